//! # Callables - The Invocation Contract
//!
//! A [`Callable`] takes a tuple of inputs and produces an [`Outcome`]: either
//! a value or a [`Failure`](crate::Failure). The input tuple fixes the arity at the type
//! level, so `arity()` is a constant of the shape.
//!
//! Plain functions and closures returning an `Outcome` are callables already:
//!
//! ```rust
//! use fallible_core::{of, Callable, Outcome};
//!
//! let add = of(|a: i32, b: i32| -> Outcome<i32> { Ok(a + b) });
//! assert_eq!(add.invoke((2, 3)).unwrap(), 5);
//! assert_eq!(add.arity(), 2);
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{ContractViolation, Never, Outcome};

/// Input tuples accepted by callables.
pub trait Inputs {
    /// Number of inputs in the tuple.
    const ARITY: usize;
}

/// Input tuples with at least one element, split into head and tail.
pub trait Split: Inputs {
    type Head;
    type Tail: Inputs;

    fn join(head: Self::Head, tail: Self::Tail) -> Self;
}

/// A value that accepts a tuple of inputs and produces one output or a failure.
pub trait Callable<Args: Inputs> {
    type Output;

    /// Declared failure. [`Never`] when the callable declares none.
    type Error;

    fn invoke(&self, args: Args) -> Outcome<Self::Output, Self::Error>;

    fn arity(&self) -> usize {
        Args::ARITY
    }
}

impl Inputs for () {
    const ARITY: usize = 0;
}

macro_rules! impl_inputs {
    ($n:expr; $H:ident $h:ident $(, $T:ident $t:ident)*) => {
        impl<$H $(, $T)*> Inputs for ($H, $($T,)*) {
            const ARITY: usize = $n;
        }

        impl<$H $(, $T)*> Split for ($H, $($T,)*) {
            type Head = $H;
            type Tail = ($($T,)*);

            fn join($h: $H, ($($t,)*): ($($T,)*)) -> Self {
                ($h, $($t,)*)
            }
        }
    };
}

impl_inputs!(1; A1 a1);
impl_inputs!(2; A1 a1, A2 a2);
impl_inputs!(3; A1 a1, A2 a2, A3 a3);
impl_inputs!(4; A1 a1, A2 a2, A3 a3, A4 a4);
impl_inputs!(5; A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);

macro_rules! impl_callable_for_fn {
    ($($A:ident $a:ident),*) => {
        impl<F, $($A,)* O, E> Callable<($($A,)*)> for F
        where
            F: Fn($($A),*) -> Outcome<O, E>,
        {
            type Output = O;
            type Error = E;

            fn invoke(&self, ($($a,)*): ($($A,)*)) -> Outcome<O, E> {
                self($($a),*)
            }
        }
    };
}

impl_callable_for_fn!();
impl_callable_for_fn!(A1 a1);
impl_callable_for_fn!(A1 a1, A2 a2);
impl_callable_for_fn!(A1 a1, A2 a2, A3 a3);
impl_callable_for_fn!(A1 a1, A2 a2, A3 a3, A4 a4);
impl_callable_for_fn!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);

/// Identity adapter. Returns its argument unchanged; it only pins down the
/// shape for type inference at the call site.
pub fn of<Args, C>(callable: C) -> C
where
    Args: Inputs,
    C: Callable<Args>,
{
    callable
}

// ============================================================================
// Total functions
// ============================================================================

/// A unary function that cannot fail, viewed as a callable declaring `E`.
pub struct Total<F, E = Never> {
    f: F,
    _error: PhantomData<fn() -> E>,
}

impl<F: Clone, E> Clone for Total<F, E> {
    fn clone(&self) -> Self {
        Self {
            f: self.f.clone(),
            _error: PhantomData,
        }
    }
}

/// Lift an infallible unary function into a callable.
pub fn of_total<F, E>(f: F) -> Total<F, E> {
    Total {
        f,
        _error: PhantomData,
    }
}

impl<F, A, O, E> Callable<(A,)> for Total<F, E>
where
    F: Fn(A) -> O,
{
    type Output = O;
    type Error = E;

    fn invoke(&self, (a,): (A,)) -> Outcome<O, E> {
        Ok((self.f)(a))
    }
}

// ============================================================================
// Constant and identity
// ============================================================================

/// Ignores every input and returns the same value.
pub struct Constant<T, E = Never> {
    value: T,
    _error: PhantomData<fn() -> E>,
}

impl<T: Clone, E> Clone for Constant<T, E> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            _error: PhantomData,
        }
    }
}

impl<T, E> Constant<T, E> {
    /// Build a constant from a possibly absent value.
    pub fn try_from_option(value: Option<T>) -> Result<Self, ContractViolation> {
        value
            .map(constant)
            .ok_or(ContractViolation::AbsentValue {
                what: "constant value",
            })
    }

    pub fn value(&self) -> &T {
        &self.value
    }
}

/// A callable of any arity that always returns `value`.
pub fn constant<T, E>(value: T) -> Constant<T, E> {
    Constant {
        value,
        _error: PhantomData,
    }
}

impl<T, E, Args> Callable<Args> for Constant<T, E>
where
    T: Clone,
    Args: Inputs,
{
    type Output = T;
    type Error = E;

    fn invoke(&self, _args: Args) -> Outcome<T, E> {
        Ok(self.value.clone())
    }
}

/// Returns its single input unchanged.
pub struct Identity<E = Never> {
    _error: PhantomData<fn() -> E>,
}

impl<E> Clone for Identity<E> {
    fn clone(&self) -> Self {
        identity()
    }
}

pub fn identity<E>() -> Identity<E> {
    Identity {
        _error: PhantomData,
    }
}

impl<A, E> Callable<(A,)> for Identity<E> {
    type Output = A;
    type Error = E;

    fn invoke(&self, (a,): (A,)) -> Outcome<A, E> {
        Ok(a)
    }
}

// ============================================================================
// Partial application
// ============================================================================

/// A callable with its first input bound.
pub struct Partial<C, Args: Split> {
    inner: Arc<C>,
    head: Args::Head,
    _args: PhantomData<fn(Args)>,
}

impl<C, Args> Clone for Partial<C, Args>
where
    Args: Split,
    Args::Head: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            head: self.head.clone(),
            _args: PhantomData,
        }
    }
}

impl<C, Args: Split> Partial<C, Args> {
    pub(crate) fn from_shared(inner: Arc<C>, head: Args::Head) -> Self {
        Self {
            inner,
            head,
            _args: PhantomData,
        }
    }
}

/// Bind the first input of `callable` to `head`.
pub fn partial<C, Args>(callable: C, head: Args::Head) -> Partial<C, Args>
where
    Args: Split,
    C: Callable<Args>,
{
    Partial::from_shared(Arc::new(callable), head)
}

impl<C, Args> Callable<Args::Tail> for Partial<C, Args>
where
    Args: Split,
    Args::Head: Clone,
    C: Callable<Args>,
{
    type Output = C::Output;
    type Error = C::Error;

    fn invoke(&self, rest: Args::Tail) -> Outcome<C::Output, C::Error> {
        self.inner.invoke(Args::join(self.head.clone(), rest))
    }
}
