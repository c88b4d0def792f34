//! # Composition Algebra
//!
//! Callables are values: these operators build new callables out of
//! existing ones without running anything. The receiver is consumed and owned
//! by the result, so a composed callable can never refer back to itself.
//!
//! Laws (checked in `tests/laws.rs`):
//!
//! ```text
//! f.compose((b1, .., bn)).invoke((x1, .., xn)) == f.invoke((b1(x1), .., bn(xn)))
//! f.and_then(g).invoke(x)                     == g(f.invoke(x))
//! f.curried()(x1)(x2)(x3)                     == f.invoke((x1, x2, x3))
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use crate::callable::{of_total, Callable, Inputs, Partial, Split, Total};
use crate::error::Outcome;

// ============================================================================
// compose
// ============================================================================

/// A tuple of unary callables, one per raw input, sharing one error type.
pub trait Adapters<Raw: Inputs> {
    type Mapped: Inputs;
    type Error;

    fn adapt(&self, raw: Raw) -> Outcome<Self::Mapped, Self::Error>;
}

macro_rules! impl_adapters {
    ($($B:ident $X:ident $x:ident $idx:tt),+) => {
        impl<E, $($B, $X),+> Adapters<($($X,)+)> for ($($B,)+)
        where
            $($B: Callable<($X,), Error = E>,)+
        {
            type Mapped = ($($B::Output,)+);
            type Error = E;

            fn adapt(&self, ($($x,)+): ($($X,)+)) -> Outcome<Self::Mapped, E> {
                Ok(($(self.$idx.invoke(($x,))?,)+))
            }
        }
    };
}

impl_adapters!(B1 X1 x1 0);
impl_adapters!(B1 X1 x1 0, B2 X2 x2 1);
impl_adapters!(B1 X1 x1 0, B2 X2 x2 1, B3 X3 x3 2);
impl_adapters!(B1 X1 x1 0, B2 X2 x2 1, B3 X3 x3 2, B4 X4 x4 3);
impl_adapters!(B1 X1 x1 0, B2 X2 x2 1, B3 X3 x3 2, B4 X4 x4 3, B5 X5 x5 4);

/// Callable produced by [`ComposeExt::compose`].
#[derive(Debug, Clone)]
pub struct Compose<C, B> {
    inner: C,
    befores: B,
}

impl<C, B, Raw> Callable<Raw> for Compose<C, B>
where
    Raw: Inputs,
    B: Adapters<Raw>,
    C: Callable<B::Mapped, Error = B::Error>,
{
    type Output = C::Output;
    type Error = C::Error;

    fn invoke(&self, raw: Raw) -> Outcome<C::Output, C::Error> {
        let mapped = self.befores.adapt(raw)?;
        self.inner.invoke(mapped)
    }
}

// ============================================================================
// and_then / consume
// ============================================================================

/// Callable produced by [`ComposeExt::and_then`].
#[derive(Debug, Clone)]
pub struct AndThen<C, G> {
    inner: C,
    after: G,
}

impl<C, G, Args> Callable<Args> for AndThen<C, G>
where
    Args: Inputs,
    C: Callable<Args>,
    G: Callable<(C::Output,), Error = C::Error>,
{
    type Output = G::Output;
    type Error = C::Error;

    fn invoke(&self, args: Args) -> Outcome<G::Output, C::Error> {
        let value = self.inner.invoke(args)?;
        self.after.invoke((value,))
    }
}

/// Callable produced by [`ComposeExt::consume`].
#[derive(Debug, Clone)]
pub struct Consume<C, S> {
    inner: C,
    sink: S,
}

impl<C, S, Args> Callable<Args> for Consume<C, S>
where
    Args: Inputs,
    C: Callable<Args>,
    S: Fn(C::Output),
{
    type Output = ();
    type Error = C::Error;

    fn invoke(&self, args: Args) -> Outcome<(), C::Error> {
        let value = self.inner.invoke(args)?;
        (self.sink)(value);
        Ok(())
    }
}

// ============================================================================
// curried / tupled / reversed
// ============================================================================

/// Callable produced by [`ComposeExt::curried`].
///
/// Takes the first input and returns a callable over the rest; the last
/// link in the chain is a unary callable returning the final output.
pub struct Curry<C, Args> {
    inner: Arc<C>,
    _args: PhantomData<fn(Args)>,
}

impl<C, Args> Clone for Curry<C, Args> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _args: PhantomData,
        }
    }
}

impl<C, Args> Curry<C, Args> {
    fn from_shared(inner: Arc<C>) -> Self {
        Self {
            inner,
            _args: PhantomData,
        }
    }
}

impl<C, A1, A2> Callable<(A1,)> for Curry<C, (A1, A2)>
where
    C: Callable<(A1, A2)>,
{
    type Output = Partial<C, (A1, A2)>;
    type Error = C::Error;

    fn invoke(&self, (a1,): (A1,)) -> Outcome<Self::Output, C::Error> {
        Ok(Partial::from_shared(Arc::clone(&self.inner), a1))
    }
}

impl<C, A1, A2, A3> Callable<(A1,)> for Curry<C, (A1, A2, A3)>
where
    C: Callable<(A1, A2, A3)>,
{
    type Output = Curry<Partial<C, (A1, A2, A3)>, (A2, A3)>;
    type Error = C::Error;

    fn invoke(&self, (a1,): (A1,)) -> Outcome<Self::Output, C::Error> {
        let rest = Partial::from_shared(Arc::clone(&self.inner), a1);
        Ok(Curry::from_shared(Arc::new(rest)))
    }
}

impl<C, A1, A2, A3, A4> Callable<(A1,)> for Curry<C, (A1, A2, A3, A4)>
where
    C: Callable<(A1, A2, A3, A4)>,
{
    type Output = Curry<Partial<C, (A1, A2, A3, A4)>, (A2, A3, A4)>;
    type Error = C::Error;

    fn invoke(&self, (a1,): (A1,)) -> Outcome<Self::Output, C::Error> {
        let rest = Partial::from_shared(Arc::clone(&self.inner), a1);
        Ok(Curry::from_shared(Arc::new(rest)))
    }
}

/// Callable produced by [`ComposeExt::tupled`]: one input, the whole tuple.
#[derive(Debug, Clone)]
pub struct Tupled<C> {
    inner: C,
}

impl<C, Args> Callable<(Args,)> for Tupled<C>
where
    Args: Inputs,
    C: Callable<Args>,
{
    type Output = C::Output;
    type Error = C::Error;

    fn invoke(&self, (args,): (Args,)) -> Outcome<C::Output, C::Error> {
        self.inner.invoke(args)
    }
}

/// Input tuples of arity two or more, which can be reversed.
pub trait Reverse: Inputs {
    type Reversed: Inputs;

    /// Turn reversed inputs back into the original order.
    fn restore(reversed: Self::Reversed) -> Self;
}

macro_rules! impl_reverse {
    (($($A:ident),+) => ($($R:ident $r:ident),+)) => {
        impl<$($A),+> Reverse for ($($A,)+) {
            type Reversed = ($($R,)+);

            fn restore(($($r,)+): Self::Reversed) -> Self {
                impl_reverse!(@rev [] $($r)+)
            }
        }
    };
    (@rev [$($done:ident)*]) => { ($($done,)*) };
    (@rev [$($done:ident)*] $head:ident $($rest:ident)*) => {
        impl_reverse!(@rev [$head $($done)*] $($rest)*)
    };
}

impl_reverse!((A1, A2) => (A2 a2, A1 a1));
impl_reverse!((A1, A2, A3) => (A3 a3, A2 a2, A1 a1));
impl_reverse!((A1, A2, A3, A4) => (A4 a4, A3 a3, A2 a2, A1 a1));
impl_reverse!((A1, A2, A3, A4, A5) => (A5 a5, A4 a4, A3 a3, A2 a2, A1 a1));

/// Callable produced by [`ComposeExt::reversed`].
pub struct Reversed<C, Args> {
    inner: C,
    _args: PhantomData<fn(Args)>,
}

impl<C: Clone, Args> Clone for Reversed<C, Args> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _args: PhantomData,
        }
    }
}

impl<C, Args> Callable<Args::Reversed> for Reversed<C, Args>
where
    Args: Reverse,
    C: Callable<Args>,
{
    type Output = C::Output;
    type Error = C::Error;

    fn invoke(&self, reversed: Args::Reversed) -> Outcome<C::Output, C::Error> {
        self.inner.invoke(Args::restore(reversed))
    }
}

// ============================================================================
// Boxed callables
// ============================================================================

/// A type-erased callable, for storing heterogeneous pipelines.
pub struct BoxCallable<Args: Inputs, O, E> {
    inner: Box<dyn Callable<Args, Output = O, Error = E> + Send + Sync>,
}

impl<Args: Inputs, O, E> BoxCallable<Args, O, E> {
    pub fn new<C>(callable: C) -> Self
    where
        C: Callable<Args, Output = O, Error = E> + Send + Sync + 'static,
    {
        Self {
            inner: Box::new(callable),
        }
    }
}

impl<Args: Inputs, O, E> Callable<Args> for BoxCallable<Args, O, E> {
    type Output = O;
    type Error = E;

    fn invoke(&self, args: Args) -> Outcome<O, E> {
        self.inner.invoke(args)
    }
}

// ============================================================================
// Extension trait
// ============================================================================

/// Composition operators for every callable.
pub trait ComposeExt<Args: Inputs>: Callable<Args> + Sized {
    /// Map each raw input through its own unary callable before invoking.
    ///
    /// `befores` is a tuple with exactly one callable per input.
    /// The result is callable with the raw inputs `befores` accepts.
    fn compose<B>(self, befores: B) -> Compose<Self, B> {
        Compose {
            inner: self,
            befores,
        }
    }

    /// Feed the output into `after`.
    fn and_then<G>(self, after: G) -> AndThen<Self, G>
    where
        G: Callable<(Self::Output,), Error = Self::Error>,
    {
        AndThen { inner: self, after }
    }

    /// Post-process the output with an infallible function.
    fn map<F, P>(self, f: F) -> AndThen<Self, Total<F, Self::Error>>
    where
        F: Fn(Self::Output) -> P,
    {
        self.and_then(of_total(f))
    }

    /// Pass the output to `sink` and return `()`.
    fn consume<S>(self, sink: S) -> Consume<Self, S>
    where
        S: Fn(Self::Output),
    {
        Consume { inner: self, sink }
    }

    /// Chain of unary callables, one per input. Arities 2 to 4.
    fn curried(self) -> Curry<Self, Args>
    where
        Args: Split,
    {
        Curry::from_shared(Arc::new(self))
    }

    /// Single input holding the whole input tuple.
    fn tupled(self) -> Tupled<Self> {
        Tupled { inner: self }
    }

    /// Same callable with its inputs in reverse order.
    fn reversed(self) -> Reversed<Self, Args>
    where
        Args: Reverse,
    {
        Reversed {
            inner: self,
            _args: PhantomData,
        }
    }

    fn boxed(self) -> BoxCallable<Args, Self::Output, Self::Error>
    where
        Self: Send + Sync + 'static,
    {
        BoxCallable::new(self)
    }
}

impl<C, Args> ComposeExt<Args> for C
where
    Args: Inputs,
    C: Callable<Args>,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Failure, Never};
    use std::sync::Mutex;
    use thiserror::Error;

    #[derive(Debug, Clone, PartialEq, Error)]
    #[error("negative: {0}")]
    struct Negative(i32);

    fn sqrt_floor(x: i32) -> Outcome<i32, Negative> {
        if x < 0 {
            Err(Negative(x).into())
        } else {
            Ok((x as f64).sqrt() as i32)
        }
    }

    fn concat(a: String, b: String, c: String) -> Outcome<String> {
        Ok(format!("{a}{b}{c}"))
    }

    #[test]
    fn test_compose_applies_befores_positionally() {
        let len = of_total::<_, Never>(|s: &str| s.len());
        let upper = of_total::<_, Never>(|s: &str| s.to_uppercase());
        let describe = |n: usize, s: String| -> Outcome<String> { Ok(format!("{n}:{s}")) };

        let composed = describe.compose((len, upper));
        assert_eq!(composed.invoke(("abc", "xy")).unwrap(), "3:XY");
    }

    #[test]
    fn test_compose_stops_at_failing_before() {
        let double = |x: i32| -> Outcome<i32, Negative> { Ok(x * 2) };
        let composed = double.compose((sqrt_floor,));

        assert_eq!(composed.invoke((16,)).unwrap(), 8);
        assert!(matches!(
            composed.invoke((-1,)),
            Err(Failure::Checked(Negative(-1)))
        ));
    }

    #[test]
    fn test_and_then_and_map() {
        let f = sqrt_floor.map(|r: i32| r + 1);
        assert_eq!(f.invoke((9,)).unwrap(), 4);

        let g = sqrt_floor.and_then(sqrt_floor);
        assert_eq!(g.invoke((81,)).unwrap(), 3);
    }

    #[test]
    fn test_consume_passes_output_to_sink() {
        let seen = Mutex::new(Vec::new());
        let f = sqrt_floor.consume(|v: i32| seen.lock().unwrap().push(v));

        f.invoke((25,)).unwrap();
        f.invoke((4,)).unwrap();
        assert!(f.invoke((-4,)).is_err());
        assert_eq!(*seen.lock().unwrap(), vec![5, 2]);
    }

    #[test]
    fn test_tupled_and_reversed() {
        let tupled = concat.tupled();
        let args = ("a".to_string(), "b".to_string(), "c".to_string());
        assert_eq!(tupled.invoke((args,)).unwrap(), "abc");

        let reversed = concat.reversed();
        let out = reversed
            .invoke(("a".to_string(), "b".to_string(), "c".to_string()))
            .unwrap();
        assert_eq!(out, "cba");
    }

    #[test]
    fn test_curried_binary() {
        let sub = |a: i32, b: i32| -> Outcome<i32> { Ok(a - b) };
        let step = sub.curried().invoke((10,)).unwrap();
        assert_eq!(step.invoke((3,)).unwrap(), 7);
        assert_eq!(step.invoke((4,)).unwrap(), 6);
    }

    #[test]
    fn test_boxed_pipelines_share_a_type() {
        let pipelines: Vec<BoxCallable<(i32,), i32, Negative>> = vec![
            sqrt_floor.boxed(),
            sqrt_floor.map(|r: i32| r * 10).boxed(),
        ];
        let results: Vec<i32> = pipelines
            .iter()
            .map(|p| p.invoke((49,)).unwrap())
            .collect();
        assert_eq!(results, vec![7, 70]);
    }
}
