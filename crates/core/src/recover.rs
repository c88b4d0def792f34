//! # Recovery Algebra
//!
//! Operators that decide what happens when an invocation fails. Each one
//! evaluates the primary callable exactly once per invocation and touches
//! its alternative (`other`, fallback, supplier, mapper) only after a
//! failure it is allowed to intercept.
//!
//! | Operator          | Intercepts          | Result declares |
//! |-------------------|---------------------|-----------------|
//! | `or_else`         | checked             | same `E`        |
//! | `or_throw`        | checked             | nothing         |
//! | `fallback_to`     | checked             | nothing         |
//! | `or_return[_with]`| checked             | nothing         |
//! | `or_return_self`  | checked             | nothing         |
//! | `recover`         | checked + unchecked | nothing         |
//!
//! Fatal failures are never intercepted.

use std::error::Error as StdError;
use std::fmt::Display;
use std::sync::Arc;

use crate::callable::{Callable, Inputs};
use crate::error::{ContractViolation, Failure, Never, Outcome, Unchecked};

/// Callable produced by [`RecoverExt::or_else`].
#[derive(Debug, Clone)]
pub struct OrElse<C, D> {
    primary: C,
    other: D,
}

impl<C, D, Args> Callable<Args> for OrElse<C, D>
where
    Args: Inputs + Clone,
    C: Callable<Args>,
    D: Callable<Args, Output = C::Output, Error = C::Error>,
{
    type Output = C::Output;
    type Error = C::Error;

    fn invoke(&self, args: Args) -> Outcome<C::Output, C::Error> {
        match self.primary.invoke(args.clone()) {
            Err(Failure::Checked(_)) => self.other.invoke(args),
            result => result,
        }
    }
}

/// Callable produced by [`RecoverExt::or_throw`].
#[derive(Debug, Clone)]
pub struct OrThrow<C, F> {
    primary: C,
    factory: F,
}

impl<C, F, X, Args> Callable<Args> for OrThrow<C, F>
where
    Args: Inputs,
    C: Callable<Args>,
    C::Error: StdError + Send + Sync + 'static,
    F: Fn() -> X,
    X: StdError + Send + Sync + 'static,
{
    type Output = C::Output;
    type Error = Never;

    fn invoke(&self, args: Args) -> Outcome<C::Output> {
        self.primary.invoke(args).map_err(|failure| {
            failure.map_checked(|original| {
                Failure::Unchecked(Unchecked::Replaced {
                    raised: Arc::new((self.factory)()),
                    suppressed: Arc::new(original),
                })
            })
        })
    }
}

/// Callable produced by [`RecoverExt::fallback_to`].
#[derive(Debug, Clone)]
pub struct FallbackTo<C, D> {
    primary: C,
    fallback: D,
}

impl<C, D, Args> Callable<Args> for FallbackTo<C, D>
where
    Args: Inputs + Clone,
    C: Callable<Args>,
    D: Callable<Args, Output = C::Output, Error = Never>,
{
    type Output = C::Output;
    type Error = Never;

    fn invoke(&self, args: Args) -> Outcome<C::Output> {
        match self.primary.invoke(args.clone()) {
            Ok(value) => Ok(value),
            Err(failure) => {
                failure.split_checked::<Never>()?;
                self.fallback.invoke(args)
            }
        }
    }
}

/// Callable produced by [`RecoverExt::or_return`].
#[derive(Debug, Clone)]
pub struct OrReturn<C, T> {
    primary: C,
    value: T,
}

impl<C, T, Args> Callable<Args> for OrReturn<C, T>
where
    Args: Inputs,
    C: Callable<Args, Output = T>,
    T: Clone,
{
    type Output = T;
    type Error = Never;

    fn invoke(&self, args: Args) -> Outcome<T> {
        match self.primary.invoke(args) {
            Ok(value) => Ok(value),
            Err(failure) => {
                failure.split_checked::<Never>()?;
                Ok(self.value.clone())
            }
        }
    }
}

/// Callable produced by [`RecoverExt::or_return_with`].
#[derive(Debug, Clone)]
pub struct OrReturnWith<C, S> {
    primary: C,
    supplier: S,
}

impl<C, S, Args> Callable<Args> for OrReturnWith<C, S>
where
    Args: Inputs,
    C: Callable<Args>,
    S: Fn() -> C::Output,
{
    type Output = C::Output;
    type Error = Never;

    fn invoke(&self, args: Args) -> Outcome<C::Output> {
        match self.primary.invoke(args) {
            Ok(value) => Ok(value),
            Err(failure) => {
                failure.split_checked::<Never>()?;
                Ok((self.supplier)())
            }
        }
    }
}

/// Callable produced by [`RecoverExt::or_return_self`]. Unary operators only.
#[derive(Debug, Clone)]
pub struct OrReturnSelf<C> {
    primary: C,
}

impl<C, A> Callable<(A,)> for OrReturnSelf<C>
where
    A: Clone,
    C: Callable<(A,), Output = A>,
{
    type Output = A;
    type Error = Never;

    fn invoke(&self, (a,): (A,)) -> Outcome<A> {
        match self.primary.invoke((a.clone(),)) {
            Ok(value) => Ok(value),
            Err(failure) => {
                failure.split_checked::<Never>()?;
                Ok(a)
            }
        }
    }
}

/// Callable produced by [`RecoverExt::recover`].
#[derive(Debug, Clone)]
pub struct Recover<C, M> {
    primary: C,
    mapper: M,
}

impl<C, M, R, Args> Callable<Args> for Recover<C, M>
where
    Args: Inputs + Clone,
    C: Callable<Args>,
    C::Error: Display,
    M: Fn(&Failure<C::Error>) -> Option<R>,
    R: Callable<Args, Output = C::Output, Error = Never>,
{
    type Output = C::Output;
    type Error = Never;

    fn invoke(&self, args: Args) -> Outcome<C::Output> {
        let failure = match self.primary.invoke(args.clone()) {
            Ok(value) => return Ok(value),
            Err(Failure::Fatal(fatal)) => return Err(Failure::Fatal(fatal)),
            Err(failure) => failure,
        };

        let replacement = (self.mapper)(&failure).ok_or_else(|| {
            Failure::<Never>::Unchecked(Unchecked::Contract(
                ContractViolation::MissingReplacement {
                    kind: failure.kind().to_string(),
                    message: failure.to_string(),
                },
            ))
        })?;
        replacement.invoke(args)
    }
}

/// Recovery operators for every callable.
pub trait RecoverExt<Args: Inputs>: Callable<Args> + Sized {
    /// On a checked failure, invoke `other` with the same inputs.
    fn or_else<D>(self, other: D) -> OrElse<Self, D>
    where
        D: Callable<Args, Output = Self::Output, Error = Self::Error>,
    {
        OrElse {
            primary: self,
            other,
        }
    }

    /// On a checked failure, raise `factory()` with the original suppressed.
    fn or_throw<F, X>(self, factory: F) -> OrThrow<Self, F>
    where
        F: Fn() -> X,
        X: StdError + Send + Sync + 'static,
    {
        OrThrow {
            primary: self,
            factory,
        }
    }

    /// On a checked failure, invoke the non-declaring `fallback`.
    fn fallback_to<D>(self, fallback: D) -> FallbackTo<Self, D>
    where
        D: Callable<Args, Output = Self::Output, Error = Never>,
    {
        FallbackTo {
            primary: self,
            fallback,
        }
    }

    /// On a checked failure, return `value`.
    fn or_return(self, value: Self::Output) -> OrReturn<Self, Self::Output>
    where
        Self::Output: Clone,
    {
        OrReturn {
            primary: self,
            value,
        }
    }

    /// On a checked failure, return a freshly supplied value.
    fn or_return_with<S>(self, supplier: S) -> OrReturnWith<Self, S>
    where
        S: Fn() -> Self::Output,
    {
        OrReturnWith {
            primary: self,
            supplier,
        }
    }

    /// On a checked failure, return the input unchanged.
    fn or_return_self(self) -> OrReturnSelf<Self> {
        OrReturnSelf { primary: self }
    }

    /// On any non-fatal failure, invoke the replacement chosen by `mapper`.
    ///
    /// A mapper returning `None` raises
    /// [`ContractViolation::MissingReplacement`] naming the failure.
    fn recover<M, R>(self, mapper: M) -> Recover<Self, M>
    where
        M: Fn(&Failure<Self::Error>) -> Option<R>,
        R: Callable<Args, Output = Self::Output, Error = Never>,
    {
        Recover {
            primary: self,
            mapper,
        }
    }
}

impl<C, Args> RecoverExt<Args> for C
where
    Args: Inputs,
    C: Callable<Args>,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callable::constant;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use thiserror::Error;

    #[derive(Debug, Clone, PartialEq, Error)]
    #[error("odd input {0}")]
    struct Odd(i32);

    #[derive(Debug, Default, Error)]
    #[error("replacement failure")]
    struct Replacement;

    fn halve(x: i32) -> Outcome<i32, Odd> {
        if x % 2 == 0 {
            Ok(x / 2)
        } else {
            Err(Odd(x).into())
        }
    }

    #[test]
    fn test_or_else_invokes_other_only_on_failure() {
        let calls = AtomicUsize::new(0);
        let other = |x: i32| -> Outcome<i32, Odd> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(x * 100)
        };
        let f = halve.or_else(other);

        assert_eq!(f.invoke((4,)).unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(f.invoke((3,)).unwrap(), 300);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_or_throw_suppresses_original() {
        let err = halve.or_throw(Replacement::default).invoke((3,)).unwrap_err();
        let unchecked = err.as_unchecked().expect("unchecked");

        assert_eq!(unchecked.to_string(), "replacement failure");
        assert!(unchecked.downcast_ref::<Replacement>().is_some());
        let suppressed = unchecked.suppressed().expect("suppressed");
        assert_eq!(suppressed.downcast_ref::<Odd>(), Some(&Odd(3)));
    }

    #[test]
    fn test_fallback_to_non_declaring() {
        let f = halve.fallback_to(|x: i32| -> Outcome<i32> { Ok(-x) });
        assert_eq!(f.invoke((8,)).unwrap(), 4);
        assert_eq!(f.invoke((5,)).unwrap(), -5);
    }

    #[test]
    fn test_or_return_variants() {
        assert_eq!(halve.or_return(42).invoke((7,)).unwrap(), 42);
        assert_eq!(halve.or_return(42).invoke((6,)).unwrap(), 3);
        assert_eq!(halve.or_return_with(|| 9).invoke((1,)).unwrap(), 9);
        assert_eq!(halve.or_return_self().invoke((11,)).unwrap(), 11);
        assert_eq!(halve.or_return_self().invoke((10,)).unwrap(), 5);
    }

    #[test]
    fn test_recover_handles_unchecked() {
        let raising = |_: i32| -> Outcome<i32, Odd> { Err(Failure::raise(Replacement)) };
        let f = raising.recover(|failure: &Failure<Odd>| {
            assert_eq!(failure.kind(), "raised");
            Some(constant(0))
        });
        assert_eq!(f.invoke((1,)).unwrap(), 0);
    }

    #[test]
    fn test_recover_missing_replacement_names_failure() {
        let f = halve.recover(|_: &Failure<Odd>| None::<crate::callable::Constant<i32>>);
        let err = f.invoke((3,)).unwrap_err();

        match err.as_unchecked().and_then(Unchecked::as_contract) {
            Some(ContractViolation::MissingReplacement { kind, message }) => {
                assert!(kind.ends_with("Odd"));
                assert_eq!(message, "odd input 3");
            }
            other => panic!("expected contract violation, got {:?}", other),
        }
    }

    // ========================================================================
    // Evaluation counts
    // ========================================================================

    fn counted<'a>(calls: &'a AtomicUsize) -> impl Fn(i32) -> Outcome<i32, Odd> + 'a {
        move |x: i32| {
            calls.fetch_add(1, Ordering::SeqCst);
            halve(x)
        }
    }

    #[test]
    fn test_fallback_to_is_lazy() {
        let primary = AtomicUsize::new(0);
        let fallbacks = AtomicUsize::new(0);
        let f = counted(&primary).fallback_to(|x: i32| -> Outcome<i32> {
            fallbacks.fetch_add(1, Ordering::SeqCst);
            Ok(-x)
        });

        assert_eq!(f.invoke((4,)).unwrap(), 2);
        assert_eq!(primary.load(Ordering::SeqCst), 1);
        assert_eq!(fallbacks.load(Ordering::SeqCst), 0);

        assert_eq!(f.invoke((5,)).unwrap(), -5);
        assert_eq!(primary.load(Ordering::SeqCst), 2);
        assert_eq!(fallbacks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_or_return_with_is_lazy() {
        let primary = AtomicUsize::new(0);
        let supplied = AtomicUsize::new(0);
        let f = counted(&primary).or_return_with(|| {
            supplied.fetch_add(1, Ordering::SeqCst);
            9
        });

        assert_eq!(f.invoke((2,)).unwrap(), 1);
        assert_eq!(primary.load(Ordering::SeqCst), 1);
        assert_eq!(supplied.load(Ordering::SeqCst), 0);

        assert_eq!(f.invoke((1,)).unwrap(), 9);
        assert_eq!(primary.load(Ordering::SeqCst), 2);
        assert_eq!(supplied.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_recover_is_lazy() {
        let primary = AtomicUsize::new(0);
        let mapped = AtomicUsize::new(0);
        let f = counted(&primary).recover(|_: &Failure<Odd>| {
            mapped.fetch_add(1, Ordering::SeqCst);
            Some(constant(0))
        });

        assert_eq!(f.invoke((8,)).unwrap(), 4);
        assert_eq!(primary.load(Ordering::SeqCst), 1);
        assert_eq!(mapped.load(Ordering::SeqCst), 0);

        assert_eq!(f.invoke((7,)).unwrap(), 0);
        assert_eq!(primary.load(Ordering::SeqCst), 2);
        assert_eq!(mapped.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_or_throw_is_lazy() {
        let primary = AtomicUsize::new(0);
        let built = AtomicUsize::new(0);
        let f = counted(&primary).or_throw(|| {
            built.fetch_add(1, Ordering::SeqCst);
            Replacement
        });

        assert_eq!(f.invoke((6,)).unwrap(), 3);
        assert_eq!(primary.load(Ordering::SeqCst), 1);
        assert_eq!(built.load(Ordering::SeqCst), 0);

        assert!(f.invoke((3,)).is_err());
        assert_eq!(primary.load(Ordering::SeqCst), 2);
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unchecked_is_not_caught_by_or_return() {
        let raising = |_: i32| -> Outcome<i32, Odd> { Err(Failure::raise(Replacement)) };
        let err = raising.or_return(1).invoke((2,)).unwrap_err();
        assert_eq!(err.kind(), "raised");
    }
}
