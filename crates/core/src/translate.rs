//! # Failure Translator
//!
//! Adapts a callable that declares a failure `E` into one that declares
//! nothing. Three strategies are offered, chosen per call site:
//!
//! | Adapter      | Checked failure becomes                     |
//! |--------------|---------------------------------------------|
//! | `nest`       | [`Unchecked::Nested`] carrier, cause = original |
//! | `nest_with`  | whatever the caller's mapper builds          |
//! | `sneaky`     | [`Unchecked::Raised`] holding the original   |
//!
//! Unchecked and fatal failures pass through every adapter untouched.

use std::error::Error as StdError;

use crate::callable::{Callable, Inputs};
use crate::error::{Failure, Never, Outcome, Unchecked};

/// Wrap a checked failure in a carrier; leave everything else alone.
pub fn nest_failure<E>(failure: Failure<E>) -> Failure<Never>
where
    E: StdError + Send + Sync + 'static,
{
    failure.map_checked(|e| Failure::Unchecked(Unchecked::nested(e)))
}

/// Propagate a checked failure as itself through a non-declaring signature.
pub fn sneak_failure<E>(failure: Failure<E>) -> Failure<Never>
where
    E: StdError + Send + Sync + 'static,
{
    failure.map_checked(|e| Failure::Unchecked(Unchecked::raised(e)))
}

/// Callable produced by [`TranslateExt::nest`].
#[derive(Debug, Clone)]
pub struct Nest<C> {
    inner: C,
}

impl<C, Args> Callable<Args> for Nest<C>
where
    Args: Inputs,
    C: Callable<Args>,
    C::Error: StdError + Send + Sync + 'static,
{
    type Output = C::Output;
    type Error = Never;

    fn invoke(&self, args: Args) -> Outcome<C::Output> {
        self.inner.invoke(args).map_err(nest_failure)
    }
}

/// Callable produced by [`TranslateExt::nest_with`].
#[derive(Debug, Clone)]
pub struct NestWith<C, M> {
    inner: C,
    mapper: M,
}

impl<C, M, X, Args> Callable<Args> for NestWith<C, M>
where
    Args: Inputs,
    C: Callable<Args>,
    M: Fn(C::Error) -> X,
    X: StdError + Send + Sync + 'static,
{
    type Output = C::Output;
    type Error = Never;

    fn invoke(&self, args: Args) -> Outcome<C::Output> {
        self.inner
            .invoke(args)
            .map_err(|failure| failure.map_checked(|e| Failure::raise((self.mapper)(e))))
    }
}

/// Callable produced by [`TranslateExt::sneaky`].
#[derive(Debug, Clone)]
pub struct Sneaky<C> {
    inner: C,
}

impl<C, Args> Callable<Args> for Sneaky<C>
where
    Args: Inputs,
    C: Callable<Args>,
    C::Error: StdError + Send + Sync + 'static,
{
    type Output = C::Output;
    type Error = Never;

    fn invoke(&self, args: Args) -> Outcome<C::Output> {
        self.inner.invoke(args).map_err(sneak_failure)
    }
}

/// Failure translation for every callable.
pub trait TranslateExt<Args: Inputs>: Callable<Args> + Sized {
    /// Checked failures become a carrier recording message and cause.
    fn nest(self) -> Nest<Self> {
        Nest { inner: self }
    }

    /// Same as [`nest`](Self::nest).
    fn unchecked(self) -> Nest<Self> {
        self.nest()
    }

    /// Checked failures are mapped by `mapper` and raised unchecked.
    ///
    /// The mapper has to return a failure type, so a mapper that "forgets"
    /// to produce one does not type-check.
    fn nest_with<M, X>(self, mapper: M) -> NestWith<Self, M>
    where
        M: Fn(Self::Error) -> X,
        X: StdError + Send + Sync + 'static,
    {
        NestWith {
            inner: self,
            mapper,
        }
    }

    /// Checked failures are raised unchecked as the original value.
    fn sneaky(self) -> Sneaky<Self> {
        Sneaky { inner: self }
    }
}

impl<C, Args> TranslateExt<Args> for C
where
    Args: Inputs,
    C: Callable<Args>,
{
}
