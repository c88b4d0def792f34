//! # Failure Taxonomy
//!
//! Every invocation either produces a value or a [`Failure`]. A failure is
//! tagged with how the framework is allowed to treat it:
//!
//! - **Checked**: the declared failure `E` of a callable. Translators may wrap
//!   it, recovery operators may replace it.
//! - **Unchecked**: the undeclared propagation path. Translators pass it
//!   through untouched; only `recover` intercepts it.
//! - **Fatal**: never intercepted, wrapped, or suppressed by any operator.
//!
//! Panics are fatal as well. Nothing in this crate calls `catch_unwind`, so a
//! panic unwinds through every wrapper with its payload intact.
//!
//! A callable that declares nothing uses [`Never`] as its error type, so its
//! failures can only be unchecked or fatal.

use std::any::type_name;
use std::convert::Infallible;
use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// Shared handle to an arbitrary failure.
///
/// Identity survives cloning: `Arc::ptr_eq` and `downcast_ref` both see the
/// original value.
pub type Cause = Arc<dyn StdError + Send + Sync + 'static>;

/// Marker for "no declared failure".
pub type Never = Infallible;

/// Result of invoking a callable that declares failures of type `E`.
pub type Outcome<T, E = Never> = Result<T, Failure<E>>;

/// A failure raised by an invocation.
#[derive(Debug, Clone, Error)]
pub enum Failure<E> {
    /// The declared failure of the callable.
    #[error("{0}")]
    Checked(E),

    /// A failure outside the callable's declared contract.
    #[error(transparent)]
    Unchecked(Unchecked),

    /// An unrecoverable condition. Operators never touch it.
    #[error(transparent)]
    Fatal(Fatal),
}

impl<E> From<E> for Failure<E> {
    fn from(error: E) -> Self {
        Failure::Checked(error)
    }
}

impl<E> Failure<E> {
    /// Raise `error` on the unchecked path without a carrier.
    pub fn raise<X>(error: X) -> Self
    where
        X: StdError + Send + Sync + 'static,
    {
        Failure::Unchecked(Unchecked::raised(error))
    }

    /// Raise `error` as a fatal condition.
    pub fn fatal<X>(error: X) -> Self
    where
        X: StdError + Send + Sync + 'static,
    {
        Failure::Fatal(Fatal::new(error))
    }

    pub fn is_checked(&self) -> bool {
        matches!(self, Failure::Checked(_))
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Failure::Fatal(_))
    }

    pub fn as_checked(&self) -> Option<&E> {
        match self {
            Failure::Checked(e) => Some(e),
            _ => None,
        }
    }

    pub fn into_checked(self) -> Option<E> {
        match self {
            Failure::Checked(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_unchecked(&self) -> Option<&Unchecked> {
        match self {
            Failure::Unchecked(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_fatal(&self) -> Option<&Fatal> {
        match self {
            Failure::Fatal(f) => Some(f),
            _ => None,
        }
    }

    /// Name of the failure's kind, used in diagnostics.
    ///
    /// Checked failures report the type name of `E`.
    pub fn kind(&self) -> &'static str {
        match self {
            Failure::Checked(_) => type_name::<E>(),
            Failure::Unchecked(u) => u.kind(),
            Failure::Fatal(_) => "fatal",
        }
    }

    /// Separate the checked failure from everything that must keep
    /// propagating.
    ///
    /// Unchecked and fatal failures come back in `Err`, re-typed for a
    /// context declaring `F`, with their identity unchanged.
    pub fn split_checked<F>(self) -> Result<E, Failure<F>> {
        match self {
            Failure::Checked(e) => Ok(e),
            Failure::Unchecked(u) => Err(Failure::Unchecked(u)),
            Failure::Fatal(f) => Err(Failure::Fatal(f)),
        }
    }

    /// Rewrite only the checked case; unchecked and fatal pass through.
    pub fn map_checked<F>(self, f: impl FnOnce(E) -> Failure<F>) -> Failure<F> {
        match self.split_checked() {
            Ok(e) => f(e),
            Err(other) => other,
        }
    }
}

impl Failure<Never> {
    /// Re-type a non-declaring failure for a context that declares `E`.
    pub fn widen<E>(self) -> Failure<E> {
        match self {
            Failure::Checked(never) => match never {},
            Failure::Unchecked(u) => Failure::Unchecked(u),
            Failure::Fatal(f) => Failure::Fatal(f),
        }
    }
}

/// Failures travelling on the undeclared path.
#[derive(Debug, Clone, Error)]
pub enum Unchecked {
    /// Carrier wrapping a checked failure. `message` is the cause's message.
    #[error("{message}")]
    Nested {
        message: String,
        #[source]
        cause: Cause,
    },

    /// A failure propagated as-is, without a carrier.
    #[error(transparent)]
    Raised(Cause),

    /// A failure built to replace a checked one, which is kept as suppressed.
    #[error("{raised}")]
    Replaced { raised: Cause, suppressed: Cause },

    /// The caller broke the contract of an operator.
    #[error(transparent)]
    Contract(#[from] ContractViolation),
}

impl Unchecked {
    /// Wrap `error` in a carrier that records its message and the error itself.
    pub fn nested<X>(error: X) -> Self
    where
        X: StdError + Send + Sync + 'static,
    {
        Unchecked::Nested {
            message: error.to_string(),
            cause: Arc::new(error),
        }
    }

    pub fn raised<X>(error: X) -> Self
    where
        X: StdError + Send + Sync + 'static,
    {
        Unchecked::Raised(Arc::new(error))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Unchecked::Nested { .. } => "nested",
            Unchecked::Raised(_) => "raised",
            Unchecked::Replaced { .. } => "replaced",
            Unchecked::Contract(_) => "contract violation",
        }
    }

    /// The failure this one stands for.
    ///
    /// For a carrier that is the wrapped cause; for a raised failure, the
    /// failure itself; for a replacement, the new failure.
    pub fn cause(&self) -> Option<&Cause> {
        match self {
            Unchecked::Nested { cause, .. } => Some(cause),
            Unchecked::Raised(cause) => Some(cause),
            Unchecked::Replaced { raised, .. } => Some(raised),
            Unchecked::Contract(_) => None,
        }
    }

    pub fn suppressed(&self) -> Option<&Cause> {
        match self {
            Unchecked::Replaced { suppressed, .. } => Some(suppressed),
            _ => None,
        }
    }

    /// Downcast [`cause`](Self::cause) to a concrete failure type.
    pub fn downcast_ref<T>(&self) -> Option<&T>
    where
        T: StdError + 'static,
    {
        self.cause().and_then(|cause| cause.downcast_ref::<T>())
    }

    pub fn as_contract(&self) -> Option<&ContractViolation> {
        match self {
            Unchecked::Contract(v) => Some(v),
            _ => None,
        }
    }
}

/// An unrecoverable condition.
#[derive(Debug, Clone, Error)]
#[error("fatal: {0}")]
pub struct Fatal(Cause);

impl Fatal {
    pub fn new<X>(error: X) -> Self
    where
        X: StdError + Send + Sync + 'static,
    {
        Self(Arc::new(error))
    }

    pub fn from_cause(cause: Cause) -> Self {
        Self(cause)
    }

    pub fn cause(&self) -> &Cause {
        &self.0
    }
}

/// Misuse of an operator by its caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    /// A value that must be present was absent.
    #[error("{what} must not be absent")]
    AbsentValue { what: &'static str },

    /// A `recover` mapper produced no replacement callable.
    #[error("recover mapper returned no replacement for {kind}: {message}")]
    MissingReplacement { kind: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Error)]
    #[error("boom {0}")]
    struct Boom(u32);

    #[test]
    fn test_from_lifts_into_checked() {
        let failure: Failure<Boom> = Boom(1).into();
        assert!(failure.is_checked());
        assert_eq!(failure.as_checked(), Some(&Boom(1)));
        assert_eq!(failure.to_string(), "boom 1");
    }

    #[test]
    fn test_kind_names() {
        let checked: Failure<Boom> = Failure::Checked(Boom(1));
        assert!(checked.kind().ends_with("Boom"));

        let raised: Failure<Boom> = Failure::raise(Boom(2));
        assert_eq!(raised.kind(), "raised");

        let fatal: Failure<Boom> = Failure::fatal(Boom(3));
        assert_eq!(fatal.kind(), "fatal");
        assert_eq!(fatal.to_string(), "fatal: boom 3");
    }

    #[test]
    fn test_split_checked_keeps_identity() {
        let cause: Cause = Arc::new(Boom(7));
        let fatal: Failure<Boom> = Failure::Fatal(Fatal::from_cause(cause.clone()));

        let split: Result<Boom, Failure<Never>> = fatal.split_checked();
        match split {
            Err(Failure::Fatal(f)) => assert!(Arc::ptr_eq(f.cause(), &cause)),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_nested_carrier_records_message_and_source() {
        let carrier = Unchecked::nested(Boom(4));
        assert_eq!(carrier.to_string(), "boom 4");
        assert_eq!(carrier.downcast_ref::<Boom>(), Some(&Boom(4)));
        assert!(carrier.source().is_some());
    }

    #[test]
    fn test_widen_preserves_unchecked() {
        let failure: Failure<Never> = Failure::raise(Boom(5));
        let widened: Failure<Boom> = failure.widen();
        assert!(!widened.is_checked());
        assert_eq!(
            widened.as_unchecked().and_then(|u| u.downcast_ref::<Boom>()),
            Some(&Boom(5))
        );
    }

    #[test]
    fn test_contract_violation_message() {
        let v = ContractViolation::MissingReplacement {
            kind: "Boom".to_string(),
            message: "boom 9".to_string(),
        };
        assert_eq!(
            v.to_string(),
            "recover mapper returned no replacement for Boom: boom 9"
        );
    }
}
