//! # Fallible Core - Composable Callables That Can Fail
//!
//! This crate treats fallible functions as first-class values:
//!
//! - **Callables**: Anything invocable with a tuple of inputs, returning
//!   an [`Outcome`] (closures and fn items included)
//! - **Failures**: Checked, unchecked and fatal failure paths ([`Failure`])
//! - **Translation**: Turning declared failures into undeclared ones
//!   (`nest`, `nest_with`, `sneaky`)
//! - **Recovery**: Fallbacks, defaults and replacement selection
//!   (`or_else`, `or_return`, `recover`, ...)
//! - **Composition**: `compose`, `and_then`, `curried`, `tupled`,
//!   `reversed`, `consume`
//! - **Memoization**: Thread-safe at-most-once caching per input tuple
//! - **Tracing**: Compile-time configurable tracing with hooks
//!
//! ## Design Philosophy
//!
//! Every operator returns a new callable and leaves its operands untouched.
//! Pipelines are built as values first and invoked later:
//!
//! ```rust
//! use fallible_core::{Callable, ComposeExt, Failure, Outcome, RecoverExt, TranslateExt};
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("division by zero")]
//! struct DivideByZero;
//!
//! fn divide10(x: i32) -> Outcome<i32, DivideByZero> {
//!     if x == 0 {
//!         Err(Failure::Checked(DivideByZero))
//!     } else {
//!         Ok(10 / x)
//!     }
//! }
//!
//! let safe = divide10.or_return(-1).map(|v: i32| v * 2);
//! assert_eq!(safe.invoke((5,)).unwrap(), 4);
//! assert_eq!(safe.invoke((0,)).unwrap(), -2);
//!
//! let err = divide10.nest().invoke((0,)).unwrap_err();
//! assert_eq!(err.to_string(), "division by zero");
//! ```

pub mod callable;
pub mod compose;
pub mod error;
pub mod hooks;
pub mod memo;
pub mod recover;
pub mod tracing;
pub mod translate;

// Re-export key types at crate root for convenience
pub use callable::{
    constant, identity, of, of_total, partial, Callable, Constant, Identity, Inputs, Partial,
    Split, Total,
};
pub use compose::{
    Adapters, AndThen, BoxCallable, Compose, ComposeExt, Consume, Curry, Reverse, Reversed,
    Tupled,
};
pub use error::{Cause, ContractViolation, Failure, Fatal, Never, Outcome, Unchecked};
pub use hooks::{CompositeHook, InvocationHook, LoggingHook, NullHook, RecordingHook};
pub use memo::{MemoConfig, MemoStats, Memoize, Memoized, MemoizedSupplier};
pub use recover::{
    FallbackTo, OrElse, OrReturn, OrReturnSelf, OrReturnWith, OrThrow, Recover, RecoverExt,
};
pub use tracing::{
    AutoTraced, InvocationRecord, Trace, TraceOutcome, TraceSummary, Traced, TracedExt,
};
pub use translate::{nest_failure, sneak_failure, Nest, NestWith, Sneaky, TranslateExt};
