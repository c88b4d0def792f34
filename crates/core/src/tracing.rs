//! # Compile-Time Tracing
//!
//! Compile-time configurable tracing of invocations using const generics.
//!
//! - `Traced<C, false>`: forwards to the inner callable without timing or
//!   recording anything. The wrapper still carries its unused name, hook slot
//!   and empty trace.
//! - `Traced<C, true>`: times every invocation, notifies the hook (if any)
//!   and appends an [`InvocationRecord`] to the wrapper's [`Trace`].
//!
//! Records accumulate until drained with [`Traced::take_trace`]. Long-lived
//! traced callables should drain periodically.
//!
//! The output of a traced callable is the output of the inner one, so a
//! traced callable composes like any other. Records serialize with serde:
//!
//! ```rust
//! use fallible_core::{Callable, Outcome, TracedExt};
//!
//! let double = (|x: i32| -> Outcome<i32> { Ok(x * 2) }).traced("double");
//! double.invoke((21,)).unwrap();
//!
//! let json = double.trace().to_json().unwrap();
//! assert!(json.contains("\"name\":\"double\""));
//! ```

use std::fmt::Display;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::callable::{Callable, Inputs};
use crate::error::{Failure, Outcome};
use crate::hooks::InvocationHook;

// ============================================================================
// Records
// ============================================================================

/// How a traced invocation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TraceOutcome {
    Success,
    Checked { kind: String, message: String },
    Unchecked { kind: String, message: String },
    Fatal { message: String },
}

impl TraceOutcome {
    /// Classify the result of an invocation.
    pub fn of<T, E: Display>(result: &Outcome<T, E>) -> Self {
        match result {
            Ok(_) => TraceOutcome::Success,
            Err(failure @ Failure::Checked(_)) => TraceOutcome::Checked {
                kind: failure.kind().to_string(),
                message: failure.to_string(),
            },
            Err(failure @ Failure::Unchecked(_)) => TraceOutcome::Unchecked {
                kind: failure.kind().to_string(),
                message: failure.to_string(),
            },
            Err(failure @ Failure::Fatal(_)) => TraceOutcome::Fatal {
                message: failure.to_string(),
            },
        }
    }

    pub fn is_failure(&self) -> bool {
        !matches!(self, TraceOutcome::Success)
    }
}

/// A single traced invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRecord {
    /// Name given to the traced callable
    pub name: String,
    /// Number of inputs
    pub arity: usize,
    /// Wall-clock duration in microseconds
    pub duration_us: u64,
    pub outcome: TraceOutcome,
}

/// Records collected by a traced callable, in invocation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    pub records: Vec<InvocationRecord>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn failure_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome.is_failure())
            .count()
    }

    pub fn summary(&self) -> TraceSummary {
        TraceSummary::from(self)
    }

    /// Export as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Export as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Summary statistics for a trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSummary {
    /// Total invocations
    pub total: usize,
    pub successes: usize,
    pub checked_failures: usize,
    pub unchecked_failures: usize,
    pub fatal_failures: usize,
    /// Sum of all durations
    pub total_duration_us: u64,
    /// Success rate
    pub success_rate: f64,
}

impl From<&Trace> for TraceSummary {
    fn from(trace: &Trace) -> Self {
        let count = |pred: fn(&TraceOutcome) -> bool| {
            trace.records.iter().filter(|r| pred(&r.outcome)).count()
        };

        let total = trace.records.len();
        let successes = count(|o| matches!(o, TraceOutcome::Success));
        let success_rate = if total > 0 {
            successes as f64 / total as f64
        } else {
            1.0
        };

        Self {
            total,
            successes,
            checked_failures: count(|o| matches!(o, TraceOutcome::Checked { .. })),
            unchecked_failures: count(|o| matches!(o, TraceOutcome::Unchecked { .. })),
            fatal_failures: count(|o| matches!(o, TraceOutcome::Fatal { .. })),
            total_duration_us: trace.records.iter().map(|r| r.duration_us).sum(),
            success_rate,
        }
    }
}

// ============================================================================
// Traced wrapper
// ============================================================================

/// A traced wrapper around a callable.
///
/// The const generic `ENABLED` determines whether tracing is active:
/// - `Traced<C, false>`: Plain forwarding, nothing recorded
/// - `Traced<C, true>`: Full tracing with timing
pub struct Traced<C, const ENABLED: bool> {
    inner: C,
    name: String,
    hook: Option<Arc<dyn InvocationHook>>,
    trace: Mutex<Trace>,
}

impl<C, const ENABLED: bool> Traced<C, ENABLED> {
    /// Create a new traced wrapper.
    pub fn new(inner: C, name: impl Into<String>) -> Self {
        Self {
            inner,
            name: name.into(),
            hook: None,
            trace: Mutex::new(Trace::new()),
        }
    }

    /// Notify `hook` of every invocation.
    pub fn with_hook(mut self, hook: Arc<dyn InvocationHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get a reference to the inner callable.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Unwrap and return the inner callable.
    pub fn into_inner(self) -> C {
        self.inner
    }

    /// Snapshot of the records collected so far.
    pub fn trace(&self) -> Trace {
        self.trace
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return the records collected so far.
    pub fn take_trace(&self) -> Trace {
        std::mem::take(&mut *self.trace.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

// ============================================================================
// Tracing Disabled: Plain Forwarding
// ============================================================================

impl<C, Args> Callable<Args> for Traced<C, false>
where
    Args: Inputs,
    C: Callable<Args>,
{
    type Output = C::Output;
    type Error = C::Error;

    fn invoke(&self, args: Args) -> Outcome<C::Output, C::Error> {
        self.inner.invoke(args)
    }
}

// ============================================================================
// Tracing Enabled: Full Timing
// ============================================================================

impl<C, Args> Callable<Args> for Traced<C, true>
where
    Args: Inputs,
    C: Callable<Args>,
    C::Error: Display,
{
    type Output = C::Output;
    type Error = C::Error;

    fn invoke(&self, args: Args) -> Outcome<C::Output, C::Error> {
        if let Some(hook) = &self.hook {
            hook.on_invoke_start(&self.name, Args::ARITY);
        }

        let start = Instant::now();
        let result = self.inner.invoke(args);
        let record = InvocationRecord {
            name: self.name.clone(),
            arity: Args::ARITY,
            duration_us: start.elapsed().as_micros() as u64,
            outcome: TraceOutcome::of(&result),
        };

        if let Some(hook) = &self.hook {
            if let Err(failure) = &result {
                hook.on_failure(&self.name, failure.kind(), &failure.to_string());
            }
            hook.on_invoke_end(&record);
        }

        self.trace
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .push(record);
        result
    }
}

// ============================================================================
// Compile-Time Selection
// ============================================================================

/// Type alias for traced callables in debug builds.
/// In debug: full tracing. In release: plain forwarding.
#[cfg(debug_assertions)]
pub type AutoTraced<C> = Traced<C, true>;

/// Type alias for traced callables in release builds.
/// In debug: full tracing. In release: plain forwarding.
#[cfg(not(debug_assertions))]
pub type AutoTraced<C> = Traced<C, false>;

/// Extension trait for wrapping callables with optional tracing.
pub trait TracedExt<Args: Inputs>: Callable<Args> + Sized {
    /// Wrap this callable with tracing enabled.
    fn traced(self, name: impl Into<String>) -> Traced<Self, true> {
        Traced::new(self, name)
    }

    /// Wrap with tracing enabled and report every event to `hook`.
    fn traced_with_hook(
        self,
        name: impl Into<String>,
        hook: Arc<dyn InvocationHook>,
    ) -> Traced<Self, true> {
        Traced::new(self, name).with_hook(hook)
    }

    /// Wrap this callable with tracing disabled.
    fn untraced(self) -> Traced<Self, false> {
        Traced::new(self, "")
    }

    /// Wrap with auto-selected tracing (debug = on, release = off).
    fn auto_traced(self, name: impl Into<String>) -> AutoTraced<Self> {
        Traced::new(self, name)
    }
}

impl<C, Args> TracedExt<Args> for C
where
    Args: Inputs,
    C: Callable<Args>,
{
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Never;
    use crate::hooks::RecordingHook;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("too big: {0}")]
    struct TooBig(u8);

    fn increment(x: u8) -> Outcome<u8, TooBig> {
        x.checked_add(1).ok_or(Failure::Checked(TooBig(x)))
    }

    #[test]
    fn test_traced_disabled_same_output() {
        let traced = increment.untraced();
        assert_eq!(traced.invoke((5,)).unwrap(), 6);
        assert!(traced.trace().is_empty());
    }

    #[test]
    fn test_traced_enabled_records_outcomes() {
        let traced = increment.traced("increment");

        assert_eq!(traced.invoke((5,)).unwrap(), 6);
        assert!(traced.invoke((255,)).is_err());

        let trace = traced.trace();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace.records[0].outcome, TraceOutcome::Success);
        assert_eq!(trace.records[0].arity, 1);
        match &trace.records[1].outcome {
            TraceOutcome::Checked { kind, message } => {
                assert!(kind.ends_with("TooBig"));
                assert_eq!(message, "too big: 255");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_hook_receives_records() {
        let hook = Arc::new(RecordingHook::new());
        let traced = increment.traced_with_hook("inc", hook.clone());

        traced.invoke((1,)).unwrap();
        traced.invoke((2,)).unwrap();

        let records = hook.records();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.name == "inc"));
    }

    #[test]
    fn test_summary_counts() {
        let fatal = |_: u8| -> Outcome<u8, Never> { Err(Failure::fatal(TooBig(0))) };
        let traced = fatal.traced("fatal");
        let _ = traced.invoke((0,));

        let summary = traced.trace().summary();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.fatal_failures, 1);
        assert_eq!(summary.success_rate, 0.0);
    }

    #[test]
    fn test_trace_json_roundtrip() {
        let traced = increment.traced("increment");
        traced.invoke((255,)).unwrap_err();

        let json = traced.trace().to_json().unwrap();
        assert!(json.contains("\"status\":\"checked\""));

        let back: Trace = serde_json::from_str(&json).unwrap();
        assert_eq!(back, traced.trace());
    }

    #[test]
    fn test_take_trace_drains_records() {
        let traced = increment.traced("increment");
        for x in 0..100 {
            traced.invoke((x,)).unwrap();
        }

        let drained = traced.take_trace();
        assert_eq!(drained.len(), 100);
        assert!(traced.trace().is_empty());

        traced.invoke((1,)).unwrap();
        assert_eq!(traced.take_trace().len(), 1);
        assert!(traced.take_trace().is_empty());
    }

    #[test]
    fn test_traced_wrapper_accessors() {
        let traced = increment.traced("increment");
        assert_eq!(traced.name(), "increment");
        assert_eq!(traced.inner().invoke((1,)).unwrap(), 2);

        let inner = traced.into_inner();
        assert_eq!(inner.invoke((2,)).unwrap(), 3);
    }
}
