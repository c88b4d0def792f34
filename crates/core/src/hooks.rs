//! Invocation hooks for observability.
//!
//! Hooks observe invocations of a [`Traced`](crate::tracing::Traced)
//! callable without changing what it computes.
//!
//! ## Events
//!
//! - `on_invoke_start`: before the wrapped callable runs
//! - `on_failure`: when it returns a failure
//! - `on_invoke_end`: after it returns, with the finished record
//!
//! ## Example
//!
//! ```ignore
//! struct PrintFailures;
//!
//! impl InvocationHook for PrintFailures {
//!     fn on_failure(&self, name: &str, kind: &str, message: &str) {
//!         println!("{} failed ({}): {}", name, kind, message);
//!     }
//! }
//! ```

use std::sync::{Mutex, PoisonError};

use crate::tracing::{InvocationRecord, TraceOutcome};

// ============================================================================
// Invocation Hook Trait
// ============================================================================

/// Trait for observing invocation events.
///
/// All methods have default no-op implementations, so you only need to
/// implement the events you care about.
pub trait InvocationHook: Send + Sync {
    /// Called before the wrapped callable runs.
    ///
    /// # Arguments
    /// * `name` - Name given to the traced callable
    /// * `arity` - Number of inputs of the invocation
    fn on_invoke_start(&self, _name: &str, _arity: usize) {}

    /// Called when the invocation produced a failure.
    ///
    /// # Arguments
    /// * `name` - Name given to the traced callable
    /// * `kind` - Failure kind, as reported by `Failure::kind`
    /// * `message` - Display text of the failure
    fn on_failure(&self, _name: &str, _kind: &str, _message: &str) {}

    /// Called after every invocation, successful or not.
    fn on_invoke_end(&self, _record: &InvocationRecord) {}
}

// ============================================================================
// Null Hook (Default)
// ============================================================================

/// A no-op hook implementation for when no observation is needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHook;

impl InvocationHook for NullHook {}

// ============================================================================
// Logging Hook
// ============================================================================

/// A hook that logs all events to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHook {
    /// Whether to include verbose details
    pub verbose: bool,
}

impl LoggingHook {
    /// Create a new logging hook.
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Create a verbose logging hook.
    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}

impl InvocationHook for LoggingHook {
    fn on_invoke_start(&self, name: &str, arity: usize) {
        if self.verbose {
            println!("[Hook] {}/{} invoked", name, arity);
        }
    }

    fn on_failure(&self, name: &str, kind: &str, message: &str) {
        println!("[Hook] {} failed ({}): {}", name, kind, message);
    }

    fn on_invoke_end(&self, record: &InvocationRecord) {
        let status = match record.outcome {
            TraceOutcome::Success => "ok",
            TraceOutcome::Checked { .. } => "checked failure",
            TraceOutcome::Unchecked { .. } => "unchecked failure",
            TraceOutcome::Fatal { .. } => "fatal",
        };
        println!(
            "[Hook] {} finished in {}us: {}",
            record.name, record.duration_us, status
        );
    }
}

// ============================================================================
// Composite Hook
// ============================================================================

/// A hook that delegates to multiple inner hooks.
pub struct CompositeHook {
    hooks: Vec<Box<dyn InvocationHook>>,
}

impl CompositeHook {
    /// Create a new composite hook.
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Add a hook to the composite.
    pub fn with<H: InvocationHook + 'static>(mut self, hook: H) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }
}

impl Default for CompositeHook {
    fn default() -> Self {
        Self::new()
    }
}

impl InvocationHook for CompositeHook {
    fn on_invoke_start(&self, name: &str, arity: usize) {
        for hook in &self.hooks {
            hook.on_invoke_start(name, arity);
        }
    }

    fn on_failure(&self, name: &str, kind: &str, message: &str) {
        for hook in &self.hooks {
            hook.on_failure(name, kind, message);
        }
    }

    fn on_invoke_end(&self, record: &InvocationRecord) {
        for hook in &self.hooks {
            hook.on_invoke_end(record);
        }
    }
}

// ============================================================================
// Recording Hook
// ============================================================================

/// A hook that keeps every finished record.
#[derive(Debug, Default)]
pub struct RecordingHook {
    records: Mutex<Vec<InvocationRecord>>,
}

impl RecordingHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records seen so far.
    pub fn records(&self) -> Vec<InvocationRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl InvocationHook for RecordingHook {
    fn on_invoke_end(&self, record: &InvocationRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
    }
}

// ============================================================================
// Tests
// ============================================================================
