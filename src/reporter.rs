//! Reporting collaborator
//!
//! The facade never logs through a global; it reports to the [`Reporter`]
//! it was constructed with.

use crate::core::{DbError, Operation};
use std::error::Error as _;
use tracing::{debug, error, info};

pub trait Reporter: Send + Sync {
    /// About to run `sql` for `operation`. Bound values are not passed.
    fn statement(&self, operation: Operation, table: &str, sql: &str);

    fn succeeded(&self, operation: Operation, table: &str);

    fn failed(&self, operation: Operation, table: &str, error: &DbError);
}

/// Emits `tracing` events: statements at debug, outcomes at info or error.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn statement(&self, operation: Operation, table: &str, sql: &str) {
        debug!(%operation, table, sql, "executing statement");
    }

    fn succeeded(&self, operation: Operation, table: &str) {
        info!(%operation, table, "operation succeeded");
    }

    fn failed(&self, operation: Operation, table: &str, err: &DbError) {
        let cause = err.source().map(|s| s.to_string()).unwrap_or_default();
        error!(%operation, table, error = %err, cause = %cause, "operation failed");
    }
}

/// Discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn statement(&self, _operation: Operation, _table: &str, _sql: &str) {}

    fn succeeded(&self, _operation: Operation, _table: &str) {}

    fn failed(&self, _operation: Operation, _table: &str, _error: &DbError) {}
}
