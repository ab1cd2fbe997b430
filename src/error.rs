//! Error types for scheduling.

use crate::ilp::SolverStatus;
use thiserror::Error;

/// Errors produced while building, solving, or reporting a schedule.
///
/// Every variant carries enough context (entity, field, constraint or metric)
/// to be shown to an end user as-is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    /// Malformed input entity data.
    #[error(
        "invalid {}{}: {} {}",
        .entity,
        .id.map(|i| format!(" {i}")).unwrap_or_default(),
        .field,
        .reason
    )]
    InvalidInput {
        /// Entity kind, e.g. `"student"`.
        entity: &'static str,
        /// Display id of the offending entity, when one applies.
        id: Option<u32>,
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The solver could not certify an optimum.
    #[error("solver stopped with status {status:?}: {detail}")]
    Solver {
        /// Final solver status.
        status: SolverStatus,
        /// Human-readable detail.
        detail: String,
    },

    /// A utilization ratio was requested against a zero denominator.
    #[error("cannot compute {metric}: denominator is zero")]
    DivisionByZero {
        /// Name of the metric.
        metric: &'static str,
    },

    /// A solver returned values violating a scheduling invariant.
    #[error("assignment violates {invariant}: {detail}")]
    InvariantViolated {
        /// Violated invariant.
        invariant: &'static str,
        /// Where it was violated.
        detail: String,
    },
}

impl ScheduleError {
    pub(crate) fn invalid(
        entity: &'static str,
        id: Option<u32>,
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        ScheduleError::InvalidInput {
            entity,
            id,
            field,
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ScheduleError>;
