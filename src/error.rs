//! Fatal error conditions for timeline analysis
//!
//! Every variant terminates the analysis. A measurement is only meaningful
//! when all passes were captured under comparable conditions, so nothing
//! here is retried or downgraded.

use thiserror::Error;

/// Errors raised by the event log, activity registry and analysis stages
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimelineError {
    #[error("internal error: activity '{0}' registered twice")]
    DuplicateActivity(String),

    #[error("internal error: could not find activity '{0}'")]
    UnknownActivity(String),

    #[error("pass {pass}: no events were recorded")]
    EmptyRun { pass: usize },

    #[error("pass {pass}: run never reached its terminal event")]
    RunNotClosed { pass: usize },

    #[error("pass {pass}: elapsed time {elapsed_ns} ns is below the {floor_ns} ns floor")]
    ElapsedTooShort {
        pass: usize,
        elapsed_ns: u64,
        floor_ns: u64,
    },

    #[error("pass {pass}: event #{index} goes back in time")]
    NonMonotonic { pass: usize, index: usize },

    #[error("pass {pass}: event #{index} has a malformed message")]
    MalformedMessage { pass: usize, index: usize },

    #[error("activity '{name}' has no start/end events in pass {pass}")]
    IncompleteActivity { name: String, pass: usize },

    #[error("invalid activity rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, TimelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = TimelineError::UnknownActivity("kernel".to_string());
        assert_eq!(
            err.to_string(),
            "internal error: could not find activity 'kernel'"
        );

        let err = TimelineError::NonMonotonic { pass: 2, index: 17 };
        assert_eq!(err.to_string(), "pass 2: event #17 goes back in time");
    }
}
