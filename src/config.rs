//! Analysis configuration
//!
//! The numeric tuning knobs depend on the machine being measured, so they
//! are named constants with overrides rather than literals in the code.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TimelineError};

/// Number of measured passes retained for analysis
pub const DEFAULT_RUNS: usize = 5;

/// Passes run before measuring, to warm caches; their events are discarded
pub const DEFAULT_WARMUP_RUNS: usize = 3;

/// Activities above this share of the whole run (percent) are highlighted
pub const DEFAULT_WARNING_THRESHOLD: f64 = 1.0;

/// An unterminated line older than this is not merged with new output (10ms)
pub const DEFAULT_FRAGMENTATION_WINDOW_NS: u64 = 10_000_000;

/// Gaps between timeline instants above this get a spacer row (1ms)
pub const DEFAULT_SPACER_THRESHOLD_NS: u64 = 1_000_000;

/// A pass shorter than this cannot have measured anything (1µs)
pub const DEFAULT_MIN_ELAPSED_NS: u64 = 1_000;

/// Configuration consumed by the analysis core
///
/// # Example
/// ```
/// use bootline::config::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.warning_threshold, 1.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Measured passes (N)
    pub runs: usize,

    /// Cache warm-up passes, never measured
    pub warmup_runs: usize,

    /// Percent of the whole run above which an activity is flagged
    pub warning_threshold: f64,

    /// Maximum age of an open continuation before it is abandoned
    pub fragmentation_window_ns: u64,

    /// Minimum gap between instants that produces a spacer row
    pub spacer_threshold_ns: u64,

    /// Sanity floor for the elapsed time of every pass
    pub min_elapsed_ns: u64,

    /// Emit colours even when stdout is not a terminal
    pub force_colour: bool,

    /// Dump raw events and synthesized activities
    pub verbose: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            runs: DEFAULT_RUNS,
            warmup_runs: DEFAULT_WARMUP_RUNS,
            warning_threshold: DEFAULT_WARNING_THRESHOLD,
            fragmentation_window_ns: DEFAULT_FRAGMENTATION_WINDOW_NS,
            spacer_threshold_ns: DEFAULT_SPACER_THRESHOLD_NS,
            min_elapsed_ns: DEFAULT_MIN_ELAPSED_NS,
            force_colour: false,
            verbose: false,
        }
    }
}

impl AnalysisConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.runs == 0 {
            return Err(TimelineError::InvalidConfig(
                "runs must be >= 1, got 0".to_string(),
            ));
        }

        if !self.warning_threshold.is_finite() || self.warning_threshold < 0.0 {
            return Err(TimelineError::InvalidConfig(format!(
                "warning_threshold must be a non-negative percentage, got {}",
                self.warning_threshold
            )));
        }

        Ok(())
    }
}
