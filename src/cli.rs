//! CLI argument parsing for bootline

use clap::Parser;
use std::path::PathBuf;

use crate::config::{AnalysisConfig, DEFAULT_RUNS, DEFAULT_WARMUP_RUNS, DEFAULT_WARNING_THRESHOLD};

#[derive(Parser, Debug)]
#[command(name = "bootline")]
#[command(version)]
#[command(about = "Trace a boot sequence over several passes and show which phases take the most time", long_about = None)]
pub struct Cli {
    /// Number of measured passes
    #[arg(long = "runs", value_name = "N", default_value_t = DEFAULT_RUNS)]
    pub runs: usize,

    /// Number of cache warm-up passes before measuring
    #[arg(long = "warmup", value_name = "N", default_value_t = DEFAULT_WARMUP_RUNS)]
    pub warmup: usize,

    /// Highlight activities taking more than PCT percent of the run
    #[arg(long = "threshold", value_name = "PCT", default_value_t = DEFAULT_WARNING_THRESHOLD)]
    pub threshold: f64,

    /// Output colours, even if not a terminal
    #[arg(long = "colour", visible_alias = "color")]
    pub colour: bool,

    /// Activity rules (TOML); defaults to the built-in appliance rules
    #[arg(long = "activities", value_name = "FILE")]
    pub activities: Option<PathBuf>,

    /// Dump every collected event and the raw statistics
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable debug tracing output on stderr
    #[arg(long = "debug")]
    pub debug: bool,

    /// Command to measure (everything after --)
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

impl Cli {
    /// Analysis configuration selected by the flags
    pub fn config(&self) -> AnalysisConfig {
        AnalysisConfig {
            runs: self.runs,
            warmup_runs: self.warmup,
            warning_threshold: self.threshold,
            force_colour: self.colour,
            verbose: self.verbose,
            ..AnalysisConfig::default()
        }
    }
}
