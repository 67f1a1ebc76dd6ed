//! Analysis context: the state shared by every stage
//!
//! Holds the configuration, the event logs of all measured passes and the
//! activity registry. Stages receive it by reference; there is no global
//! state. Lifecycle: populate across all passes, validate, synthesize,
//! render, drop.

use crate::activity::{self, ActivityRegistry, ActivityRules};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::event_log::Run;

#[derive(Debug, Clone)]
pub struct AnalysisContext {
    config: AnalysisConfig,
    runs: Vec<Run>,
    registry: ActivityRegistry,
}

impl AnalysisContext {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            runs: Vec::with_capacity(config.runs),
            config,
            registry: ActivityRegistry::new(),
        }
    }

    /// A fresh event log for the next measured pass
    pub fn new_run(&self) -> Run {
        Run::with_fragmentation_window(self.runs.len(), self.config.fragmentation_window_ns)
    }

    /// Store a finished pass and mark its activity boundaries
    pub fn add_run(&mut self, rules: &ActivityRules, run: Run) -> Result<()> {
        activity::instrument(rules, &run, &mut self.registry)?;
        self.runs.push(run);
        Ok(())
    }

    /// True once all configured passes have been stored
    pub fn is_complete(&self) -> bool {
        self.runs.len() >= self.config.runs
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn registry(&self) -> &ActivityRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ActivityRegistry {
        &mut self.registry
    }
}
