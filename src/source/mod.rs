//! Event sources: whatever drives the measured subsystem during a pass
//!
//! A source runs one complete pass and delivers every chunk of output to
//! the pass's event log with [`Run::record`](crate::event_log::Run::record).
//! It must deliver the arming milestone first (a `launch` trace marker) and
//! a [`SourceTag::Close`](crate::event::SourceTag::Close) event last.

mod command;
mod scripted;

pub use command::CommandSource;
pub use scripted::{ScriptedEvent, ScriptedSource};

use crate::event_log::Run;
use anyhow::Result;

/// Drives one pass of the measured subsystem
pub trait EventSource {
    /// Run the subsystem once, recording its events into `run`
    fn run(&mut self, run: &mut Run) -> Result<()>;
}
