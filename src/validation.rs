//! Sanity checks on the collected passes
//!
//! Run after every pass has completed and before synthesis. Any failure
//! means the measurement itself is broken, so the first violation found is
//! returned and analysis stops.

use crate::activity::WHOLE_RUN_ACTIVITY;
use crate::context::AnalysisContext;
use crate::error::{Result, TimelineError};
use crate::event_log::Run;

/// Check every pass, then every activity, of the context
pub fn validate(ctx: &AnalysisContext) -> Result<()> {
    for run in ctx.runs() {
        validate_run(run, ctx.config().min_elapsed_ns)?;
    }
    validate_activities(ctx)
}

/// Check one pass against the event log contract
pub fn validate_run(run: &Run, min_elapsed_ns: u64) -> Result<()> {
    let pass = run.pass();

    if run.is_empty() {
        return Err(TimelineError::EmptyRun { pass });
    }

    let elapsed_ns = run.elapsed_ns().ok_or(TimelineError::RunNotClosed { pass })?;
    if elapsed_ns <= min_elapsed_ns {
        return Err(TimelineError::ElapsedTooShort {
            pass,
            elapsed_ns,
            floor_ns: min_elapsed_ns,
        });
    }

    let events = run.events();
    for (index, pair) in events.windows(2).enumerate() {
        if pair[1].timestamp < pair[0].timestamp {
            return Err(TimelineError::NonMonotonic {
                pass,
                index: index + 1,
            });
        }
    }

    if let Some(index) = events.iter().position(|e| !e.is_well_formed()) {
        return Err(TimelineError::MalformedMessage { pass, index });
    }

    Ok(())
}

/// Every activity needs in-range boundaries in every pass
fn validate_activities(ctx: &AnalysisContext) -> Result<()> {
    let registry = ctx.registry();
    registry.lookup(WHOLE_RUN_ACTIVITY)?;

    for activity in registry.iter() {
        for (pass, run) in ctx.runs().iter().enumerate() {
            let in_range = activity
                .bounds(pass)
                .is_some_and(|(start, end)| start <= end && end < run.len());
            if !in_range {
                return Err(TimelineError::IncompleteActivity {
                    name: activity.name().to_string(),
                    pass,
                });
            }
        }
    }

    Ok(())
}
