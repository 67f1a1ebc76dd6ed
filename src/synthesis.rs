//! Timeline synthesis: per-activity statistics across passes
//!
//! For each activity and each pass, the start offset is the time from the
//! pass's first event to the activity's start event, and the duration is
//! the time from its start event to its end event. Across passes:
//!
//! ```text
//! start    = mean(start offsets)
//! mean     = mean(durations)
//! end      = start + mean - 1        (adjacent activities never touch)
//! variance = Σ (duration - mean)² / N (population variance)
//! sd       = √variance
//! percent  = 100 × mean / mean(run)
//! warning  = percent ≥ threshold && !long
//! ```
//!
//! All times are nanoseconds.

use std::io::{self, Write};
use tracing::debug;

use crate::activity::{ActivityFlags, WHOLE_RUN_ACTIVITY};
use crate::context::AnalysisContext;
use crate::error::{Result, TimelineError};
use crate::event::escape_message;

/// One pass's measurement of an activity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// From the pass's first event to the activity's start event
    pub start_offset_ns: f64,
    /// From the activity's start event to its end event
    pub duration_ns: f64,
}

/// Aggregated timing of an activity over all passes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityStats {
    pub start: f64,
    pub mean: f64,
    pub end: f64,
    pub variance: f64,
    pub sd: f64,
}

impl ActivityStats {
    /// Aggregate samples; `None` without samples
    pub fn from_samples(samples: &[Sample]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let n = samples.len() as f64;

        let start = samples.iter().map(|s| s.start_offset_ns).sum::<f64>() / n;
        let mean = samples.iter().map(|s| s.duration_ns).sum::<f64>() / n;
        let variance = samples
            .iter()
            .map(|s| (s.duration_ns - mean).powi(2))
            .sum::<f64>()
            / n;

        Some(Self {
            start,
            mean,
            end: start + mean - 1.0,
            variance,
            sd: variance.sqrt(),
        })
    }
}

/// A synthesized activity, ready for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineActivity {
    pub name: String,
    pub flags: ActivityFlags,
    pub stats: ActivityStats,
    /// Share of the whole run's mean duration
    pub percent: f64,
    /// Highlight in the report
    pub warning: bool,
}

impl TimelineActivity {
    pub fn start(&self) -> f64 {
        self.stats.start
    }

    pub fn end(&self) -> f64 {
        self.stats.end
    }

    pub fn mean(&self) -> f64 {
        self.stats.mean
    }
}

/// Synthesized activities, ordered by start offset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    activities: Vec<TimelineActivity>,
}

impl Timeline {
    /// Build a timeline, sorting activities by ascending start offset
    ///
    /// The sort is stable and uses a total order on the offsets, so
    /// activities with equal start offsets keep their input order.
    pub fn new(mut activities: Vec<TimelineActivity>) -> Self {
        activities.sort_by(|a, b| a.start().total_cmp(&b.start()));
        Self { activities }
    }

    pub fn activities(&self) -> &[TimelineActivity] {
        &self.activities
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// Activities ordered by descending mean duration
    pub fn by_duration(&self) -> Vec<&TimelineActivity> {
        let mut longest: Vec<&TimelineActivity> = self.activities.iter().collect();
        longest.sort_by(|a, b| b.mean().total_cmp(&a.mean()));
        longest
    }

    /// Write every activity's raw statistics, for verbose output
    pub fn dump<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for (i, activity) in self.activities.iter().enumerate() {
            let stats = &activity.stats;
            writeln!(out, "activity {}:", i)?;
            writeln!(out, "    name = {}", escape_message(&activity.name))?;
            writeln!(out, "    start - end = {:.1} - {:.1}", stats.start, stats.end)?;
            writeln!(out, "    mean elapsed = {:.1}", stats.mean)?;
            writeln!(out, "    variance = {:.1}", stats.variance)?;
            writeln!(out, "    s.d = {:.1}", stats.sd)?;
            writeln!(out, "    percent = {:.1}", activity.percent)?;
        }
        Ok(())
    }
}

/// Compute statistics for every registered activity over every pass
///
/// Expects a validated context: every activity has in-range boundaries in
/// every pass and the whole-run activity exists.
pub fn synthesize(ctx: &AnalysisContext) -> Result<Timeline> {
    let runs = ctx.runs();
    let registry = ctx.registry();

    let mut synthesized = Vec::with_capacity(registry.len());
    for activity in registry.iter() {
        let mut samples = Vec::with_capacity(runs.len());
        for (pass, run) in runs.iter().enumerate() {
            let incomplete = || TimelineError::IncompleteActivity {
                name: activity.name().to_string(),
                pass,
            };
            let (start, end) = activity.bounds(pass).ok_or_else(incomplete)?;
            let events = run.events();
            let first = events.first().ok_or(TimelineError::EmptyRun { pass })?;
            let start_event = events.get(start).ok_or_else(incomplete)?;
            let end_event = events.get(end).ok_or_else(incomplete)?;

            samples.push(Sample {
                start_offset_ns: start_event.timestamp.signed_since(first.timestamp) as f64,
                duration_ns: end_event.timestamp.signed_since(start_event.timestamp) as f64,
            });
        }

        let stats = ActivityStats::from_samples(&samples)
            .ok_or_else(|| TimelineError::InvalidConfig("no measured passes".to_string()))?;
        synthesized.push((activity.name(), activity.flags(), stats));
    }

    let total = synthesized
        .iter()
        .find(|(name, _, _)| *name == WHOLE_RUN_ACTIVITY)
        .map(|(_, _, stats)| stats.mean)
        .ok_or_else(|| TimelineError::UnknownActivity(WHOLE_RUN_ACTIVITY.to_string()))?;

    let threshold = ctx.config().warning_threshold;
    let activities = synthesized
        .into_iter()
        .map(|(name, flags, stats)| {
            let percent = 100.0 * stats.mean / total;
            TimelineActivity {
                name: name.to_string(),
                flags,
                stats,
                percent,
                warning: !flags.long && percent >= threshold,
            }
        })
        .collect();

    let timeline = Timeline::new(activities);
    debug!(activities = timeline.len(), total_ns = total, "synthesized timeline");
    Ok(timeline)
}
