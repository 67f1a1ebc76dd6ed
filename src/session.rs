//! A complete analysis session
//!
//! Warm up, measure every pass, then validate, synthesize and print. Passes
//! run strictly one after another; analysis starts only after the last one.

use anyhow::{Context, Result};
use std::io::Write;
use tracing::info;

use crate::activity::{prune_optional, ActivityRules};
use crate::config::AnalysisConfig;
use crate::context::AnalysisContext;
use crate::event_log::Run;
use crate::info::print_info;
use crate::render::{RenderOptions, Renderer};
use crate::source::EventSource;
use crate::synthesis::{synthesize, Timeline};
use crate::validation::validate;

pub struct Session<'a> {
    config: AnalysisConfig,
    rules: &'a ActivityRules,
    colour: bool,
}

impl<'a> Session<'a> {
    pub fn new(config: AnalysisConfig, rules: &'a ActivityRules) -> Self {
        Self {
            config,
            rules,
            colour: false,
        }
    }

    /// Emit ANSI colours in the timeline and report
    pub fn with_colour(mut self, colour: bool) -> Self {
        self.colour = colour;
        self
    }

    /// Run every pass with `source` and write the report to `out`
    ///
    /// Returns the synthesized timeline. Any error aborts the session.
    pub fn run<S, W>(self, source: &mut S, out: &mut W) -> Result<Timeline>
    where
        S: EventSource + ?Sized,
        W: Write,
    {
        self.config.validate()?;

        writeln!(out, "Warming up the cache ...")?;
        for pass in 0..self.config.warmup_runs {
            // Recorded only to keep the source's contract; thrown away
            let mut discarded = Run::new(pass);
            source
                .run(&mut discarded)
                .with_context(|| format!("warm-up pass {} failed", pass + 1))?;
        }

        writeln!(out, "Running the tests in {} passes ...", self.config.runs)?;
        let mut ctx = AnalysisContext::new(self.config.clone());
        while !ctx.is_complete() {
            let mut run = ctx.new_run();
            let pass = run.pass();
            source
                .run(&mut run)
                .with_context(|| format!("pass {} failed", pass + 1))?;

            writeln!(
                out,
                "    pass {}: {} events collected in {} ns",
                pass + 1,
                run.len(),
                run.elapsed_ns().unwrap_or(0)
            )?;
            ctx.add_run(self.rules, run)?;
        }

        if self.config.verbose {
            for run in ctx.runs() {
                run.dump(out)?;
            }
        }

        writeln!(out, "Analyzing the results ...")?;
        prune_optional(ctx.registry_mut(), self.config.runs);
        validate(&ctx)?;
        let timeline = synthesize(&ctx)?;
        info!(activities = timeline.len(), "analysis complete");

        if self.config.verbose {
            timeline.dump(out)?;
        }

        writeln!(out)?;
        print_info(out, ctx.runs().first(), self.rules)?;
        writeln!(out)?;

        let renderer = Renderer::new(
            &timeline,
            RenderOptions {
                colour: self.colour,
                spacer_threshold_ns: self.config.spacer_threshold_ns as f64,
            },
        );
        renderer.render_timeline(out)?;
        writeln!(out)?;
        writeln!(out, "Longest activities:")?;
        writeln!(out)?;
        renderer.render_ranking(out)?;

        Ok(timeline)
    }
}
