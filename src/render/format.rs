use anstream::{AutoStream, ColorChoice};
use anstyle::{AnsiColor, Color, Style};
use std::io::{self, Write};

use crate::config::DEFAULT_SPACER_THRESHOLD_NS;
use crate::event::escape_message;
use crate::render::{layout, Cell, Row};
use crate::synthesis::{Timeline, TimelineActivity};

/// Activities over the warning threshold (bold red)
const ALERT: Style = Style::new()
    .bold()
    .fg_color(Some(Color::Ansi(AnsiColor::Red)));

/// Activities under the threshold (green)
const NORMAL: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));

/// Instant labels (bold blue)
const TIME: Style = Style::new()
    .bold()
    .fg_color(Some(Color::Ansi(AnsiColor::Blue)));

/// Column glyphs (bold magenta)
const GLYPH: Style = Style::new()
    .bold()
    .fg_color(Some(Color::Ansi(AnsiColor::Magenta)));

/// Colour if forced, otherwise only when stdout supports it
///
/// Respects `NO_COLOR` and `CLICOLOR_FORCE` through anstream's detection.
pub fn use_colour(force: bool) -> bool {
    force || AutoStream::choice(&io::stdout()) != ColorChoice::Never
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub colour: bool,
    pub spacer_threshold_ns: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            colour: false,
            spacer_threshold_ns: DEFAULT_SPACER_THRESHOLD_NS as f64,
        }
    }
}

/// Prints the timeline diagram and the ranked report
pub struct Renderer<'a> {
    timeline: &'a Timeline,
    options: RenderOptions,
}

impl<'a> Renderer<'a> {
    pub fn new(timeline: &'a Timeline, options: RenderOptions) -> Self {
        Self { timeline, options }
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if self.options.colour {
            format!("{style}{text}{style:#}")
        } else {
            text.to_string()
        }
    }

    /// `name 1.234567s ±1.2ms (12.3%)`, coloured by the warning flag
    pub fn summary(&self, activity: &TimelineActivity) -> String {
        let style = if activity.warning { ALERT } else { NORMAL };
        format!(
            "{} {:.6}s ±{:.1}ms {}",
            self.paint(style, &escape_message(&activity.name)),
            activity.stats.mean / 1_000_000_000.0,
            activity.stats.sd / 1_000_000.0,
            self.paint(style, &format!("({:.1}%)", activity.percent)),
        )
    }

    /// Write the column diagram, one row per instant
    pub fn render_timeline<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let activities = self.timeline.activities();

        for row in layout(self.timeline, self.options.spacer_threshold_ns) {
            match row {
                Row::Spacer { next, lines } => {
                    let width = instant_label(next).chars().count();
                    let glyphs: String = lines
                        .iter()
                        .map(|&line| if line { "│ " } else { "  " })
                        .collect();
                    let line = format!("{}{}", " ".repeat(width), self.paint(GLYPH, &glyphs));
                    writeln!(out, "{}", line.trim_end())?;
                }
                Row::Instant { t, cells, starting } => {
                    let glyphs: String = cells
                        .iter()
                        .map(|cell| match cell {
                            Cell::Empty => "  ",
                            Cell::Start => "▲ ",
                            Cell::End => "▼ ",
                            Cell::Through => "│ ",
                        })
                        .collect();

                    let mut line = format!(
                        "{}{}",
                        self.paint(TIME, &instant_label(t)),
                        self.paint(GLYPH, &glyphs)
                    );
                    let summaries: Vec<String> = starting
                        .iter()
                        .map(|&i| self.summary(&activities[i]))
                        .collect();
                    line.push_str(&summaries.join(" "));
                    writeln!(out, "{}", line.trim_end())?;
                }
            }
        }
        Ok(())
    }

    /// Write every activity, longest mean duration first
    pub fn render_ranking<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for activity in self.timeline.by_duration() {
            writeln!(out, "{}", self.summary(activity))?;
        }
        Ok(())
    }
}

/// `1.234567s: `
fn instant_label(t: f64) -> String {
    format!("{:.6}s: ", t / 1_000_000_000.0)
}
