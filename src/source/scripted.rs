use anyhow::Result;

use crate::event::{SourceTag, Timestamp};
use crate::event_log::Run;
use crate::source::EventSource;

/// Idle time inserted between replayed passes
const PASS_GAP_NS: u64 = 1_000_000_000;

/// One chunk of a script, at an offset from the start of the pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedEvent {
    pub offset_ns: u64,
    pub source: SourceTag,
    pub bytes: Vec<u8>,
}

/// Replays the same chunks on every pass
///
/// Each pass can be stretched by a factor (cycled through `stretch`) to
/// simulate run-to-run jitter. Warm-up passes consume factors as well.
///
/// # Example
/// ```
/// use bootline::event::SourceTag;
/// use bootline::event_log::Run;
/// use bootline::source::{EventSource, ScriptedSource};
///
/// let mut source = ScriptedSource::new()
///     .event(0, SourceTag::Trace, "launch")
///     .event(1_000, SourceTag::Appliance, "hello\n")
///     .event(5_000, SourceTag::Close, "close callback");
///
/// let mut run = Run::new(0);
/// source.run(&mut run)?;
/// assert_eq!(run.elapsed_ns(), Some(5_000));
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    script: Vec<ScriptedEvent>,
    stretch: Vec<f64>,
    passes: usize,
    base_ns: u64,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk delivered `offset_ns` after the start of each pass
    pub fn event(mut self, offset_ns: u64, source: SourceTag, bytes: impl AsRef<[u8]>) -> Self {
        self.script.push(ScriptedEvent {
            offset_ns,
            source,
            bytes: bytes.as_ref().to_vec(),
        });
        self
    }

    /// Per-pass factors applied to every offset
    pub fn with_stretch(mut self, stretch: Vec<f64>) -> Self {
        self.stretch = stretch;
        self
    }

    /// Passes replayed so far
    pub fn passes(&self) -> usize {
        self.passes
    }
}

impl EventSource for ScriptedSource {
    fn run(&mut self, run: &mut Run) -> Result<()> {
        let factor = if self.stretch.is_empty() {
            1.0
        } else {
            self.stretch[self.passes % self.stretch.len()]
        };

        let mut last = self.base_ns;
        for event in &self.script {
            let at = self.base_ns + (event.offset_ns as f64 * factor).round() as u64;
            run.record(event.source, Timestamp::from_nanos(at), &event.bytes);
            last = last.max(at);
        }

        self.passes += 1;
        self.base_ns = last + PASS_GAP_NS;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passes_get_later_timestamps() {
        let mut source = ScriptedSource::new()
            .event(0, SourceTag::Trace, "launch")
            .event(100, SourceTag::Close, "close callback");

        let mut first = Run::new(0);
        let mut second = Run::new(1);
        source.run(&mut first).unwrap();
        source.run(&mut second).unwrap();

        assert!(second.start().unwrap() > first.end().unwrap());
        assert_eq!(first.elapsed_ns(), second.elapsed_ns());
        assert_eq!(source.passes(), 2);
    }

    #[test]
    fn test_stretch_cycles() {
        let mut source = ScriptedSource::new()
            .event(0, SourceTag::Trace, "launch")
            .event(1_000, SourceTag::Close, "close callback")
            .with_stretch(vec![1.0, 1.5]);

        let elapsed: Vec<u64> = (0..3)
            .map(|pass| {
                let mut run = Run::new(pass);
                source.run(&mut run).unwrap();
                run.elapsed_ns().unwrap()
            })
            .collect();
        assert_eq!(elapsed, vec![1_000, 1_500, 1_000]);
    }
}
