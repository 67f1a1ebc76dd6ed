//! Per-pass event log with line continuation merging
//!
//! Output from the measured subsystem arrives in arbitrary chunks: one
//! chunk may carry several lines, and one line may be spread over several
//! chunks. The log splits chunks into single-line events and glues the
//! fragments of an unterminated line back together, as long as they arrive
//! within the fragmentation window.
//!
//! Nothing is recorded until the arming milestone (the `launch` trace
//! marker) has been seen, so output from before the measured sequence
//! starts never skews the timeline.

use std::io::{self, Write};
use tracing::{debug, trace};

use crate::config::DEFAULT_FRAGMENTATION_WINDOW_NS;
use crate::event::{escape_message, Event, SourceTag, Timestamp};

/// Trace message marking the true start of the measured sequence
pub const ARMING_MILESTONE: &str = "launch";

/// The last event of a pass, whose line has not been terminated yet
#[derive(Debug, Clone, PartialEq, Eq)]
struct Continuation {
    /// Index of the pending event in `Run::events`
    index: usize,
    source: SourceTag,
    /// Raw bytes received so far; the message is re-derived from these so
    /// that multi-byte characters split across chunks survive intact
    raw: Vec<u8>,
}

/// Event log of one measured pass
#[derive(Debug, Clone)]
pub struct Run {
    pass: usize,
    events: Vec<Event>,
    armed: bool,
    end: Option<Timestamp>,
    continuation: Option<Continuation>,
    fragmentation_window_ns: u64,
}

impl Run {
    /// Create an empty, unarmed log for pass number `pass`
    pub fn new(pass: usize) -> Self {
        Self::with_fragmentation_window(pass, DEFAULT_FRAGMENTATION_WINDOW_NS)
    }

    pub fn with_fragmentation_window(pass: usize, fragmentation_window_ns: u64) -> Self {
        Self {
            pass,
            events: Vec::new(),
            armed: false,
            end: None,
            continuation: None,
            fragmentation_window_ns,
        }
    }

    /// Record a chunk of output delivered by an event source
    ///
    /// The chunk is split on `\n` into complete events carrying `timestamp`
    /// and `source`. A leading fragment completes the open continuation (if
    /// it is recent enough and from the same source); a trailing fragment
    /// without a terminator becomes the new open continuation. Only output
    /// streams ([`SourceTag::is_stream`]) fragment; milestone messages are
    /// stored as complete events and never merged. Trailing `\r`
    /// characters are trimmed from every stored message.
    ///
    /// A [`SourceTag::Close`] event is the terminal event and fixes the end
    /// timestamp of the pass.
    pub fn record(&mut self, source: SourceTag, timestamp: Timestamp, bytes: &[u8]) {
        if !self.armed {
            if source != SourceTag::Trace || bytes != ARMING_MILESTONE.as_bytes() {
                return;
            }
            debug!(pass = self.pass, "arming milestone seen, recording events");
            self.armed = true;
        }

        self.expire_continuation(source, timestamp);

        let mut rest = bytes;
        if let Some(open) = self.continuation.as_mut() {
            let (head, tail) = split_line(rest);
            open.raw.extend_from_slice(head);
            self.events[open.index].message = line_to_message(&open.raw);

            match tail {
                // Still not terminated, more to come
                None => return,
                Some(tail) => {
                    rest = tail;
                    self.continuation = None;
                }
            }
        }

        while !rest.is_empty() {
            let (line, tail) = split_line(rest);
            self.events.push(Event {
                timestamp,
                source,
                message: line_to_message(line),
            });

            match tail {
                None => {
                    if source.is_stream() {
                        self.continuation = Some(Continuation {
                            index: self.events.len() - 1,
                            source,
                            raw: line.to_vec(),
                        });
                    }
                    break;
                }
                Some(tail) => rest = tail,
            }
        }

        if source == SourceTag::Close {
            self.end = Some(timestamp);
        }
    }

    /// Append an event as-is, bypassing splitting and trimming
    #[cfg(test)]
    pub(crate) fn push_raw_event(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Abandon the open continuation if it cannot belong to this chunk
    fn expire_continuation(&mut self, source: SourceTag, now: Timestamp) {
        let Some(open) = &self.continuation else {
            return;
        };

        let age = now.saturating_since(self.events[open.index].timestamp);
        if open.source != source || age > self.fragmentation_window_ns {
            trace!(
                pass = self.pass,
                index = open.index,
                age_ns = age,
                "abandoning unterminated line"
            );
            self.continuation = None;
        }
    }

    pub fn pass(&self) -> usize {
        self.pass
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Index of the event still waiting for its line terminator
    pub fn open_continuation(&self) -> Option<usize> {
        self.continuation.as_ref().map(|c| c.index)
    }

    /// Timestamp of the first recorded event
    pub fn start(&self) -> Option<Timestamp> {
        self.events.first().map(|e| e.timestamp)
    }

    /// Timestamp of the terminal event, once seen
    pub fn end(&self) -> Option<Timestamp> {
        self.end
    }

    /// Time from the first recorded event to the terminal event
    pub fn elapsed_ns(&self) -> Option<u64> {
        Some(self.end?.saturating_since(self.start()?))
    }

    /// Write every event of the pass, for verbose output
    pub fn dump<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "pass {}", self.pass)?;
        writeln!(out, "    number of events collected {}", self.events.len())?;
        if let Some(elapsed) = self.elapsed_ns() {
            writeln!(out, "    elapsed time {} ns", elapsed)?;
        }
        let start = self.start().unwrap_or_default();
        for (i, event) in self.events.iter().enumerate() {
            writeln!(
                out,
                "    #{}: +{} [{}] \"{}\"",
                i,
                event.timestamp.saturating_since(start),
                event.source,
                escape_message(&event.message)
            )?;
        }
        Ok(())
    }
}

/// Split at the first `\n`: the line before it and, if found, what follows
fn split_line(bytes: &[u8]) -> (&[u8], Option<&[u8]>) {
    match bytes.iter().position(|&b| b == b'\n') {
        Some(i) => (&bytes[..i], Some(&bytes[i + 1..])),
        None => (bytes, None),
    }
}

fn line_to_message(line: &[u8]) -> String {
    let mut message = String::from_utf8_lossy(line).into_owned();
    let trimmed = message.trim_end_matches('\r').len();
    message.truncate(trimmed);
    message
}
