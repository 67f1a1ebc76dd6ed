//! Timestamped, source-tagged events
//!
//! Timestamps are nanoseconds since a [`Clock`] origin. All passes of one
//! analysis share the same clock, but only differences within a pass are
//! ever compared.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Monotonic point in time, nanoseconds since the clock origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_nanos(ns: u64) -> Self {
        Self(ns)
    }

    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Nanoseconds from `earlier` to `self`, negative if `self` is earlier
    pub fn signed_since(self, earlier: Timestamp) -> i64 {
        self.0 as i64 - earlier.0 as i64
    }

    /// Nanoseconds from `earlier` to `self`, zero if `self` is earlier
    pub fn saturating_since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

/// Source of timestamps for live event sources
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    origin: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn now(&self) -> Timestamp {
        Timestamp(self.origin.elapsed().as_nanos() as u64)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Which channel produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    /// Call trace markers (the arming milestone is one of these)
    Trace,
    /// Output of the measured appliance: firmware, kernel, init
    Appliance,
    /// Debug messages from the launching library
    Library,
    /// The measured subsystem finished launching
    LaunchDone,
    /// The measured subprocess exited
    SubprocessQuit,
    /// Teardown; the designated terminal event of a pass
    Close,
}

impl SourceTag {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceTag::Trace => "trace",
            SourceTag::Appliance => "appliance",
            SourceTag::Library => "library",
            SourceTag::LaunchDone => "launch_done",
            SourceTag::SubprocessQuit => "subprocess_quit",
            SourceTag::Close => "close",
        }
    }

    /// True for output streams, whose lines may arrive in fragments
    ///
    /// Milestones (trace markers and lifecycle callbacks) are always
    /// delivered as complete messages.
    pub fn is_stream(self) -> bool {
        matches!(self, SourceTag::Appliance | SourceTag::Library)
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single line of output captured during a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub timestamp: Timestamp,
    pub source: SourceTag,
    pub message: String,
}

impl Event {
    /// True if the message satisfies the event log contract
    pub fn is_well_formed(&self) -> bool {
        !self.message.contains('\n') && !self.message.ends_with('\r')
    }
}

/// Render a message with non-printable characters as `\xNN`
pub fn escape_message(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    for c in message.chars() {
        if c.is_control() {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("\\x{:02x}", byte));
            }
        } else {
            out.push(c);
        }
    }
    out
}
