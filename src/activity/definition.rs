/// Behavioural flags of an activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityFlags {
    /// Expected to take a large share of the run; never highlighted
    pub long: bool,

    /// May be absent from some passes; dropped instead of failing analysis
    pub optional: bool,
}

impl ActivityFlags {
    pub const NONE: Self = Self {
        long: false,
        optional: false,
    };

    pub const LONG: Self = Self {
        long: true,
        optional: false,
    };
}

/// A named phase with its per-pass boundary events
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    name: String,
    flags: ActivityFlags,
    /// Per pass: (start event index, end event index)
    bounds: Vec<Option<(usize, usize)>>,
}

impl Activity {
    pub(crate) fn new(name: &str, flags: ActivityFlags) -> Self {
        Self {
            name: name.to_string(),
            flags,
            bounds: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flags(&self) -> ActivityFlags {
        self.flags
    }

    /// Record the start and end event indices for `pass`
    pub fn mark(&mut self, pass: usize, start_event: usize, end_event: usize) {
        if pass >= self.bounds.len() {
            self.bounds.resize(pass + 1, None);
        }
        self.bounds[pass] = Some((start_event, end_event));
    }

    /// Start and end event indices for `pass`, if marked
    pub fn bounds(&self, pass: usize) -> Option<(usize, usize)> {
        self.bounds.get(pass).copied().flatten()
    }

    pub fn has_data(&self, pass: usize) -> bool {
        self.bounds(pass).is_some()
    }

    /// True if every pass in `0..runs` has boundaries
    pub fn is_complete(&self, runs: usize) -> bool {
        (0..runs).all(|pass| self.has_data(pass))
    }
}
