use crate::activity::{Activity, ActivityFlags};
use crate::error::{Result, TimelineError};
use std::collections::HashMap;

/// Registry of every activity seen while instrumenting the passes
///
/// Names are unique. Registering a name twice, or looking up a name that
/// was never registered, means the instrumentation and the analysis disagree
/// about the phase set; both are reported as fatal errors.
///
/// # Example
/// ```
/// use bootline::activity::{ActivityFlags, ActivityRegistry};
///
/// let mut registry = ActivityRegistry::new();
/// registry.register("kernel", ActivityFlags::NONE)?;
/// assert!(registry.exists("kernel"));
/// assert!(registry.register("kernel", ActivityFlags::NONE).is_err());
/// # Ok::<(), bootline::error::TimelineError>(())
/// ```
#[derive(Debug, Default, Clone)]
pub struct ActivityRegistry {
    /// Activities in registration order
    activities: Vec<Activity>,

    /// Fast lookup: name → position in `activities`
    by_name: HashMap<String, usize>,
}

impl ActivityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new activity
    ///
    /// # Errors
    /// [`TimelineError::DuplicateActivity`] if `name` is already registered.
    pub fn register(&mut self, name: &str, flags: ActivityFlags) -> Result<&mut Activity> {
        if self.by_name.contains_key(name) {
            return Err(TimelineError::DuplicateActivity(name.to_string()));
        }

        let index = self.activities.len();
        self.activities.push(Activity::new(name, flags));
        self.by_name.insert(name.to_string(), index);
        Ok(&mut self.activities[index])
    }

    /// Find a registered activity
    ///
    /// # Errors
    /// [`TimelineError::UnknownActivity`] if `name` was never registered.
    pub fn lookup(&self, name: &str) -> Result<&Activity> {
        self.by_name
            .get(name)
            .map(|&i| &self.activities[i])
            .ok_or_else(|| TimelineError::UnknownActivity(name.to_string()))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Result<&mut Activity> {
        match self.by_name.get(name) {
            Some(&i) => Ok(&mut self.activities[i]),
            None => Err(TimelineError::UnknownActivity(name.to_string())),
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// True if `name` is registered but has no boundaries for `pass` yet
    pub fn exists_with_no_data(&self, name: &str, pass: usize) -> bool {
        self.lookup(name).is_ok_and(|a| !a.has_data(pass))
    }

    /// Keep only the activities for which `keep` returns true
    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&Activity) -> bool,
    {
        self.activities.retain(keep);
        self.by_name = self
            .activities
            .iter()
            .enumerate()
            .map(|(i, a)| (a.name().to_string(), i))
            .collect();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Activity> {
        self.activities.iter()
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }
}
