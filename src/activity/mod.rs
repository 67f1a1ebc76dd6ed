// Activities: named phases of the startup sequence
//
// An activity is bounded, in every measured pass, by a start event and an end
// event of that pass's event log. The registry holds the process-wide set of
// activities; rules describe how boundaries are recognized in the event
// stream, and `instrument` applies the rules to each finished pass.

mod definition;
mod instrument;
mod registry;
mod rules;

pub use definition::{Activity, ActivityFlags};
pub use instrument::{instrument, prune_optional, WHOLE_RUN_ACTIVITY};
pub use registry::ActivityRegistry;
pub use rules::{ActivityRule, ActivityRules, RuleDefinition};

#[cfg(test)]
mod tests;
