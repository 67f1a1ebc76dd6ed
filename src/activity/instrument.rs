use crate::activity::{ActivityFlags, ActivityRegistry, ActivityRules};
use crate::error::Result;
use crate::event_log::Run;
use tracing::{debug, trace};

/// Activity spanning each whole pass; percentages are relative to it
pub const WHOLE_RUN_ACTIVITY: &str = "run";

/// Mark activity boundaries found in a finished pass
///
/// The whole-run activity covers the first to the last event. Every rule
/// is then applied to every event: a start match whose end is found marks
/// the activity named by the rule, registering it on first sight. When an
/// activity already has boundaries for this pass, later matches are
/// ignored, so the first occurrence wins.
pub fn instrument(rules: &ActivityRules, run: &Run, registry: &mut ActivityRegistry) -> Result<()> {
    let pass = run.pass();
    let events = run.events();
    if events.is_empty() {
        return Ok(());
    }

    if !registry.exists(WHOLE_RUN_ACTIVITY) {
        registry.register(WHOLE_RUN_ACTIVITY, ActivityFlags::LONG)?;
    }
    registry
        .lookup_mut(WHOLE_RUN_ACTIVITY)?
        .mark(pass, 0, events.len() - 1);

    for rule in rules.rules() {
        for (i, event) in events.iter().enumerate() {
            let Some(caps) = rule.match_start(event) else {
                continue;
            };

            let name = rule.name_for(&caps);
            if registry.exists(&name) && !registry.exists_with_no_data(&name, pass) {
                continue;
            }

            let Some(end) = rule.find_end(events, i, &caps) else {
                trace!(pass, activity = %name, start = i, "no end event, ignoring start");
                continue;
            };

            if !registry.exists(&name) {
                registry.register(&name, rule.flags())?;
            }
            registry.lookup_mut(&name)?.mark(pass, i, end);
            trace!(pass, activity = %name, start = i, end, "marked");
        }
    }

    debug!(pass, activities = registry.len(), "instrumented pass");
    Ok(())
}

/// Drop optional activities missing from any of the `runs` passes
pub fn prune_optional(registry: &mut ActivityRegistry, runs: usize) {
    registry.retain(|activity| {
        let keep = !activity.flags().optional || activity.is_complete(runs);
        if !keep {
            debug!(activity = activity.name(), "optional activity missing from some pass, dropped");
        }
        keep
    });
}
