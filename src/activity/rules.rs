use crate::activity::{ActivityFlags, WHOLE_RUN_ACTIVITY};
use crate::error::{Result, TimelineError};
use crate::event::{Event, SourceTag};
use anyhow::Context;
use regex::{Captures, Regex};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Rules for the appliance boot sequence, compiled into the binary
const DEFAULT_TOML: &str = include_str!("../../activities-default.toml");

/// `${N}` placeholder in activity names and end patterns
fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\$\{(\d+)\}").expect("placeholder pattern is valid"))
}

/// How one activity is recognized in an event log, as written in TOML
///
/// # Example TOML
/// ```toml
/// [[activity]]
/// name = "initcall ${1}"
/// start = "calling  ([_A-Za-z0-9]+)\\+"
/// end = "initcall ${1}\\+.* returned"
/// source = "appliance"
/// optional = true
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuleDefinition {
    /// Activity name; `${N}` expands to capture group N of `start`
    pub name: String,

    /// Pattern matched against event messages to find the start event
    pub start: String,

    /// Pattern for the end event, searched after the start event; `${N}`
    /// expands to the (escaped) capture group N of `start`. Without it the
    /// activity ends at the event following the start event.
    #[serde(default)]
    pub end: Option<String>,

    /// Only events from this source can start the activity
    #[serde(default)]
    pub source: Option<SourceTag>,

    /// Exempt from the time-share warning
    #[serde(default)]
    pub long: bool,

    /// Drop the activity if some pass lacks it, instead of failing
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone)]
enum EndPattern {
    Fixed(Regex),
    Template(String),
    NextEvent,
}

/// A compiled [`RuleDefinition`]
#[derive(Debug, Clone)]
pub struct ActivityRule {
    definition: RuleDefinition,
    start: Regex,
    end: EndPattern,
}

impl ActivityRule {
    pub fn compile(definition: RuleDefinition) -> Result<Self> {
        let invalid = |reason: String| TimelineError::InvalidRule {
            rule: definition.name.clone(),
            reason,
        };

        if definition.name == WHOLE_RUN_ACTIVITY {
            return Err(invalid(format!(
                "'{}' is reserved for the whole-run activity",
                WHOLE_RUN_ACTIVITY
            )));
        }

        let start = Regex::new(&definition.start).map_err(|e| invalid(e.to_string()))?;

        let groups = start.captures_len() - 1;
        let templates = std::iter::once(definition.name.as_str()).chain(definition.end.as_deref());
        for template in templates {
            for caps in placeholder().captures_iter(template) {
                let group: usize = caps[1].parse().unwrap_or(usize::MAX);
                if group == 0 || group > groups {
                    return Err(invalid(format!(
                        "placeholder ${{{}}} but start pattern has {} capture group(s)",
                        &caps[1], groups
                    )));
                }
            }
        }

        let end = match &definition.end {
            None => EndPattern::NextEvent,
            Some(end) if placeholder().is_match(end) => {
                // Check the pattern compiles with placeholders filled in
                let probe = placeholder().replace_all(end, "x");
                Regex::new(&probe).map_err(|e| invalid(e.to_string()))?;
                EndPattern::Template(end.clone())
            }
            Some(end) => EndPattern::Fixed(Regex::new(end).map_err(|e| invalid(e.to_string()))?),
        };

        Ok(Self {
            definition,
            start,
            end,
        })
    }

    pub fn definition(&self) -> &RuleDefinition {
        &self.definition
    }

    pub fn flags(&self) -> ActivityFlags {
        ActivityFlags {
            long: self.definition.long,
            optional: self.definition.optional,
        }
    }

    /// Captures of the start pattern if `event` can start this activity
    pub fn match_start<'e>(&self, event: &'e Event) -> Option<Captures<'e>> {
        if self.definition.source.is_some_and(|s| s != event.source) {
            return None;
        }
        self.start.captures(&event.message)
    }

    /// Activity name for a start match
    pub fn name_for(&self, caps: &Captures<'_>) -> String {
        expand(&self.definition.name, caps, false)
    }

    /// Index of the end event for an activity started at `start_index`
    pub fn find_end(&self, events: &[Event], start_index: usize, caps: &Captures<'_>) -> Option<usize> {
        let later = start_index + 1;
        let end = match &self.end {
            EndPattern::NextEvent => return (later < events.len()).then_some(later),
            EndPattern::Fixed(end) => end.clone(),
            EndPattern::Template(template) => Regex::new(&expand(template, caps, true)).ok()?,
        };

        events
            .iter()
            .enumerate()
            .skip(later)
            .find(|(_, e)| end.is_match(&e.message))
            .map(|(i, _)| i)
    }
}

/// Replace `${N}` with capture group N, regex-escaped if `escape` is set
fn expand(template: &str, caps: &Captures<'_>, escape: bool) -> String {
    placeholder()
        .replace_all(template, |p: &Captures<'_>| {
            let text = p[1]
                .parse::<usize>()
                .ok()
                .and_then(|n| caps.get(n))
                .map_or("", |m| m.as_str());
            if escape {
                regex::escape(text)
            } else {
                text.to_string()
            }
        })
        .into_owned()
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct InfoSection {
    #[serde(default)]
    patterns: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RulesFile {
    #[serde(default)]
    info: InfoSection,
    #[serde(default)]
    activity: Vec<RuleDefinition>,
}

/// Activity rules plus the patterns picking version lines for the banner
#[derive(Debug, Clone)]
pub struct ActivityRules {
    rules: Vec<ActivityRule>,
    info_patterns: Vec<Regex>,
}

impl ActivityRules {
    /// Parse rules from TOML text
    ///
    /// # Errors
    /// [`TimelineError::InvalidRule`] for bad TOML, bad patterns, reserved
    /// names or two rules with the same literal name.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: RulesFile = toml::from_str(content).map_err(|e| TimelineError::InvalidRule {
            rule: "<file>".to_string(),
            reason: e.to_string(),
        })?;

        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(file.activity.len());
        for definition in file.activity {
            let literal = !placeholder().is_match(&definition.name);
            if literal && !seen.insert(definition.name.clone()) {
                return Err(TimelineError::InvalidRule {
                    rule: definition.name,
                    reason: "defined twice".to_string(),
                });
            }
            rules.push(ActivityRule::compile(definition)?);
        }

        let info_patterns = file
            .info
            .patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| TimelineError::InvalidRule {
                    rule: "info".to_string(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            rules,
            info_patterns,
        })
    }

    /// Load rules from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read activities file: {}", path.as_ref().display())
        })?;
        Self::from_toml_str(&content).with_context(|| {
            format!("Failed to parse activities file: {}", path.as_ref().display())
        })
    }

    /// Rules for the appliance boot sequence embedded in the binary
    pub fn default_rules() -> Result<Self> {
        Self::from_toml_str(DEFAULT_TOML)
    }

    pub fn rules(&self) -> &[ActivityRule] {
        &self.rules
    }

    /// True if `message` should be shown in the banner's appliance section
    pub fn is_info_line(&self, message: &str) -> bool {
        self.info_patterns.iter().any(|p| p.is_match(message))
    }
}
