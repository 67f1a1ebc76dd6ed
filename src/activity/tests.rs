// Tests for the activity registry, rule parsing and instrumentation

use super::*;
use crate::error::TimelineError;
use crate::event::{SourceTag, Timestamp};
use crate::event_log::Run;
use std::io::Write;
use tempfile::NamedTempFile;

fn run_with(pass: usize, lines: &[(SourceTag, &str)]) -> Run {
    let mut run = Run::new(pass);
    run.record(SourceTag::Trace, Timestamp::from_nanos(0), b"launch");
    for (i, (source, line)) in lines.iter().enumerate() {
        let ts = Timestamp::from_nanos((i as u64 + 1) * 1_000);
        run.record(*source, ts, format!("{}\n", line).as_bytes());
    }
    run
}

#[test]
fn test_register_then_lookup() {
    let mut registry = ActivityRegistry::new();
    registry.register("kernel", ActivityFlags::LONG).unwrap();

    let activity = registry.lookup("kernel").unwrap();
    assert_eq!(activity.name(), "kernel");
    assert!(activity.flags().long);
}

#[test]
fn test_duplicate_registration_is_fatal() {
    let mut registry = ActivityRegistry::new();
    registry.register("bios", ActivityFlags::NONE).unwrap();
    assert_eq!(
        registry.register("bios", ActivityFlags::LONG).unwrap_err(),
        TimelineError::DuplicateActivity("bios".to_string())
    );
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_unknown_lookup_is_fatal() {
    let registry = ActivityRegistry::new();
    assert_eq!(
        registry.lookup("missing").unwrap_err(),
        TimelineError::UnknownActivity("missing".to_string())
    );
}

#[test]
fn test_exists_with_no_data() {
    let mut registry = ActivityRegistry::new();
    assert!(!registry.exists_with_no_data("kernel", 0));

    registry.register("kernel", ActivityFlags::NONE).unwrap();
    assert!(registry.exists_with_no_data("kernel", 0));
    assert!(registry.exists_with_no_data("kernel", 1));

    registry.lookup_mut("kernel").unwrap().mark(1, 3, 9);
    assert!(registry.exists_with_no_data("kernel", 0));
    assert!(!registry.exists_with_no_data("kernel", 1));
    assert_eq!(registry.lookup("kernel").unwrap().bounds(1), Some((3, 9)));
}

#[test]
fn test_retain_rebuilds_lookup() {
    let mut registry = ActivityRegistry::new();
    for name in ["a", "b", "c"] {
        registry.register(name, ActivityFlags::NONE).unwrap();
    }
    registry.retain(|a| a.name() != "a");

    assert!(!registry.exists("a"));
    assert_eq!(registry.lookup("c").unwrap().name(), "c");
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_default_rules_load() {
    let rules = ActivityRules::default_rules().expect("Failed to load default rules");
    assert!(rules.rules().iter().any(|r| r.definition().name == "kernel"));
    assert!(rules.is_info_line("Linux version 6.8.0 (gcc)"));
    assert!(!rules.is_info_line("random output"));
}

#[test]
fn test_reserved_name_rejected() {
    let toml = r#"
        [[activity]]
        name = "run"
        start = "x"
    "#;
    assert!(matches!(
        ActivityRules::from_toml_str(toml),
        Err(TimelineError::InvalidRule { .. })
    ));
}

#[test]
fn test_duplicate_rule_rejected() {
    let toml = r#"
        [[activity]]
        name = "boot"
        start = "a"

        [[activity]]
        name = "boot"
        start = "b"
    "#;
    let err = ActivityRules::from_toml_str(toml).unwrap_err();
    assert!(err.to_string().contains("defined twice"));
}

#[test]
fn test_bad_regex_rejected() {
    let toml = r#"
        [[activity]]
        name = "broken"
        start = "("
    "#;
    assert!(ActivityRules::from_toml_str(toml).is_err());
}

#[test]
fn test_placeholder_without_group_rejected() {
    let toml = r#"
        [[activity]]
        name = "step ${2}"
        start = "step (\\d+)"
    "#;
    let err = ActivityRules::from_toml_str(toml).unwrap_err();
    assert!(err.to_string().contains("capture group"));
}

#[test]
fn test_rules_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[[activity]]\nname = \"boot\"\nstart = \"^begin\"\nend = \"^end\"").unwrap();

    let rules = ActivityRules::from_file(file.path()).unwrap();
    assert_eq!(rules.rules().len(), 1);
}

#[test]
fn test_rules_from_missing_file() {
    let err = ActivityRules::from_file("/nonexistent/activities.toml").unwrap_err();
    assert!(err.to_string().contains("Failed to read activities file"));
}

#[test]
fn test_instrument_marks_whole_run_and_rules() {
    let rules = ActivityRules::from_toml_str(
        r#"
        [[activity]]
        name = "firmware"
        start = "^BIOS start"
        end = "^BIOS done"

        [[activity]]
        name = "handoff"
        start = "^BIOS done"
    "#,
    )
    .unwrap();

    let run = run_with(
        0,
        &[
            (SourceTag::Appliance, "noise"),
            (SourceTag::Appliance, "BIOS start"),
            (SourceTag::Appliance, "BIOS done"),
            (SourceTag::Appliance, "kernel"),
            (SourceTag::Close, "close callback"),
        ],
    );

    let mut registry = ActivityRegistry::new();
    instrument(&rules, &run, &mut registry).unwrap();

    assert_eq!(registry.lookup("run").unwrap().bounds(0), Some((0, 5)));
    assert!(registry.lookup("run").unwrap().flags().long);
    assert_eq!(registry.lookup("firmware").unwrap().bounds(0), Some((2, 3)));
    assert_eq!(registry.lookup("handoff").unwrap().bounds(0), Some((3, 4)));
}

#[test]
fn test_instrument_templated_names() {
    let rules = ActivityRules::from_toml_str(
        r#"
        [[activity]]
        name = "initcall ${1}"
        start = "calling  ([a-z_]+)\\+"
        end = "initcall ${1}\\+.* returned"
        source = "appliance"
        optional = true
    "#,
    )
    .unwrap();

    let run = run_with(
        0,
        &[
            (SourceTag::Appliance, "calling  pci_init+0x0/0x10 @ 1"),
            (SourceTag::Appliance, "calling  net_init+0x0/0x10 @ 1"),
            (SourceTag::Appliance, "initcall net_init+0x0/0x10 returned 0 after 5 usecs"),
            (SourceTag::Appliance, "initcall pci_init+0x0/0x10 returned 0 after 9 usecs"),
            (SourceTag::Library, "calling  lib_init+0x0 from the library"),
        ],
    );

    let mut registry = ActivityRegistry::new();
    instrument(&rules, &run, &mut registry).unwrap();

    assert_eq!(registry.lookup("initcall pci_init").unwrap().bounds(0), Some((1, 4)));
    assert_eq!(registry.lookup("initcall net_init").unwrap().bounds(0), Some((2, 3)));
    assert!(registry.lookup("initcall net_init").unwrap().flags().optional);
    // Wrong source, never registered
    assert!(!registry.exists("initcall lib_init"));
}

#[test]
fn test_first_occurrence_wins() {
    let rules = ActivityRules::from_toml_str(
        r#"
        [[activity]]
        name = "tick"
        start = "^tick$"
    "#,
    )
    .unwrap();

    let run = run_with(
        0,
        &[
            (SourceTag::Appliance, "tick"),
            (SourceTag::Appliance, "tock"),
            (SourceTag::Appliance, "tick"),
            (SourceTag::Appliance, "tock"),
        ],
    );

    let mut registry = ActivityRegistry::new();
    instrument(&rules, &run, &mut registry).unwrap();
    assert_eq!(registry.lookup("tick").unwrap().bounds(0), Some((1, 2)));
}

#[test]
fn test_start_without_end_not_registered() {
    let rules = ActivityRules::from_toml_str(
        r#"
        [[activity]]
        name = "never"
        start = "^begin$"
        end = "^finish$"
    "#,
    )
    .unwrap();

    let run = run_with(0, &[(SourceTag::Appliance, "begin")]);
    let mut registry = ActivityRegistry::new();
    instrument(&rules, &run, &mut registry).unwrap();
    assert!(!registry.exists("never"));
}

#[test]
fn test_prune_optional() {
    let mut registry = ActivityRegistry::new();
    registry
        .register(
            "flaky",
            ActivityFlags {
                long: false,
                optional: true,
            },
        )
        .unwrap()
        .mark(0, 1, 2);
    registry.register("steady", ActivityFlags::NONE).unwrap().mark(0, 1, 2);

    prune_optional(&mut registry, 2);

    assert!(!registry.exists("flaky"));
    // Non-optional activities are left for validation to report
    assert!(registry.exists("steady"));
}
