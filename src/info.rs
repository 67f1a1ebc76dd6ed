//! Banner identifying the tool, the host and the measured appliance
//!
//! Lets results be compared with later runs on other machines. Host details
//! are best effort; missing information is simply left out.

use std::fs;
use std::io::{self, Write};

use crate::activity::ActivityRules;
use crate::event::escape_message;
use crate::event_log::Run;

/// `uname -a` style line, if available
fn uname_line() -> Option<String> {
    let uts = nix::sys::utsname::uname().ok()?;
    Some(format!(
        "{} {} {} {} {}",
        uts.sysname().to_string_lossy(),
        uts.nodename().to_string_lossy(),
        uts.release().to_string_lossy(),
        uts.version().to_string_lossy(),
        uts.machine().to_string_lossy()
    ))
}

/// First `model name` line of /proc/cpuinfo
fn cpu_model_line() -> Option<String> {
    let cpuinfo = fs::read_to_string("/proc/cpuinfo").ok()?;
    cpuinfo
        .lines()
        .find(|line| line.starts_with("model name"))
        .map(str::to_string)
}

/// Write the banner
///
/// The appliance section lists the version lines (per the info patterns of
/// `rules`) found in the first measured pass.
pub fn print_info<W: Write>(out: &mut W, first_run: Option<&Run>, rules: &ActivityRules) -> io::Result<()> {
    writeln!(out, "{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))?;

    writeln!(out, "Host:")?;
    for line in [uname_line(), cpu_model_line()].into_iter().flatten() {
        writeln!(out, "{}", line)?;
    }

    writeln!(out, "Appliance:")?;
    let events = first_run.map(Run::events).unwrap_or_default();
    for event in events.iter().filter(|e| rules.is_info_line(&e.message)) {
        writeln!(out, "{}", escape_message(&event.message))?;
    }

    Ok(())
}
