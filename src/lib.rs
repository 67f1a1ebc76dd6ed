//! Bootline - multi-pass boot timeline analyzer
//!
//! Runs a startup sequence several times, captures its timestamped output,
//! and works out which phases ("activities") the sequence goes through, how
//! long each takes on average, how much that varies between passes and what
//! share of the whole boot it accounts for. The result is printed as a
//! column timeline and as a list of the longest activities.

pub mod activity;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod event_log;
pub mod info;
pub mod render;
pub mod session;
pub mod source;
pub mod synthesis;
pub mod validation;
