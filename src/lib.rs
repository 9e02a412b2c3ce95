//! Opt-in tracking of how long subjects spend on their activities.
//! A daemon samples presence of tracked subjects on a fixed interval and accumulates one unit per
//! sample into a durable store, while queries render the accumulated totals as paginated reports.
//!

pub mod cli;
pub mod commands;
pub mod daemon;
pub mod fs;
pub mod poller;
pub mod report;
pub mod tracking;
pub mod utils;
