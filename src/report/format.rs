use std::fmt::Write;

use crate::tracking::{ActivityKind, AggregateRecord};

const MINUTES_IN_HOUR: u64 = 60;
const HOURS_IN_DAY: u64 = 24;

/// Renders accumulated units (minutes) as `<verb> for <Nd><Nh><Nm>`. Zero components are left
/// out, so zero units render as `<verb> for `.
pub fn format_duration(total_units: u64, kind: ActivityKind) -> String {
    let hours = total_units / MINUTES_IN_HOUR;
    let minutes = total_units % MINUTES_IN_HOUR;
    let days = hours / HOURS_IN_DAY;
    let hours = hours % HOURS_IN_DAY;

    let mut result = format!("{} for ", kind.verb());
    for (value, unit) in [(days, 'd'), (hours, 'h'), (minutes, 'm')] {
        if value > 0 {
            // Writing into a String can't fail.
            let _ = write!(result, "{value}{unit}");
        }
    }
    result
}

/// A single line of a report.
pub fn format_entry(record: &AggregateRecord) -> String {
    format!(
        "**{}** - {}",
        record.activity,
        format_duration(record.total_units, record.kind)
    )
}
