use chrono::{DateTime, Local};

pub const NEVER: &str = "Never";

/// Renders an epoch-seconds timestamp as local wall-clock time, or [`NEVER`].
pub fn format_ack_time(ts: Option<f64>) -> String {
    match ts.and_then(to_local) {
        Some(time) => time.format("%H:%M:%S").to_string(),
        None => NEVER.to_string(),
    }
}

fn to_local(ts: f64) -> Option<DateTime<Local>> {
    if !ts.is_finite() || ts <= 0.0 {
        return None;
    }
    let secs = ts.trunc() as i64;
    let nanos = ((ts.fract()) * 1_000_000_000.0) as u32;
    DateTime::from_timestamp(secs, nanos).map(|utc| utc.with_timezone(&Local))
}
