use serde::{Deserialize, Serialize};

pub const DEFAULT_START: &str = "1970-01-01T00:00:00";
pub const DEFAULT_END: &str = "2100-01-01T00:00:00";

/// Bounds of a history query. The values are handed to the temperature
/// service exactly as the user typed them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

impl Default for TimeRange {
    fn default() -> Self {
        TimeRange {
            start: DEFAULT_START.to_string(),
            end: DEFAULT_END.to_string(),
        }
    }
}

/// The optional range fields of the dashboard form. Arrives as a query
/// string on GET and as an urlencoded body on POST.
#[derive(Deserialize, Debug, Default)]
pub struct RangeForm {
    pub start_datetime: Option<String>,
    pub end_datetime: Option<String>,
}

impl RangeForm {
    pub fn resolve(self) -> TimeRange {
        let range = TimeRange {
            start: or_default(self.start_datetime, DEFAULT_START),
            end: or_default(self.end_datetime, DEFAULT_END),
        };
        log::debug!("Resolved range {} to {}", range.start, range.end);
        range
    }
}

fn or_default(value: Option<String>, default: &str) -> String {
    match value {
        Some(value) if !value.is_empty() => value,
        _ => default.to_string(),
    }
}
