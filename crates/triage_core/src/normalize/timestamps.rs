use time::format_description::well_known::Rfc3339;
use time::{format_description, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::error::AppError;

/// Whole seconds only, so stored timestamps order correctly as plain strings.
fn canonicalize_rfc3339_utc(dt: OffsetDateTime) -> Result<String, AppError> {
    let format_failed = |e: String| {
        AppError::new("TS_FORMAT_FAILED", "Failed to format timestamp").with_details(e)
    };
    dt.to_offset(UtcOffset::UTC)
        .replace_nanosecond(0)
        .map_err(|e| format_failed(e.to_string()))?
        .format(&Rfc3339)
        .map_err(|e| format_failed(e.to_string()))
}

pub fn now_rfc3339_utc() -> Result<String, AppError> {
    canonicalize_rfc3339_utc(OffsetDateTime::now_utc())
}

/// Formats without an offset; reporting apps that send these are assumed to mean UTC.
const NAIVE_FORMATS: [&str; 4] = [
    "[year]-[month]-[day]T[hour]:[minute]:[second]",
    "[year]-[month]-[day] [hour]:[minute]:[second]",
    "[year]-[month]-[day]T[hour]:[minute]",
    "[year]-[month]-[day] [hour]:[minute]",
];

fn parse_naive_assume_utc(raw: &str) -> Option<OffsetDateTime> {
    NAIVE_FORMATS.iter().find_map(|fmt| {
        let items = format_description::parse(fmt).ok()?;
        PrimitiveDateTime::parse(raw, &items)
            .ok()
            .map(PrimitiveDateTime::assume_utc)
    })
}

/// Normalize a report date into canonical RFC3339 UTC.
///
/// Accepts RFC3339 with any offset, or one of the offset-less formats above (read as
/// UTC). Anything else is a validation error; dates are never guessed.
pub fn normalize_report_date(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("Report date is empty"));
    }

    if let Ok(dt) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return canonicalize_rfc3339_utc(dt);
    }

    match parse_naive_assume_utc(trimmed) {
        Some(dt) => canonicalize_rfc3339_utc(dt),
        None => Err(AppError::validation("Unparseable report date")
            .with_details(format!("raw={trimmed}"))),
    }
}
