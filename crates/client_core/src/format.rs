//! Display formatting for stored bill fields.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use shared::domain::BillStatus;

use crate::error::FormatError;

const MONTHS: [&str; 12] = [
    "Jan", "Fév", "Mar", "Avr", "Mai", "Jui", "Jui", "Aoû", "Sep", "Oct", "Nov", "Déc",
];

/// Renders an ISO date as `"{day} {Mon}. {yy}"`, e.g. `2004-04-04` → `4 Avr. 04`.
pub fn format_date(raw: &str) -> Result<String, FormatError> {
    let date = parse_date(raw).ok_or_else(|| FormatError::InvalidDate(raw.to_string()))?;
    Ok(format!(
        "{} {}. {:02}",
        date.day(),
        MONTHS[date.month0() as usize],
        date.year().rem_euclid(100)
    ))
}

pub fn format_status(raw: &str) -> Result<&'static str, FormatError> {
    match BillStatus::parse(raw) {
        Some(BillStatus::Pending) => Ok("En attente"),
        Some(BillStatus::Accepted) => Ok("Accepté"),
        Some(BillStatus::Refused) => Ok("Refused"),
        None => Err(FormatError::UnknownStatus(raw.to_string())),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|datetime| datetime.date())
}

#[cfg(test)]
#[path = "tests/format_tests.rs"]
mod tests;
