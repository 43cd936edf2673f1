//! Portuguese month names as they appear in vendor email templates.

use billkeeper_core::{DomainError, DomainResult, Period};
use chrono::NaiveDate;

const MONTH_NAMES: [&str; 12] = [
    "JANEIRO",
    "FEVEREIRO",
    "MARÇO",
    "ABRIL",
    "MAIO",
    "JUNHO",
    "JULHO",
    "AGOSTO",
    "SETEMBRO",
    "OUTUBRO",
    "NOVEMBRO",
    "DEZEMBRO",
];

/// 1-based month for an exact upper-case Portuguese month name.
///
/// Exact match only; the vendor templates are upper-case and any deviation
/// should fail rather than guess.
pub fn month_by_name(name: &str) -> DomainResult<u32> {
    MONTH_NAMES
        .iter()
        .position(|&n| n == name)
        .map(|i| i as u32 + 1)
        .ok_or_else(|| DomainError::internal(format!("unknown month name: {name:?}")))
}

/// Resolve which calendar month a stated reference-month name refers to.
///
/// Walks backwards month-by-month from the due date until the named month
/// matches. A charge due in March that states "JANEIRO" refers to January of
/// the same year; a January due date stating "JANEIRO" refers to January of
/// the previous year.
pub fn reference_period(month_name: &str, due_date: NaiveDate) -> DomainResult<Period> {
    let month = month_by_name(month_name)?;

    let mut period = Period::of(due_date);
    for _ in 0..12 {
        period = period.prev();
        if period.month() == month {
            return Ok(period);
        }
    }

    // Unreachable: any month is hit within 12 backward steps.
    Err(DomainError::internal(format!(
        "could not resolve reference month {month_name:?} from due date {due_date}"
    )))
}
