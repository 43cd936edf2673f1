//! Value extractor contract and vendor dispatch.

use chrono::NaiveDate;

use billkeeper_billing::ExtractorKind;
use billkeeper_core::{DomainError, DomainResult, Money, Period};

use crate::corsan::CorsanExtractor;
use crate::cpfl::CpflExtractor;

/// Result of scraping one vendor notification email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedCharge {
    /// Amount owed, already ceiling-rounded to cents.
    pub amount: Money,
    /// Due date stated in the email.
    pub due_date: NaiveDate,
    /// Calendar month the charge refers to.
    pub reference: Period,
}

/// Parses a vendor's free-text email body into a charge.
pub trait ValueExtractor: Send + Sync {
    fn extract(&self, body: &str) -> DomainResult<ExtractedCharge>;
}

/// Resolve the extractor for a configured kind.
///
/// Adding a vendor means a new extractor module plus one arm here; the
/// worker and orchestrator stay untouched.
pub fn extractor_for(kind: ExtractorKind) -> Box<dyn ValueExtractor> {
    match kind {
        ExtractorKind::Cpfl => Box::new(CpflExtractor),
        ExtractorKind::Corsan => Box::new(CorsanExtractor),
    }
}

/// Text between the end of `label` and the start of `next`, trimmed.
///
/// Anchor-based scraping: both labels must occur, in that order. A missing
/// label means the vendor changed the template; fail naming it.
pub(crate) fn field_between<'a>(body: &'a str, label: &str, next: &str) -> DomainResult<&'a str> {
    let start = body
        .find(label)
        .ok_or_else(|| DomainError::internal(format!("label not found: {label:?}")))?
        + label.len();
    let rest = &body[start..];
    let end = rest
        .find(next)
        .ok_or_else(|| DomainError::internal(format!("label not found: {next:?}")))?;
    Ok(rest[..end].trim())
}

/// Parse a `d/m/yyyy` date field, naming the field on failure.
pub(crate) fn parse_due_date(text: &str, field: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(text, "%d/%m/%Y")
        .map_err(|_| DomainError::internal(format!("error parsing {field}: {text:?}")))
}

/// Parse a decimal-comma currency field, naming the field on failure.
pub(crate) fn parse_amount(text: &str, field: &str) -> DomainResult<Money> {
    Money::parse_decimal(text)
        .map_err(|_| DomainError::internal(format!("error parsing {field}: {text:?}")))
}
