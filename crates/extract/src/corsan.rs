//! Corsan (water) notification email extractor.
//!
//! Template shape:
//!
//! ```text
//! Sua fatura referente ao mês de JANEIRO está disponível.
//! Código do Imóvel: 123456 Vencimento: 15/3/2024 Valor: 89,90.
//! Agradecemos a preferência.
//! ```
//!
//! The reference month is stated by name only; which calendar year it falls
//! in is derived from the due date (see [`crate::month::reference_period`]).

use billkeeper_core::{DomainError, DomainResult};

use crate::extractor::{field_between, parse_amount, parse_due_date, ExtractedCharge, ValueExtractor};
use crate::month::reference_period;

const LBL_PROPERTY: &str = "Código do Imóvel:";
const LBL_DUE_DATE: &str = "Vencimento:";
const LBL_REFERENCE: &str = "referente ao mês de";
const LBL_AMOUNT: &str = "Valor:";
const LBL_END: &str = "Agradecemos";

pub struct CorsanExtractor;

impl ValueExtractor for CorsanExtractor {
    fn extract(&self, body: &str) -> DomainResult<ExtractedCharge> {
        let property = field_between(body, LBL_PROPERTY, LBL_DUE_DATE)?;

        let due_text = field_between(body, LBL_DUE_DATE, LBL_AMOUNT)?;
        let due_date = parse_due_date(due_text, LBL_DUE_DATE)?;

        let reference_name = reference_month_name(body)?;
        let reference = reference_period(reference_name, due_date)?;

        let amount_text = field_between(body, LBL_AMOUNT, LBL_END)?;
        let amount_text = amount_text.strip_suffix('.').unwrap_or(amount_text);
        let amount = parse_amount(amount_text, LBL_AMOUNT)?;

        tracing::debug!(
            property,
            %amount,
            %due_date,
            %reference,
            "parsed corsan message body"
        );

        Ok(ExtractedCharge {
            amount,
            due_date,
            reference,
        })
    }
}

/// The single word following the reference label.
fn reference_month_name(body: &str) -> DomainResult<&str> {
    let start = body
        .find(LBL_REFERENCE)
        .ok_or_else(|| DomainError::internal(format!("label not found: {LBL_REFERENCE:?}")))?
        + LBL_REFERENCE.len();
    body[start..]
        .split_whitespace()
        .next()
        .ok_or_else(|| DomainError::internal(format!("empty field after {LBL_REFERENCE:?}")))
}
