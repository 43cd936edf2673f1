//! CPFL (electricity) notification email extractor.
//!
//! The template carries labelled fields in a fixed order:
//!
//! ```text
//! ... Número da instalação: 4001234567 Data de vencimento: 15/3/2024
//! Mês de referência: JANEIRO Valor a pagar: R$ 123,45. Para abrir ...
//! ```

use billkeeper_core::DomainResult;

use crate::extractor::{field_between, parse_amount, parse_due_date, ExtractedCharge, ValueExtractor};
use crate::month::reference_period;

const LBL_INSTALLATION: &str = "Número da instalação:";
const LBL_DUE_DATE: &str = "Data de vencimento:";
const LBL_REFERENCE: &str = "Mês de referência:";
const LBL_AMOUNT: &str = "Valor a pagar:";
const LBL_END: &str = "Para abrir";

pub struct CpflExtractor;

impl ValueExtractor for CpflExtractor {
    fn extract(&self, body: &str) -> DomainResult<ExtractedCharge> {
        let installation = field_between(body, LBL_INSTALLATION, LBL_DUE_DATE)?;

        let due_text = field_between(body, LBL_DUE_DATE, LBL_REFERENCE)?;
        let due_date = parse_due_date(due_text, LBL_DUE_DATE)?;

        let reference_name = field_between(body, LBL_REFERENCE, LBL_AMOUNT)?;
        let reference = reference_period(reference_name, due_date)?;

        let amount_text = field_between(body, LBL_AMOUNT, LBL_END)?;
        let amount = parse_amount(strip_currency(amount_text), LBL_AMOUNT)?;

        tracing::debug!(
            installation,
            %amount,
            %due_date,
            %reference,
            "parsed cpfl message body"
        );

        Ok(ExtractedCharge {
            amount,
            due_date,
            reference,
        })
    }
}

/// Drop the `R$` prefix and the sentence-final period.
fn strip_currency(text: &str) -> &str {
    let text = text.strip_prefix("R$").unwrap_or(text).trim();
    text.strip_suffix('.').unwrap_or(text).trim()
}
