use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use billkeeper_core::{BillId, DomainError, DomainResult, InvoiceId, Money};

/// Invoice payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Unpaid,
    Paid,
}

/// One record per (bill, due date) representing money owed.
///
/// The engine enforces at most one Unpaid invoice per (bill, due date) by
/// deleting any stale Unpaid invoice before creating the fresh one. Paid
/// invoices are never touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub bill_id: BillId,
    pub due_date: NaiveDate,
    pub amount: Money,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Create a fresh Unpaid invoice.
    pub fn unpaid(bill_id: BillId, due_date: NaiveDate, amount: Money) -> DomainResult<Self> {
        if !amount.is_positive() {
            return Err(DomainError::validation(
                "invoice amount must be positive",
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: InvoiceId::new(),
            bill_id,
            due_date,
            amount,
            status: InvoiceStatus::Unpaid,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_unpaid(&self) -> bool {
        self.status == InvoiceStatus::Unpaid
    }
}
