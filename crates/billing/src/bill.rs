use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use billkeeper_core::{BillId, DomainError, DomainResult, SourceId};

/// Whether a bill is eligible for processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    Active,
    Inactive,
}

/// Where a bill's owed amount for a period comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSourceKind {
    /// Pre-entered (month, year, amount) schedule.
    Table,
    /// Amount scraped from vendor notification email.
    Email,
    /// Reserved; no resolver exists yet.
    Api,
}

/// A recurring obligation (electricity, water, rent, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    pub id: BillId,
    pub name: String,
    pub company: String,
    pub source_kind: ValueSourceKind,
    pub source_id: SourceId,
    /// Day of month the bill is due (1-31).
    pub due_day: u32,
    pub status: BillStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bill {
    pub fn new(
        name: impl Into<String>,
        company: impl Into<String>,
        source_kind: ValueSourceKind,
        source_id: SourceId,
        due_day: u32,
    ) -> DomainResult<Self> {
        let now = Utc::now();
        let bill = Self {
            id: BillId::new(),
            name: name.into(),
            company: company.into(),
            source_kind,
            source_id,
            due_day,
            status: BillStatus::Active,
            created_at: now,
            updated_at: now,
        };
        bill.validate()?;
        Ok(bill)
    }

    pub fn is_active(&self) -> bool {
        self.status == BillStatus::Active
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.len() <= 3 || self.company.len() <= 3 {
            return Err(DomainError::validation(
                "bill name and company must be longer than 3 characters",
            ));
        }
        if !(1..=31).contains(&self.due_day) {
            return Err(DomainError::validation("bill due day must be 1-31"));
        }
        Ok(())
    }
}
