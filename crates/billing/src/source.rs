//! Value sources: where a bill's owed amount for a period comes from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use billkeeper_core::{DomainError, DomainResult, Money, Period, SourceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Active,
    Inactive,
}

/// One pre-entered amount for a billing period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    pub period: Period,
    pub amount: Money,
}

/// Static (month, year, amount) schedule.
///
/// Invariant: at most one amount per period; `new`/`update` reject duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableValueSource {
    pub id: SourceId,
    pub name: String,
    pub entries: Vec<TableEntry>,
    pub status: SourceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TableValueSource {
    pub fn new(name: impl Into<String>, entries: Vec<TableEntry>) -> DomainResult<Self> {
        let now = Utc::now();
        let source = Self {
            id: SourceId::new(),
            name: name.into(),
            entries,
            status: SourceStatus::Active,
            created_at: now,
            updated_at: now,
        };
        source.validate()?;
        Ok(source)
    }

    /// Amount pre-entered for a period, if any.
    pub fn amount_for(&self, period: Period) -> Option<Money> {
        self.entries
            .iter()
            .find(|e| e.period == period)
            .map(|e| e.amount)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.len() < 3 {
            return Err(DomainError::validation(
                "table value source name must be at least 3 characters",
            ));
        }
        for (i, entry) in self.entries.iter().enumerate() {
            if self.entries[..i].iter().any(|e| e.period == entry.period) {
                return Err(DomainError::validation(format!(
                    "duplicate table entry for period {}",
                    entry.period
                )));
            }
        }
        Ok(())
    }
}

/// Selects which vendor template an email body is parsed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    Cpfl,
    Corsan,
}

/// Email-scraped value source. No stored amount; resolved per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailValueSource {
    pub id: SourceId,
    /// Sender address searched for.
    pub address: String,
    /// Subject substring searched for.
    pub subject: String,
    pub extractor: ExtractorKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmailValueSource {
    pub fn new(
        address: impl Into<String>,
        subject: impl Into<String>,
        extractor: ExtractorKind,
    ) -> DomainResult<Self> {
        let now = Utc::now();
        let source = Self {
            id: SourceId::new(),
            address: address.into(),
            subject: subject.into(),
            extractor,
            created_at: now,
            updated_at: now,
        };
        source.validate()?;
        Ok(source)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.address.len() < 5 {
            return Err(DomainError::validation(
                "email value source address must be at least 5 characters",
            ));
        }
        if self.subject.is_empty() {
            return Err(DomainError::validation(
                "email value source subject must not be empty",
            ));
        }
        Ok(())
    }
}
