//! Value source resolvers: one per source kind.
//!
//! Each resolver turns (source id, processing period) into an amount. Adding
//! a source kind means adding a resolver here and one dispatch arm in the
//! worker; the orchestrator never changes.

use billkeeper_core::{DomainError, DomainResult, Money, Period, SourceId};
use billkeeper_extract::{extractor_for, EmailGateway};

use crate::store::{EmailSourceStore, TableSourceStore};

/// Looks up a pre-entered amount from a bill's static schedule.
pub struct TableResolver<'a> {
    sources: &'a dyn TableSourceStore,
}

impl<'a> TableResolver<'a> {
    pub fn new(sources: &'a dyn TableSourceStore) -> Self {
        Self { sources }
    }

    /// Amount for the period, or `None` when the schedule has no entry yet
    /// (not an error: nothing owed this cycle).
    pub async fn resolve(&self, source_id: SourceId, period: Period) -> DomainResult<Option<Money>> {
        let source = self.sources.find_by_id(source_id).await?;

        match source.amount_for(period) {
            Some(amount) if amount.is_positive() => {
                tracing::debug!(%source_id, %period, %amount, "found table entry for period");
                Ok(Some(amount))
            }
            _ => {
                tracing::info!(%source_id, %period, "no table entry for period, skipping");
                Ok(None)
            }
        }
    }
}

/// Scrapes the amount from recent vendor correspondence.
pub struct EmailResolver<'a> {
    sources: &'a dyn EmailSourceStore,
    gateway: &'a dyn EmailGateway,
}

impl<'a> EmailResolver<'a> {
    pub fn new(sources: &'a dyn EmailSourceStore, gateway: &'a dyn EmailGateway) -> Self {
        Self { sources, gateway }
    }

    pub async fn resolve(&self, source_id: SourceId, period: Period) -> DomainResult<Money> {
        let source = self.sources.find_by_id(source_id).await?;
        let extractor = extractor_for(source.extractor);

        tracing::debug!(
            address = %source.address,
            subject = %source.subject,
            %period,
            "searching vendor emails"
        );

        let mut refs = self
            .gateway
            .search(&source.address, &source.subject, period.first_day(), period.last_day())
            .await?;

        if refs.is_empty() {
            return Err(DomainError::not_found(format!(
                "no messages from {} matching {:?} in {period}",
                source.address, source.subject
            )));
        }

        // Stable order, earliest id wins.
        refs.sort_by(|a, b| a.id.cmp(&b.id));
        let message = self.gateway.fetch(&refs[0].id).await?;

        let charge = extractor.extract(&message.snippet)?;
        tracing::debug!(message_id = %message.id, amount = %charge.amount, "extracted charge");

        Ok(charge.amount)
    }
}
