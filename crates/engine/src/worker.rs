//! Per-bill unit of work.

use std::sync::Arc;

use billkeeper_billing::{Bill, Invoice, ValueSourceKind};
use billkeeper_core::{DomainError, DomainResult, Period};
use billkeeper_extract::EmailGateway;

use crate::resolver::{EmailResolver, TableResolver};
use crate::store::{EmailSourceStore, InvoiceStore, TableSourceStore};

/// What processing one bill produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// A fresh Unpaid invoice was created.
    Created(Invoice),
    /// No amount known for the period; nothing owed this cycle.
    Skipped,
}

/// Processes a single bill for one run.
#[derive(Clone)]
pub struct BillWorker {
    table_sources: Arc<dyn TableSourceStore>,
    email_sources: Arc<dyn EmailSourceStore>,
    invoices: Arc<dyn InvoiceStore>,
    gateway: Arc<dyn EmailGateway>,
}

impl BillWorker {
    pub fn new(
        table_sources: Arc<dyn TableSourceStore>,
        email_sources: Arc<dyn EmailSourceStore>,
        invoices: Arc<dyn InvoiceStore>,
        gateway: Arc<dyn EmailGateway>,
    ) -> Self {
        Self {
            table_sources,
            email_sources,
            invoices,
            gateway,
        }
    }

    /// Replace the bill's invoice for the run's target due date.
    ///
    /// The target due date is the bill's due day in the month *after* the
    /// processing period (a January run bills with a February due date).
    /// Days past the end of the month clamp to the month's last day.
    pub async fn process_bill(&self, bill: &Bill, period: Period) -> DomainResult<WorkerOutcome> {
        let due_date = period.next().day(bill.due_day);
        tracing::info!(bill = %bill.name, %period, %due_date, "processing bill");

        // Replace-not-merge: drop any stale Unpaid invoice for this due date
        // first. Best effort; zero matches (or a store hiccup) must not fail
        // the worker before the amount is even resolved.
        match self.invoices.delete_unpaid(bill.id, due_date).await {
            Ok(deleted) if deleted > 0 => {
                tracing::info!(bill_id = %bill.id, %due_date, deleted, "deleted stale unpaid invoices");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(bill_id = %bill.id, %due_date, error = %e, "failed to delete stale unpaid invoices");
            }
        }

        let amount = match bill.source_kind {
            ValueSourceKind::Table => {
                let resolver = TableResolver::new(self.table_sources.as_ref());
                match resolver.resolve(bill.source_id, period).await? {
                    Some(amount) => amount,
                    None => return Ok(WorkerOutcome::Skipped),
                }
            }
            ValueSourceKind::Email => {
                let resolver = EmailResolver::new(self.email_sources.as_ref(), self.gateway.as_ref());
                resolver.resolve(bill.source_id, period).await?
            }
            ValueSourceKind::Api => {
                return Err(DomainError::unimplemented(
                    "value source kind 'api' has no resolver",
                ));
            }
        };

        let invoice = Invoice::unpaid(bill.id, due_date, amount)?;
        self.invoices.create(invoice.clone()).await?;
        tracing::info!(bill = %bill.name, invoice_id = %invoice.id, amount = %amount, "invoice created");

        Ok(WorkerOutcome::Created(invoice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billkeeper_billing::{InvoiceStatus, TableEntry, TableValueSource};
    use billkeeper_core::Money;
    use chrono::NaiveDate;

    use crate::memory::{
        InMemoryEmailGateway, InMemoryEmailSourceStore, InMemoryInvoiceStore,
        InMemoryTableSourceStore,
    };

    struct Fixture {
        table_sources: Arc<InMemoryTableSourceStore>,
        invoices: Arc<InMemoryInvoiceStore>,
        worker: BillWorker,
    }

    fn fixture() -> Fixture {
        let table_sources = Arc::new(InMemoryTableSourceStore::new());
        let email_sources = Arc::new(InMemoryEmailSourceStore::new());
        let invoices = Arc::new(InMemoryInvoiceStore::new());
        let gateway = Arc::new(InMemoryEmailGateway::new());
        let worker = BillWorker::new(
            table_sources.clone(),
            email_sources.clone(),
            invoices.clone(),
            gateway,
        );
        Fixture {
            table_sources,
            invoices,
            worker,
        }
    }

    fn period(y: i32, m: u32) -> Period {
        Period::new(y, m).unwrap()
    }

    async fn table_bill(fx: &Fixture, due_day: u32, entries: Vec<TableEntry>) -> Bill {
        let source = TableValueSource::new("Power schedule", entries).unwrap();
        let source_id = source.id;
        fx.table_sources.insert(source).await;
        Bill::new("Power", "Acme Energy", ValueSourceKind::Table, source_id, due_day).unwrap()
    }

    #[tokio::test]
    async fn creates_invoice_due_month_after_period() {
        let fx = fixture();
        let bill = table_bill(
            &fx,
            10,
            vec![TableEntry {
                period: period(2024, 1),
                amount: Money::from_cents(12000),
            }],
        )
        .await;

        let outcome = fx.worker.process_bill(&bill, period(2024, 1)).await.unwrap();
        let WorkerOutcome::Created(invoice) = outcome else {
            panic!("expected invoice, got {outcome:?}");
        };
        assert_eq!(invoice.due_date, NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());
        assert_eq!(invoice.amount, Money::from_cents(12000));
        assert_eq!(invoice.status, InvoiceStatus::Unpaid);
        assert_eq!(fx.invoices.all().await.len(), 1);
    }

    #[tokio::test]
    async fn due_day_clamps_to_short_months() {
        let fx = fixture();
        let bill = table_bill(
            &fx,
            31,
            vec![TableEntry {
                period: period(2024, 1),
                amount: Money::from_cents(5000),
            }],
        )
        .await;

        let outcome = fx.worker.process_bill(&bill, period(2024, 1)).await.unwrap();
        let WorkerOutcome::Created(invoice) = outcome else {
            panic!("expected invoice");
        };
        // Due in February 2024: day 31 clamps to the 29th.
        assert_eq!(invoice.due_date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[tokio::test]
    async fn missing_period_entry_skips_without_invoice() {
        let fx = fixture();
        let bill = table_bill(&fx, 10, vec![]).await;

        let outcome = fx.worker.process_bill(&bill, period(2024, 1)).await.unwrap();
        assert_eq!(outcome, WorkerOutcome::Skipped);
        assert!(fx.invoices.all().await.is_empty());
    }

    #[tokio::test]
    async fn reprocessing_replaces_the_unpaid_invoice() {
        let fx = fixture();
        let bill = table_bill(
            &fx,
            10,
            vec![TableEntry {
                period: period(2024, 1),
                amount: Money::from_cents(12000),
            }],
        )
        .await;

        fx.worker.process_bill(&bill, period(2024, 1)).await.unwrap();
        fx.worker.process_bill(&bill, period(2024, 1)).await.unwrap();

        let invoices = fx.invoices.find_by_bill(bill.id).await;
        assert_eq!(invoices.len(), 1, "stale unpaid invoice must be replaced");
    }

    #[tokio::test]
    async fn paid_invoices_survive_reprocessing() {
        let fx = fixture();
        let bill = table_bill(
            &fx,
            10,
            vec![TableEntry {
                period: period(2024, 1),
                amount: Money::from_cents(12000),
            }],
        )
        .await;

        let mut paid = Invoice::unpaid(
            bill.id,
            NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
            Money::from_cents(11000),
        )
        .unwrap();
        paid.status = InvoiceStatus::Paid;
        fx.invoices.create(paid.clone()).await.unwrap();

        fx.worker.process_bill(&bill, period(2024, 1)).await.unwrap();

        let invoices = fx.invoices.find_by_bill(bill.id).await;
        assert_eq!(invoices.len(), 2);
        assert!(invoices.iter().any(|i| i.id == paid.id));
    }

    #[tokio::test]
    async fn api_source_kind_is_unimplemented() {
        let fx = fixture();
        let bill = Bill::new("Phone", "TelCo Inc", ValueSourceKind::Api, billkeeper_core::SourceId::new(), 5)
            .unwrap();

        let err = fx.worker.process_bill(&bill, period(2024, 1)).await.unwrap_err();
        assert!(matches!(err, DomainError::Unimplemented(_)));
    }
}
