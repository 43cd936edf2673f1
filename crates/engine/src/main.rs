//! Dev runner: seeds in-memory stores with a sample bill, kicks off a
//! processing run and prints the resulting invoices.

use std::sync::Arc;
use std::time::Duration;

use billkeeper_billing::{Bill, TableEntry, TableValueSource, ValueSourceKind};
use billkeeper_core::{Money, Period};
use billkeeper_engine::memory::{
    InMemoryBillStore, InMemoryEmailGateway, InMemoryEmailSourceStore, InMemoryInvoiceStore,
    InMemoryJobStore, InMemoryTableSourceStore,
};
use billkeeper_engine::{BillProcessor, EngineConfig};
use chrono::Utc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    billkeeper_observability::init();

    let bills = Arc::new(InMemoryBillStore::new());
    let table_sources = Arc::new(InMemoryTableSourceStore::new());
    let email_sources = Arc::new(InMemoryEmailSourceStore::new());
    let invoices = Arc::new(InMemoryInvoiceStore::new());
    let jobs = Arc::new(InMemoryJobStore::new());
    let gateway = Arc::new(InMemoryEmailGateway::new());

    let period = Period::previous_month(Utc::now().date_naive());
    let source = TableValueSource::new(
        "Rent schedule",
        vec![TableEntry {
            period,
            amount: Money::from_cents(120_000),
        }],
    )?;
    let source_id = source.id;
    table_sources.insert(source).await;

    let bill = Bill::new("Rent", "Landlord Ltda", ValueSourceKind::Table, source_id, 5)?;
    bills.insert(bill).await;

    let processor = BillProcessor::new(
        bills,
        table_sources,
        email_sources,
        invoices.clone(),
        jobs,
        gateway,
        EngineConfig::from_env(),
    );

    let job_id = processor.start(Some(period)).await?;
    tracing::info!(%job_id, %period, "run started");

    loop {
        let status = processor.status(job_id).await?;
        if status.is_terminal() {
            tracing::info!(%job_id, %status, "run finished");
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    for invoice in invoices.all().await {
        tracing::info!(
            invoice_id = %invoice.id,
            bill_id = %invoice.bill_id,
            due_date = %invoice.due_date,
            amount = %invoice.amount,
            "invoice"
        );
    }

    Ok(())
}
