//! Persistence collaborator contracts.
//!
//! The engine owns no storage. CRUD management of bills, invoices, value
//! sources and jobs lives elsewhere; these traits are the slice of it the
//! processing run actually consumes. Single-document writes are expected to
//! be serialized by the store; the engine never relies on multi-document
//! transactions.

use async_trait::async_trait;
use chrono::NaiveDate;

use billkeeper_billing::{Bill, EmailValueSource, Invoice, JobStatus, ProcessingJob, TableValueSource};
use billkeeper_core::{BillId, DomainResult, JobId, SourceId};

#[async_trait]
pub trait BillStore: Send + Sync {
    /// All bills eligible for processing.
    async fn find_active(&self) -> DomainResult<Vec<Bill>>;
}

#[async_trait]
pub trait TableSourceStore: Send + Sync {
    async fn find_by_id(&self, id: SourceId) -> DomainResult<TableValueSource>;
}

#[async_trait]
pub trait EmailSourceStore: Send + Sync {
    async fn find_by_id(&self, id: SourceId) -> DomainResult<EmailValueSource>;
}

#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Delete Unpaid invoices for (bill, due date); returns how many matched.
    ///
    /// Zero matches is not an error.
    async fn delete_unpaid(&self, bill_id: BillId, due_date: NaiveDate) -> DomainResult<usize>;

    async fn create(&self, invoice: Invoice) -> DomainResult<()>;
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, job: ProcessingJob) -> DomainResult<()>;

    async fn update(&self, job: ProcessingJob) -> DomainResult<()>;

    async fn find_by_id(&self, id: JobId) -> DomainResult<ProcessingJob>;

    /// Number of jobs still in `Started` state.
    async fn count_in_progress(&self) -> DomainResult<usize>;

    /// Jobs matching the status filter; all jobs when `None`.
    async fn find(&self, status: Option<JobStatus>) -> DomainResult<Vec<ProcessingJob>>;
}
