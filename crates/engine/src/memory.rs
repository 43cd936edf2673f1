//! In-memory store implementations for tests and the dev runner.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use billkeeper_billing::{
    Bill, BillStatus, EmailValueSource, Invoice, InvoiceStatus, JobStatus, ProcessingJob,
    TableValueSource,
};
use billkeeper_core::{BillId, DomainError, DomainResult, JobId, SourceId};
use billkeeper_extract::{EmailGateway, EmailMessage, MessageRef};

use crate::store::{BillStore, EmailSourceStore, InvoiceStore, JobStore, TableSourceStore};

#[derive(Default)]
pub struct InMemoryBillStore {
    bills: RwLock<Vec<Bill>>,
}

impl InMemoryBillStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, bill: Bill) {
        self.bills.write().await.push(bill);
    }
}

#[async_trait]
impl BillStore for InMemoryBillStore {
    async fn find_active(&self) -> DomainResult<Vec<Bill>> {
        Ok(self
            .bills
            .read()
            .await
            .iter()
            .filter(|b| b.status == BillStatus::Active)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryTableSourceStore {
    sources: RwLock<HashMap<SourceId, TableValueSource>>,
}

impl InMemoryTableSourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, source: TableValueSource) {
        self.sources.write().await.insert(source.id, source);
    }
}

#[async_trait]
impl TableSourceStore for InMemoryTableSourceStore {
    async fn find_by_id(&self, id: SourceId) -> DomainResult<TableValueSource> {
        self.sources
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("table value source {id}")))
    }
}

#[derive(Default)]
pub struct InMemoryEmailSourceStore {
    sources: RwLock<HashMap<SourceId, EmailValueSource>>,
}

impl InMemoryEmailSourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, source: EmailValueSource) {
        self.sources.write().await.insert(source.id, source);
    }
}

#[async_trait]
impl EmailSourceStore for InMemoryEmailSourceStore {
    async fn find_by_id(&self, id: SourceId) -> DomainResult<EmailValueSource> {
        self.sources
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("email value source {id}")))
    }
}

#[derive(Default)]
pub struct InMemoryInvoiceStore {
    invoices: RwLock<Vec<Invoice>>,
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<Invoice> {
        self.invoices.read().await.clone()
    }

    pub async fn find_by_bill(&self, bill_id: BillId) -> Vec<Invoice> {
        self.invoices
            .read()
            .await
            .iter()
            .filter(|i| i.bill_id == bill_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl InvoiceStore for InMemoryInvoiceStore {
    async fn delete_unpaid(&self, bill_id: BillId, due_date: NaiveDate) -> DomainResult<usize> {
        let mut invoices = self.invoices.write().await;
        let before = invoices.len();
        invoices.retain(|i| {
            !(i.bill_id == bill_id && i.due_date == due_date && i.status == InvoiceStatus::Unpaid)
        });
        Ok(before - invoices.len())
    }

    async fn create(&self, invoice: Invoice) -> DomainResult<()> {
        self.invoices.write().await.push(invoice);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, ProcessingJob>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, job: ProcessingJob) -> DomainResult<()> {
        self.jobs.write().await.insert(job.id, job);
        Ok(())
    }

    async fn update(&self, job: ProcessingJob) -> DomainResult<()> {
        let mut jobs = self.jobs.write().await;
        if !jobs.contains_key(&job.id) {
            return Err(DomainError::not_found(format!("processing job {}", job.id)));
        }
        jobs.insert(job.id, job);
        Ok(())
    }

    async fn find_by_id(&self, id: JobId) -> DomainResult<ProcessingJob> {
        self.jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("processing job {id}")))
    }

    async fn count_in_progress(&self) -> DomainResult<usize> {
        Ok(self
            .jobs
            .read()
            .await
            .values()
            .filter(|j| j.status == JobStatus::Started)
            .count())
    }

    async fn find(&self, status: Option<JobStatus>) -> DomainResult<Vec<ProcessingJob>> {
        let mut jobs: Vec<ProcessingJob> = self
            .jobs
            .read()
            .await
            .values()
            .filter(|j| status.is_none_or(|s| j.status == s))
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.created_at);
        Ok(jobs)
    }
}

/// A seeded mailbox entry for [`InMemoryEmailGateway`].
#[derive(Debug, Clone)]
pub struct StoredEmail {
    pub address: String,
    pub subject: String,
    pub received: NaiveDate,
    pub message: EmailMessage,
}

/// Fake mailbox backing the email gateway contract.
#[derive(Default)]
pub struct InMemoryEmailGateway {
    emails: RwLock<Vec<StoredEmail>>,
}

impl InMemoryEmailGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, email: StoredEmail) {
        self.emails.write().await.push(email);
    }
}

#[async_trait]
impl EmailGateway for InMemoryEmailGateway {
    async fn search(
        &self,
        address: &str,
        subject: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<Vec<MessageRef>> {
        Ok(self
            .emails
            .read()
            .await
            .iter()
            .filter(|e| {
                e.address == address
                    && e.subject.contains(subject)
                    && e.received >= from
                    && e.received <= to
            })
            .map(|e| MessageRef {
                id: e.message.id.clone(),
            })
            .collect())
    }

    async fn fetch(&self, message_id: &str) -> DomainResult<EmailMessage> {
        self.emails
            .read()
            .await
            .iter()
            .find(|e| e.message.id == message_id)
            .map(|e| e.message.clone())
            .ok_or_else(|| DomainError::not_found(format!("message {message_id}")))
    }
}
