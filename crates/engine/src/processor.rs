//! Job orchestration: start a run, fan out over active bills, aggregate
//! outcomes, expose status reads.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinSet;

use billkeeper_billing::{JobStatus, ProcessingJob};
use billkeeper_core::{BillId, DomainError, DomainResult, JobId, Period};
use billkeeper_extract::EmailGateway;

use crate::config::EngineConfig;
use crate::store::{BillStore, EmailSourceStore, InvoiceStore, JobStore, TableSourceStore};
use crate::supervisor::supervise;
use crate::worker::{BillWorker, WorkerOutcome};

/// One bill's failure, tagged for the aggregate report.
#[derive(Debug)]
struct BillFailure {
    bill_id: BillId,
    error: DomainError,
}

/// Entry point for bill processing runs.
///
/// `start` is fire-and-forget: it persists a `Started` job, schedules the
/// fan-out and the timeout supervisor, and returns the job id immediately.
/// Callers poll `status` for the outcome.
#[derive(Clone)]
pub struct BillProcessor {
    bills: Arc<dyn BillStore>,
    jobs: Arc<dyn JobStore>,
    worker: BillWorker,
    config: EngineConfig,
}

impl BillProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bills: Arc<dyn BillStore>,
        table_sources: Arc<dyn TableSourceStore>,
        email_sources: Arc<dyn EmailSourceStore>,
        invoices: Arc<dyn InvoiceStore>,
        jobs: Arc<dyn JobStore>,
        gateway: Arc<dyn EmailGateway>,
        config: EngineConfig,
    ) -> Self {
        Self {
            bills,
            jobs,
            worker: BillWorker::new(table_sources, email_sources, invoices, gateway),
            config,
        }
    }

    /// Start a processing run for `period` (default: the previous calendar
    /// month). Fails with `Conflict` while another run is in progress.
    ///
    /// The in-progress check is check-then-act against the job store, not a
    /// mutex; two rapid-fire starts can both pass it. Accepted as a soft
    /// guard.
    pub async fn start(&self, period: Option<Period>) -> DomainResult<JobId> {
        let in_progress = self.jobs.count_in_progress().await?;
        if in_progress > 0 {
            return Err(DomainError::conflict("bill processing already in progress"));
        }

        let period = period.unwrap_or_else(|| Period::previous_month(Utc::now().date_naive()));
        let job = ProcessingJob::start(period);
        self.jobs.create(job.clone()).await?;

        // Both the fan-out and the supervisor observe the same completion
        // signal; terminal writes go through `finish_job` either way.
        let (done_tx, done_rx) = watch::channel(false);
        tokio::spawn(self.clone().run(job.clone(), done_tx));
        tokio::spawn(supervise(
            self.jobs.clone(),
            job.id,
            self.config.processing_timeout,
            done_rx,
        ));

        Ok(job.id)
    }

    /// Current status of a run.
    pub async fn status(&self, job_id: JobId) -> DomainResult<JobStatus> {
        Ok(self.jobs.find_by_id(job_id).await?.status)
    }

    /// Runs matching the status filter; all runs when `None`.
    pub async fn list(&self, status: Option<JobStatus>) -> DomainResult<Vec<ProcessingJob>> {
        self.jobs.find(status).await
    }

    async fn run(self, job: ProcessingJob, done_tx: watch::Sender<bool>) {
        tracing::info!(job_id = %job.id, period = %job.period, "bill processing started");

        let status = self.fan_out(&job).await;

        if let Err(e) = finish_job(self.jobs.as_ref(), job.id, status).await {
            tracing::error!(job_id = %job.id, error = %e, "failed to write terminal job status");
        }
        let _ = done_tx.send(true);
    }

    /// Execute one worker per active bill and fold their outcomes into the
    /// run's terminal status.
    async fn fan_out(&self, job: &ProcessingJob) -> JobStatus {
        let bills = match self.bills.find_active().await {
            Ok(bills) => bills,
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "failed to load active bills");
                return JobStatus::Error;
            }
        };

        let mut tasks = JoinSet::new();
        let mut task_bills: HashMap<tokio::task::Id, BillId> = HashMap::new();

        for bill in bills {
            let worker = self.worker.clone();
            let period = job.period;
            let bill_id = bill.id;
            let handle = tasks.spawn(async move {
                let outcome = worker.process_bill(&bill, period).await;
                (bill_id, outcome)
            });
            task_bills.insert(handle.id(), bill_id);
        }

        // Outcomes funnel through this single join loop; workers never
        // touch a shared collection.
        let mut failures: Vec<BillFailure> = Vec::new();
        let mut created = 0usize;
        let mut skipped = 0usize;

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, (_, Ok(WorkerOutcome::Created(_))))) => created += 1,
                Ok((_, (_, Ok(WorkerOutcome::Skipped)))) => skipped += 1,
                Ok((_, (bill_id, Err(error)))) => {
                    tracing::warn!(job_id = %job.id, %bill_id, %error, "bill processing failed");
                    failures.push(BillFailure { bill_id, error });
                }
                Err(join_error) => {
                    let bill_id = task_bills
                        .get(&join_error.id())
                        .copied()
                        .unwrap_or_else(BillId::new);
                    tracing::error!(job_id = %job.id, %bill_id, error = %join_error, "bill worker panicked");
                    failures.push(BillFailure {
                        bill_id,
                        error: DomainError::internal(join_error.to_string()),
                    });
                }
            }
        }

        if failures.is_empty() {
            tracing::info!(job_id = %job.id, created, skipped, "bill processing finished successfully");
            JobStatus::Success
        } else {
            tracing::warn!(
                job_id = %job.id,
                created,
                skipped,
                failed = failures.len(),
                failures = ?summarize(&failures),
                "bill processing finished with errors"
            );
            JobStatus::Error
        }
    }
}

/// One `bill id: error` line per failed bill, for the run's summary log.
fn summarize(failures: &[BillFailure]) -> Vec<String> {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.bill_id, f.error))
        .collect()
}

/// The single authoritative terminal-status setter.
///
/// Re-reads the job and writes only if it is still non-terminal, so a late
/// supervisor can never clobber a just-completed run (and vice versa).
/// Returns whether the write happened.
pub(crate) async fn finish_job(
    jobs: &dyn JobStore,
    job_id: JobId,
    status: JobStatus,
) -> DomainResult<bool> {
    let mut job = jobs.find_by_id(job_id).await?;
    if job.is_finished() {
        tracing::debug!(%job_id, current = %job.status, requested = %status, "job already terminal");
        return Ok(false);
    }
    job.finish(status);
    jobs.update(job).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use billkeeper_billing::{
        Bill, EmailValueSource, ExtractorKind, TableEntry, TableValueSource, ValueSourceKind,
    };
    use billkeeper_core::{Money, SourceId};
    use billkeeper_extract::EmailMessage;
    use chrono::NaiveDate;

    use crate::memory::{
        InMemoryBillStore, InMemoryEmailGateway, InMemoryEmailSourceStore, InMemoryInvoiceStore,
        InMemoryJobStore, InMemoryTableSourceStore, StoredEmail,
    };

    struct Fixture {
        bills: Arc<InMemoryBillStore>,
        table_sources: Arc<InMemoryTableSourceStore>,
        email_sources: Arc<InMemoryEmailSourceStore>,
        invoices: Arc<InMemoryInvoiceStore>,
        jobs: Arc<InMemoryJobStore>,
        gateway: Arc<InMemoryEmailGateway>,
        processor: BillProcessor,
    }

    fn fixture_with_timeout(timeout: Duration) -> Fixture {
        let bills = Arc::new(InMemoryBillStore::new());
        let table_sources = Arc::new(InMemoryTableSourceStore::new());
        let email_sources = Arc::new(InMemoryEmailSourceStore::new());
        let invoices = Arc::new(InMemoryInvoiceStore::new());
        let jobs = Arc::new(InMemoryJobStore::new());
        let gateway = Arc::new(InMemoryEmailGateway::new());
        let processor = BillProcessor::new(
            bills.clone(),
            table_sources.clone(),
            email_sources.clone(),
            invoices.clone(),
            jobs.clone(),
            gateway.clone(),
            EngineConfig::new(timeout),
        );
        Fixture {
            bills,
            table_sources,
            email_sources,
            invoices,
            jobs,
            gateway,
            processor,
        }
    }

    fn fixture() -> Fixture {
        fixture_with_timeout(Duration::from_secs(60))
    }

    fn period(y: i32, m: u32) -> Period {
        Period::new(y, m).unwrap()
    }

    async fn seed_table_bill(fx: &Fixture, name: &str, amount_cents: i64, p: Period) -> Bill {
        let source = TableValueSource::new(
            format!("{name} schedule"),
            vec![TableEntry {
                period: p,
                amount: Money::from_cents(amount_cents),
            }],
        )
        .unwrap();
        let source_id = source.id;
        fx.table_sources.insert(source).await;

        let bill = Bill::new(name, "Acme Utilities", ValueSourceKind::Table, source_id, 10).unwrap();
        fx.bills.insert(bill.clone()).await;
        bill
    }

    async fn wait_terminal(fx: &Fixture, job_id: JobId) -> JobStatus {
        for _ in 0..500 {
            let status = fx.processor.status(job_id).await.unwrap();
            if status.is_terminal() {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("job never reached a terminal status");
    }

    #[tokio::test(start_paused = true)]
    async fn run_over_zero_bills_succeeds_with_no_invoices() {
        let fx = fixture();

        let job_id = fx.processor.start(Some(period(2024, 1))).await.unwrap();
        assert_eq!(wait_terminal(&fx, job_id).await, JobStatus::Success);
        assert!(fx.invoices.all().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn table_bills_produce_one_unpaid_invoice_each() {
        let fx = fixture();
        let power = seed_table_bill(&fx, "Power", 12000, period(2024, 1)).await;
        let water = seed_table_bill(&fx, "Water", 8990, period(2024, 1)).await;

        let job_id = fx.processor.start(Some(period(2024, 1))).await.unwrap();
        assert_eq!(wait_terminal(&fx, job_id).await, JobStatus::Success);

        let power_invoices = fx.invoices.find_by_bill(power.id).await;
        assert_eq!(power_invoices.len(), 1);
        assert_eq!(power_invoices[0].amount, Money::from_cents(12000));
        assert_eq!(
            power_invoices[0].due_date,
            NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()
        );
        assert_eq!(fx.invoices.find_by_bill(water.id).await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn back_to_back_runs_replace_rather_than_accumulate() {
        let fx = fixture();
        let bill = seed_table_bill(&fx, "Power", 12000, period(2024, 1)).await;

        let first = fx.processor.start(Some(period(2024, 1))).await.unwrap();
        assert_eq!(wait_terminal(&fx, first).await, JobStatus::Success);
        let second = fx.processor.start(Some(period(2024, 1))).await.unwrap();
        assert_eq!(wait_terminal(&fx, second).await, JobStatus::Success);

        assert_eq!(fx.invoices.find_by_bill(bill.id).await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn one_failing_bill_fails_the_job_but_not_its_siblings() {
        let fx = fixture();
        let healthy = seed_table_bill(&fx, "Power", 12000, period(2024, 1)).await;

        // Bill whose value source does not exist.
        let broken = Bill::new(
            "Internet",
            "Missing Source Co",
            ValueSourceKind::Table,
            SourceId::new(),
            5,
        )
        .unwrap();
        fx.bills.insert(broken.clone()).await;

        let job_id = fx.processor.start(Some(period(2024, 1))).await.unwrap();
        assert_eq!(wait_terminal(&fx, job_id).await, JobStatus::Error);

        assert_eq!(fx.invoices.find_by_bill(healthy.id).await.len(), 1);
        assert!(fx.invoices.find_by_bill(broken.id).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn email_bill_resolves_amount_from_vendor_message() {
        let fx = fixture();
        let source = EmailValueSource::new(
            "billing@corsan.example",
            "Fatura",
            ExtractorKind::Corsan,
        )
        .unwrap();
        let source_id = source.id;
        fx.email_sources.insert(source).await;

        let bill = Bill::new("Water", "Corsan", ValueSourceKind::Email, source_id, 15).unwrap();
        fx.bills.insert(bill.clone()).await;

        fx.gateway
            .insert(StoredEmail {
                address: "billing@corsan.example".into(),
                subject: "Fatura disponível".into(),
                received: NaiveDate::from_ymd_opt(2024, 1, 18).unwrap(),
                message: EmailMessage {
                    id: "msg-1".into(),
                    snippet: "Prezado cliente, sua fatura referente ao mês de JANEIRO \
está disponível. Código do Imóvel: 123456 Vencimento: 15/2/2024 \
Valor: 89,905. Agradecemos a preferência."
                        .into(),
                },
            })
            .await;

        let job_id = fx.processor.start(Some(period(2024, 1))).await.unwrap();
        assert_eq!(wait_terminal(&fx, job_id).await, JobStatus::Success);

        let invoices = fx.invoices.find_by_bill(bill.id).await;
        assert_eq!(invoices.len(), 1);
        // 89.905 ceilings to 89.91.
        assert_eq!(invoices[0].amount, Money::from_cents(8991));
        assert_eq!(
            invoices[0].due_date,
            NaiveDate::from_ymd_opt(2024, 2, 15).unwrap()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_start_is_a_conflict() {
        let fx = fixture();

        // A run already sitting in Started state.
        fx.jobs
            .create(ProcessingJob::start(period(2024, 1)))
            .await
            .unwrap();

        let err = fx.processor.start(Some(period(2024, 1))).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn status_of_unknown_job_is_not_found() {
        let fx = fixture();
        let err = fx.processor.status(JobId::new()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let fx = fixture();

        let mut done = ProcessingJob::start(period(2024, 1));
        done.finish(JobStatus::Success);
        fx.jobs.create(done).await.unwrap();
        fx.jobs
            .create(ProcessingJob::start(period(2024, 2)))
            .await
            .unwrap();

        let all = fx.processor.list(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let started = fx.processor.list(Some(JobStatus::Started)).await.unwrap();
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].period, period(2024, 2));
    }

    #[test]
    fn failure_summary_names_each_failed_bill() {
        let first = BillId::new();
        let second = BillId::new();
        let failures = vec![
            BillFailure {
                bill_id: first,
                error: DomainError::not_found("table value source"),
            },
            BillFailure {
                bill_id: second,
                error: DomainError::unimplemented("value source kind 'api' has no resolver"),
            },
        ];

        let lines = summarize(&failures);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(&first.to_string()));
        assert!(lines[0].contains("table value source"));
        assert!(lines[1].starts_with(&second.to_string()));
        assert!(lines[1].contains("api"));
    }

    #[tokio::test(start_paused = true)]
    async fn finish_job_never_overwrites_a_terminal_status() {
        let fx = fixture();
        let job = ProcessingJob::start(period(2024, 1));
        let job_id = job.id;
        fx.jobs.create(job).await.unwrap();

        assert!(finish_job(fx.jobs.as_ref(), job_id, JobStatus::Success)
            .await
            .unwrap());
        assert!(!finish_job(fx.jobs.as_ref(), job_id, JobStatus::Timeout)
            .await
            .unwrap());
        assert_eq!(fx.processor.status(job_id).await.unwrap(), JobStatus::Success);
    }
}
