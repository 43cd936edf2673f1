//! Bill processing job record and status lifecycle.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use billkeeper_core::{DomainError, JobId, Period};

/// Processing run status.
///
/// Lifecycle: `Started` transitions exactly once to exactly one terminal
/// state. Terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Started,
    Success,
    Error,
    Timeout,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Error | JobStatus::Timeout)
    }

    pub fn name(&self) -> &'static str {
        match self {
            JobStatus::Started => "started",
            JobStatus::Success => "success",
            JobStatus::Error => "error",
            JobStatus::Timeout => "timeout",
        }
    }
}

impl FromStr for JobStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "started" => Ok(JobStatus::Started),
            "success" => Ok(JobStatus::Success),
            "error" => Ok(JobStatus::Error),
            "timeout" => Ok(JobStatus::Timeout),
            other => Err(DomainError::validation(format!(
                "invalid job status name: {other:?}"
            ))),
        }
    }
}

impl core::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// One record per processing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingJob {
    pub id: JobId,
    /// The calendar month this run computes amounts for.
    pub period: Period,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProcessingJob {
    /// Create a run in `Started` state for the given processing period.
    pub fn start(period: Period) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            period,
            status: JobStatus::Started,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move to a terminal status, refreshing `updated_at`.
    pub fn finish(&mut self, status: JobStatus) {
        debug_assert!(status.is_terminal());
        self.status = status;
        self.updated_at = Utc::now();
    }
}
