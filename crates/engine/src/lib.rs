//! billkeeper-engine — the bill processing engine.
//!
//! Fans a processing run out over every active bill, resolves each bill's
//! amount from its value source, and replaces the corresponding unpaid
//! invoice. Runs are supervised: a run that never finishes is marked
//! `Timeout` instead of lingering in `Started` forever.

pub mod config;
pub mod memory;
pub mod processor;
pub mod resolver;
pub mod store;
pub mod supervisor;
pub mod worker;

pub use config::{EngineConfig, PROCESSING_TIMEOUT_ENV};
pub use processor::BillProcessor;
pub use store::{BillStore, EmailSourceStore, InvoiceStore, JobStore, TableSourceStore};
pub use worker::{BillWorker, WorkerOutcome};
