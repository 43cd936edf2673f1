//! `billkeeper-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod money;
pub mod period;

pub use error::{DomainError, DomainResult};
pub use id::{BillId, InvoiceId, JobId, SourceId};
pub use money::Money;
pub use period::Period;
