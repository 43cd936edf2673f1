//! `billkeeper-billing` — domain entities for bills, invoices, value sources
//! and processing jobs.

pub mod bill;
pub mod invoice;
pub mod job;
pub mod source;

pub use bill::{Bill, BillStatus, ValueSourceKind};
pub use invoice::{Invoice, InvoiceStatus};
pub use job::{JobStatus, ProcessingJob};
pub use source::{EmailValueSource, ExtractorKind, SourceStatus, TableEntry, TableValueSource};
