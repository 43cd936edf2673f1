//! `billkeeper-extract` — vendor email scraping.
//!
//! Contains the email gateway contract and the anchor-text value extractors.
//! Extractors are pure text parsers: given a message body they produce the
//! owed amount plus due metadata. Parsing is anchored to the vendor's exact
//! wording; a template change fails loudly, naming the missing label or
//! unparseable field.

pub mod corsan;
pub mod cpfl;
pub mod extractor;
pub mod gateway;
pub mod month;

pub use extractor::{extractor_for, ExtractedCharge, ValueExtractor};
pub use gateway::{EmailGateway, EmailMessage, MessageRef};
