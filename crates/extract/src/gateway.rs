//! Email source gateway contract.
//!
//! The real mailbox (IMAP, Gmail API, ...) lives behind this trait; the
//! engine only needs search + fetch.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use billkeeper_core::DomainResult;

/// Opaque reference to a message returned by a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub id: String,
}

/// A fetched message. Only the snippet (free-text body preview) is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub id: String,
    pub snippet: String,
}

/// Searches and fetches vendor notification emails.
#[async_trait]
pub trait EmailGateway: Send + Sync {
    /// Messages from `address` matching `subject` within the date range.
    async fn search(
        &self,
        address: &str,
        subject: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<Vec<MessageRef>>;

    /// Full content of a single message.
    async fn fetch(&self, message_id: &str) -> DomainResult<EmailMessage>;
}
