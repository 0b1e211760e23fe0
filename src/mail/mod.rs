//! Mail collaborator — listing, fetching, draft staging, label mutation.
//!
//! The trait is the seam the cycle runner depends on; `gmail::GmailClient`
//! is the production implementation. Authentication happens out of band —
//! implementations hold a ready credential.

pub mod gmail;
pub mod message;

use async_trait::async_trait;

use crate::error::MailError;
use message::MessageEnvelope;

/// Mail transport operations the triage pipeline needs.
#[async_trait]
pub trait MailClient: Send + Sync {
    /// Ids of up to `max` unread inbox messages, in provider order.
    async fn list_unread(&self, max: usize) -> Result<Vec<String>, MailError>;

    /// Full message (headers plus payload tree) for one id.
    async fn get_message(&self, id: &str) -> Result<MessageEnvelope, MailError>;

    /// Stage `raw_mime` (URL-safe base64 over an RFC 822 message) as a
    /// draft on the given thread. Returns the provider's draft id. The
    /// draft is never sent.
    async fn create_draft(&self, thread_id: &str, raw_mime: &str) -> Result<String, MailError>;

    /// Remove the unread marker from a message.
    async fn mark_read(&self, id: &str) -> Result<(), MailError>;
}
