//! Draft publisher — stages a reply as a provider-side draft for human
//! review. Nothing in this module ever sends mail.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use lettre::Message;
use lettre::message::header::ContentType;
use tracing::{info, warn};

use crate::error::MailError;
use crate::mail::MailClient;

/// Builds single-part reply messages and stages them as drafts.
pub struct DraftPublisher {
    mail: Arc<dyn MailClient>,
    from_address: String,
}

impl DraftPublisher {
    pub fn new(mail: Arc<dyn MailClient>, from_address: impl Into<String>) -> Self {
        Self {
            mail,
            from_address: from_address.into(),
        }
    }

    /// Stage a reply draft on `thread_id` addressed to `recipient`.
    ///
    /// Never propagates a transport error: every failure path is logged and
    /// reported as `false` so the caller leaves the source message unread.
    pub async fn publish(
        &self,
        thread_id: &str,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> bool {
        let raw = match build_reply_mime(&self.from_address, recipient, subject, body) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(recipient = %recipient, error = %e, "Could not build draft message");
                return false;
            }
        };

        match self.mail.create_draft(thread_id, &raw).await {
            Ok(draft_id) => {
                info!(
                    draft_id = %draft_id,
                    recipient = %recipient,
                    "Reply staged as draft for review"
                );
                true
            }
            Err(e) => {
                warn!(recipient = %recipient, error = %e, "Could not create draft");
                false
            }
        }
    }
}

/// Single-part `text/plain` reply, URL-safe base64 over the RFC 822 bytes
/// as the drafts API expects.
fn build_reply_mime(
    from: &str,
    to: &str,
    subject: &str,
    body: &str,
) -> Result<String, MailError> {
    let message = Message::builder()
        .from(from.parse().map_err(|e| MailError::Address {
            address: from.to_string(),
            reason: format!("{e}"),
        })?)
        .to(to.parse().map_err(|e| MailError::Address {
            address: to.to_string(),
            reason: format!("{e}"),
        })?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| MailError::Mime(e.to_string()))?;

    Ok(URL_SAFE.encode(message.formatted()))
}
