//! Cycle runner — one fetch → classify → draft → mark-read pass over the
//! current batch of unread messages.
//!
//! Failures are message-scoped: one message's classification or draft
//! failure never aborts the rest of the cycle. Only fetch failures and a
//! broken template store escape to the supervisor.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::classify::Classifier;
use crate::draft::DraftPublisher;
use crate::error::{ClassifyError, Error, Result};
use crate::mail::MailClient;
use crate::mail::message::InboundEmail;

/// One unit of supervised work. The supervisor drives this seam; tests
/// substitute scripted implementations.
#[async_trait]
pub trait Cycle: Send + Sync {
    /// Run one pass, returning the number of messages for which a draft
    /// was staged.
    async fn run_cycle(&self) -> Result<usize>;
}

/// Production cycle: unread Gmail messages through classification into
/// reply drafts.
pub struct CycleRunner {
    mail: Arc<dyn MailClient>,
    classifier: Classifier,
    publisher: DraftPublisher,
    max_messages: usize,
}

impl CycleRunner {
    pub fn new(
        mail: Arc<dyn MailClient>,
        classifier: Classifier,
        publisher: DraftPublisher,
        max_messages: usize,
    ) -> Self {
        Self {
            mail,
            classifier,
            publisher,
            max_messages,
        }
    }

    /// Fetch up to `max_messages` unread messages as pipeline records,
    /// silently dropping those with no extractable plain-text body.
    /// Listing and retrieval failures propagate as cycle-level errors.
    async fn fetch_unread(&self) -> Result<Vec<InboundEmail>> {
        let ids = self.mail.list_unread(self.max_messages).await?;

        let mut emails = Vec::with_capacity(ids.len());
        for id in ids {
            let envelope = self.mail.get_message(&id).await?;
            match envelope.into_inbound() {
                Some(email) => emails.push(email),
                None => debug!(id = %id, "No plain-text body, skipping"),
            }
        }
        Ok(emails)
    }
}

#[async_trait]
impl Cycle for CycleRunner {
    async fn run_cycle(&self) -> Result<usize> {
        let emails = self.fetch_unread().await?;

        if emails.is_empty() {
            info!("No unread messages to triage");
            return Ok(0);
        }

        info!(count = emails.len(), "Triaging unread messages");

        let mut drafted = 0;
        for email in &emails {
            debug!(id = %email.id, sender = %email.sender, "Classifying message");

            let classification = match self
                .classifier
                .classify(&email.subject, &email.body)
                .await
            {
                Ok(c) => c,
                // A broken template store affects every message equally.
                Err(ClassifyError::Store(e)) => return Err(Error::Store(e)),
                Err(e) => {
                    warn!(
                        id = %email.id,
                        error = %e,
                        "Classification failed, leaving unread for retry"
                    );
                    continue;
                }
            };

            info!(
                id = %email.id,
                category = %classification.category,
                "Message classified"
            );

            let published = self
                .publisher
                .publish(
                    &email.thread_id,
                    &email.sender,
                    &classification.reply_subject,
                    &classification.reply_body,
                )
                .await;

            if !published {
                warn!(id = %email.id, "Draft not staged, leaving unread for retry");
                continue;
            }

            // Only a message with a staged draft loses its unread marker.
            self.mail.mark_read(&email.id).await?;
            drafted += 1;
        }

        Ok(drafted)
    }
}
