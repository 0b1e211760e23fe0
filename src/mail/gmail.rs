//! Gmail REST client.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use super::MailClient;
use super::message::MessageEnvelope;
use crate::error::MailError;

const API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Gmail-backed mail client. Holds a ready OAuth access token; the
/// interactive authorization flow is out of scope.
pub struct GmailClient {
    token: SecretString,
    client: reqwest::Client,
    base_url: String,
}

impl GmailClient {
    pub fn new(token: SecretString) -> Self {
        Self {
            token,
            client: reqwest::Client::new(),
            base_url: API_BASE.to_string(),
        }
    }

    fn bearer(&self) -> &str {
        self.token.expose_secret()
    }

    async fn check(
        response: reqwest::Response,
        operation: &str,
    ) -> Result<reqwest::Response, MailError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(MailError::Api {
            operation: operation.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DraftResponse {
    id: String,
}

#[async_trait]
impl MailClient for GmailClient {
    async fn list_unread(&self, max: usize) -> Result<Vec<String>, MailError> {
        let max = max.to_string();
        let response = self
            .client
            .get(format!("{}/messages", self.base_url))
            .bearer_auth(self.bearer())
            .query(&[
                ("labelIds", "INBOX"),
                ("q", "is:unread"),
                ("maxResults", max.as_str()),
            ])
            .send()
            .await?;

        let parsed: ListResponse = Self::check(response, "messages.list").await?.json().await?;
        Ok(parsed.messages.into_iter().map(|m| m.id).collect())
    }

    async fn get_message(&self, id: &str) -> Result<MessageEnvelope, MailError> {
        let response = self
            .client
            .get(format!("{}/messages/{id}", self.base_url))
            .bearer_auth(self.bearer())
            .query(&[("format", "full")])
            .send()
            .await?;

        Ok(Self::check(response, "messages.get").await?.json().await?)
    }

    async fn create_draft(&self, thread_id: &str, raw_mime: &str) -> Result<String, MailError> {
        let body = serde_json::json!({
            "message": { "raw": raw_mime, "threadId": thread_id }
        });

        let response = self
            .client
            .post(format!("{}/drafts", self.base_url))
            .bearer_auth(self.bearer())
            .json(&body)
            .send()
            .await?;

        let parsed: DraftResponse = Self::check(response, "drafts.create").await?.json().await?;
        debug!(draft_id = %parsed.id, thread_id = %thread_id, "Draft created");
        Ok(parsed.id)
    }

    async fn mark_read(&self, id: &str) -> Result<(), MailError> {
        let body = serde_json::json!({ "removeLabelIds": ["UNREAD"] });

        let response = self
            .client
            .post(format!("{}/messages/{id}/modify", self.base_url))
            .bearer_auth(self.bearer())
            .json(&body)
            .send()
            .await?;

        Self::check(response, "messages.modify").await?;
        Ok(())
    }
}
