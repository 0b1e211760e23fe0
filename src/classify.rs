//! Classifier — asks the generation service to categorize a message and
//! draft a reply, memoizing the first template seen per category.
//!
//! Fail-closed: a malformed or missing response never mutates the store.
//! First-write-wins: once a category has a stored template, later
//! classifications for that category leave it untouched even when their
//! generated reply differs.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::ClassifyError;
use crate::llm::GenerationClient;
use crate::store::{ReplyTemplate, TemplateStore};

/// Classification outcome for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Open-ended category chosen by the model, not a fixed enumeration.
    /// Compared by exact string equality — "Billing" and "billing" are
    /// distinct categories (known limitation).
    pub category: String,
    pub reply_subject: String,
    pub reply_body: String,
}

/// Classifies messages and maintains the per-category template library.
pub struct Classifier {
    llm: Arc<dyn GenerationClient>,
    store: TemplateStore,
}

impl Classifier {
    pub fn new(llm: Arc<dyn GenerationClient>, store: TemplateStore) -> Self {
        Self { llm, store }
    }

    /// Classify one message and ensure its category has a stored template.
    ///
    /// The store is reloaded on every call rather than cached across calls.
    /// An empty body is still classified — subject-only is acceptable.
    pub async fn classify(
        &self,
        subject: &str,
        body: &str,
    ) -> Result<Classification, ClassifyError> {
        let mut templates = self.store.load().await?;

        let prompt = build_prompt(subject, body);
        let raw = self.llm.generate(&prompt).await?;

        let classification = parse_response(&raw).inspect_err(|e| {
            warn!(error = %e, "Discarding unparseable classification response");
        })?;

        if !templates.contains_key(&classification.category) {
            templates.insert(
                classification.category.clone(),
                ReplyTemplate {
                    subject: classification.reply_subject.clone(),
                    body: classification.reply_body.clone(),
                },
            );
            self.store.save(&templates).await?;
            info!(
                category = %classification.category,
                "New category discovered, template stored"
            );
        }

        Ok(classification)
    }
}

// ── Prompt construction ─────────────────────────────────────────────

fn build_prompt(subject: &str, body: &str) -> String {
    format!(
        "You are an email classification and reply assistant.\n\n\
         Analyze the email and choose the category that best describes it. Do not \
         limit yourself to predefined categories; invent a meaningful category name \
         if none fits.\n\n\
         Draft a professional reply and suggest a reply subject starting with \"Re:\".\n\n\
         Respond with ONLY a JSON object with exactly these fields:\n\
         {{\"category\": \"...\", \"reply_subject\": \"Re: ...\", \"reply_body\": \"...\"}}\n\n\
         Email Subject: {subject}\n\
         Email Body: {body}"
    )
}

// ── Response parsing ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawClassification {
    category: String,
    reply_subject: String,
    reply_body: String,
}

/// Parse the model's raw output into a `Classification`.
///
/// All three fields are required; a response missing any of them is rejected
/// wholesale rather than patched with defaults.
fn parse_response(raw: &str) -> Result<Classification, ClassifyError> {
    let json = extract_json_object(raw);

    let parsed: RawClassification = serde_json::from_str(&json)
        .map_err(|e| ClassifyError::Malformed(format!("JSON parse error: {e}")))?;

    if parsed.category.trim().is_empty() {
        return Err(ClassifyError::Malformed("empty category".into()));
    }

    Ok(Classification {
        category: parsed.category,
        reply_subject: parsed.reply_subject,
        reply_body: parsed.reply_body,
    })
}

/// Extract a JSON object from model output (handles markdown wrapping).
fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();

    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with('{') {
                return inner.to_string();
            }
        }
    }

    // Last resort: widest object bounds
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && end > start
    {
        return trimmed[start..=end].to_string();
    }

    trimmed.to_string()
}
