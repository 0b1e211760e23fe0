//! Gmail message payload model and plain-text body extraction.

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::GeneralPurpose;
use base64::engine::{DecodePaddingMode, GeneralPurposeConfig};
use serde::Deserialize;

/// URL-safe base64 tolerant of both padded and unpadded input — Gmail emits
/// unpadded data but other producers pad.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// How deep into a nested multipart tree we search for a body part.
/// Bounded so a pathological payload cannot recurse without limit.
const MAX_PART_DEPTH: usize = 10;

// ── Wire types (Gmail `messages.get` format=full) ───────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEnvelope {
    pub id: String,
    pub thread_id: String,
    #[serde(default)]
    pub payload: MessagePart,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub body: PartBody,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartBody {
    #[serde(default)]
    pub data: Option<String>,
}

/// One unread message mapped to the fields the pipeline needs. Scoped to
/// the cycle that fetched it.
#[derive(Debug, Clone)]
pub struct InboundEmail {
    pub id: String,
    pub thread_id: String,
    pub subject: String,
    pub sender: String,
    pub body: String,
}

impl MessageEnvelope {
    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.payload
            .headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Map to the pipeline record. `None` when no plain-text body can be
    /// extracted — such messages cannot be classified meaningfully and are
    /// skipped upstream.
    pub fn into_inbound(self) -> Option<InboundEmail> {
        let subject = self.header("Subject").unwrap_or_default().to_string();
        let sender = self.header("From").unwrap_or_default().to_string();
        let body = extract_plain_text(&self.payload)?;

        Some(InboundEmail {
            id: self.id,
            thread_id: self.thread_id,
            subject,
            sender,
            body,
        })
    }
}

// ── Body extraction ─────────────────────────────────────────────────

/// Depth-first search for the first part matching `pred`, bounded to
/// `depth` levels of nesting.
pub fn find_part<'a, F>(parts: &'a [MessagePart], pred: &F, depth: usize) -> Option<&'a MessagePart>
where
    F: Fn(&MessagePart) -> bool,
{
    if depth == 0 {
        return None;
    }
    for part in parts {
        if pred(part) {
            return Some(part);
        }
        if let Some(found) = find_part(&part.parts, pred, depth - 1) {
            return Some(found);
        }
    }
    None
}

/// Plain-text body of a payload tree, base64-decoded.
///
/// Multipart messages yield their first `text/plain` part; single-part
/// messages yield the top-level body whatever its type. Returns `None` for
/// undecodable data or a blank body.
pub fn extract_plain_text(payload: &MessagePart) -> Option<String> {
    let data = if payload.parts.is_empty() {
        payload.body.data.as_deref()
    } else {
        let is_plain = |p: &MessagePart| p.mime_type == "text/plain" && p.body.data.is_some();
        find_part(&payload.parts, &is_plain, MAX_PART_DEPTH).and_then(|p| p.body.data.as_deref())
    }?;

    let bytes = URL_SAFE_LENIENT.decode(data).ok()?;
    let text = String::from_utf8_lossy(&bytes).into_owned();

    if text.trim().is_empty() { None } else { Some(text) }
}
