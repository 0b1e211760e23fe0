//! End-to-end pipeline tests: scripted mail and generation collaborators
//! driving the real classifier, draft publisher and cycle runner.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;

use inbox_triage::classify::Classifier;
use inbox_triage::cycle::{Cycle, CycleRunner};
use inbox_triage::draft::DraftPublisher;
use inbox_triage::error::{Error, LlmError, MailError};
use inbox_triage::llm::GenerationClient;
use inbox_triage::mail::MailClient;
use inbox_triage::mail::message::{Header, MessageEnvelope, MessagePart, PartBody};
use inbox_triage::store::TemplateStore;

// ── Scripted collaborators ──────────────────────────────────────────

struct FakeMailbox {
    messages: Vec<MessageEnvelope>,
    read: Mutex<Vec<String>>,
    drafts: Mutex<Vec<(String, String)>>,
    fail_draft_threads: Vec<String>,
    fail_listing: bool,
    fail_mark_read: bool,
}

impl FakeMailbox {
    fn new(messages: Vec<MessageEnvelope>) -> Self {
        Self {
            messages,
            read: Mutex::new(Vec::new()),
            drafts: Mutex::new(Vec::new()),
            fail_draft_threads: Vec::new(),
            fail_listing: false,
            fail_mark_read: false,
        }
    }

    fn read_ids(&self) -> Vec<String> {
        self.read.lock().unwrap().clone()
    }

    fn draft_count(&self) -> usize {
        self.drafts.lock().unwrap().len()
    }
}

#[async_trait]
impl MailClient for FakeMailbox {
    async fn list_unread(&self, max: usize) -> Result<Vec<String>, MailError> {
        if self.fail_listing {
            return Err(MailError::Api {
                operation: "messages.list".into(),
                status: 503,
                body: "unavailable".into(),
            });
        }
        Ok(self
            .messages
            .iter()
            .take(max)
            .map(|m| m.id.clone())
            .collect())
    }

    async fn get_message(&self, id: &str) -> Result<MessageEnvelope, MailError> {
        self.messages
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| MailError::Decode(format!("no such message: {id}")))
    }

    async fn create_draft(&self, thread_id: &str, raw_mime: &str) -> Result<String, MailError> {
        if self.fail_draft_threads.iter().any(|t| t == thread_id) {
            return Err(MailError::Api {
                operation: "drafts.create".into(),
                status: 400,
                body: "rejected".into(),
            });
        }
        let mut drafts = self.drafts.lock().unwrap();
        drafts.push((thread_id.to_string(), raw_mime.to_string()));
        Ok(format!("draft-{}", drafts.len()))
    }

    async fn mark_read(&self, id: &str) -> Result<(), MailError> {
        if self.fail_mark_read {
            return Err(MailError::Api {
                operation: "messages.modify".into(),
                status: 500,
                body: "label mutation failed".into(),
            });
        }
        self.read.lock().unwrap().push(id.to_string());
        Ok(())
    }
}

struct ScriptedLlm {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<usize>,
}

impl ScriptedLlm {
    fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(0),
        }
    }

    fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl GenerationClient for ScriptedLlm {
    async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
        *self.calls.lock().unwrap() += 1;
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(LlmError::EmptyResponse)
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

fn envelope(id: &str, thread: &str, subject: &str, from: &str, body: Option<&str>) -> MessageEnvelope {
    MessageEnvelope {
        id: id.to_string(),
        thread_id: thread.to_string(),
        payload: MessagePart {
            mime_type: "text/plain".to_string(),
            headers: vec![
                Header {
                    name: "Subject".to_string(),
                    value: subject.to_string(),
                },
                Header {
                    name: "From".to_string(),
                    value: from.to_string(),
                },
            ],
            body: PartBody {
                data: body.map(|b| URL_SAFE.encode(b)),
            },
            parts: Vec::new(),
        },
    }
}

fn response(category: &str, body: &str) -> String {
    format!(
        r#"{{"category": "{category}", "reply_subject": "Re: {category}", "reply_body": "{body}"}}"#
    )
}

fn runner(
    mailbox: Arc<FakeMailbox>,
    llm: Arc<ScriptedLlm>,
    store: TemplateStore,
) -> CycleRunner {
    let llm: Arc<dyn GenerationClient> = llm;
    let classifier = Classifier::new(llm, store);
    let mail: Arc<dyn MailClient> = mailbox;
    let publisher = DraftPublisher::new(Arc::clone(&mail), "me@example.com");
    CycleRunner::new(mail, classifier, publisher, 10)
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn full_pipeline_drafts_and_marks_read() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox = Arc::new(FakeMailbox::new(vec![
        envelope("m1", "t1", "Invoice #123", "alice@example.com", Some("please pay")),
        envelope("m2", "t2", "Broken login", "bob@example.com", Some("cannot sign in")),
    ]));
    let llm = Arc::new(ScriptedLlm::new(vec![
        response("Billing", "We will process your invoice."),
        response("Support", "We are looking into it."),
    ]));
    let store = TemplateStore::new(dir.path().join("templates.json"));

    let runner = runner(Arc::clone(&mailbox), llm, store.clone());
    let drafted = runner.run_cycle().await.unwrap();

    assert_eq!(drafted, 2);
    assert_eq!(mailbox.read_ids(), vec!["m1", "m2"]);
    assert_eq!(mailbox.draft_count(), 2);

    // Drafts carry the generated reply, addressed back to the sender.
    let drafts = mailbox.drafts.lock().unwrap();
    assert_eq!(drafts[0].0, "t1");
    let mime = String::from_utf8(URL_SAFE.decode(&drafts[0].1).unwrap()).unwrap();
    assert!(mime.contains("alice@example.com"));
    assert!(mime.contains("Subject: Re: Billing"));
    assert!(mime.contains("We will process your invoice."));
    drop(drafts);

    // Both categories were memoized.
    let templates = store.load().await.unwrap();
    assert_eq!(templates.len(), 2);
    assert!(templates.contains_key("Billing"));
    assert!(templates.contains_key("Support"));
}

#[tokio::test]
async fn one_bad_message_does_not_abort_the_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox = Arc::new(FakeMailbox::new(vec![
        envelope("m1", "t1", "a", "a@example.com", Some("first")),
        envelope("m2", "t2", "b", "b@example.com", Some("second")),
        envelope("m3", "t3", "c", "c@example.com", Some("third")),
    ]));
    let llm = Arc::new(ScriptedLlm::new(vec![
        response("A", "reply a"),
        "this is not machine-parseable".to_string(),
        response("C", "reply c"),
    ]));
    let store = TemplateStore::new(dir.path().join("templates.json"));

    let runner = runner(Arc::clone(&mailbox), llm, store);
    let drafted = runner.run_cycle().await.unwrap();

    assert_eq!(drafted, 2);
    // The failing message keeps its unread marker for the next cycle.
    assert_eq!(mailbox.read_ids(), vec!["m1", "m3"]);
}

#[tokio::test]
async fn failed_draft_leaves_message_unread() {
    let dir = tempfile::tempdir().unwrap();
    let mut mailbox = FakeMailbox::new(vec![envelope(
        "m1",
        "t1",
        "Invoice",
        "alice@example.com",
        Some("please pay"),
    )]);
    mailbox.fail_draft_threads = vec!["t1".to_string()];
    let mailbox = Arc::new(mailbox);

    let llm = Arc::new(ScriptedLlm::new(vec![response("Billing", "reply")]));
    let store = TemplateStore::new(dir.path().join("templates.json"));

    let runner = runner(Arc::clone(&mailbox), llm, store);
    let drafted = runner.run_cycle().await.unwrap();

    assert_eq!(drafted, 0);
    assert!(mailbox.read_ids().is_empty());
    assert_eq!(mailbox.draft_count(), 0);
}

#[tokio::test]
async fn messages_without_plain_text_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox = Arc::new(FakeMailbox::new(vec![
        envelope("m1", "t1", "no body", "a@example.com", None),
        envelope("m2", "t2", "has body", "b@example.com", Some("hello")),
    ]));
    let llm = Arc::new(ScriptedLlm::new(vec![response("Greeting", "hi")]));
    let store = TemplateStore::new(dir.path().join("templates.json"));

    let runner = runner(Arc::clone(&mailbox), Arc::clone(&llm), store);
    let drafted = runner.run_cycle().await.unwrap();

    assert_eq!(drafted, 1);
    // The body-less message never reached the generation service.
    assert_eq!(llm.call_count(), 1);
    assert_eq!(mailbox.read_ids(), vec!["m2"]);
}

#[tokio::test]
async fn listing_failure_escapes_as_cycle_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut mailbox = FakeMailbox::new(Vec::new());
    mailbox.fail_listing = true;

    let llm = Arc::new(ScriptedLlm::new(Vec::new()));
    let store = TemplateStore::new(dir.path().join("templates.json"));

    let runner = runner(Arc::new(mailbox), llm, store);
    let err = runner.run_cycle().await.unwrap_err();
    assert!(matches!(err, Error::Mail(_)));
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn mark_read_failure_escapes_after_draft_is_staged() {
    let dir = tempfile::tempdir().unwrap();
    let mut mailbox = FakeMailbox::new(vec![envelope(
        "m1",
        "t1",
        "Invoice",
        "alice@example.com",
        Some("please pay"),
    )]);
    mailbox.fail_mark_read = true;
    let mailbox = Arc::new(mailbox);

    let llm = Arc::new(ScriptedLlm::new(vec![response("Billing", "reply")]));
    let store = TemplateStore::new(dir.path().join("templates.json"));

    let runner = runner(Arc::clone(&mailbox), llm, store);
    let err = runner.run_cycle().await.unwrap_err();

    // The draft made it out before the label mutation failed; the error is
    // cycle-level, not a silent per-message skip.
    assert!(matches!(err, Error::Mail(_)));
    assert_eq!(mailbox.draft_count(), 1);
    assert!(mailbox.read_ids().is_empty());
}

#[tokio::test]
async fn corrupt_template_store_aborts_the_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("templates.json");
    tokio::fs::write(&path, b"{not json").await.unwrap();

    let mailbox = Arc::new(FakeMailbox::new(vec![
        envelope("m1", "t1", "Invoice", "alice@example.com", Some("please pay")),
        envelope("m2", "t2", "Help", "bob@example.com", Some("login broken")),
    ]));
    let llm = Arc::new(ScriptedLlm::new(vec![
        response("Billing", "reply"),
        response("Support", "reply"),
    ]));

    let runner = runner(Arc::clone(&mailbox), llm, TemplateStore::new(path));
    let err = runner.run_cycle().await.unwrap_err();

    // A broken store affects every message equally, so nothing is drafted
    // or marked read.
    assert!(matches!(err, Error::Store(_)));
    assert_eq!(mailbox.draft_count(), 0);
    assert!(mailbox.read_ids().is_empty());
}

#[tokio::test]
async fn templates_are_first_write_wins_across_cycles() {
    let dir = tempfile::tempdir().unwrap();
    let store = TemplateStore::new(dir.path().join("templates.json"));

    let first_mailbox = Arc::new(FakeMailbox::new(vec![envelope(
        "m1", "t1", "Invoice #1", "a@example.com", Some("pay me"),
    )]));
    let first_llm = Arc::new(ScriptedLlm::new(vec![response("Billing", "original reply")]));
    runner(first_mailbox, first_llm, store.clone())
        .run_cycle()
        .await
        .unwrap();

    let second_mailbox = Arc::new(FakeMailbox::new(vec![envelope(
        "m2", "t2", "Invoice #2", "b@example.com", Some("pay me too"),
    )]));
    let second_llm = Arc::new(ScriptedLlm::new(vec![response("Billing", "different reply")]));
    runner(second_mailbox, second_llm, store.clone())
        .run_cycle()
        .await
        .unwrap();

    let templates = store.load().await.unwrap();
    assert_eq!(templates.len(), 1);
    assert_eq!(templates["Billing"].body, "original reply");
}
