use std::sync::Arc;

use inbox_triage::classify::Classifier;
use inbox_triage::config::TriageConfig;
use inbox_triage::cycle::CycleRunner;
use inbox_triage::draft::DraftPublisher;
use inbox_triage::llm::{GeminiClient, GenerationClient};
use inbox_triage::mail::MailClient;
use inbox_triage::mail::gmail::GmailClient;
use inbox_triage::store::TemplateStore;
use inbox_triage::supervisor::{PollSupervisor, spawn_supervisor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = match TriageConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("  required: GEMINI_API_KEY, GMAIL_ACCESS_TOKEN, TRIAGE_FROM_ADDRESS");
            std::process::exit(1);
        }
    };

    eprintln!("📬 inbox-triage v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.gemini_model);
    eprintln!("   Templates: {}", config.template_path.display());
    eprintln!(
        "   Polling every {}s (backoff {}s). Ctrl-C to stop.\n",
        config.poll_interval.as_secs(),
        config.backoff_interval.as_secs()
    );

    let llm: Arc<dyn GenerationClient> = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
    ));
    let mail: Arc<dyn MailClient> = Arc::new(GmailClient::new(config.gmail_token.clone()));

    let store = TemplateStore::new(config.template_path.clone());
    let classifier = Classifier::new(llm, store);
    let publisher = DraftPublisher::new(Arc::clone(&mail), config.from_address.clone());
    let runner = CycleRunner::new(mail, classifier, publisher, config.max_messages);

    let supervisor = PollSupervisor::new(
        Arc::new(runner),
        config.poll_interval,
        config.backoff_interval,
    );
    let (handle, shutdown) = spawn_supervisor(supervisor);

    tokio::signal::ctrl_c().await?;
    eprintln!("\nShutting down...");

    let _ = shutdown.send(true);
    handle.await??;

    Ok(())
}
