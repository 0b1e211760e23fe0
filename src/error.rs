//! Error types for inbox-triage.

/// Top-level error type for the daemon.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    #[error("Generation error: {0}")]
    Llm(#[from] LlmError),

    #[error("Template store error: {0}")]
    Store(#[from] StoreError),

    #[error("Classification error: {0}")]
    Classify(#[from] ClassifyError),
}

impl Error {
    /// Whether the poll supervisor should back off and retry after this
    /// error instead of terminating. Everything in current scope is a
    /// transient collaborator or I/O failure, so everything is retried;
    /// future variants can opt out here.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_)
            | Error::Mail(_)
            | Error::Llm(_)
            | Error::Store(_)
            | Error::Classify(_) => true,
        }
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Mail collaborator errors.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mail request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mail API rejected {operation} with status {status}: {body}")]
    Api {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Malformed message payload: {0}")]
    Decode(String),

    #[error("Invalid mail address {address}: {reason}")]
    Address { address: String, reason: String },

    #[error("Failed to build draft message: {0}")]
    Mime(String),
}

/// Generation collaborator errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Generation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Generation service returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Generation response contained no text")]
    EmptyResponse,
}

/// Template store errors. An absent backing file is not an error — the
/// store treats it as empty — but an unreadable or corrupt one is.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Template store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template store is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Classification errors. `Generation` and `Malformed` are message-scoped
/// (the message stays unread and is retried next cycle); `Store` means the
/// template file itself is broken and aborts the whole cycle.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("Generation call failed: {0}")]
    Generation(#[from] LlmError),

    #[error("Unparseable classification response: {0}")]
    Malformed(String),

    #[error("Template store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias for the daemon.
pub type Result<T> = std::result::Result<T, Error>;
