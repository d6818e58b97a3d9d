//! Error taxonomy for the publishing run.
//!
//! Every component returns [`BotError`]; only `main` turns one into a process
//! exit status via [`BotError::exit_code`]. News retrieval and cover selection
//! recover locally and never surface these.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BotError>;

#[derive(Debug, Error)]
pub enum BotError {
    /// A required environment variable is absent or empty.
    #[error("{var} is not defined; set the environment variable before running")]
    MissingCredential { var: &'static str },

    #[error("configuration error: {0}")]
    Config(String),

    /// The backend rejected our credential.
    #[error("{service} authentication failed (status {status}); check the API key and its permissions")]
    Auth { service: &'static str, status: u16 },

    #[error("{service} returned unexpected status {status}: {body}")]
    UnexpectedStatus {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// Timeout, connection failure, TLS error.
    #[error("network error talking to {service}: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },

    /// A successful response lacked the fields we need.
    #[error("{service} response has an unexpected shape: {detail}")]
    MalformedResponse {
        service: &'static str,
        detail: String,
    },

    /// Application-level errors embedded in a GraphQL response.
    #[error("GraphQL error from {service}: {messages}")]
    GraphQl {
        service: &'static str,
        messages: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BotError {
    pub fn transport(service: &'static str, err: reqwest::Error) -> Self {
        BotError::Transport {
            service,
            message: err.to_string(),
        }
    }

    pub fn malformed(service: &'static str, detail: impl Into<String>) -> Self {
        BotError::MalformedResponse {
            service,
            detail: detail.into(),
        }
    }

    /// Process exit status for this failure.
    ///
    /// `2` for configuration problems, `3` for rejected credentials, `1` for
    /// everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            BotError::MissingCredential { .. } | BotError::Config(_) => 2,
            BotError::Auth { .. } => 3,
            _ => 1,
        }
    }
}

impl From<serde_yaml::Error> for BotError {
    fn from(err: serde_yaml::Error) -> Self {
        BotError::Config(err.to_string())
    }
}
