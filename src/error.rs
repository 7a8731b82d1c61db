//! Error types for the update pipeline.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The supplied string is not an IPv6 address
    #[error("Invalid IPv6 address: {input}")]
    InvalidAddress { input: String },

    /// The `ip` command failed or its output held no usable address
    #[error("External command error: {0}")]
    ExternalCommand(String),

    /// Non-success HTTP status or `success: false` from the provider
    #[error("{}", remote_message(.context, .status, .body))]
    Remote {
        context: String,
        status: Option<u16>,
        body: String,
    },

    /// Zone or record absent at the provider
    #[error("{0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

fn remote_message(context: &str, status: &Option<u16>, body: &str) -> String {
    match status {
        Some(code) => format!("{}: {}, {}", context, code, body),
        None => format!("{}: {}", context, body),
    }
}

impl Error {
    pub fn invalid_address(input: impl Into<String>) -> Self {
        Self::InvalidAddress {
            input: input.into(),
        }
    }

    pub fn external_command(msg: impl Into<String>) -> Self {
        Self::ExternalCommand(msg.into())
    }

    pub fn remote(context: impl Into<String>, status: Option<u16>, body: impl Into<String>) -> Self {
        Self::Remote {
            context: context.into(),
            status,
            body: body.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Whether a retry might succeed: transport failures, 5xx and 429.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(e) => !e.is_decode() && !e.is_builder(),
            Error::Remote {
                status: Some(code), ..
            } => *code >= 500 || *code == 429,
            _ => false,
        }
    }
}
