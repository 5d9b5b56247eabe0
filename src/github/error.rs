//! Error types for GitHub App authentication and status reporting.

use thiserror::Error;

/// Errors that can occur while talking to GitHub on behalf of a pipeline run.
///
/// Every variant is terminal for the call that produced it. Nothing in this
/// crate retries; callers decide whether a fresh attempt makes sense.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// The App private key could not be parsed as an RSA PEM key.
    #[error("failed to parse private key: {0}")]
    KeyParse(#[source] jsonwebtoken::errors::Error),

    /// The JWT could not be signed with the parsed key.
    #[error("failed to sign app token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// GitHub answered with a non-success HTTP status (>= 300).
    #[error("non-OK HTTP status from {url}: {status}")]
    Transport { url: String, status: u16 },

    /// Network-level failure before a response was received.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A response was missing a field the protocol requires.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A response body could not be decoded.
    #[error("failed to decode GitHub response: {0}")]
    Decode(#[from] serde_json::Error),

    /// No credentials are configured on the provider client.
    #[error("cannot set status on GitHub: no token or URL set")]
    NotAuthenticated,

    /// The in-flight call was aborted by an external cancellation.
    #[error("request cancelled")]
    Cancelled,
}

impl GitHubError {
    /// Create a transport error from a URL and status code.
    pub fn transport(url: impl Into<String>, status: u16) -> Self {
        Self::Transport {
            url: url.into(),
            status,
        }
    }

    /// HTTP status carried by a [`GitHubError::Transport`] error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
