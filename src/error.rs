//! Error types for the reqwest-agent-pool crate.

use thiserror::Error;

/// Boxed error type used to carry transport failures from any client.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced by agents and the pool.
#[derive(Debug, Error)]
pub enum Error {
    /// Operation attempted on a closed agent.
    #[error("agent is closed")]
    AgentClosed,

    /// The agent's rate gate had no token for this request.
    #[error("rate limit exceeded")]
    RateLimited,

    /// No candidate agent produced a terminal outcome.
    #[error("no healthy agents")]
    NoHealthyAgents,

    /// A management operation referenced an unknown agent name.
    #[error("agent {name} not found")]
    AgentNotFound { name: String },

    /// The caller's deadline expired mid-flight. Never retried.
    #[error("request cancelled")]
    Cancelled(#[source] BoxError),

    /// Network or protocol failure surfaced from the transport.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// The request body is streaming and cannot be buffered for replay.
    #[error("request body is streaming and cannot be replayed")]
    StreamingBody,

    /// Failed to read an endpoint list from disk.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the failure came from the caller's own deadline, in which
    /// case retrying with another agent is pointless.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // A timeout that is not a connect timeout is the caller's
        // per-request deadline. Connect timeouts stay retryable.
        if err.is_timeout() && !err.is_connect() {
            Error::Cancelled(Box::new(err))
        } else {
            Error::Transport(Box::new(err))
        }
    }
}
