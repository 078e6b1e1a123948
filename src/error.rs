//! Error types shared by the feed source, the notifier, and the monitor.
//!
//! A failed check never stops the process.  [`CheckError`] is what the
//! monitor sees when a pass has to be aborted; whatever happened to the
//! diagnostic notification sent alongside it is logged, not returned.

use thiserror::Error;

/// Boxed transport failure (connection refused, timeout, undecodable body).
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// The feed request never produced a response.
#[derive(Debug, Error)]
#[error("feed request failed: {0}")]
pub struct FetchError(#[source] pub TransportError);

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        Self(Box::new(err))
    }
}

/// A feed body that is not well-formed markup, or whose items are incomplete.
#[derive(Debug, Error)]
#[error("malformed feed: {reason}")]
pub struct ParseError {
    pub reason: String,
    /// The raw body that failed to parse, kept for the diagnostic message.
    pub body: String,
}

impl ParseError {
    pub fn new(reason: impl Into<String>, body: &str) -> Self {
        Self {
            reason: reason.into(),
            body: body.to_string(),
        }
    }
}

/// Failures reported by the push gateway client.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The request could not be delivered or its reply could not be read.
    #[error("notify transport failed: {0}")]
    Transport(#[source] TransportError),

    /// The gateway answered with `success: false`.
    #[error("notify failed: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(Box::new(err))
    }
}

/// Why a single concert check failed.  Any of these aborts the current pass.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("`{url}` `{name}` {source}")]
    Fetch {
        url: String,
        name: String,
        #[source]
        source: FetchError,
    },

    #[error("`{url}` `{name}` query request failed: {status} {body}")]
    BadStatus {
        url: String,
        name: String,
        status: u16,
        body: String,
    },

    #[error("`{url}` `{name}` {source}")]
    Parse {
        url: String,
        name: String,
        #[source]
        source: ParseError,
    },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
