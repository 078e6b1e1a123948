//! Feed sources and the classifier that reads them.
//!
//! The monitor only knows about the [`Fetch`] trait: give it a URL, get back
//! a status code and a body.  [`HttpSource`] is the real implementation; the
//! tests in `monitor.rs` swap in scripted fakes.
//!
//! Deciding what a body *means* lives in [`feed`], which is pure and does no
//! I/O.

pub mod feed;
mod http;

pub use feed::{classify, FeedResult};
pub use http::HttpSource;

use crate::error::FetchError;

/// A feed response as seen by the monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Capability to retrieve a feed.
///
/// A non-200 status is not an error at this level; the caller decides what
/// to do with it.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<Response, FetchError>;
}
