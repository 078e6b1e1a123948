//! HTTP feed source backed by a blocking [`reqwest`] client.

use std::time::Duration;

use reqwest::blocking::Client;

use super::{Fetch, Response};
use crate::error::FetchError;

/// Sent with every feed request.
pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/111.0.0.0 Safari/537.36";

/// Fetches feeds over HTTP with a fixed `User-Agent` and a request timeout.
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    /// Build the client once; it is reused for every request in every pass.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpSource {
    fn fetch(&self, url: &str) -> Result<Response, FetchError> {
        let response = self.client.get(url).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(Response::new(status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_timeout() {
        assert!(HttpSource::new(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn unreachable_host_is_a_fetch_error() {
        let source = HttpSource::new(Duration::from_secs(2)).unwrap();
        // Port 9 on localhost is the discard service; nothing listens there in CI.
        let err = source.fetch("http://127.0.0.1:9/feed").unwrap_err();
        assert!(err.to_string().starts_with("feed request failed"));
    }
}
