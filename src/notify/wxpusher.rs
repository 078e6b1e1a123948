//! WxPusher gateway client.
//!
//! Messages are posted as JSON and rendered by the gateway as Markdown
//! (`contentType: 3`).  The gateway always answers `200` with a
//! `{ "success": bool, "msg": string }` envelope, so delivery failures have to
//! be read out of the body rather than the status code.

use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::Notify;
use crate::config::PushConfig;
use crate::error::NotifyError;

pub const DEFAULT_ENDPOINT: &str = "https://wxpusher.zjiecode.com/api/send/message";

/// Longest summary the gateway shows in the message list.
const SUMMARY_CHARS: usize = 100;

/// Markdown.
const CONTENT_TYPE_MARKDOWN: u8 = 3;

/// Request body for `POST /api/send/message`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload<'a> {
    pub app_token: &'a str,
    pub content: &'a str,
    pub summary: String,
    pub content_type: u8,
    pub topic_ids: &'a [u64],
    pub uids: &'a [String],
    pub url: &'a str,
    pub verify_pay: bool,
}

#[derive(Debug, Deserialize)]
struct Reply {
    success: bool,
    #[serde(default)]
    msg: String,
}

impl Reply {
    fn into_result(self) -> Result<(), NotifyError> {
        if self.success {
            Ok(())
        } else {
            Err(NotifyError::Rejected(self.msg))
        }
    }
}

/// First [`SUMMARY_CHARS`] characters of `message`, cut on a char boundary.
pub fn summarize(message: &str) -> String {
    message.chars().take(SUMMARY_CHARS).collect()
}

pub struct WxPusher {
    client: Client,
    endpoint: String,
    app_token: String,
    topic_ids: Vec<u64>,
    uids: Vec<String>,
}

impl WxPusher {
    pub fn new(config: &PushConfig, timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            app_token: config.app_token.clone(),
            topic_ids: config.topic_ids.clone(),
            uids: config.uids.clone(),
        })
    }

    /// Build the request body for `message`.  Pure, so it is testable offline.
    pub fn payload<'a>(&'a self, message: &'a str) -> Payload<'a> {
        Payload {
            app_token: &self.app_token,
            content: message,
            summary: summarize(message),
            content_type: CONTENT_TYPE_MARKDOWN,
            topic_ids: &self.topic_ids,
            uids: &self.uids,
            url: "",
            verify_pay: false,
        }
    }
}

impl Notify for WxPusher {
    fn notify(&self, message: &str) -> Result<(), NotifyError> {
        debug!("pushing {} chars to {}", message.chars().count(), self.endpoint);
        let reply: Reply = self
            .client
            .post(&self.endpoint)
            .json(&self.payload(message))
            .send()?
            .json()?;
        reply.into_result()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn pusher() -> WxPusher {
        let config = PushConfig {
            app_token: "AT_test".into(),
            topic_ids: vec![42],
            uids: vec!["UID_a".into(), "UID_b".into()],
            endpoint: DEFAULT_ENDPOINT.into(),
        };
        WxPusher::new(&config, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn short_message_summary_is_the_whole_message() {
        let msg = "`Show` is out.";
        assert_eq!(summarize(msg), msg);
    }

    #[test]
    fn long_message_summary_is_a_100_char_prefix() {
        let msg = "x".repeat(250);
        let summary = summarize(&msg);
        assert_eq!(summary.chars().count(), 100);
        assert!(msg.starts_with(&summary));
    }

    #[test]
    fn summary_counts_characters_not_bytes() {
        let msg = "音乐会".repeat(50);
        let summary = summarize(&msg);
        assert_eq!(summary.chars().count(), 100);
        assert!(msg.starts_with(&summary));
    }

    #[test]
    fn payload_matches_gateway_schema() {
        let pusher = pusher();
        let json = serde_json::to_value(pusher.payload("hello")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "appToken": "AT_test",
                "content": "hello",
                "summary": "hello",
                "contentType": 3,
                "topicIds": [42],
                "uids": ["UID_a", "UID_b"],
                "url": "",
                "verifyPay": false,
            })
        );
    }

    #[test]
    fn successful_reply_is_ok() {
        let reply: Reply = serde_json::from_str(r#"{"success":true,"msg":"ok","code":1000}"#).unwrap();
        assert!(reply.into_result().is_ok());
    }

    #[test]
    fn failed_reply_is_rejected_with_reason() {
        let reply: Reply = serde_json::from_str(r#"{"success":false,"msg":"bad token"}"#).unwrap();
        match reply.into_result() {
            Err(NotifyError::Rejected(reason)) => assert_eq!(reason, "bad token"),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn unreachable_gateway_is_a_transport_error() {
        let config = PushConfig {
            app_token: "AT_test".into(),
            topic_ids: vec![],
            uids: vec!["UID_a".into()],
            endpoint: "http://127.0.0.1:9/api/send/message".into(),
        };
        let pusher = WxPusher::new(&config, Duration::from_secs(2)).unwrap();
        assert!(matches!(pusher.notify("hi"), Err(NotifyError::Transport(_))));
    }
}
