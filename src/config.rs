//! Configuration file loading and validation.
//!
//! Everything the monitor needs is read from one JSON file:
//!
//! ```json
//! {
//!   "concerts": [{ "name": "New Year Gala", "url": "https://example.com/rss" }],
//!   "wx_push": { "app_token": "AT_xxx", "topic_ids": [123], "uids": [] },
//!   "timeout": 10,
//!   "duration": {
//!     "inner": { "type": "fixed", "len": 5 },
//!     "outer": { "type": "gamma", "k": 2.0, "theta": 30.0 }
//!   }
//! }
//! ```
//!
//! [`Config::load`] rejects anything the monitor could not run with, so the
//! rest of the program never has to re-check these values.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::delay::DelaySpec;
use crate::notify::DEFAULT_ENDPOINT;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// One watched concert.  The feed URL doubles as its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Concert {
    pub name: String,
    pub url: String,
}

impl Concert {
    pub fn id(&self) -> &str {
        &self.url
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PushConfig {
    pub app_token: String,
    #[serde(default)]
    pub topic_ids: Vec<u64>,
    #[serde(default)]
    pub uids: Vec<String>,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

/// The two pacing delays.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DurationConfig {
    /// Between two concerts within a pass.
    pub inner: DelaySpec,
    /// Between two passes.
    pub outer: DelaySpec,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub concerts: Vec<Concert>,
    pub wx_push: PushConfig,
    /// Network timeout in seconds, shared by feed requests and pushes.
    pub timeout: f64,
    pub duration: DurationConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Network timeout.  Falls back to `Duration::MAX` only for values that
    /// [`Config::load`] would already have rejected.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout).unwrap_or(Duration::MAX)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.concerts.is_empty() {
            return Err(invalid("`concerts` must list at least one concert"));
        }

        let mut seen = HashSet::new();
        for concert in &self.concerts {
            if concert.name.trim().is_empty() {
                return Err(invalid(format!("concert `{}` has an empty name", concert.url)));
            }
            match reqwest::Url::parse(&concert.url) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                _ => {
                    return Err(invalid(format!(
                        "concert `{}` has an invalid url `{}`",
                        concert.name, concert.url
                    )))
                }
            }
            if !seen.insert(concert.id()) {
                return Err(invalid(format!("concert url `{}` is listed twice", concert.url)));
            }
        }

        if self.timeout <= 0.0 || Duration::try_from_secs_f64(self.timeout).is_err() {
            return Err(invalid(format!("`timeout` must be > 0 seconds, got {}", self.timeout)));
        }

        for (label, spec) in [("inner", &self.duration.inner), ("outer", &self.duration.outer)] {
            spec.build()
                .map_err(|e| invalid(format!("`duration.{label}`: {e}")))?;
        }

        let push = &self.wx_push;
        if push.app_token.trim().is_empty() {
            return Err(invalid("`wx_push.app_token` is empty"));
        }
        if push.topic_ids.is_empty() && push.uids.is_empty() {
            return Err(invalid("`wx_push` needs at least one topic id or uid"));
        }
        if reqwest::Url::parse(&push.endpoint).is_err() {
            return Err(invalid(format!("`wx_push.endpoint` is not a url: {}", push.endpoint)));
        }

        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "concerts": [
            { "name": "New Year Gala", "url": "https://example.com/gala/rss" },
            { "name": "Spring Recital", "url": "https://example.com/spring/rss" }
        ],
        "wx_push": { "app_token": "AT_x", "topic_ids": [123], "uids": ["UID_y"] },
        "timeout": 10,
        "duration": {
            "inner": { "type": "fixed", "len": 5 },
            "outer": { "type": "gamma", "k": 2.0, "theta": 30.0 }
        }
    }"#;

    fn sample_with(patch: impl FnOnce(&mut serde_json::Value)) -> String {
        let mut value: serde_json::Value = serde_json::from_str(SAMPLE).unwrap();
        patch(&mut value);
        value.to_string()
    }

    fn assert_invalid(text: &str) {
        match Config::from_json(text) {
            Err(ConfigError::Invalid(_)) => {}
            other => panic!("expected invalid config, got {other:?}"),
        }
    }

    #[test]
    fn parses_sample() {
        let config = Config::from_json(SAMPLE).unwrap();
        assert_eq!(config.concerts.len(), 2);
        assert_eq!(config.concerts[0].id(), "https://example.com/gala/rss");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.duration.inner, DelaySpec::Fixed { len: 5.0 });
        assert_eq!(config.duration.outer, DelaySpec::Gamma { k: 2.0, theta: 30.0 });
        assert_eq!(config.wx_push.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.concerts[1].name, "Spring Recital");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_json_is_json_error() {
        assert!(matches!(Config::from_json("{"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let text = sample_with(|v| v["timeot"] = serde_json::json!(5));
        assert!(matches!(Config::from_json(&text), Err(ConfigError::Json(_))));
    }

    #[test]
    fn rejects_non_positive_gamma() {
        assert_invalid(&sample_with(|v| v["duration"]["outer"]["k"] = serde_json::json!(0)));
        assert_invalid(&sample_with(|v| v["duration"]["outer"]["theta"] = serde_json::json!(-1.0)));
    }

    #[test]
    fn rejects_negative_fixed_length() {
        assert_invalid(&sample_with(|v| v["duration"]["inner"]["len"] = serde_json::json!(-0.5)));
    }

    #[test]
    fn rejects_zero_timeout() {
        assert_invalid(&sample_with(|v| v["timeout"] = serde_json::json!(0)));
    }

    #[test]
    fn rejects_fixed_length_too_large_for_a_duration() {
        assert_invalid(&sample_with(|v| v["duration"]["inner"]["len"] = serde_json::json!(1e30)));
    }

    #[test]
    fn rejects_timeout_too_large_for_a_duration() {
        assert_invalid(&sample_with(|v| v["timeout"] = serde_json::json!(1e30)));
    }

    #[test]
    fn rejects_empty_watch_list() {
        assert_invalid(&sample_with(|v| v["concerts"] = serde_json::json!([])));
    }

    #[test]
    fn rejects_duplicate_urls() {
        assert_invalid(&sample_with(|v| {
            v["concerts"][1]["url"] = "https://example.com/gala/rss".into()
        }));
    }

    #[test]
    fn rejects_non_http_url() {
        assert_invalid(&sample_with(|v| v["concerts"][0]["url"] = "ftp://example.com".into()));
        assert_invalid(&sample_with(|v| v["concerts"][0]["url"] = "not a url".into()));
    }

    #[test]
    fn rejects_push_without_recipients() {
        assert_invalid(&sample_with(|v| {
            v["wx_push"]["topic_ids"] = serde_json::json!([]);
            v["wx_push"]["uids"] = serde_json::json!([]);
        }));
    }

    #[test]
    fn rejects_empty_app_token() {
        assert_invalid(&sample_with(|v| v["wx_push"]["app_token"] = "".into()));
    }
}
