//! # Client Configuration
//!
//! Where the generation backend lives and how patient to be with it.
//! Defaults can be overridden from the environment:
//!
//! - `SCRIBE_API_URL` - backend base URL
//! - `SCRIBE_ENDPOINT` - generation path
//! - `SCRIBE_CONNECT_TIMEOUT_SECS`
//! - `SCRIBE_REQUEST_TIMEOUT_SECS` - `0` disables the overall timeout
//! - `SCRIBE_UI_LANGUAGE` - `en` or `zh`

use crate::models::UiLanguage;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the generation client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// Backend base URL, without trailing slash
    pub base_url: String,
    /// Path of the streaming generation endpoint
    pub endpoint: String,
    /// TCP/TLS connect timeout
    pub connect_timeout_secs: u64,
    /// Overall request timeout; generations are long, so off by default
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    /// Buffered session snapshots before the read loop waits on observers
    pub channel_capacity: usize,
    /// Language for narrated hand-offs
    #[serde(default)]
    pub ui_language: UiLanguage,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            endpoint: "/api/generate/stream".to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: None,
            channel_capacity: 64,
            ui_language: UiLanguage::En,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `SCRIBE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("SCRIBE_API_URL") {
            self.base_url = url;
        }
        if let Some(endpoint) = lookup("SCRIBE_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(secs) = lookup("SCRIBE_CONNECT_TIMEOUT_SECS") {
            self.connect_timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("Invalid SCRIBE_CONNECT_TIMEOUT_SECS: {:?}", secs))?;
        }
        if let Some(secs) = lookup("SCRIBE_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("Invalid SCRIBE_REQUEST_TIMEOUT_SECS: {:?}", secs))?;
            self.request_timeout_secs = (secs > 0).then_some(secs);
        }
        if let Some(tag) = lookup("SCRIBE_UI_LANGUAGE") {
            self.ui_language = UiLanguage::from_tag(&tag)
                .with_context(|| format!("Unsupported SCRIBE_UI_LANGUAGE: {:?}", tag))?;
        }
        Ok(self)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_ui_language(mut self, language: UiLanguage) -> Self {
        self.ui_language = language;
        self
    }

    /// Full URL of the generation endpoint
    pub fn generation_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        )
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
