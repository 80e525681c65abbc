//! Delivery of commit statuses and PR comments.

use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitState {
    Success,
    Failure,
}

impl CommitState {
    pub fn as_str(self) -> &'static str {
        match self {
            CommitState::Success => "success",
            CommitState::Failure => "failure",
        }
    }
}

pub trait StatusSink {
    fn report(&self, state: CommitState, context: &str, description: &str, target_url: &str)
        -> Result<()>;
    fn comment(&self, body: &str) -> Result<()>;
}

/// Posts to the GitHub statuses and issue-comments endpoints of one PR.
pub struct GitHubSink {
    client: Client,
    statuses_url: String,
    comments_url: String,
}

impl GitHubSink {
    pub fn new(cfg: &Config, statuses_url: &str, comments_url: &str) -> Result<Self> {
        if cfg.forge.token.is_empty() {
            return Err(anyhow!("no forge token (set {})", cfg.forge.token_env));
        }
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("token {}", cfg.forge.token))
                .map_err(|_| anyhow!("forge token is not a valid header value"))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(cfg.forge.user_agent.clone())
            .timeout(Duration::from_secs(cfg.service.http_timeout_seconds))
            .build()
            .with_context(|| "building forge HTTP client")?;

        Ok(Self {
            client,
            statuses_url: statuses_url.to_string(),
            comments_url: comments_url.to_string(),
        })
    }

    fn post(&self, url: &str, body: &serde_json::Value) -> Result<()> {
        debug!("POST {url}");
        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .with_context(|| format!("POST {url}"))?;
        if !resp.status().is_success() {
            return Err(anyhow!("POST {url}: HTTP {}", resp.status()));
        }
        Ok(())
    }
}

impl StatusSink for GitHubSink {
    fn report(
        &self,
        state: CommitState,
        context: &str,
        description: &str,
        target_url: &str,
    ) -> Result<()> {
        let mut body = serde_json::json!({
            "state": state,
            "context": context,
            "description": truncate_description(description),
        });
        if !target_url.is_empty() {
            body["target_url"] = serde_json::Value::String(target_url.to_string());
        }
        self.post(&self.statuses_url, &body)
    }

    fn comment(&self, body: &str) -> Result<()> {
        self.post(&self.comments_url, &serde_json::json!({ "body": body }))
    }
}

/// Dry-run sink: logs what would be posted.
pub struct LogSink;

impl StatusSink for LogSink {
    fn report(
        &self,
        state: CommitState,
        context: &str,
        description: &str,
        target_url: &str,
    ) -> Result<()> {
        info!(
            "[dry-run] status {} context={context} target={target_url}: {description}",
            state.as_str()
        );
        Ok(())
    }

    fn comment(&self, body: &str) -> Result<()> {
        info!("[dry-run] comment:\n{body}");
        Ok(())
    }
}

/// GitHub rejects status descriptions over 140 characters.
pub fn truncate_description(s: &str) -> String {
    const MAX: usize = 140;
    if s.chars().count() <= MAX {
        return s.to_string();
    }
    let mut out: String = s.chars().take(MAX - 3).collect();
    out.push_str("...");
    out
}
