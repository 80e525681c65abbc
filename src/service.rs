//! Client for the hosted scan service: project page fetch and build upload.

use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use reqwest::blocking::{multipart, Client};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

pub trait ScanService {
    fn fetch_report_html(&self) -> Result<String>;
    fn upload(&self, archive: &Path, version: &str, description: &str) -> Result<()>;
}

pub struct CoverityScan {
    client: Client,
    report_url: String,
    upload_url: String,
    token: String,
    email: String,
}

impl CoverityScan {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.service.http_timeout_seconds))
            .user_agent(cfg.forge.user_agent.clone())
            .build()
            .with_context(|| "building HTTP client")?;

        Ok(Self {
            client,
            report_url: cfg.service.report_url(),
            upload_url: cfg.service.upload_url(),
            token: cfg.service.token.clone(),
            email: cfg.service.email.clone(),
        })
    }
}

impl ScanService for CoverityScan {
    fn fetch_report_html(&self) -> Result<String> {
        debug!("GET {}", self.report_url);
        let resp = self
            .client
            .get(&self.report_url)
            .send()
            .with_context(|| format!("GET {}", self.report_url))?;

        if !resp.status().is_success() {
            return Err(anyhow!("GET {}: HTTP {}", self.report_url, resp.status()));
        }
        resp.text().with_context(|| "reading report body")
    }

    fn upload(&self, archive: &Path, version: &str, description: &str) -> Result<()> {
        if self.token.is_empty() {
            return Err(anyhow!("no scan service token configured"));
        }
        let form = multipart::Form::new()
            .text("token", self.token.clone())
            .text("email", self.email.clone())
            .text("version", version.to_string())
            .text("description", description.to_string())
            .file("file", archive)
            .with_context(|| format!("attaching {}", archive.display()))?;

        info!("uploading {} to scan service", archive.display());
        let resp = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .with_context(|| "POST build upload")?;

        // The service answers 200 even for some rejected submissions; only
        // transport and HTTP errors are visible here.
        if !resp.status().is_success() {
            return Err(anyhow!("build upload: HTTP {}", resp.status()));
        }
        Ok(())
    }
}
