use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "risk-dashboard";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_url: String,
    /// Whether the grades upload sends the bearer token.
    #[serde(default)]
    pub upload_requires_auth: bool,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

fn default_page_size() -> usize {
    5
}

fn default_timeout() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            upload_requires_auth: false,
            page_size: default_page_size(),
            request_timeout_secs: default_timeout(),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config: AppConfig =
            confy::load(APP_NAME, "config").context("failed to load dashboard configuration")?;
        config.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `RISK_API_URL` and `RISK_UPLOAD_REQUIRES_AUTH` on top of the file values.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        if let Some(url) = lookup("RISK_API_URL").filter(|value| !value.trim().is_empty()) {
            self.api_url = url;
        }
        if let Some(flag) = lookup("RISK_UPLOAD_REQUIRES_AUTH") {
            self.upload_requires_auth = parse_flag(&flag)
                .with_context(|| format!("RISK_UPLOAD_REQUIRES_AUTH has invalid value '{flag}'"))?;
        }
        self.api_url = self.api_url.trim_end_matches('/').to_string();
        Ok(self)
    }
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("expected a boolean"),
    }
}
