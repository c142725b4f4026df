use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::Context;

pub const CONFIG_FILE: &str = "console.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_url: String,
    pub api_token: Option<String>,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    /// Base the Steam login callback returns to; defaults to `api_url`.
    pub login_return_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:6006".into(),
            api_token: None,
            poll_interval: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            login_return_url: None,
        }
    }
}

impl Settings {
    pub fn login_return_base(&self) -> &str {
        self.login_return_url.as_deref().unwrap_or(&self.api_url)
    }
}

pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let path = path.unwrap_or_else(|| Path::new(CONFIG_FILE));
    if let Ok(raw) = fs::read_to_string(path) {
        apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid config file {}", path.display()))?;
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());

    Ok(settings)
}

/// Overlays keys from a flat `key = "value"` table.
pub fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg = toml::from_str::<HashMap<String, String>>(raw)?;
    if let Some(v) = file_cfg.get("api_url") {
        settings.api_url = v.clone();
    }
    if let Some(v) = file_cfg.get("api_token") {
        settings.api_token = Some(v.clone());
    }
    if let Some(delay) = file_cfg.get("poll_interval_secs").and_then(|v| seconds(v)) {
        settings.poll_interval = delay;
    }
    if let Some(timeout) = file_cfg.get("request_timeout_secs").and_then(|v| seconds(v)) {
        settings.request_timeout = timeout;
    }
    if let Some(v) = file_cfg.get("login_return_url") {
        settings.login_return_url = Some(v.clone());
    }
    Ok(())
}

pub fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("APP__API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = var("APP__API_TOKEN") {
        settings.api_token = Some(v);
    }
    if let Some(delay) = var("APP__POLL_INTERVAL_SECS").and_then(|v| seconds(&v)) {
        settings.poll_interval = delay;
    }
    if let Some(timeout) = var("APP__REQUEST_TIMEOUT_SECS").and_then(|v| seconds(&v)) {
        settings.request_timeout = timeout;
    }
    if let Some(v) = var("APP__LOGIN_RETURN_URL") {
        settings.login_return_url = Some(v);
    }
}

/// Whole seconds, at least one.
fn seconds(raw: &str) -> Option<Duration> {
    raw.trim().parse::<u64>().ok().map(|secs| Duration::from_secs(secs.max(1)))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
