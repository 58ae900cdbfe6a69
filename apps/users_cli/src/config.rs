use std::{collections::HashMap, fs, io, path::Path, time::Duration};

use anyhow::{anyhow, Context};
use client_core::FetchReconcile;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub request_timeout_secs: Option<u64>,
    pub prune_missing_on_fetch: bool,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "https://jsonplaceholder.typicode.com".into(),
            request_timeout_secs: None,
            prune_missing_on_fetch: false,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn fetch_reconcile(&self) -> FetchReconcile {
        if self.prune_missing_on_fetch {
            FetchReconcile::Replace
        } else {
            FetchReconcile::Merge
        }
    }
}

/// Defaults, then `path` if it exists, then environment variables.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => apply_file_overrides(&mut settings, &raw)
            .with_context(|| format!("failed to load settings from '{}'", path.display()))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()));
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn apply_file_overrides(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: HashMap<String, toml::Value> = toml::from_str(raw)?;
    let lookup = |key: &str| file_cfg.get(key).and_then(value_text);

    if let Some(v) = lookup("api_base_url") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("request_timeout_secs") {
        settings.request_timeout_secs = Some(parse_secs("request_timeout_secs", &v)?);
    }
    if let Some(v) = lookup("prune_missing_on_fetch") {
        settings.prune_missing_on_fetch = parse_flag("prune_missing_on_fetch", &v)?;
    }
    if let Some(v) = lookup("log_filter") {
        settings.log_filter = v;
    }
    Ok(())
}

fn apply_env_overrides(
    settings: &mut Settings,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = env("USERS_API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        settings.request_timeout_secs = Some(parse_secs("APP__REQUEST_TIMEOUT_SECS", &v)?);
    }

    if let Some(v) = env("APP__PRUNE_MISSING_ON_FETCH") {
        settings.prune_missing_on_fetch = parse_flag("APP__PRUNE_MISSING_ON_FETCH", &v)?;
    }

    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
    Ok(())
}

fn value_text(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(text) => Some(text.clone()),
        toml::Value::Integer(number) => Some(number.to_string()),
        toml::Value::Boolean(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn parse_secs(key: &str, raw: &str) -> anyhow::Result<u64> {
    raw.trim()
        .parse::<u64>()
        .with_context(|| format!("{key} must be a whole number of seconds, got '{raw}'"))
}

fn parse_flag(key: &str, raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow!("{key} must be true or false, got '{raw}'")),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
