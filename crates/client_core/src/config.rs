use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context};
use serde::Deserialize;
use tracing::warn;
use url::Url;

pub const SETTINGS_FILE: &str = "mhsim.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend_url: String,
    pub simulate_path: String,
    /// `None` waits for the backend indefinitely.
    pub request_timeout_seconds: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:5000".into(),
            simulate_path: "/simulate".into(),
            request_timeout_seconds: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    backend_url: Option<String>,
    simulate_path: Option<String>,
    request_timeout_seconds: Option<u64>,
}

impl Settings {
    pub fn with_backend_url(mut self, backend_url: impl Into<String>) -> Self {
        self.backend_url = backend_url.into();
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_seconds
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Backend root, always ending in `/` so relative joins stay below it.
    pub fn base_url(&self) -> anyhow::Result<Url> {
        let raw = self.backend_url.trim();
        if raw.is_empty() {
            bail!("backend url is empty; set backend_url in {SETTINGS_FILE} or SIM_BACKEND_URL");
        }

        let mut url =
            Url::parse(raw).with_context(|| format!("invalid backend url '{raw}'"))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!(
                "backend url '{raw}' must use http or https, not '{}'",
                url.scheme()
            );
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }

    pub fn simulate_url(&self) -> anyhow::Result<Url> {
        let base = self.base_url()?;
        let path = self.simulate_path.trim().trim_start_matches('/');
        if path.is_empty() {
            return Ok(base);
        }
        base.join(path)
            .with_context(|| format!("invalid simulate path '{}'", self.simulate_path))
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the TOML file at `path` if it exists, then environment overrides.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file_settings(&mut settings, file_cfg),
            Err(err) => warn!(path = %path.display(), %err, "ignoring unreadable settings file"),
        }
    }

    apply_env_overrides(&mut settings, env);
    settings
}

fn apply_file_settings(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.backend_url {
        settings.backend_url = v;
    }
    if let Some(v) = file_cfg.simulate_path {
        settings.simulate_path = v;
    }
    if file_cfg.request_timeout_seconds.is_some() {
        settings.request_timeout_seconds = file_cfg.request_timeout_seconds;
    }
}

fn apply_env_overrides(settings: &mut Settings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("SIM_BACKEND_URL") {
        settings.backend_url = v;
    }
    if let Some(v) = env("APP__BACKEND_URL") {
        settings.backend_url = v;
    }

    if let Some(v) = env("APP__SIMULATE_PATH") {
        settings.simulate_path = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECONDS") {
        match v.trim().parse::<u64>() {
            Ok(parsed) => settings.request_timeout_seconds = Some(parsed),
            Err(_) => warn!(value = %v, "ignoring non-numeric APP__REQUEST_TIMEOUT_SECONDS"),
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
