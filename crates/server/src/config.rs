use std::{fs, path::Path};

use anyhow::Context;
use lti_core::registration::RegistrationSettings;
use serde::Deserialize;
use tracing::warn;

pub const SETTINGS_FILE: &str = "acs_server.toml";

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_bind: String,
    pub access_token_ttl_seconds: i64,
    pub max_body_bytes: usize,
    pub registration: RegistrationSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8090".into(),
            access_token_ttl_seconds: 3600,
            max_body_bytes: 64 * 1024,
            registration: RegistrationSettings::default(),
        }
    }
}

/// Every key is optional; a present `[registration]` table replaces the
/// default registration as a whole.
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    bind_addr: Option<String>,
    access_token_ttl_seconds: Option<i64>,
    max_body_bytes: Option<usize>,
    registration: Option<RegistrationSettings>,
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if Path::new(SETTINGS_FILE).exists() {
        if let Err(error) = apply_file(&mut settings, SETTINGS_FILE) {
            warn!(file = SETTINGS_FILE, %error, "ignoring unreadable settings file");
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

pub fn apply_file(settings: &mut Settings, path: impl AsRef<Path>) -> anyhow::Result<()> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
    apply_toml(settings, &raw)
        .with_context(|| format!("failed to parse settings file '{}'", path.display()))
}

fn apply_toml(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;

    if let Some(v) = file_cfg.bind_addr {
        settings.server_bind = v;
    }
    if let Some(v) = file_cfg.access_token_ttl_seconds {
        settings.access_token_ttl_seconds = v;
    }
    if let Some(v) = file_cfg.max_body_bytes {
        settings.max_body_bytes = v;
    }
    if let Some(v) = file_cfg.registration {
        settings.registration = v;
    }

    Ok(())
}

/// Environment overrides; later keys in each group win.
pub fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("ACS_SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = var("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = var("APP__ACCESS_TOKEN_TTL_SECONDS") {
        if let Ok(parsed) = v.parse::<i64>() {
            settings.access_token_ttl_seconds = parsed;
        }
    }

    if let Some(v) = var("APP__PLATFORM_SECRET") {
        settings.registration.platform_secret = v;
    }
    if let Some(v) = var("APP__TOOL_SECRET") {
        settings.registration.tool_secret = v;
    }
    if let Some(v) = var("APP__PLATFORM_AUDIENCE") {
        settings.registration.platform_audience = v;
    }
    if let Some(v) = var("APP__CLIENT_ID") {
        settings.registration.client_id = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
