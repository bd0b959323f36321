use std::{collections::HashMap, fs, path::Path, path::PathBuf};

use tracing::warn;

const SETTINGS_FILE: &str = "billed.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_url: String,
    pub session_file: PathBuf,
    pub download_dir: PathBuf,
    pub preview_width: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5678".into(),
            session_file: PathBuf::from("./session.json"),
            download_dir: PathBuf::from("./downloads"),
            preview_width: 800.0,
        }
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the flat key/value settings file, then environment.
fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<toml::Table>(&raw) {
            Ok(table) => {
                let file_cfg = flatten_scalars(table);
                if let Some(v) = file_cfg.get("api_url") {
                    settings.api_url = v.clone();
                }
                if let Some(v) = file_cfg.get("session_file") {
                    settings.session_file = PathBuf::from(v);
                }
                if let Some(v) = file_cfg.get("download_dir") {
                    settings.download_dir = PathBuf::from(v);
                }
                if let Some(v) = file_cfg.get("preview_width") {
                    apply_preview_width(&mut settings, v);
                }
            }
            Err(err) => warn!(path = %path.display(), error = %err, "ignoring malformed settings file"),
        }
    }

    if let Some(v) = env("BILLED_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = env("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = env("BILLED_SESSION_FILE") {
        settings.session_file = PathBuf::from(v);
    }

    if let Some(v) = env("BILLED_DOWNLOAD_DIR") {
        settings.download_dir = PathBuf::from(v);
    }

    if let Some(v) = env("BILLED_PREVIEW_WIDTH") {
        apply_preview_width(&mut settings, &v);
    }

    settings
}

/// Scalar values as strings; arrays and tables are skipped.
fn flatten_scalars(table: toml::Table) -> HashMap<String, String> {
    table
        .into_iter()
        .filter_map(|(key, value)| {
            let value = match value {
                toml::Value::String(v) => v,
                toml::Value::Integer(v) => v.to_string(),
                toml::Value::Float(v) => v.to_string(),
                toml::Value::Boolean(v) => v.to_string(),
                other => {
                    warn!(%key, kind = other.type_str(), "ignoring non-scalar setting");
                    return None;
                }
            };
            Some((key, value))
        })
        .collect()
}

fn apply_preview_width(settings: &mut Settings, raw: &str) {
    match raw.trim().parse::<f64>() {
        Ok(width) if width.is_finite() && width >= 0.0 => settings.preview_width = width,
        _ => warn!(value = raw, "ignoring invalid preview width"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
