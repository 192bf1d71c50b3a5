use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{AidatError, Result};
use crate::models::FeePolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default = "default_building_id")]
    pub building_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub default_monthly_dues: f64,
    #[serde(default = "default_elevator_fee")]
    pub default_annual_elevator_fee: f64,
}

fn default_building_id() -> String {
    "default".to_string()
}

fn default_elevator_fee() -> f64 {
    600.0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            building_id: default_building_id(),
            user_name: String::new(),
            default_monthly_dues: 0.0,
            default_annual_elevator_fee: default_elevator_fee(),
        }
    }
}

impl Settings {
    /// Fee policy for a building with nothing cached yet.
    pub fn default_policy(&self) -> FeePolicy {
        FeePolicy {
            monthly_dues: self.default_monthly_dues,
            annual_elevator_fee: self.default_annual_elevator_fee,
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("aidat")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("aidat")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable settings, using defaults");
                Settings::default()
            }
        }
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| AidatError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

pub fn get_data_dir() -> PathBuf {
    PathBuf::from(&load_settings().data_dir)
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert!(s.user_name.is_empty());
        assert_eq!(s.building_id, "default");
        assert_eq!(s.default_monthly_dues, 0.0);
        assert_eq!(s.default_annual_elevator_fee, 600.0);
        assert!(s.data_dir.ends_with("aidat"));
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"data_dir": "/tmp/test", "user_name": "Ayşe", "default_monthly_dues": 750}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.user_name, "Ayşe");
        assert_eq!(s.building_id, "default");
        let policy = s.default_policy();
        assert_eq!(policy.monthly_dues, 750.0);
        assert_eq!(policy.annual_elevator_fee, 600.0);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings { building_id: "lale".into(), ..Settings::default() };
        std::fs::write(&path, serde_json::to_string_pretty(&settings).unwrap()).unwrap();
        let loaded: Settings = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.building_id, "lale");
    }

    #[test]
    fn test_shellexpand_tilde() {
        let expanded = shellexpand_path("~/aidat");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("aidat"));
    }
}
