use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::aggregate::Limits;
use crate::error::{Result, RupError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub db_path: String,
    pub cache_ttl_secs: u64,
    pub primary_top_n: usize,
    pub timeline_top_n: usize,
    pub secondary_top_n: usize,
    pub export_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: "RUP.db".to_string(),
            cache_ttl_secs: 3600,
            primary_top_n: 10,
            timeline_top_n: 15,
            secondary_top_n: 5,
            export_dir: "exports".to_string(),
        }
    }
}

impl Settings {
    pub fn limits(&self) -> Limits {
        Limits {
            primary: self.primary_top_n,
            timeline: self.timeline_top_n,
            secondary: self.secondary_top_n,
            ..Limits::default()
        }
    }

    pub fn cache_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cache_ttl_secs)
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("rupscope")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Missing file, unreadable JSON or missing keys all fall back to defaults.
pub fn load_settings_from(path: &Path) -> Settings {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|content| serde_json::from_str(&content).ok())
        .unwrap_or_default()
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| RupError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(&settings_path(), settings)
}

/// Expand a leading `~` and make the path absolute when it exists.
pub fn shellexpand_path(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{rest}", home.to_string_lossy());
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
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            db_path: "/data/RUP-2025.db".to_string(),
            primary_top_n: 20,
            ..Settings::default()
        };
        save_settings_to(&path, &settings).unwrap();
        assert_eq!(load_settings_from(&path), settings);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let s = load_settings_from(&dir.path().join("nope.json"));
        assert_eq!(s, Settings::default());
        assert_eq!(s.cache_ttl_secs, 3600);
        assert_eq!(s.db_path, "RUP.db");
    }

    #[test]
    fn test_partial_file_merges_with_defaults() {
        let json = r#"{"db_path": "/tmp/rup.db", "timeline_top_n": 12}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.db_path, "/tmp/rup.db");
        assert_eq!(s.timeline_top_n, 12);
        assert_eq!(s.secondary_top_n, 5);
        assert_eq!(s.export_dir, "exports");
    }

    #[test]
    fn test_save_creates_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep").join("nested").join("settings.json");
        save_settings_to(&path, &Settings::default()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_limits_follow_settings() {
        let s = Settings {
            primary_top_n: 3,
            ..Settings::default()
        };
        let limits = s.limits();
        assert_eq!(limits.primary, 3);
        assert_eq!(limits.timeline, 15);
        assert_eq!(limits.distribution, 8);
    }
}
