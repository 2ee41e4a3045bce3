use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::heuristic::{DensityPolicy, ViewModePolicy};
use crate::core::pagination::DEFAULT_PAGE_SIZE;
use crate::core::virtualize::DEFAULT_OVERSCAN;
use crate::error::Result;

pub const DEFAULT_CONTAINER_HEIGHT: f64 = 600.0;
pub const DEFAULT_BUSY_POLL_SECS: u64 = 5;
pub const DEFAULT_REFRESH_SECS: u64 = 300;

/// Engine policy. Every field has a default, so a partial config file is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub page_size: usize,
    pub overscan: usize,
    /// Viewport height for virtualized lists until the UI reports one.
    pub container_height: f64,
    pub view_mode: ViewModePolicy,
    pub density: DensityPolicy,
    pub busy_poll_secs: u64,
    pub refresh_secs: u64,
    /// Where the preference database lives. Defaults to the user data dir.
    pub data_dir: Option<PathBuf>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig {
            page_size: DEFAULT_PAGE_SIZE,
            overscan: DEFAULT_OVERSCAN,
            container_height: DEFAULT_CONTAINER_HEIGHT,
            view_mode: ViewModePolicy::default(),
            density: DensityPolicy::default(),
            busy_poll_secs: DEFAULT_BUSY_POLL_SECS,
            refresh_secs: DEFAULT_REFRESH_SECS,
            data_dir: None,
        }
    }
}

fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailview")
        .join("config.json")
}

fn parse_env<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("Ignoring {name}={raw:?}: not a valid value");
            None
        }
    }
}

impl ViewConfig {
    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(path)?;
        let cfg: ViewConfig = serde_json::from_str(&data)?;
        Ok(Some(cfg))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Overlay `MAILVIEW_*` variables. Unparseable values are logged and skipped.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = parse_env(&lookup, "MAILVIEW_PAGE_SIZE") {
            self.page_size = v;
        }
        if let Some(v) = parse_env(&lookup, "MAILVIEW_OVERSCAN") {
            self.overscan = v;
        }
        if let Some(v) = parse_env(&lookup, "MAILVIEW_VIEWPORT_HEIGHT") {
            self.container_height = v;
        }
        if let Some(v) = parse_env(&lookup, "MAILVIEW_BUSY_POLL_SECS") {
            self.busy_poll_secs = v;
        }
        if let Some(v) = parse_env(&lookup, "MAILVIEW_REFRESH_SECS") {
            self.refresh_secs = v;
        }
        if let Some(dir) = lookup("MAILVIEW_DATA_DIR").filter(|d| !d.trim().is_empty()) {
            self.data_dir = Some(PathBuf::from(dir));
        }
    }

    /// Resolution order: env vars → config file → built-in defaults.
    pub fn resolve() -> Self {
        let mut config = match Self::load_from(&config_path()) {
            Ok(Some(cfg)) => {
                log::info!("Config loaded from {}", config_path().display());
                cfg
            }
            Ok(None) => {
                log::info!("No config file found, using defaults");
                ViewConfig::default()
            }
            Err(e) => {
                log::warn!("Config file error: {}", e);
                ViewConfig::default()
            }
        };
        config.apply_env(|name| std::env::var(name).ok());
        config.sanitize();
        config
    }

    /// Pull nonsense values back to something the engine can use.
    pub fn sanitize(&mut self) {
        if self.page_size == 0 {
            log::warn!("page_size 0 is not usable, using {DEFAULT_PAGE_SIZE}");
            self.page_size = DEFAULT_PAGE_SIZE;
        }
        if !self.container_height.is_finite() || self.container_height < 0.0 {
            self.container_height = DEFAULT_CONTAINER_HEIGHT;
        }
        if self.busy_poll_secs == 0 {
            self.busy_poll_secs = DEFAULT_BUSY_POLL_SECS;
        }
        if self.refresh_secs == 0 {
            self.refresh_secs = DEFAULT_REFRESH_SECS;
        }
    }

    pub fn busy_poll_interval(&self) -> Duration {
        Duration::from_secs(self.busy_poll_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    pub fn preference_db_path(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("mailview")
            })
            .join("prefs.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"page_size": 50, "view_mode": {"flat_max": 5, "virtualized_max": 10, "grouped_max": 20}}"#).unwrap();

        let cfg = ViewConfig::load_from(&path).unwrap().unwrap();
        assert_eq!(cfg.page_size, 50);
        assert_eq!(cfg.view_mode.flat_max, 5);
        assert_eq!(cfg.density, DensityPolicy::default());
        assert_eq!(cfg.overscan, DEFAULT_OVERSCAN);
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ViewConfig::load_from(&dir.path().join("nope.json")).unwrap().is_none());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let cfg = ViewConfig {
            page_size: 100,
            data_dir: Some(PathBuf::from("/tmp/mv")),
            ..Default::default()
        };
        cfg.save_to(&path).unwrap();
        assert_eq!(ViewConfig::load_from(&path).unwrap(), Some(cfg));
    }

    #[test]
    fn env_overrides_and_bad_values_are_skipped() {
        let env: HashMap<&str, &str> = [
            ("MAILVIEW_PAGE_SIZE", "10"),
            ("MAILVIEW_OVERSCAN", "lots"),
            ("MAILVIEW_DATA_DIR", "/var/lib/mailview"),
        ]
        .into_iter()
        .collect();

        let mut cfg = ViewConfig::default();
        cfg.apply_env(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(cfg.page_size, 10);
        assert_eq!(cfg.overscan, DEFAULT_OVERSCAN);
        assert_eq!(
            cfg.preference_db_path(),
            PathBuf::from("/var/lib/mailview/prefs.db")
        );
    }

    #[test]
    fn sanitize_fixes_zeroes() {
        let mut cfg = ViewConfig {
            page_size: 0,
            busy_poll_secs: 0,
            container_height: f64::NAN,
            ..Default::default()
        };
        cfg.sanitize();
        assert_eq!(cfg.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(cfg.busy_poll_interval(), Duration::from_secs(5));
        assert_eq!(cfg.container_height, DEFAULT_CONTAINER_HEIGHT);
    }
}
