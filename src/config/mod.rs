//! Configuration surface for the collector and viewer.
//!
//! Exactly one struct per component, each with a `Default` impl and a `load`
//! that reads a JSON file and falls back to defaults on anything short of
//! success. No legacy/mirrored key shapes (see design notes on config drift).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Severity floor for structured logging (§4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl LogLevel {
    pub fn as_tracing_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Raw on-disk shape of `config/daemon-config.json`. Deserialized leniently:
/// every field is optional so a partial file still loads.
#[derive(Debug, Default, Deserialize)]
struct RawCollectorConfig {
    monitoring: Option<RawMonitoring>,
    daemon: Option<RawDaemon>,
    database: Option<RawDatabase>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMonitoring {
    #[serde(rename = "watchPaths")]
    watch_paths: Option<Vec<String>>,
    #[serde(rename = "excludePatterns")]
    exclude_patterns: Option<Vec<String>>,
    #[serde(rename = "debounceMs")]
    debounce_ms: Option<u64>,
    #[serde(rename = "moveThresholdMs")]
    move_threshold_ms: Option<u64>,
    #[serde(rename = "maxDepth")]
    max_depth: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDaemon {
    #[serde(rename = "pidFile")]
    pid_file: Option<String>,
    #[serde(rename = "logFile")]
    log_file: Option<String>,
    #[serde(rename = "logLevel")]
    log_level: Option<LogLevel>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDatabase {
    #[serde(rename = "writeMode")]
    write_mode: Option<String>,
    #[serde(rename = "syncMode")]
    sync_mode: Option<String>,
    #[serde(rename = "cacheSize")]
    cache_size_kib: Option<i64>,
    #[serde(rename = "busyTimeout")]
    busy_timeout_ms: Option<u64>,
}

/// Collector settings (§4.9 `CollectorConfig`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectorConfig {
    pub watch_paths: Vec<PathBuf>,
    pub exclude_patterns: Vec<String>,
    pub debounce_ms: u64,
    pub move_threshold_ms: u64,
    pub max_depth: Option<usize>,
    pub pid_file: PathBuf,
    pub log_file: PathBuf,
    pub log_level: LogLevel,
    pub db_path: PathBuf,
    pub write_mode: String,
    pub sync_mode: String,
    pub cache_size_kib: i64,
    pub busy_timeout_ms: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            watch_paths: vec![PathBuf::from(".")],
            exclude_patterns: default_exclude_patterns(),
            debounce_ms: 100,
            move_threshold_ms: 100,
            max_depth: None,
            pid_file: PathBuf::from(".cctop/runtime/daemon.pid"),
            log_file: PathBuf::from(".cctop/logs/daemon.log"),
            log_level: LogLevel::Info,
            db_path: PathBuf::from(".cctop/data/activity.db"),
            write_mode: "wal".to_string(),
            sync_mode: "normal".to_string(),
            cache_size_kib: 2000,
            busy_timeout_ms: 5000,
        }
    }
}

/// Default exclude globs: the state directory plus the usual noisy trees.
pub fn default_exclude_patterns() -> Vec<String> {
    vec![
        "**/.cctop/**".to_string(),
        "**/.git/**".to_string(),
        "**/node_modules/**".to_string(),
        "**/target/**".to_string(),
    ]
}

impl CollectorConfig {
    /// Load from a JSON file if it exists and parses; otherwise return defaults.
    ///
    /// A missing or malformed file is a `config` error (§7): logged at warn,
    /// never fatal.
    pub fn load(path: Option<&Path>) -> Self {
        let mut config = Self::default();
        let Some(path) = path else {
            return config;
        };
        let raw = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                if path.exists() {
                    tracing::warn!(
                        code = crate::error::CCT_CFG_001_MISSING,
                        path = %path.display(),
                        error = %err,
                        "failed to read collector config, using defaults"
                    );
                }
                return config;
            }
        };
        let parsed: RawCollectorConfig = match serde_json::from_str(&raw) {
            Ok(p) => p,
            Err(err) => {
                tracing::warn!(
                    code = crate::error::CCT_CFG_002_INVALID,
                    path = %path.display(),
                    error = %err,
                    "invalid collector config, using defaults"
                );
                return config;
            }
        };

        if let Some(m) = parsed.monitoring {
            if let Some(paths) = m.watch_paths {
                config.watch_paths = paths.into_iter().map(PathBuf::from).collect();
            }
            if let Some(patterns) = m.exclude_patterns {
                config.exclude_patterns = patterns;
            }
            if let Some(ms) = m.debounce_ms {
                config.debounce_ms = ms;
            }
            if let Some(ms) = m.move_threshold_ms {
                config.move_threshold_ms = ms;
            }
            if let Some(depth) = m.max_depth {
                config.max_depth = Some(depth);
            }
        }
        if let Some(d) = parsed.daemon {
            if let Some(p) = d.pid_file {
                config.pid_file = PathBuf::from(p);
            }
            if let Some(p) = d.log_file {
                config.log_file = PathBuf::from(p);
            }
            if let Some(l) = d.log_level {
                config.log_level = l;
            }
        }
        if let Some(db) = parsed.database {
            if let Some(v) = db.write_mode {
                config.write_mode = v;
            }
            if let Some(v) = db.sync_mode {
                config.sync_mode = v;
            }
            if let Some(v) = db.cache_size_kib {
                config.cache_size_kib = v;
            }
            if let Some(v) = db.busy_timeout_ms {
                config.busy_timeout_ms = v;
            }
        }
        config
    }
}

/// Per-column `{visible, width}` override (§4.8/§6 `display.columns.*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnOverride {
    pub visible: bool,
    pub width: u16,
}

/// Viewer settings (§4.9 `ViewerConfig`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerConfig {
    pub refresh_interval_ms: u64,
    pub column_overrides: std::collections::HashMap<String, ColumnOverride>,
    pub directory_mute_paths: Vec<String>,
    pub db_path: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 100,
            column_overrides: std::collections::HashMap::new(),
            directory_mute_paths: Vec::new(),
            db_path: PathBuf::from(".cctop/data/activity.db"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawViewerConfig {
    display: Option<RawDisplay>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDisplay {
    #[serde(rename = "refreshInterval")]
    refresh_interval: Option<u64>,
    columns: Option<std::collections::HashMap<String, ColumnOverride>>,
    #[serde(rename = "directoryMutePaths")]
    directory_mute_paths: Option<Vec<String>>,
}

impl ViewerConfig {
    pub fn load(path: Option<&Path>) -> Self {
        let mut config = Self::default();
        let Some(path) = path else {
            return config;
        };
        let raw = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(_) => return config,
        };
        let parsed: RawViewerConfig = match serde_json::from_str(&raw) {
            Ok(p) => p,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "invalid viewer config, using defaults");
                return config;
            }
        };
        if let Some(d) = parsed.display {
            if let Some(ms) = d.refresh_interval {
                config.refresh_interval_ms = ms;
            }
            if let Some(cols) = d.columns {
                config.column_overrides = cols;
            }
            if let Some(paths) = d.directory_mute_paths {
                config.directory_mute_paths = paths;
            }
        }
        config
    }
}
