//! Configuration for the Findex daemon.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Unix socket path for IPC
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,

    /// Data directory for the record store
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// PID file path
    #[serde(default = "default_pid_file")]
    pub pid_file: PathBuf,

    /// Maximum file size to extract content from (larger files degrade
    /// to their display name)
    #[serde(default = "default_max_extract_size")]
    pub max_extract_size: u64,

    /// Search ranking configuration
    #[serde(default)]
    pub search: SearchTuning,
}

/// Search ranking knobs.
///
/// Weights need not sum to 1; they are normalized at scoring time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchTuning {
    /// Weight of the file name field
    #[serde(default = "default_name_weight")]
    pub name_weight: f64,

    /// Weight of the extracted content field
    #[serde(default = "default_content_weight")]
    pub content_weight: f64,

    /// Maximum tolerated normalized error for a field to match
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_socket_path() -> PathBuf {
    PathBuf::from("/tmp/findex.sock")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".findex")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_pid_file() -> PathBuf {
    PathBuf::from("/tmp/findex.pid")
}

fn default_max_extract_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_name_weight() -> f64 {
    0.3
}

fn default_content_weight() -> f64 {
    0.7
}

fn default_threshold() -> f64 {
    0.4
}

impl Default for SearchTuning {
    fn default() -> Self {
        Self {
            name_weight: default_name_weight(),
            content_weight: default_content_weight(),
            threshold: default_threshold(),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            pid_file: default_pid_file(),
            max_extract_size: default_max_extract_size(),
            search: SearchTuning::default(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from file, falling back to defaults
    pub fn load() -> Self {
        let config_path = default_data_dir().join("config.yaml");

        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_yaml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config file: {}", e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config file: {}", e);
                }
            }
        }

        Self::default()
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Get the record store directory
    pub fn records_dir(&self) -> PathBuf {
        self.data_dir.join("records")
    }

    /// Ensure data directories exist
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(self.records_dir())?;
        Ok(())
    }
}
