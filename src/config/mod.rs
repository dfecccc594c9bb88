//! Configuration module for the link directory backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default number of approvals required before a submission is merged.
pub const DEFAULT_APPROVAL_THRESHOLD: u32 = 3;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the canonical `sites.json` index
    pub data_dir: PathBuf,
    /// Directory holding one document per pending or rejected submission
    pub submissions_dir: PathBuf,
    /// Optional directory of static pages served as a passthrough
    pub static_dir: Option<PathBuf>,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Approvals needed before a submission is merged into the index
    pub approval_threshold: u32,
    /// Attempts made for each persistence write before giving up
    pub io_retries: u32,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON-formatted log lines
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let data_dir = env::var("LINKDIR_DATA_DIR")
            .unwrap_or_else(|_| "./data".to_string())
            .into();

        let submissions_dir = env::var("LINKDIR_SUBMISSIONS_DIR")
            .unwrap_or_else(|_| "./submissions".to_string())
            .into();

        let static_dir = env::var("LINKDIR_STATIC_DIR").ok().map(PathBuf::from);

        let bind_addr = env::var("LINKDIR_BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .expect("Invalid LINKDIR_BIND_ADDR format");

        let approval_threshold = env::var("LINKDIR_APPROVAL_THRESHOLD")
            .ok()
            .map(|v| {
                v.parse::<u32>()
                    .ok()
                    .filter(|t| *t >= 1)
                    .expect("LINKDIR_APPROVAL_THRESHOLD must be a positive integer")
            })
            .unwrap_or(DEFAULT_APPROVAL_THRESHOLD);

        let io_retries = env::var("LINKDIR_IO_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(3)
            .max(1);

        let log_level = env::var("LINKDIR_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_json = env::var("LINKDIR_LOG_JSON")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            data_dir,
            submissions_dir,
            static_dir,
            bind_addr,
            approval_threshold,
            io_retries,
            log_level,
            log_json,
        }
    }

    /// Path of the canonical index document.
    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join("sites.json")
    }
}
