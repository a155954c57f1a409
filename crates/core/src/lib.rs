//! Climate API Core Library
//!
//! Shared utilities for the climate API service:
//! - Configuration loading (XDG-compliant)
//! - File system checks

mod config;
pub mod fs;

pub use config::{find_config_file, load_config, ConfigSource};
pub use fs::is_file;

/// Application name used for XDG paths
pub const APP_NAME: &str = "climate-api";

/// Default API port
pub const DEFAULT_API_PORT: u16 = 9810;

/// Default location of the observation database, relative to the working directory
pub const DEFAULT_DATABASE_PATH: &str = "./Resources/hawaii.sqlite";

/// Default size of the read-only connection pool
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
