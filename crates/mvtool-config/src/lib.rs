//! Configuration management for mvtool.
//!
//! This crate discovers the `.mvtool/` directory and loads the layered
//! configuration in `.mvtool/config.yaml`.

pub mod config;
pub mod dir;

pub use config::{
    CONFIG_FILE, ConfigError, DatabaseConfig, ImportConfig, JiraConfig, MvtoolConfig, Result,
    load_config, save_config,
};
pub use dir::{ensure_mvtool_dir, find_mvtool_dir, find_mvtool_dir_or_error};
