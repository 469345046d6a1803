//! Discovery of the `.mvtool/` directory.

use std::path::{Path, PathBuf};

use crate::config::{ConfigError, Result};

/// Name of the metadata directory.
pub const MVTOOL_DIR_NAME: &str = ".mvtool";

/// Environment variable overriding discovery.
pub const MVTOOL_DIR_ENV: &str = "MVTOOL_DIR";

/// Walks up from `start` looking for a `.mvtool/` directory.
///
/// `MVTOOL_DIR` takes precedence when it names an existing directory.
pub fn find_mvtool_dir(start: &Path) -> Option<PathBuf> {
    if let Ok(env_dir) = std::env::var(MVTOOL_DIR_ENV) {
        let env_path = PathBuf::from(env_dir);
        if env_path.is_dir() {
            return Some(env_path);
        }
    }

    let start = start.canonicalize().ok()?;
    start
        .ancestors()
        .map(|dir| dir.join(MVTOOL_DIR_NAME))
        .find(|candidate| candidate.is_dir())
}

/// Like [`find_mvtool_dir`] but fails with [`ConfigError::DirNotFound`].
pub fn find_mvtool_dir_or_error(start: &Path) -> Result<PathBuf> {
    find_mvtool_dir(start).ok_or(ConfigError::DirNotFound)
}

/// Creates `.mvtool/` under `path` (or `path` itself when it already ends in
/// `.mvtool`) and returns it.
pub fn ensure_mvtool_dir(path: &Path) -> Result<PathBuf> {
    let dir = if path.ends_with(MVTOOL_DIR_NAME) {
        path.to_path_buf()
    } else {
        path.join(MVTOOL_DIR_NAME)
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
