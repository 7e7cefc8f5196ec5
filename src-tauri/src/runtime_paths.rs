use std::{
    env,
    path::{Path, PathBuf},
};

use crate::app_constants::{
    APP_DIR_NAME, DATA_DIR_ENV, EXTERNAL_CLIENT_DIR_NAME, EXTERNAL_CLIENT_STATE_FILE,
    STORE_FILE_NAME,
};

pub(crate) fn env_path(key: &str) -> Option<PathBuf> {
    let value = env::var(key).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(PathBuf::from(trimmed))
}

/// Per-user directory holding the app store and logs.
pub fn default_data_dir() -> Option<PathBuf> {
    env_path(DATA_DIR_ENV).or_else(|| dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME)))
}

pub fn store_path(data_dir: &Path) -> PathBuf {
    data_dir.join(STORE_FILE_NAME)
}

pub fn log_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("logs")
}

/// Settings file written by the external game client launcher.
pub fn external_client_state_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| {
        dir.join(EXTERNAL_CLIENT_DIR_NAME)
            .join(EXTERNAL_CLIENT_STATE_FILE)
    })
}

pub(crate) fn executable_dir() -> Option<PathBuf> {
    env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(Path::to_path_buf))
}

/// Resolves a bundled file: explicit override first, then the directory of
/// the running executable.
pub fn resolve_bundled_path(override_env: &str, file_name: &str) -> Option<PathBuf> {
    if let Some(path) = env_path(override_env) {
        return Some(path);
    }

    let candidate = executable_dir()?.join(file_name);
    candidate.exists().then_some(candidate)
}
