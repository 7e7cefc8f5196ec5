use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use serde::Serialize;
use thiserror::Error;
use tokio::process::Command;

use crate::app_constants::GAME_EXECUTABLE_NAME;

pub const PATCH_FAILED_MESSAGE: &str = "Something went wrong applying the patch to the WoW client files. Please contact a developer for help!";

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("The game install directory is not configured.")]
    InstallDirNotConfigured,
    #[error("Patch tool not found at {0}.")]
    ToolMissing(String),
    #[error("Failed to run patch tool {tool}: {reason}")]
    Spawn { tool: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRequest {
    pub item_name: String,
    pub store_path: PathBuf,
    pub install_dir: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum PatchBanner {
    Shown { message: String },
    Hidden,
}

impl PatchBanner {
    /// Any non-zero result code shows the failure banner; zero clears it.
    pub fn for_result_code(result_code: i32) -> Self {
        if result_code == 0 {
            Self::Hidden
        } else {
            Self::Shown {
                message: PATCH_FAILED_MESSAGE.to_string(),
            }
        }
    }

    pub fn is_shown(&self) -> bool {
        matches!(self, Self::Shown { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchOutcome {
    pub result_code: i32,
    pub banner: PatchBanner,
}

impl PatchOutcome {
    pub fn from_result_code(result_code: i32) -> Self {
        Self {
            result_code,
            banner: PatchBanner::for_result_code(result_code),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.result_code == 0
    }
}

/// Wraps the external executable that writes item records into the client.
#[derive(Debug, Clone)]
pub struct PatchTool {
    executable: PathBuf,
}

impl PatchTool {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub async fn apply(&self, request: &PatchRequest) -> Result<PatchOutcome, PatchError> {
        let install_dir = request.install_dir.trim();
        if install_dir.is_empty() {
            return Err(PatchError::InstallDirNotConfigured);
        }
        if !self.executable.is_file() {
            return Err(PatchError::ToolMissing(self.executable.display().to_string()));
        }

        log::info!(
            "[patch] applying '{}' to {} with {}",
            request.item_name,
            install_dir,
            self.executable.display()
        );
        let mut command = Command::new(&self.executable);
        command
            .arg(&request.store_path)
            .arg(install_dir)
            .arg(&request.item_name)
            .stdin(Stdio::null());
        if Path::new(install_dir).is_dir() {
            command.current_dir(install_dir);
        }

        let output = command.output().await.map_err(|error| PatchError::Spawn {
            tool: self.executable.display().to_string(),
            reason: error.to_string(),
        })?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            log::debug!("[patch:stdout] {line}");
        }
        for line in String::from_utf8_lossy(&output.stderr).lines() {
            log::warn!("[patch:stderr] {line}");
        }

        let result_code = output.status.code().unwrap_or(-1);
        if result_code == 0 {
            log::info!("[patch] patch tool finished successfully");
        } else {
            log::error!("[patch] patch tool failed with result code {result_code}");
        }
        Ok(PatchOutcome::from_result_code(result_code))
    }
}

/// Starts the game client after a successful patch. Failures are logged only.
pub fn launch_game(install_dir: &str) {
    let install_dir = Path::new(install_dir.trim());
    let game_path = install_dir.join(GAME_EXECUTABLE_NAME);
    if !game_path.is_file() {
        log::warn!("[patch] game executable not found at {}", game_path.display());
        return;
    }

    match std::process::Command::new(&game_path)
        .current_dir(install_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => log::info!("[patch] launched game client as pid {}", child.id()),
        Err(error) => log::error!(
            "[patch] failed to launch game client {}: {}",
            game_path.display(),
            error
        ),
    }
}
