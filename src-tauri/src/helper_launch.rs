use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    app_constants::{DEFAULT_HELPER_TIMEOUT_MS, HELPER_CMD_ENV, HELPER_EXECUTABLE_NAME, HELPER_TIMEOUT_ENV},
    runtime_paths,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperLaunchPlan {
    pub cmd: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl HelperLaunchPlan {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn debug_command(&self) -> Vec<String> {
        let mut parts = vec![self.cmd.clone()];
        parts.extend(self.args.clone());
        parts
    }
}

fn helper_file_name() -> String {
    if cfg!(target_os = "windows") {
        format!("{HELPER_EXECUTABLE_NAME}.exe")
    } else {
        HELPER_EXECUTABLE_NAME.to_string()
    }
}

pub fn resolve_custom_launch(custom_cmd: &str) -> Result<HelperLaunchPlan, String> {
    let mut pieces = shlex::split(custom_cmd)
        .ok_or_else(|| format!("Invalid {HELPER_CMD_ENV}: {custom_cmd}"))?;
    if pieces.is_empty() {
        return Err(format!("{HELPER_CMD_ENV} is empty."));
    }

    let cmd = pieces.remove(0);
    Ok(HelperLaunchPlan {
        cmd,
        args: pieces,
        cwd: None,
    })
}

fn resolve_bundled_launch() -> Result<HelperLaunchPlan, String> {
    let exe_dir = runtime_paths::executable_dir()
        .ok_or_else(|| "Cannot locate the running executable directory.".to_string())?;
    let helper_path = exe_dir.join(helper_file_name());
    if !helper_path.is_file() {
        return Err(format!(
            "Helper executable is missing: {}",
            helper_path.display()
        ));
    }

    Ok(HelperLaunchPlan {
        cmd: helper_path.to_string_lossy().to_string(),
        args: Vec::new(),
        cwd: Some(exe_dir),
    })
}

/// Picks the helper command: `ITEM_CUSTOMIZER_HELPER_CMD` wins over the
/// executable shipped next to the shell.
pub fn resolve_launch_plan(assets_dir: Option<&Path>) -> Result<HelperLaunchPlan, String> {
    let mut plan = match env::var(HELPER_CMD_ENV)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
    {
        Some(custom_cmd) => resolve_custom_launch(&custom_cmd)?,
        None => resolve_bundled_launch()?,
    };

    if let Some(assets_dir) = assets_dir {
        plan.args.push("--assets-dir".to_string());
        plan.args.push(assets_dir.to_string_lossy().to_string());
    }
    Ok(plan)
}

pub fn resolve_ready_timeout() -> Duration {
    let timeout_ms = env::var(HELPER_TIMEOUT_ENV)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_HELPER_TIMEOUT_MS);
    Duration::from_millis(timeout_ms)
}
