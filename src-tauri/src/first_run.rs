use std::{
    fs,
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
};

use serde::Serialize;
use serde_json::Value;

use crate::settings::{AppSettings, PreviewCharacter};

const INSTALL_PATH_FIELD: &str = "InstallPath";

/// Payload of the one-shot first-start event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FirstRunNotice {
    #[serde(rename = "suggestedDir")]
    pub suggested_dir: String,
    #[serde(rename = "launchWoWAfterPatch")]
    pub launch_after_patch: bool,
    #[serde(rename = "previewCharacter")]
    pub preview_character: PreviewCharacter,
}

/// Reads the install path recorded by the external client launcher.
pub fn read_suggested_install_dir(client_state_path: Option<&Path>) -> String {
    let Some(path) = client_state_path else {
        return String::new();
    };
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return String::new(),
        Err(error) => {
            log::warn!("[first-run] failed to read {}: {}", path.display(), error);
            return String::new();
        }
    };

    match serde_json::from_str::<Value>(&raw) {
        Ok(state) => state
            .get(INSTALL_PATH_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Err(error) => {
            log::warn!("[first-run] failed to parse {}: {}", path.display(), error);
            String::new()
        }
    }
}

/// Builds the notice when no install directory is configured yet.
pub fn detect_first_run(
    settings: &AppSettings,
    client_state_path: Option<&Path>,
) -> Option<FirstRunNotice> {
    if settings.has_install_dir() {
        return None;
    }

    Some(FirstRunNotice {
        suggested_dir: read_suggested_install_dir(client_state_path),
        launch_after_patch: settings.launch_after_patch,
        preview_character: settings.preview_character.clone(),
    })
}

/// Ensures the first-start notice is delivered at most once per launch.
#[derive(Debug, Default)]
pub struct FirstRunGate {
    fired: AtomicBool,
}

impl FirstRunGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_fire(&self) -> bool {
        self.fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Runs detection and hands the notice out only on the first call.
    pub fn take_notice(
        &self,
        settings: &AppSettings,
        client_state_path: Option<&Path>,
    ) -> Option<FirstRunNotice> {
        let notice = detect_first_run(settings, client_state_path)?;
        self.try_fire().then_some(notice)
    }
}
