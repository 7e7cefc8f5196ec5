use std::time::Duration;

use serde_json::Value;

use crate::app_constants::{UPDATE_CHECK_INITIAL_DELAY, UPDATE_CHECK_INTERVAL};

/// Debug builds never talk to the update endpoint.
pub fn should_schedule_update_checks(debug_build: bool) -> bool {
    !debug_build
}

/// Releases are signed; without a public key every check would be rejected,
/// so the key is filled in at deploy time and checks stay off until then.
pub fn updater_configured(updater_config: Option<&Value>) -> bool {
    let Some(config) = updater_config else {
        return false;
    };
    let has_pubkey = config
        .get("pubkey")
        .and_then(Value::as_str)
        .is_some_and(|key| !key.trim().is_empty());
    let has_endpoint = config
        .get("endpoints")
        .and_then(Value::as_array)
        .is_some_and(|endpoints| !endpoints.is_empty());
    has_pubkey && has_endpoint
}

/// Delay before the given check, counting from zero.
pub fn delay_before_check(check_index: u32) -> Duration {
    if check_index == 0 {
        UPDATE_CHECK_INITIAL_DELAY
    } else {
        UPDATE_CHECK_INTERVAL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartChoice {
    RestartNow,
    Later,
}

impl RestartChoice {
    pub fn from_confirmation(confirmed: bool) -> Self {
        if confirmed {
            Self::RestartNow
        } else {
            Self::Later
        }
    }
}

#[cfg(feature = "desktop")]
pub(crate) fn spawn_update_checks(app_handle: tauri::AppHandle) {
    if !should_schedule_update_checks(cfg!(debug_assertions)) {
        log::info!("[update] debug build, update checks disabled");
        return;
    }
    if !updater_configured(app_handle.config().plugins.0.get("updater")) {
        log::warn!("[update] updater pubkey or endpoints not configured, update checks disabled");
        return;
    }

    tauri::async_runtime::spawn(async move {
        let mut check_index = 0;
        loop {
            tokio::time::sleep(delay_before_check(check_index)).await;
            check_index = check_index.saturating_add(1);
            if desktop::check_and_install(&app_handle).await {
                return;
            }
        }
    });
}

#[cfg(feature = "desktop")]
mod desktop {
    use std::time::Instant;

    use tauri::AppHandle;
    use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};
    use tauri_plugin_updater::UpdaterExt;

    use super::RestartChoice;

    /// Returns true once an update was installed and the loop should end.
    pub(super) async fn check_and_install(app_handle: &AppHandle) -> bool {
        let current_version = app_handle.package_info().version.to_string();
        let updater = match app_handle.updater() {
            Ok(updater) => updater,
            Err(error) => {
                log::warn!("[update] failed to initialize updater: {error}");
                return false;
            }
        };

        let check_started = Instant::now();
        let update = match updater.check().await {
            Ok(Some(update)) => update,
            Ok(None) => {
                log::info!(
                    "[update] no update available current_version={} elapsed_ms={}",
                    current_version,
                    check_started.elapsed().as_millis()
                );
                return false;
            }
            Err(error) => {
                // Missing release metadata is expected before the first publish.
                log::warn!(
                    "[update] check failed current_version={} elapsed_ms={} error={}",
                    current_version,
                    check_started.elapsed().as_millis(),
                    error
                );
                return false;
            }
        };

        let new_version = update.version.to_string();
        log::info!("[update] downloading {current_version} -> {new_version}");
        if let Err(error) = update.download_and_install(|_, _| {}, || {}).await {
            log::error!("[update] failed to install {new_version}: {error}");
            return false;
        }
        log::info!("[update] installed {new_version}");

        let dialog_handle = app_handle.clone();
        let confirmed = tauri::async_runtime::spawn_blocking(move || {
            dialog_handle
                .dialog()
                .message(format!(
                    "Version {new_version} has been downloaded. Restart now to apply it?"
                ))
                .title("Update ready")
                .kind(MessageDialogKind::Info)
                .buttons(MessageDialogButtons::OkCancelCustom(
                    "Restart".to_string(),
                    "Later".to_string(),
                ))
                .blocking_show()
        })
        .await
        .unwrap_or(false);

        match RestartChoice::from_confirmation(confirmed) {
            RestartChoice::RestartNow => {
                log::info!("[update] restarting to apply update");
                app_handle.restart();
            }
            RestartChoice::Later => log::info!("[update] restart postponed by user"),
        }
        true
    }
}
