use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use thiserror::Error;
use url::Url;

use crate::{
    app_store::{AppStore, StoreError},
    app_types::{AtomicFlagGuard, HelperBridgeState},
    catalog::{Catalog, CatalogError},
    first_run::{FirstRunGate, FirstRunNotice},
    helper_launch::HelperLaunchPlan,
    helper_supervisor::{HelperError, HelperStatus, HelperSupervisor},
    item_data::{ItemData, ItemDataError},
    lifecycle::Lifecycle,
    patch_tool::{self, PatchError, PatchOutcome, PatchRequest, PatchTool},
    runtime_paths,
};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Unavailable(String),
    #[error("Another helper action is already in progress.")]
    Busy,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    ItemData(#[from] ItemDataError),
    #[error(transparent)]
    Patch(#[from] PatchError),
    #[error(transparent)]
    Helper(#[from] HelperError),
}

#[derive(Debug)]
pub struct ServiceConfig {
    pub data_dir: PathBuf,
    pub catalog_path: Option<PathBuf>,
    pub patch_tool_path: Option<PathBuf>,
    pub helper_plan: Result<HelperLaunchPlan, String>,
    pub helper_timeout: Duration,
    pub client_state_path: Option<PathBuf>,
}

/// Everything the bridge commands reach: opened once at startup and shared.
#[derive(Debug)]
pub struct AppServices {
    store: Arc<AppStore>,
    catalog: Result<Arc<Catalog>, String>,
    patch_tool: Result<PatchTool, String>,
    helper: Arc<HelperSupervisor>,
    lifecycle: Lifecycle,
    first_run: FirstRunGate,
    client_state_path: Option<PathBuf>,
    helper_action_in_progress: AtomicBool,
}

impl AppServices {
    pub fn initialize(config: ServiceConfig) -> Result<Self, ServiceError> {
        let store = AppStore::open(runtime_paths::store_path(&config.data_dir))?;

        let catalog = match &config.catalog_path {
            Some(path) => Catalog::open(path).map(Arc::new).map_err(|error| {
                log::error!("[catalog] failed to open {}: {}", path.display(), error);
                format!("Catalog database is unavailable: {error}")
            }),
            None => Err("Catalog database was not found.".to_string()),
        };

        let patch_tool = config
            .patch_tool_path
            .map(PatchTool::new)
            .ok_or_else(|| "Patch tool was not found.".to_string());

        let helper = match config.helper_plan {
            Ok(plan) => HelperSupervisor::new(plan, config.helper_timeout),
            Err(reason) => HelperSupervisor::without_plan(reason, config.helper_timeout),
        };

        Ok(Self {
            store: Arc::new(store),
            catalog,
            patch_tool,
            helper: Arc::new(helper),
            lifecycle: Lifecycle::new(),
            first_run: FirstRunGate::new(),
            client_state_path: config.client_state_path,
            helper_action_in_progress: AtomicBool::new(false),
        })
    }

    pub fn store(&self) -> &Arc<AppStore> {
        &self.store
    }

    pub fn helper(&self) -> &Arc<HelperSupervisor> {
        &self.helper
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn catalog(&self) -> Result<Arc<Catalog>, ServiceError> {
        self.catalog.clone().map_err(ServiceError::Unavailable)
    }

    pub async fn helper_uri(&self) -> Result<Url, ServiceError> {
        Ok(self.helper.uri().await?)
    }

    pub fn helper_state(&self) -> HelperBridgeState {
        let status = self.helper.status();
        let reason = match &status {
            HelperStatus::Failed { reason } => Some(reason.clone()),
            HelperStatus::Exited { code } => Some(HelperError::Exited(*code).to_string()),
            _ => None,
        };
        HelperBridgeState {
            status: status.label(),
            port: status.port(),
            reason,
            restarting: self.helper_action_in_progress.load(Ordering::Acquire),
        }
    }

    pub async fn restart_helper(&self) -> Result<(), ServiceError> {
        let _guard =
            AtomicFlagGuard::try_set(&self.helper_action_in_progress).ok_or(ServiceError::Busy)?;
        self.helper.restart().await?;
        self.helper.uri().await?;
        Ok(())
    }

    pub fn load_item_data(&self) -> Result<ItemData, ServiceError> {
        Ok(self.store.item_data()?)
    }

    pub fn save_item_data(&self, item: &ItemData) -> Result<(), ServiceError> {
        Ok(self.store.set_item_data(item)?)
    }

    pub fn import_item_file(&self, path: &Path) -> Result<ItemData, ServiceError> {
        log::info!("[item] importing item data from {}", path.display());
        Ok(ItemData::load_file(path)?)
    }

    pub fn export_item_file(&self, path: &Path, item: &ItemData) -> Result<(), ServiceError> {
        log::info!("[item] exporting item data to {}", path.display());
        let mut item = item.clone();
        item.normalize();
        Ok(item.export_file(path)?)
    }

    /// Runs the patch tool against the persisted store and, on success, starts
    /// the game when the user asked for it.
    pub async fn apply_patch(&self, item_name: &str) -> Result<PatchOutcome, ServiceError> {
        let settings = self.store.settings()?;
        let tool = self
            .patch_tool
            .as_ref()
            .map_err(|reason| ServiceError::Unavailable(reason.clone()))?;

        let request = PatchRequest {
            item_name: item_name.to_string(),
            store_path: self.store.path().to_path_buf(),
            install_dir: settings.install_root_dir.clone(),
        };
        let outcome = tool.apply(&request).await?;

        if outcome.succeeded() && settings.launch_after_patch {
            patch_tool::launch_game(&settings.install_root_dir);
        }
        Ok(outcome)
    }

    /// The first-start notice, handed out at most once per launch.
    pub fn take_first_run_notice(&self) -> Result<Option<FirstRunNotice>, ServiceError> {
        let settings = self.store.settings()?;
        Ok(self
            .first_run
            .take_notice(&settings, self.client_state_path.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::app_types::BridgeResult;

    fn config(data_dir: &Path) -> ServiceConfig {
        ServiceConfig {
            data_dir: data_dir.to_path_buf(),
            catalog_path: None,
            patch_tool_path: None,
            helper_plan: Err("no helper in tests".to_string()),
            helper_timeout: Duration::from_millis(200),
            client_state_path: None,
        }
    }

    #[test]
    fn missing_catalog_is_reported_not_panicked() {
        let dir = tempfile::tempdir().unwrap();
        let services = AppServices::initialize(config(dir.path())).unwrap();

        let result: BridgeResult<()> = services.catalog().map(|_| ()).into();
        assert!(!result.ok);
        assert_eq!(result.error.as_deref(), Some("Catalog database was not found."));
    }

    #[test]
    fn first_run_notice_fires_once_until_install_dir_is_set() {
        let dir = tempfile::tempdir().unwrap();
        let services = AppServices::initialize(config(dir.path())).unwrap();

        assert!(services.take_first_run_notice().unwrap().is_some());
        assert!(services.take_first_run_notice().unwrap().is_none());
    }

    #[test]
    fn first_run_notice_never_fires_with_install_dir() {
        let dir = tempfile::tempdir().unwrap();
        let services = AppServices::initialize(config(dir.path())).unwrap();
        services
            .store()
            .set("settings.freedomWoWRootDir", json!("C:/WoW"))
            .unwrap();

        assert!(services.take_first_run_notice().unwrap().is_none());
    }

    #[tokio::test]
    async fn patch_without_install_dir_is_an_error_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.patch_tool_path = Some(dir.path().join("DBXPatchTool.exe"));
        let services = AppServices::initialize(config).unwrap();

        let result: BridgeResult<PatchOutcome> = services.apply_patch("My Awesome Item").await.into();
        assert!(!result.ok);
        assert_eq!(
            result.error.as_deref(),
            Some("The game install directory is not configured.")
        );
    }

    #[tokio::test]
    async fn helper_without_plan_reports_failed_state() {
        let dir = tempfile::tempdir().unwrap();
        let services = AppServices::initialize(config(dir.path())).unwrap();
        assert!(services.helper().start().await.is_err());

        let state = services.helper_state();
        assert_eq!(state.status, "failed");
        assert_eq!(state.reason.as_deref(), Some("no helper in tests"));
        assert!(services.helper_uri().await.is_err());
    }

    #[test]
    fn item_export_then_import_keeps_invariants() {
        let dir = tempfile::tempdir().unwrap();
        let services = AppServices::initialize(config(dir.path())).unwrap();
        let mut item = services.load_item_data().unwrap();
        item.item_component_models.remove("1");
        item.metadata.name = "Exported".to_string();

        let path = dir.path().join("exported.json");
        services.export_item_file(&path, &item).unwrap();
        let imported = services.import_item_file(&path).unwrap();

        assert_eq!(imported.metadata.name, "Exported");
        assert_eq!(imported.item_component_models.len(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn patch_runs_tool_with_configured_install_dir() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let tool_path = dir.path().join("patch.sh");
        std::fs::write(&tool_path, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&tool_path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut config = config(dir.path());
        config.patch_tool_path = Some(tool_path);
        let services = AppServices::initialize(config).unwrap();
        services
            .store()
            .set(
                "settings",
                json!({
                    "freedomWoWRootDir": dir.path().to_string_lossy(),
                    "launchWoWAfterPatch": false
                }),
            )
            .unwrap();

        let outcome = services.apply_patch("My Awesome Item").await.unwrap();
        assert_eq!(outcome.result_code, 0);
        assert!(!outcome.banner.is_shown());
    }
}
