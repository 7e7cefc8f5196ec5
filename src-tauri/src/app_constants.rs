use std::time::Duration;

pub const APP_DIR_NAME: &str = "item-customizer";
pub const STORE_FILE_NAME: &str = "app-store.json";
pub const DESKTOP_LOG_FILE: &str = "item-customizer";

pub const HELPER_EXECUTABLE_NAME: &str = "item-helper";
pub const HELPER_HOST: &str = "127.0.0.1";
pub const DEFAULT_HELPER_TIMEOUT_MS: u64 = 20_000;

pub const PATCH_TOOL_FILE_NAME: &str = "DBXPatchTool.exe";
pub const GAME_EXECUTABLE_NAME: &str = "Wow.exe";
pub const CATALOG_DB_FILE_NAME: &str = "app.db";
pub const HELPER_ASSETS_DIR_NAME: &str = "modelviewer";

pub const EXTERNAL_CLIENT_DIR_NAME: &str = "WoWFreedomClient";
pub const EXTERNAL_CLIENT_STATE_FILE: &str = "appstate.json";

pub const DATA_DIR_ENV: &str = "ITEM_CUSTOMIZER_DATA_DIR";
pub const HELPER_CMD_ENV: &str = "ITEM_CUSTOMIZER_HELPER_CMD";
pub const HELPER_TIMEOUT_ENV: &str = "ITEM_CUSTOMIZER_HELPER_TIMEOUT_MS";
pub const CATALOG_DB_ENV: &str = "ITEM_CUSTOMIZER_CATALOG_DB";
pub const PATCH_TOOL_ENV: &str = "ITEM_CUSTOMIZER_PATCH_TOOL";
pub const ASSETS_DIR_ENV: &str = "ITEM_CUSTOMIZER_ASSETS_DIR";

pub const FIRST_RUN_CHECK_DELAY: Duration = Duration::from_millis(3_000);
pub const UPDATE_CHECK_INITIAL_DELAY: Duration = Duration::from_secs(60);
pub const UPDATE_CHECK_INTERVAL: Duration = Duration::from_secs(15 * 60);

pub const MAIN_WINDOW_LABEL: &str = "main";
pub const LOADING_PAGE: &str = "loading.html";
pub const APP_PAGE: &str = "index.html";

pub const FIRST_START_EVENT: &str = "app://first-start";
pub const MENU_OPEN_EVENT: &str = "menu://open";
pub const MENU_SAVE_EVENT: &str = "menu://save";
pub const HELPER_EXITED_EVENT: &str = "helper://exited";
pub const HELPER_STARTUP_FAILED_EVENT: &str = "helper://startup-failed";
