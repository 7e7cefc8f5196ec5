use std::path::PathBuf;

use serde_json::Value;
use tauri::{AppHandle, Manager};
use tauri_plugin_dialog::DialogExt;

use crate::{
    app_services::AppServices,
    app_types::{BridgeResult, HelperBridgeState},
    catalog::{
        Catalog, CatalogError, DisplayModelResource, DisplayTexture, IconFile, ItemToDisplay,
        ModelResource, TextureFile,
    },
    item_data::ItemData,
    lifecycle::StartupFailedPayload,
    patch_tool::PatchOutcome,
};

const DEFAULT_SEARCH_LIMIT: u32 = 50;

async fn with_catalog<T, F>(app_handle: &AppHandle, query: F) -> BridgeResult<T>
where
    T: Send + 'static,
    F: FnOnce(&Catalog) -> Result<T, CatalogError> + Send + 'static,
{
    let catalog = match app_handle.state::<AppServices>().catalog() {
        Ok(catalog) => catalog,
        Err(error) => return BridgeResult::failure(error.to_string()),
    };

    match tauri::async_runtime::spawn_blocking(move || query(&catalog)).await {
        Ok(result) => {
            if let Err(error) = &result {
                log::warn!("[catalog] query failed: {error}");
            }
            result.into()
        }
        Err(error) => BridgeResult::failure(format!("Catalog query task failed: {error}")),
    }
}

fn search_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_SEARCH_LIMIT)
}

#[tauri::command]
pub(crate) async fn get_helper_uri(app_handle: AppHandle) -> BridgeResult<String> {
    let state = app_handle.state::<AppServices>();
    state.helper_uri().await.map(String::from).into()
}

#[tauri::command]
pub(crate) fn get_helper_state(app_handle: AppHandle) -> BridgeResult<HelperBridgeState> {
    BridgeResult::success(app_handle.state::<AppServices>().helper_state())
}

#[tauri::command]
pub(crate) fn get_startup_failure(
    app_handle: AppHandle,
) -> BridgeResult<Option<StartupFailedPayload>> {
    let state = app_handle.state::<AppServices>();
    BridgeResult::success(state.lifecycle().startup_failure())
}

#[tauri::command]
pub(crate) async fn restart_helper(app_handle: AppHandle) -> BridgeResult<HelperBridgeState> {
    let state = app_handle.state::<AppServices>();
    match state.restart_helper().await {
        Ok(()) => BridgeResult::success(state.helper_state()),
        Err(error) => {
            log::error!("[helper] restart requested from UI failed: {error}");
            BridgeResult::failure(error.to_string())
        }
    }
}

#[tauri::command]
pub(crate) fn settings_get(app_handle: AppHandle, key: String) -> BridgeResult<Option<Value>> {
    app_handle.state::<AppServices>().store().get(&key).into()
}

#[tauri::command]
pub(crate) fn settings_set(app_handle: AppHandle, key: String, value: Value) -> BridgeResult<()> {
    app_handle.state::<AppServices>().store().set(&key, value).into()
}

#[tauri::command]
pub(crate) async fn catalog_item_by_id(
    app_handle: AppHandle,
    item_id: i64,
) -> BridgeResult<ItemToDisplay> {
    with_catalog(&app_handle, move |catalog| catalog.item_by_id(item_id)).await
}

#[tauri::command]
pub(crate) async fn catalog_search_items(
    app_handle: AppHandle,
    query: String,
    inventory_type: Option<i64>,
    limit: Option<u32>,
) -> BridgeResult<Vec<ItemToDisplay>> {
    with_catalog(&app_handle, move |catalog| {
        catalog.search_items(&query, inventory_type, search_limit(limit))
    })
    .await
}

#[tauri::command]
pub(crate) async fn catalog_random_item(
    app_handle: AppHandle,
    inventory_type: Option<i64>,
) -> BridgeResult<ItemToDisplay> {
    with_catalog(&app_handle, move |catalog| catalog.random_item(inventory_type)).await
}

#[tauri::command]
pub(crate) async fn catalog_display_models(
    app_handle: AppHandle,
    display_id: i64,
) -> BridgeResult<Vec<DisplayModelResource>> {
    with_catalog(&app_handle, move |catalog| catalog.display_models(display_id)).await
}

#[tauri::command]
pub(crate) async fn catalog_display_textures(
    app_handle: AppHandle,
    display_id: i64,
) -> BridgeResult<Vec<DisplayTexture>> {
    with_catalog(&app_handle, move |catalog| catalog.display_textures(display_id)).await
}

#[tauri::command]
pub(crate) async fn catalog_model_by_file_id(
    app_handle: AppHandle,
    file_id: i64,
) -> BridgeResult<ModelResource> {
    with_catalog(&app_handle, move |catalog| {
        catalog.model_resource_by_file_id(file_id)
    })
    .await
}

#[tauri::command]
pub(crate) async fn catalog_search_models(
    app_handle: AppHandle,
    query: String,
    limit: Option<u32>,
) -> BridgeResult<Vec<ModelResource>> {
    with_catalog(&app_handle, move |catalog| {
        catalog.search_model_resources(&query, search_limit(limit))
    })
    .await
}

#[tauri::command]
pub(crate) async fn catalog_random_model(app_handle: AppHandle) -> BridgeResult<ModelResource> {
    with_catalog(&app_handle, |catalog| catalog.random_model_resource()).await
}

#[tauri::command]
pub(crate) async fn catalog_texture_by_file_id(
    app_handle: AppHandle,
    file_id: i64,
) -> BridgeResult<TextureFile> {
    with_catalog(&app_handle, move |catalog| catalog.texture_by_file_id(file_id)).await
}

#[tauri::command]
pub(crate) async fn catalog_search_textures(
    app_handle: AppHandle,
    query: String,
    limit: Option<u32>,
) -> BridgeResult<Vec<TextureFile>> {
    with_catalog(&app_handle, move |catalog| {
        catalog.search_textures(&query, search_limit(limit))
    })
    .await
}

#[tauri::command]
pub(crate) async fn catalog_random_texture(app_handle: AppHandle) -> BridgeResult<TextureFile> {
    with_catalog(&app_handle, |catalog| catalog.random_texture()).await
}

#[tauri::command]
pub(crate) async fn catalog_icon_by_file_id(
    app_handle: AppHandle,
    file_id: i64,
) -> BridgeResult<IconFile> {
    with_catalog(&app_handle, move |catalog| catalog.icon_by_file_id(file_id)).await
}

#[tauri::command]
pub(crate) async fn catalog_search_icons(
    app_handle: AppHandle,
    query: String,
    limit: Option<u32>,
) -> BridgeResult<Vec<IconFile>> {
    with_catalog(&app_handle, move |catalog| {
        catalog.search_icons(&query, search_limit(limit))
    })
    .await
}

#[tauri::command]
pub(crate) fn load_item_data(app_handle: AppHandle) -> BridgeResult<ItemData> {
    app_handle.state::<AppServices>().load_item_data().into()
}

#[tauri::command]
pub(crate) fn save_item_data(app_handle: AppHandle, item: ItemData) -> BridgeResult<()> {
    app_handle.state::<AppServices>().save_item_data(&item).into()
}

#[tauri::command]
pub(crate) fn import_item_file(app_handle: AppHandle, path: PathBuf) -> BridgeResult<ItemData> {
    app_handle
        .state::<AppServices>()
        .import_item_file(&path)
        .into()
}

#[tauri::command]
pub(crate) fn export_item_file(
    app_handle: AppHandle,
    path: PathBuf,
    item: ItemData,
) -> BridgeResult<()> {
    app_handle
        .state::<AppServices>()
        .export_item_file(&path, &item)
        .into()
}

#[tauri::command]
pub(crate) async fn apply_patch(
    app_handle: AppHandle,
    item_name: String,
) -> BridgeResult<PatchOutcome> {
    let state = app_handle.state::<AppServices>();
    state.apply_patch(&item_name).await.into()
}

#[tauri::command]
pub(crate) async fn select_folder(app_handle: AppHandle) -> BridgeResult<Option<Vec<String>>> {
    let picker_handle = app_handle.clone();
    let picked = tauri::async_runtime::spawn_blocking(move || {
        picker_handle.dialog().file().blocking_pick_folders()
    })
    .await;

    match picked {
        Ok(folders) => BridgeResult::success(folders.map(|folders| {
            folders
                .into_iter()
                .map(|folder| folder.to_string())
                .collect()
        })),
        Err(error) => BridgeResult::failure(format!("Folder picker failed: {error}")),
    }
}
