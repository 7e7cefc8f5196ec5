use std::path::PathBuf;

use tauri::{
    webview::PageLoadEvent, App, AppHandle, Manager, RunEvent, WebviewUrl, WebviewWindowBuilder,
    WindowEvent,
};
use tauri_plugin_log::{Target, TargetKind};

use crate::{
    app_constants::{
        ASSETS_DIR_ENV, CATALOG_DB_ENV, CATALOG_DB_FILE_NAME, DESKTOP_LOG_FILE,
        FIRST_RUN_CHECK_DELAY, FIRST_START_EVENT, HELPER_ASSETS_DIR_NAME, HELPER_EXITED_EVENT,
        HELPER_STARTUP_FAILED_EVENT, LOADING_PAGE, MAIN_WINDOW_LABEL, PATCH_TOOL_ENV,
        PATCH_TOOL_FILE_NAME,
    },
    app_services::{AppServices, ServiceConfig},
    app_types::HelperExitedPayload,
    helper_launch,
    helper_supervisor::{HelperError, HelperStatus},
    lifecycle::LifecyclePhase,
    main_menu, runtime_paths, update_check, window_actions,
};

fn build_log_plugin(data_dir: Option<PathBuf>) -> tauri::plugin::TauriPlugin<tauri::Wry> {
    let mut log_builder = tauri_plugin_log::Builder::default()
        .level(log::LevelFilter::Info)
        .clear_targets()
        .target(Target::new(TargetKind::Stdout));

    if let Some(dir) = data_dir {
        log_builder = log_builder.target(Target::new(TargetKind::Folder {
            path: runtime_paths::log_dir(&dir),
            file_name: Some(DESKTOP_LOG_FILE.into()),
        }));
    }
    log_builder.build()
}

fn bundled_resource(app_handle: &AppHandle, override_env: &str, name: &str) -> Option<PathBuf> {
    runtime_paths::resolve_bundled_path(override_env, name).or_else(|| {
        let candidate = app_handle.path().resource_dir().ok()?.join(name);
        candidate.exists().then_some(candidate)
    })
}

fn resolve_service_config(app_handle: &AppHandle, data_dir: Option<PathBuf>) -> ServiceConfig {
    let data_dir = data_dir
        .or_else(|| app_handle.path().app_config_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    let assets_dir = bundled_resource(app_handle, ASSETS_DIR_ENV, HELPER_ASSETS_DIR_NAME);
    let catalog_path = bundled_resource(app_handle, CATALOG_DB_ENV, CATALOG_DB_FILE_NAME);
    let patch_tool_path = bundled_resource(app_handle, PATCH_TOOL_ENV, PATCH_TOOL_FILE_NAME);

    log::info!(
        "[startup] data_dir={} catalog={:?} patch_tool={:?} assets={:?}",
        data_dir.display(),
        catalog_path,
        patch_tool_path,
        assets_dir
    );
    ServiceConfig {
        data_dir,
        catalog_path,
        patch_tool_path,
        helper_plan: helper_launch::resolve_launch_plan(assets_dir.as_deref()),
        helper_timeout: helper_launch::resolve_ready_timeout(),
        client_state_path: runtime_paths::external_client_state_path(),
    }
}

fn advance_lifecycle(app_handle: &AppHandle, next: LifecyclePhase) {
    let services = app_handle.state::<AppServices>();
    if let Err(error) = services.lifecycle().advance(next) {
        log::warn!("[lifecycle] {error}");
    }
}

fn fail_lifecycle(app_handle: &AppHandle, reason: String) {
    log::error!("[startup] {reason}");
    let services = app_handle.state::<AppServices>();
    if let Err(error) = services.lifecycle().fail(reason) {
        log::warn!("[lifecycle] {error}");
        return;
    }
    if let Some(payload) = services.lifecycle().startup_failure() {
        window_actions::emit_to_main_window(app_handle, HELPER_STARTUP_FAILED_EVENT, payload);
    }
}

fn create_main_window(app: &App) -> tauri::Result<()> {
    WebviewWindowBuilder::new(app, MAIN_WINDOW_LABEL, WebviewUrl::App(LOADING_PAGE.into()))
        .title(app.package_info().name.clone())
        .inner_size(1280.0, 800.0)
        .min_inner_size(960.0, 640.0)
        .build()?;
    advance_lifecycle(app.handle(), LifecyclePhase::WindowConstructed);
    Ok(())
}

fn spawn_startup_task(app_handle: AppHandle) {
    tauri::async_runtime::spawn(async move {
        advance_lifecycle(&app_handle, LifecyclePhase::HelperStarting);
        let services = app_handle.state::<AppServices>();
        if let Err(error) = services.helper().start().await {
            fail_lifecycle(&app_handle, format!("helper failed to start: {error}"));
            return;
        }

        let uri = match services.helper_uri().await {
            Ok(uri) => uri,
            Err(error) => {
                fail_lifecycle(&app_handle, format!("helper never became ready: {error}"));
                return;
            }
        };
        let Some(port) = uri.port() else {
            fail_lifecycle(&app_handle, format!("helper uri {uri} has no port"));
            return;
        };
        log::info!("[startup] helper ready at {uri}");
        advance_lifecycle(&app_handle, LifecyclePhase::HelperReady { port });

        let Some(window) = app_handle.get_webview_window(MAIN_WINDOW_LABEL) else {
            fail_lifecycle(&app_handle, "main window closed before the app page loaded".into());
            return;
        };
        if let Err(error) = window_actions::navigate_to_app_page(&window) {
            fail_lifecycle(&app_handle, format!("failed to open the app page: {error}"));
        }
    });
}

fn spawn_helper_exit_watcher(app_handle: AppHandle) {
    let mut status_rx = app_handle.state::<AppServices>().helper().subscribe();
    tauri::async_runtime::spawn(async move {
        while status_rx.changed().await.is_ok() {
            let status = status_rx.borrow_and_update().clone();
            if let HelperStatus::Exited { code } = status {
                let message = HelperError::Exited(code).to_string();
                log::warn!("[helper] notifying UI: {message}");
                window_actions::emit_to_main_window(
                    &app_handle,
                    HELPER_EXITED_EVENT,
                    HelperExitedPayload { code, message },
                );
            }
        }
    });
}

fn spawn_first_run_check(app_handle: AppHandle) {
    tauri::async_runtime::spawn(async move {
        tokio::time::sleep(FIRST_RUN_CHECK_DELAY).await;
        let services = app_handle.state::<AppServices>();
        match services.take_first_run_notice() {
            Ok(Some(notice)) => {
                log::info!("[first-run] install dir not configured, prompting user");
                window_actions::emit_to_main_window(&app_handle, FIRST_START_EVENT, notice);
            }
            Ok(None) => {}
            Err(error) => log::warn!("[first-run] failed to read settings: {error}"),
        }
    });
}

fn on_app_page_loaded(app_handle: &AppHandle) {
    let services = app_handle.state::<AppServices>();
    if services.lifecycle().helper_port().is_none() {
        return;
    }
    advance_lifecycle(app_handle, LifecyclePhase::PageLoaded);
    spawn_first_run_check(app_handle.clone());
}

fn stop_helper(app_handle: &AppHandle, reason: &str) {
    let Some(services) = app_handle.try_state::<AppServices>() else {
        return;
    };
    log::info!("[shutdown] stopping helper: {reason}");
    tauri::async_runtime::block_on(services.helper().stop());
}

pub(crate) fn run() {
    let data_dir = runtime_paths::default_data_dir();

    tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app, _argv, _cwd| {
            log::info!("[startup] second instance launched, focusing main window");
            window_actions::focus_main_window(app);
        }))
        .plugin(build_log_plugin(data_dir.clone()))
        .plugin(tauri_plugin_updater::Builder::new().build())
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_process::init())
        .menu(main_menu::build_main_menu)
        .on_menu_event(|app, event| main_menu::handle_menu_event(app, event.id().as_ref()))
        .invoke_handler(tauri::generate_handler![
            crate::desktop_bridge_commands::get_helper_uri,
            crate::desktop_bridge_commands::get_helper_state,
            crate::desktop_bridge_commands::restart_helper,
            crate::desktop_bridge_commands::get_startup_failure,
            crate::desktop_bridge_commands::settings_get,
            crate::desktop_bridge_commands::settings_set,
            crate::desktop_bridge_commands::catalog_item_by_id,
            crate::desktop_bridge_commands::catalog_search_items,
            crate::desktop_bridge_commands::catalog_random_item,
            crate::desktop_bridge_commands::catalog_display_models,
            crate::desktop_bridge_commands::catalog_display_textures,
            crate::desktop_bridge_commands::catalog_model_by_file_id,
            crate::desktop_bridge_commands::catalog_search_models,
            crate::desktop_bridge_commands::catalog_random_model,
            crate::desktop_bridge_commands::catalog_texture_by_file_id,
            crate::desktop_bridge_commands::catalog_search_textures,
            crate::desktop_bridge_commands::catalog_random_texture,
            crate::desktop_bridge_commands::catalog_icon_by_file_id,
            crate::desktop_bridge_commands::catalog_search_icons,
            crate::desktop_bridge_commands::load_item_data,
            crate::desktop_bridge_commands::save_item_data,
            crate::desktop_bridge_commands::import_item_file,
            crate::desktop_bridge_commands::export_item_file,
            crate::desktop_bridge_commands::apply_patch,
            crate::desktop_bridge_commands::select_folder,
        ])
        .on_window_event(|window, event| {
            if window.label() != MAIN_WINDOW_LABEL {
                return;
            }
            if let WindowEvent::Destroyed = event {
                stop_helper(window.app_handle(), "main window closed");
            }
        })
        .on_page_load(|webview, payload| {
            if !matches!(payload.event(), PageLoadEvent::Finished)
                || webview.label() != MAIN_WINDOW_LABEL
            {
                return;
            }
            log::info!("[window] page-load finished: {}", payload.url());
            if window_actions::is_app_page_url(payload.url()) {
                on_app_page_loaded(webview.app_handle());
            }
        })
        .setup(move |app| {
            let config = resolve_service_config(app.handle(), data_dir);
            app.manage(AppServices::initialize(config)?);

            create_main_window(app)?;
            spawn_helper_exit_watcher(app.handle().clone());
            spawn_startup_task(app.handle().clone());
            update_check::spawn_update_checks(app.handle().clone());
            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app_handle, event| {
            if let RunEvent::Exit = event {
                stop_helper(app_handle, "application exit");
            }
        });
}
