use tauri::{
    menu::{Menu, MenuItem, PredefinedMenuItem, Submenu},
    AppHandle, Runtime,
};

use crate::{
    menu_actions::{
        self, MenuAction, FORCE_RELOAD_ACCELERATOR, MENU_FILE_OPEN, MENU_FILE_SAVE,
        MENU_VIEW_FORCE_RELOAD, MENU_VIEW_RELOAD, MENU_VIEW_RESET_ZOOM,
        MENU_VIEW_TOGGLE_DEVTOOLS, MENU_VIEW_ZOOM_IN, MENU_VIEW_ZOOM_OUT, OPEN_ACCELERATOR,
        RELOAD_ACCELERATOR, RESET_ZOOM_ACCELERATOR, SAVE_ACCELERATOR, ZOOM_IN_ACCELERATOR,
        ZOOM_OUT_ACCELERATOR,
    },
    window_actions,
};

pub fn build_main_menu<R: Runtime>(app: &AppHandle<R>) -> tauri::Result<Menu<R>> {
    let open_item = MenuItem::with_id(app, MENU_FILE_OPEN, "Open...", true, Some(OPEN_ACCELERATOR))?;
    let save_item = MenuItem::with_id(app, MENU_FILE_SAVE, "Save", true, Some(SAVE_ACCELERATOR))?;
    let reload_item =
        MenuItem::with_id(app, MENU_VIEW_RELOAD, "Reload", true, Some(RELOAD_ACCELERATOR))?;
    let force_reload_item = MenuItem::with_id(
        app,
        MENU_VIEW_FORCE_RELOAD,
        "Force Reload",
        true,
        Some(FORCE_RELOAD_ACCELERATOR),
    )?;
    let devtools_item = MenuItem::with_id(
        app,
        MENU_VIEW_TOGGLE_DEVTOOLS,
        "Toggle Developer Tools",
        menu_actions::devtools_menu_enabled(cfg!(debug_assertions)),
        None::<&str>,
    )?;
    let reset_zoom_item = MenuItem::with_id(
        app,
        MENU_VIEW_RESET_ZOOM,
        "Reset Zoom",
        true,
        Some(RESET_ZOOM_ACCELERATOR),
    )?;
    let zoom_in_item =
        MenuItem::with_id(app, MENU_VIEW_ZOOM_IN, "Zoom In", true, Some(ZOOM_IN_ACCELERATOR))?;
    let zoom_out_item =
        MenuItem::with_id(app, MENU_VIEW_ZOOM_OUT, "Zoom Out", true, Some(ZOOM_OUT_ACCELERATOR))?;

    Menu::with_items(
        app,
        &[
            &Submenu::with_items(
                app,
                "File",
                true,
                &[
                    &open_item,
                    &save_item,
                    &PredefinedMenuItem::separator(app)?,
                    &PredefinedMenuItem::quit(app, None)?,
                ],
            )?,
            &Submenu::with_items(
                app,
                "View",
                true,
                &[
                    &reload_item,
                    &force_reload_item,
                    &devtools_item,
                    &PredefinedMenuItem::separator(app)?,
                    &reset_zoom_item,
                    &zoom_in_item,
                    &zoom_out_item,
                    &PredefinedMenuItem::separator(app)?,
                    &PredefinedMenuItem::fullscreen(app, None)?,
                ],
            )?,
            &Submenu::with_items(
                app,
                "Window",
                true,
                &[
                    &PredefinedMenuItem::minimize(app, None)?,
                    &PredefinedMenuItem::maximize(app, None)?,
                    &PredefinedMenuItem::separator(app)?,
                    &PredefinedMenuItem::close_window(app, None)?,
                ],
            )?,
        ],
    )
}

pub fn handle_menu_event(app_handle: &AppHandle, menu_id: &str) {
    let Some(action) = menu_actions::action_from_menu_id(menu_id) else {
        return;
    };

    if let Some(event) = action.ui_event() {
        log::debug!("[menu] forwarding {menu_id} as {event}");
        window_actions::emit_to_main_window(app_handle, event, ());
        return;
    }

    match action {
        MenuAction::Reload => window_actions::reload_main_window(app_handle),
        MenuAction::ForceReload => window_actions::force_reload_main_window(app_handle),
        MenuAction::ToggleDevtools => window_actions::toggle_devtools(app_handle),
        MenuAction::ResetZoom | MenuAction::ZoomIn | MenuAction::ZoomOut => {
            window_actions::zoom_main_window(app_handle, action)
        }
        MenuAction::OpenFile | MenuAction::Save => {}
    }
}
