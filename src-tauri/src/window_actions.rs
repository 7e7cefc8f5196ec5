use std::sync::atomic::{AtomicU32, Ordering};

use serde::Serialize;
use tauri::{AppHandle, Emitter, Manager, WebviewWindow};
use url::Url;

use crate::{
    app_constants::{APP_PAGE, MAIN_WINDOW_LABEL},
    menu_actions::{MenuAction, DEFAULT_ZOOM_PERCENT},
};

static MAIN_WINDOW_ZOOM_PERCENT: AtomicU32 = AtomicU32::new(DEFAULT_ZOOM_PERCENT);

fn main_window(app_handle: &AppHandle, action: &str) -> Option<WebviewWindow> {
    let window = app_handle.get_webview_window(MAIN_WINDOW_LABEL);
    if window.is_none() {
        log::warn!("[window] {action} skipped: main window not found");
    }
    window
}

pub fn focus_main_window(app_handle: &AppHandle) {
    let Some(window) = main_window(app_handle, "focus") else {
        return;
    };

    if let Err(error) = window.unminimize() {
        log::warn!("[window] failed to unminimize main window: {error}");
    }
    if let Err(error) = window.show() {
        log::warn!("[window] failed to show main window: {error}");
    }
    if let Err(error) = window.set_focus() {
        log::warn!("[window] failed to focus main window: {error}");
    }
}

pub fn reload_main_window(app_handle: &AppHandle) {
    let Some(window) = main_window(app_handle, "reload") else {
        return;
    };
    if let Err(error) = window.reload() {
        log::warn!("[window] failed to reload main window: {error}");
    }
}

/// Re-navigates to the current URL so the document is fetched again
/// instead of being restored from the webview's page state.
pub fn force_reload_main_window(app_handle: &AppHandle) {
    let Some(window) = main_window(app_handle, "force reload") else {
        return;
    };
    let result = window.url().and_then(|url| window.navigate(url));
    if let Err(error) = result {
        log::warn!("[window] failed to force reload main window: {error}");
    }
}

pub fn zoom_main_window(app_handle: &AppHandle, action: MenuAction) {
    let current = MAIN_WINDOW_ZOOM_PERCENT.load(Ordering::Relaxed);
    let Some(next) = action.zoom_percent_after(current) else {
        return;
    };
    let Some(window) = main_window(app_handle, "zoom") else {
        return;
    };
    match window.set_zoom(f64::from(next) / 100.0) {
        Ok(()) => MAIN_WINDOW_ZOOM_PERCENT.store(next, Ordering::Relaxed),
        Err(error) => log::warn!("[window] failed to set zoom to {next}%: {error}"),
    }
}

pub fn toggle_devtools(app_handle: &AppHandle) {
    let Some(window) = main_window(app_handle, "toggle devtools") else {
        return;
    };
    if window.is_devtools_open() {
        window.close_devtools();
    } else {
        window.open_devtools();
    }
}

/// Swaps the loading page for the application page once the helper is up.
pub fn navigate_to_app_page(window: &WebviewWindow) -> tauri::Result<()> {
    let script = format!("window.location.replace({});", js_string_literal(APP_PAGE));
    window.eval(&script)
}

pub fn is_app_page_url(url: &Url) -> bool {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .is_some_and(|last| last == APP_PAGE)
}

pub fn emit_to_main_window<S>(app_handle: &AppHandle, event: &str, payload: S)
where
    S: Serialize + Clone,
{
    if let Err(error) = app_handle.emit_to(MAIN_WINDOW_LABEL, event, payload) {
        log::warn!("[window] failed to emit {event}: {error}");
    }
}

fn js_string_literal(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_app_page_counts_as_loaded() {
        let app = Url::parse("tauri://localhost/index.html").unwrap();
        let loading = Url::parse("tauri://localhost/loading.html").unwrap();
        let root = Url::parse("http://tauri.localhost/").unwrap();

        assert!(is_app_page_url(&app));
        assert!(!is_app_page_url(&loading));
        assert!(!is_app_page_url(&root));
    }
}
