use crate::app_constants::{MENU_OPEN_EVENT, MENU_SAVE_EVENT};

pub const MENU_FILE_OPEN: &str = "menu_file_open";
pub const MENU_FILE_SAVE: &str = "menu_file_save";
pub const MENU_VIEW_RELOAD: &str = "menu_view_reload";
pub const MENU_VIEW_FORCE_RELOAD: &str = "menu_view_force_reload";
pub const MENU_VIEW_TOGGLE_DEVTOOLS: &str = "menu_view_toggle_devtools";
pub const MENU_VIEW_RESET_ZOOM: &str = "menu_view_reset_zoom";
pub const MENU_VIEW_ZOOM_IN: &str = "menu_view_zoom_in";
pub const MENU_VIEW_ZOOM_OUT: &str = "menu_view_zoom_out";

pub const OPEN_ACCELERATOR: &str = "CmdOrCtrl+O";
pub const SAVE_ACCELERATOR: &str = "CmdOrCtrl+S";
pub const RELOAD_ACCELERATOR: &str = "CmdOrCtrl+R";
pub const FORCE_RELOAD_ACCELERATOR: &str = "CmdOrCtrl+Shift+R";
pub const RESET_ZOOM_ACCELERATOR: &str = "CmdOrCtrl+0";
pub const ZOOM_IN_ACCELERATOR: &str = "CmdOrCtrl+=";
pub const ZOOM_OUT_ACCELERATOR: &str = "CmdOrCtrl+-";

pub const DEFAULT_ZOOM_PERCENT: u32 = 100;
const ZOOM_STEP_PERCENT: u32 = 10;
const MIN_ZOOM_PERCENT: u32 = 30;
const MAX_ZOOM_PERCENT: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    OpenFile,
    Save,
    Reload,
    ForceReload,
    ToggleDevtools,
    ResetZoom,
    ZoomIn,
    ZoomOut,
}

impl MenuAction {
    /// Event forwarded to the page for actions the UI carries out itself.
    pub fn ui_event(self) -> Option<&'static str> {
        match self {
            Self::OpenFile => Some(MENU_OPEN_EVENT),
            Self::Save => Some(MENU_SAVE_EVENT),
            _ => None,
        }
    }

    /// Zoom after this action, or `None` when the action does not zoom.
    pub fn zoom_percent_after(self, current: u32) -> Option<u32> {
        let next = match self {
            Self::ResetZoom => DEFAULT_ZOOM_PERCENT,
            Self::ZoomIn => current.saturating_add(ZOOM_STEP_PERCENT),
            Self::ZoomOut => current.saturating_sub(ZOOM_STEP_PERCENT),
            _ => return None,
        };
        Some(next.clamp(MIN_ZOOM_PERCENT, MAX_ZOOM_PERCENT))
    }
}

/// Developer tools are only offered in debug builds.
pub fn devtools_menu_enabled(debug_build: bool) -> bool {
    debug_build
}

pub fn action_from_menu_id(menu_id: &str) -> Option<MenuAction> {
    match menu_id {
        MENU_FILE_OPEN => Some(MenuAction::OpenFile),
        MENU_FILE_SAVE => Some(MenuAction::Save),
        MENU_VIEW_RELOAD => Some(MenuAction::Reload),
        MENU_VIEW_FORCE_RELOAD => Some(MenuAction::ForceReload),
        MENU_VIEW_TOGGLE_DEVTOOLS => Some(MenuAction::ToggleDevtools),
        MENU_VIEW_RESET_ZOOM => Some(MenuAction::ResetZoom),
        MENU_VIEW_ZOOM_IN => Some(MenuAction::ZoomIn),
        MENU_VIEW_ZOOM_OUT => Some(MenuAction::ZoomOut),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_from_menu_id_maps_all_known_actions() {
        assert_eq!(action_from_menu_id(MENU_FILE_OPEN), Some(MenuAction::OpenFile));
        assert_eq!(action_from_menu_id(MENU_FILE_SAVE), Some(MenuAction::Save));
        assert_eq!(action_from_menu_id(MENU_VIEW_RELOAD), Some(MenuAction::Reload));
        assert_eq!(
            action_from_menu_id(MENU_VIEW_TOGGLE_DEVTOOLS),
            Some(MenuAction::ToggleDevtools)
        );
        assert_eq!(
            action_from_menu_id(MENU_VIEW_FORCE_RELOAD),
            Some(MenuAction::ForceReload)
        );
        assert_eq!(action_from_menu_id(MENU_VIEW_RESET_ZOOM), Some(MenuAction::ResetZoom));
        assert_eq!(action_from_menu_id(MENU_VIEW_ZOOM_IN), Some(MenuAction::ZoomIn));
        assert_eq!(action_from_menu_id(MENU_VIEW_ZOOM_OUT), Some(MenuAction::ZoomOut));
    }

    #[test]
    fn zoom_steps_by_ten_percent_within_bounds() {
        assert_eq!(MenuAction::ZoomIn.zoom_percent_after(100), Some(110));
        assert_eq!(MenuAction::ZoomOut.zoom_percent_after(100), Some(90));
        assert_eq!(MenuAction::ResetZoom.zoom_percent_after(170), Some(100));
        assert_eq!(MenuAction::ZoomIn.zoom_percent_after(300), Some(300));
        assert_eq!(MenuAction::ZoomOut.zoom_percent_after(30), Some(30));
        assert_eq!(MenuAction::ZoomOut.zoom_percent_after(0), Some(30));
        assert_eq!(MenuAction::Reload.zoom_percent_after(100), None);
        assert_eq!(MenuAction::ForceReload.zoom_percent_after(100), None);
    }

    #[test]
    fn file_actions_forward_ui_events_and_view_actions_do_not() {
        assert_eq!(MenuAction::OpenFile.ui_event(), Some("menu://open"));
        assert_eq!(MenuAction::Save.ui_event(), Some("menu://save"));
        assert_eq!(MenuAction::Reload.ui_event(), None);
        assert_eq!(MenuAction::ToggleDevtools.ui_event(), None);
        assert_eq!(MenuAction::ForceReload.ui_event(), None);
        assert_eq!(MenuAction::ZoomIn.ui_event(), None);
    }

    #[test]
    fn devtools_menu_follows_build_profile() {
        assert!(devtools_menu_enabled(true));
        assert!(!devtools_menu_enabled(false));
    }

    #[test]
    fn action_from_menu_id_returns_none_for_unknown_menu_id() {
        assert_eq!(action_from_menu_id("unknown-menu"), None);
    }
}
