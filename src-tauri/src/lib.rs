pub mod app_constants;
pub mod app_services;
pub mod app_store;
pub mod app_types;
pub mod catalog;
pub mod first_run;
pub mod helper_announce;
pub mod helper_launch;
pub mod helper_server;
pub mod helper_supervisor;
pub mod item_data;
pub mod lifecycle;
pub mod menu_actions;
pub mod patch_tool;
pub mod runtime_paths;
pub mod settings;
pub mod update_check;

#[cfg(feature = "desktop")]
mod app_runtime;
#[cfg(feature = "desktop")]
mod desktop_bridge_commands;
#[cfg(feature = "desktop")]
mod main_menu;
#[cfg(feature = "desktop")]
mod window_actions;

#[cfg(feature = "desktop")]
pub fn run() {
    app_runtime::run();
}
