#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

fn main() {
    item_customizer_lib::run();
}
