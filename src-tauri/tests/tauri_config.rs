use std::path::Path;

use serde_json::Value;

fn tauri_config() -> Value {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tauri.conf.json");
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn content_security_policy_limits_sources_to_app_and_helper() {
    let config = tauri_config();
    let csp = &config["app"]["security"]["csp"];
    assert!(csp.is_object(), "a content security policy must be configured");

    assert_eq!(csp["object-src"], "'none'");
    for directive in ["script-src", "connect-src", "img-src"] {
        let sources = csp[directive].as_str().unwrap();
        assert!(sources.contains("'self'"), "{directive} must allow the app origin");
        assert!(
            sources.contains("http://127.0.0.1:*"),
            "{directive} must allow the loopback helper"
        );
        assert!(!sources.split_whitespace().any(|source| source == "*"));
    }
}

#[test]
fn main_window_is_created_in_code() {
    let config = tauri_config();
    assert_eq!(config["app"]["windows"], Value::Array(Vec::new()));
    assert_eq!(config["app"]["withGlobalTauri"], true);
}
