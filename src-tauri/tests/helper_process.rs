use std::time::Duration;

use item_customizer_lib::{
    app_constants::HELPER_HOST,
    helper_launch::HelperLaunchPlan,
    helper_supervisor::{HelperError, HelperStatus, HelperSupervisor},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};

fn helper_plan(assets_dir: &std::path::Path) -> HelperLaunchPlan {
    let mut plan = HelperLaunchPlan::new(env!("CARGO_BIN_EXE_item-helper"));
    plan.args = vec![
        "--assets-dir".to_string(),
        assets_dir.to_string_lossy().to_string(),
    ];
    plan
}

async fn http_get(port: u16, path: &str) -> String {
    let mut stream = TcpStream::connect((HELPER_HOST, port)).await.unwrap();
    let request =
        format!("GET {path} HTTP/1.1\r\nHost: {HELPER_HOST}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn supervisor_starts_real_helper_and_serves_assets() {
    let assets = tempfile::tempdir().unwrap();
    std::fs::write(assets.path().join("viewer.js"), "console.log('viewer');").unwrap();

    let supervisor = HelperSupervisor::new(helper_plan(assets.path()), Duration::from_secs(20));
    supervisor.start().await.unwrap();

    let uri = supervisor.uri().await.unwrap();
    assert_eq!(uri.host_str(), Some(HELPER_HOST));
    let port = uri.port().unwrap();
    assert_eq!(supervisor.status(), HelperStatus::Ready { port });

    let health = http_get(port, "/health").await;
    assert!(health.starts_with("HTTP/1.1 200"));
    assert!(health.contains(r#""status":"ok""#));

    let asset = http_get(port, "/assets/viewer.js").await;
    assert!(asset.starts_with("HTTP/1.1 200"));
    assert!(asset.contains("console.log('viewer');"));

    // A second readiness query answers with the same URI.
    assert_eq!(supervisor.uri().await.unwrap(), uri);

    supervisor.stop().await;
    assert_eq!(supervisor.status(), HelperStatus::Stopped);
    assert_eq!(supervisor.uri().await, Err(HelperError::Stopped));
}

#[tokio::test]
async fn restart_brings_up_a_fresh_helper() {
    let assets = tempfile::tempdir().unwrap();
    let supervisor = HelperSupervisor::new(helper_plan(assets.path()), Duration::from_secs(20));

    supervisor.start().await.unwrap();
    let first = supervisor.uri().await.unwrap();

    supervisor.restart().await.unwrap();
    let second = supervisor.uri().await.unwrap();
    let health = http_get(second.port().unwrap(), "/health").await;
    assert!(health.starts_with("HTTP/1.1 200"));
    assert_eq!(first.scheme(), second.scheme());

    supervisor.stop().await;
}

#[tokio::test]
async fn helper_rejecting_arguments_is_reported_as_exited() {
    let mut plan = HelperLaunchPlan::new(env!("CARGO_BIN_EXE_item-helper"));
    plan.args = vec!["--bogus".to_string()];
    let supervisor = HelperSupervisor::new(plan, Duration::from_secs(20));

    supervisor.start().await.unwrap();
    let error = supervisor.uri().await.unwrap_err();
    assert!(
        matches!(error, HelperError::Exited(Some(2)) | HelperError::Failed(_)),
        "unexpected error: {error:?}"
    );
}
