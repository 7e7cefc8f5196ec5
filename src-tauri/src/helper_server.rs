//! HTTP side of the helper process: health check plus the static assets the
//! editor page loads from the helper origin.

use std::{
    io::{self, Write},
    path::PathBuf,
};

use axum::{routing::get, Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::{
    app_constants::{ASSETS_DIR_ENV, HELPER_HOST},
    helper_announce, runtime_paths,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelperArgs {
    pub assets_dir: Option<PathBuf>,
}

impl HelperArgs {
    pub fn parse<I>(args: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--assets-dir" => {
                    let value = args
                        .next()
                        .ok_or_else(|| "--assets-dir requires a value".to_string())?;
                    parsed.assets_dir = Some(PathBuf::from(value));
                }
                other => return Err(format!("Unknown argument: {other}")),
            }
        }

        if parsed.assets_dir.is_none() {
            parsed.assets_dir = runtime_paths::env_path(ASSETS_DIR_ENV);
        }
        Ok(parsed)
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router(args: &HelperArgs) -> Router {
    let mut router = Router::new().route("/health", get(health));
    if let Some(assets_dir) = &args.assets_dir {
        router = router.nest_service("/assets", ServeDir::new(assets_dir));
    }
    router.layer(CorsLayer::permissive())
}

pub async fn bind_loopback() -> io::Result<TcpListener> {
    TcpListener::bind((HELPER_HOST, 0)).await
}

/// Writes the port announcement the supervisor waits for.
pub fn announce_port<W: Write>(out: &mut W, port: u16) -> io::Result<()> {
    out.write_all(helper_announce::format_port_announcement(port).as_bytes())?;
    out.flush()
}

pub async fn serve(listener: TcpListener, args: &HelperArgs) -> io::Result<()> {
    if let Some(assets_dir) = &args.assets_dir {
        if !assets_dir.is_dir() {
            log::warn!("assets directory {} does not exist", assets_dir.display());
        }
    }
    axum::serve(listener, router(args)).await
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpStream,
    };

    use super::*;

    async fn http_get(port: u16, path: &str) -> String {
        let mut stream = TcpStream::connect((HELPER_HOST, port)).await.unwrap();
        let request =
            format!("GET {path} HTTP/1.1\r\nHost: {HELPER_HOST}\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[test]
    fn parse_reads_assets_dir_flag() {
        let args = HelperArgs::parse(vec!["--assets-dir".to_string(), "/srv/mv".to_string()]).unwrap();
        assert_eq!(args.assets_dir, Some(PathBuf::from("/srv/mv")));
    }

    #[test]
    fn parse_rejects_unknown_and_incomplete_flags() {
        assert!(HelperArgs::parse(vec!["--port".to_string()]).is_err());
        assert!(HelperArgs::parse(vec!["--assets-dir".to_string()]).is_err());
    }

    #[test]
    fn announce_port_writes_single_line() {
        let mut out = Vec::new();
        announce_port(&mut out, 43123).unwrap();
        assert_eq!(out, b"43123\n");
    }

    #[tokio::test]
    async fn serves_health_and_assets() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("viewer.js"), "console.log('viewer');").unwrap();
        let args = HelperArgs {
            assets_dir: Some(dir.path().to_path_buf()),
        };

        let listener = bind_loopback().await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move { serve(listener, &args).await });

        let health = http_get(port, "/health").await;
        assert!(health.starts_with("HTTP/1.1 200"));
        assert!(health.contains(r#""status":"ok""#));

        let asset = http_get(port, "/assets/viewer.js").await;
        assert!(asset.starts_with("HTTP/1.1 200"));
        assert!(asset.contains("console.log('viewer');"));

        let missing = http_get(port, "/assets/missing.js").await;
        assert!(missing.starts_with("HTTP/1.1 404"));
    }
}
