use std::{env, io, process::ExitCode};

use env_logger::{Env, Target};
use item_customizer_lib::helper_server::{self, HelperArgs};

#[tokio::main]
async fn main() -> ExitCode {
    // stdout carries the port announcement, so logs go to stderr.
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stderr)
        .init();

    let args = match HelperArgs::parse(env::args().skip(1)) {
        Ok(args) => args,
        Err(error) => {
            log::error!("{error}");
            return ExitCode::from(2);
        }
    };

    let listener = match helper_server::bind_loopback().await {
        Ok(listener) => listener,
        Err(error) => {
            log::error!("failed to bind helper listener: {error}");
            return ExitCode::FAILURE;
        }
    };
    let port = match listener.local_addr() {
        Ok(addr) => addr.port(),
        Err(error) => {
            log::error!("failed to read helper listener address: {error}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(error) = helper_server::announce_port(&mut io::stdout().lock(), port) {
        log::error!("failed to announce helper port: {error}");
        return ExitCode::FAILURE;
    }
    log::info!("helper listening on port {port}");

    match helper_server::serve(listener, &args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log::error!("helper server stopped: {error}");
            ExitCode::FAILURE
        }
    }
}
