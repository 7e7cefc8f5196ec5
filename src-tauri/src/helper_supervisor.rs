use std::{
    process::Stdio,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use thiserror::Error;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::{Child, Command},
    sync::{oneshot, watch, Mutex},
    task::JoinHandle,
};
use url::Url;

use crate::{app_constants::HELPER_HOST, helper_announce, helper_launch::HelperLaunchPlan};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelperStatus {
    NotStarted,
    Starting,
    Ready { port: u16 },
    Failed { reason: String },
    Exited { code: Option<i32> },
    Stopped,
}

impl HelperStatus {
    /// Whether a readiness query can answer without waiting.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::NotStarted | Self::Starting)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::NotStarted => "notStarted",
            Self::Starting => "starting",
            Self::Ready { .. } => "ready",
            Self::Failed { .. } => "failed",
            Self::Exited { .. } => "exited",
            Self::Stopped => "stopped",
        }
    }

    pub fn port(&self) -> Option<u16> {
        match self {
            Self::Ready { port } => Some(*port),
            _ => None,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HelperError {
    #[error("Helper announced an invalid port: '{0}'")]
    InvalidAnnouncement(String),
    #[error("Helper launch plan is unavailable: {0}")]
    LaunchPlan(String),
    #[error("Failed to spawn helper process with command {command:?}: {reason}")]
    Spawn { command: Vec<String>, reason: String },
    #[error("Timed out after {0}ms waiting for the helper to announce its port.")]
    ReadyTimeout(u128),
    #[error("Helper failed to start: {0}")]
    Failed(String),
    #[error("Helper process exited ({}).", describe_exit(.0))]
    Exited(Option<i32>),
    #[error("Helper process was stopped.")]
    Stopped,
    #[error("Helper supervisor is shutting down.")]
    Closed,
}

pub fn helper_uri(port: u16) -> Result<Url, HelperError> {
    Url::parse(&format!("http://{HELPER_HOST}:{port}/"))
        .map_err(|error| HelperError::Failed(format!("invalid helper uri: {error}")))
}

#[derive(Debug)]
struct SharedStatus {
    generation: AtomicU64,
    status_tx: watch::Sender<HelperStatus>,
}

impl SharedStatus {
    fn begin_generation(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.status_tx.send_replace(HelperStatus::Starting);
        generation
    }

    /// Applies a status for the given launch. Stale launches are ignored, and
    /// `Ready`/`Failed` only replace `Starting` so a late announcement cannot
    /// resurrect a helper that already exited.
    fn publish(&self, generation: u64, next: HelperStatus) {
        if self.generation.load(Ordering::Acquire) != generation {
            return;
        }
        self.status_tx.send_if_modified(|current| {
            let allowed = match next {
                HelperStatus::Ready { .. } | HelperStatus::Failed { .. } => {
                    *current == HelperStatus::Starting
                }
                _ => true,
            };
            if allowed && *current != next {
                *current = next;
                return true;
            }
            false
        });
    }
}

#[derive(Debug)]
struct RunningHelper {
    kill_tx: oneshot::Sender<()>,
    monitor: JoinHandle<()>,
}

/// Owns the helper child process and its readiness signal.
#[derive(Debug)]
pub struct HelperSupervisor {
    launch: Result<HelperLaunchPlan, String>,
    ready_timeout: Duration,
    shared: Arc<SharedStatus>,
    running: Mutex<Option<RunningHelper>>,
}

impl HelperSupervisor {
    pub fn new(plan: HelperLaunchPlan, ready_timeout: Duration) -> Self {
        Self::with_launch(Ok(plan), ready_timeout)
    }

    /// A supervisor whose launch plan could not be resolved; `start` reports
    /// the reason and readiness queries fail instead of waiting.
    pub fn without_plan(reason: impl Into<String>, ready_timeout: Duration) -> Self {
        Self::with_launch(Err(reason.into()), ready_timeout)
    }

    fn with_launch(launch: Result<HelperLaunchPlan, String>, ready_timeout: Duration) -> Self {
        let (status_tx, _) = watch::channel(HelperStatus::NotStarted);
        Self {
            launch,
            ready_timeout,
            shared: Arc::new(SharedStatus {
                generation: AtomicU64::new(0),
                status_tx,
            }),
            running: Mutex::new(None),
        }
    }

    pub fn status(&self) -> HelperStatus {
        self.shared.status_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<HelperStatus> {
        self.shared.status_tx.subscribe()
    }

    pub fn ready_timeout(&self) -> Duration {
        self.ready_timeout
    }

    pub async fn start(&self) -> Result<(), HelperError> {
        let mut running = self.running.lock().await;
        if let Some(current) = running.as_ref() {
            if !current.monitor.is_finished() {
                return Ok(());
            }
        }
        *running = None;

        let generation = self.shared.begin_generation();
        let plan = match &self.launch {
            Ok(plan) => plan,
            Err(reason) => {
                log::error!("[helper] cannot start helper: {reason}");
                self.shared.publish(
                    generation,
                    HelperStatus::Failed {
                        reason: reason.clone(),
                    },
                );
                return Err(HelperError::LaunchPlan(reason.clone()));
            }
        };

        log::info!("[helper] starting helper process: {:?}", plan.debug_command());
        let mut command = Command::new(&plan.cmd);
        command
            .args(&plan.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &plan.cwd {
            command.current_dir(cwd);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(error) => {
                let error = HelperError::Spawn {
                    command: plan.debug_command(),
                    reason: error.to_string(),
                };
                log::error!("[helper] {error}");
                self.shared.publish(
                    generation,
                    HelperStatus::Failed {
                        reason: error.to_string(),
                    },
                );
                return Err(error);
            }
        };
        log::info!("[helper] helper running as pid {:?}", child.id());

        match child.stdout.take() {
            Some(stdout) => {
                tokio::spawn(watch_announcements(stdout, self.shared.clone(), generation));
            }
            None => self.shared.publish(
                generation,
                HelperStatus::Failed {
                    reason: "helper stdout is not piped".to_string(),
                },
            ),
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stderr(stderr));
        }

        let (kill_tx, kill_rx) = oneshot::channel();
        let monitor = tokio::spawn(monitor_exit(child, kill_rx, self.shared.clone(), generation));
        *running = Some(RunningHelper { kill_tx, monitor });
        Ok(())
    }

    /// Resolves with the helper's loopback URI once its port is announced.
    pub async fn uri(&self) -> Result<Url, HelperError> {
        let mut status_rx = self.shared.status_tx.subscribe();
        let settled = tokio::time::timeout(
            self.ready_timeout,
            status_rx.wait_for(HelperStatus::is_settled),
        )
        .await;

        let status = match settled {
            Ok(Ok(status)) => status.clone(),
            Ok(Err(_)) => return Err(HelperError::Closed),
            Err(_) => return Err(HelperError::ReadyTimeout(self.ready_timeout.as_millis())),
        };

        match status {
            HelperStatus::Ready { port } => helper_uri(port),
            HelperStatus::Failed { reason } => Err(HelperError::Failed(reason)),
            HelperStatus::Exited { code } => Err(HelperError::Exited(code)),
            HelperStatus::Stopped => Err(HelperError::Stopped),
            HelperStatus::NotStarted | HelperStatus::Starting => Err(HelperError::Closed),
        }
    }

    pub async fn stop(&self) {
        let running = self.running.lock().await.take();
        let Some(running) = running else {
            return;
        };

        let _ = running.kill_tx.send(());
        if let Err(error) = running.monitor.await {
            log::warn!("[helper] exit monitor task failed: {error}");
        }
    }

    pub async fn restart(&self) -> Result<(), HelperError> {
        log::info!("[helper] restarting helper process");
        self.stop().await;
        self.start().await
    }
}

async fn watch_announcements<R>(reader: R, shared: Arc<SharedStatus>, generation: u64)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    match lines.next_line().await {
        Ok(Some(line)) => match helper_announce::parse_port_announcement(&line) {
            Ok(port) => {
                log::info!("[helper] helper is listening on port {port}");
                shared.publish(generation, HelperStatus::Ready { port });
            }
            Err(error) => {
                log::error!("[helper] {error}");
                shared.publish(
                    generation,
                    HelperStatus::Failed {
                        reason: error.to_string(),
                    },
                );
            }
        },
        Ok(None) => shared.publish(
            generation,
            HelperStatus::Failed {
                reason: "helper closed stdout before announcing a port".to_string(),
            },
        ),
        Err(error) => shared.publish(
            generation,
            HelperStatus::Failed {
                reason: format!("failed to read helper announcement: {error}"),
            },
        ),
    }

    while let Ok(Some(line)) = lines.next_line().await {
        log::debug!("[helper:stdout] {line}");
    }
}

async fn forward_stderr<R>(reader: R)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        log::info!("[helper:stderr] {line}");
    }
}

async fn monitor_exit(
    mut child: Child,
    kill_rx: oneshot::Receiver<()>,
    shared: Arc<SharedStatus>,
    generation: u64,
) {
    tokio::select! {
        status = child.wait() => match status {
            Ok(status) => {
                log::error!("[helper] helper process exited unexpectedly: {status}");
                shared.publish(generation, HelperStatus::Exited { code: status.code() });
            }
            Err(error) => {
                log::error!("[helper] failed to poll helper process status: {error}");
                shared.publish(
                    generation,
                    HelperStatus::Failed {
                        reason: format!("failed to poll helper process: {error}"),
                    },
                );
            }
        },
        _ = kill_rx => {
            if let Err(error) = child.kill().await {
                log::warn!("[helper] failed to kill helper process: {error}");
            }
            log::info!("[helper] helper process stopped");
            shared.publish(generation, HelperStatus::Stopped);
        }
    }
}
