use std::sync::Mutex;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum LifecyclePhase {
    Uninitialized,
    WindowConstructed,
    HelperStarting,
    HelperReady { port: u16 },
    PageLoaded,
    Failed { reason: String },
}

impl LifecyclePhase {
    fn ordinal(&self) -> Option<u8> {
        match self {
            Self::Uninitialized => Some(0),
            Self::WindowConstructed => Some(1),
            Self::HelperStarting => Some(2),
            Self::HelperReady { .. } => Some(3),
            Self::PageLoaded => Some(4),
            Self::Failed { .. } => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::PageLoaded | Self::Failed { .. })
    }
}

/// Payload shown by the loading page when startup cannot finish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupFailedPayload {
    pub reason: String,
}

impl StartupFailedPayload {
    pub fn from_phase(phase: &LifecyclePhase) -> Option<Self> {
        match phase {
            LifecyclePhase::Failed { reason } => Some(Self {
                reason: reason.clone(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("Invalid lifecycle transition from {from:?} to {to:?}.")]
    InvalidTransition {
        from: LifecyclePhase,
        to: LifecyclePhase,
    },
    #[error("Lifecycle state lock poisoned.")]
    Poisoned,
}

/// Startup state machine of the shell. Phases advance strictly one step at a
/// time; `Failed` is reachable from any phase that is not terminal.
#[derive(Debug)]
pub struct Lifecycle {
    phase: Mutex<LifecyclePhase>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            phase: Mutex::new(LifecyclePhase::Uninitialized),
        }
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
            .lock()
            .map(|phase| phase.clone())
            .unwrap_or(LifecyclePhase::Failed {
                reason: "lifecycle state lock poisoned".to_string(),
            })
    }

    pub fn advance(&self, next: LifecyclePhase) -> Result<(), LifecycleError> {
        let mut phase = self.phase.lock().map_err(|_| LifecycleError::Poisoned)?;
        let allowed = match (phase.ordinal(), next.ordinal()) {
            (Some(current), Some(target)) => target == current + 1,
            (Some(_), None) => !phase.is_terminal(),
            (None, _) => false,
        };
        if !allowed {
            return Err(LifecycleError::InvalidTransition {
                from: phase.clone(),
                to: next,
            });
        }

        log::info!("[lifecycle] {:?} -> {:?}", *phase, next);
        *phase = next;
        Ok(())
    }

    pub fn fail(&self, reason: impl Into<String>) -> Result<(), LifecycleError> {
        self.advance(LifecyclePhase::Failed {
            reason: reason.into(),
        })
    }

    pub fn startup_failure(&self) -> Option<StartupFailedPayload> {
        StartupFailedPayload::from_phase(&self.phase())
    }

    pub fn helper_port(&self) -> Option<u16> {
        match self.phase() {
            LifecyclePhase::HelperReady { port } => Some(port),
            _ => None,
        }
    }

    pub fn is_page_loaded(&self) -> bool {
        self.phase() == LifecyclePhase::PageLoaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_walks_every_phase_in_order() {
        let lifecycle = Lifecycle::new();
        lifecycle.advance(LifecyclePhase::WindowConstructed).unwrap();
        lifecycle.advance(LifecyclePhase::HelperStarting).unwrap();
        lifecycle
            .advance(LifecyclePhase::HelperReady { port: 40000 })
            .unwrap();
        assert_eq!(lifecycle.helper_port(), Some(40000));
        lifecycle.advance(LifecyclePhase::PageLoaded).unwrap();
        assert!(lifecycle.is_page_loaded());
    }

    #[test]
    fn skipping_a_phase_is_rejected() {
        let lifecycle = Lifecycle::new();
        let error = lifecycle.advance(LifecyclePhase::PageLoaded).unwrap_err();
        assert_eq!(
            error,
            LifecycleError::InvalidTransition {
                from: LifecyclePhase::Uninitialized,
                to: LifecyclePhase::PageLoaded,
            }
        );
        assert_eq!(lifecycle.phase(), LifecyclePhase::Uninitialized);
    }

    #[test]
    fn going_backwards_is_rejected() {
        let lifecycle = Lifecycle::new();
        lifecycle.advance(LifecyclePhase::WindowConstructed).unwrap();
        lifecycle.advance(LifecyclePhase::HelperStarting).unwrap();
        assert!(lifecycle.advance(LifecyclePhase::WindowConstructed).is_err());
    }

    #[test]
    fn failure_is_terminal() {
        let lifecycle = Lifecycle::new();
        lifecycle.advance(LifecyclePhase::WindowConstructed).unwrap();
        lifecycle.advance(LifecyclePhase::HelperStarting).unwrap();
        lifecycle.fail("helper timed out").unwrap();

        assert!(lifecycle.phase().is_terminal());
        assert!(lifecycle.advance(LifecyclePhase::HelperReady { port: 1 }).is_err());
        assert!(lifecycle.fail("again").is_err());
    }

    #[test]
    fn failed_startup_yields_payload_with_reason() {
        let lifecycle = Lifecycle::new();
        lifecycle.advance(LifecyclePhase::WindowConstructed).unwrap();
        lifecycle.advance(LifecyclePhase::HelperStarting).unwrap();
        assert_eq!(lifecycle.startup_failure(), None);

        let reason = crate::helper_supervisor::HelperError::ReadyTimeout(20_000).to_string();
        lifecycle.fail(reason.clone()).unwrap();

        let payload = lifecycle.startup_failure().unwrap();
        assert_eq!(payload.reason, reason);
        let json = serde_json::to_value(payload).unwrap();
        assert_eq!(
            json["reason"],
            "Timed out after 20000ms waiting for the helper to announce its port."
        );
    }

    #[test]
    fn loaded_page_cannot_fail_afterwards() {
        let lifecycle = Lifecycle::new();
        for phase in [
            LifecyclePhase::WindowConstructed,
            LifecyclePhase::HelperStarting,
            LifecyclePhase::HelperReady { port: 8 },
            LifecyclePhase::PageLoaded,
        ] {
            lifecycle.advance(phase).unwrap();
        }
        assert!(lifecycle.fail("late").is_err());
    }
}
