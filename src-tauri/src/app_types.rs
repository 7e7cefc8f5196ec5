use std::{
    fmt::Display,
    sync::atomic::{AtomicBool, Ordering},
};

use serde::Serialize;

/// Envelope returned by every bridge command. Failures travel as `error`
/// instead of rejecting the `invoke` promise on the UI side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BridgeResult<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> BridgeResult<T> {
    pub fn success(result: T) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

impl<T, E: Display> From<Result<T, E>> for BridgeResult<T> {
    fn from(value: Result<T, E>) -> Self {
        match value {
            Ok(result) => Self::success(result),
            Err(error) => Self::failure(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HelperBridgeState {
    pub status: &'static str,
    pub port: Option<u16>,
    pub reason: Option<String>,
    pub restarting: bool,
}

/// Payload of the event emitted when the helper dies after startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HelperExitedPayload {
    pub code: Option<i32>,
    pub message: String,
}

pub struct AtomicFlagGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> AtomicFlagGuard<'a> {
    pub fn try_set(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self { flag })
    }
}

impl Drop for AtomicFlagGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    #[test]
    fn bridge_result_from_error_carries_message_only() {
        let result: BridgeResult<u32> = Err::<u32, _>("no such item").into();
        assert!(!result.ok);
        assert_eq!(result.result, None);
        assert_eq!(result.error.as_deref(), Some("no such item"));
    }

    #[test]
    fn bridge_result_serializes_without_empty_fields() {
        let json = serde_json::to_value(BridgeResult::success(7)).unwrap();
        assert_eq!(json, serde_json::json!({ "ok": true, "result": 7 }));

        let json = serde_json::to_value(BridgeResult::<u32>::failure("boom")).unwrap();
        assert_eq!(json, serde_json::json!({ "ok": false, "error": "boom" }));
    }

    #[test]
    fn helper_exited_payload_keeps_null_code_for_signals() {
        let payload = HelperExitedPayload {
            code: None,
            message: "Helper process exited (terminated by signal).".to_string(),
        };
        let json = serde_json::to_value(payload).unwrap();
        assert_eq!(json["code"], serde_json::Value::Null);
    }

    #[test]
    fn atomic_flag_guard_try_set_rejects_double_set_until_drop() {
        let flag = AtomicBool::new(false);

        let guard = AtomicFlagGuard::try_set(&flag).expect("first set should succeed");
        assert!(flag.load(Ordering::Relaxed));
        assert!(AtomicFlagGuard::try_set(&flag).is_none());

        drop(guard);
        assert!(!flag.load(Ordering::Relaxed));
        assert!(AtomicFlagGuard::try_set(&flag).is_some());
    }
}
