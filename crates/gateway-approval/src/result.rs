//! Call outcomes and the pure decode stage.
//!
//! `ApprovalResult` is created when a call is issued, mutated only by the
//! decode stage, and immutable once handed to the completion callback.
//! Decoding is a pure function over the fetch outcome so the TEMPFAIL
//! normalization rules are unit-testable without any transport.

use gateway_core::client_trx_id;
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

const DEBUG_VALUE_UNSET: &str = "<not set>";

const TEMPFAIL_TITLE: &str = "Temporary Server Error";

/// Generic support-contact message; the error code is the only part that
/// varies so operators can localize a failure without leaking transport
/// internals to players.
fn support_message(code: char) -> String {
    format!(
        "If the error continues please contact support and mention error code = {}",
        code
    )
}

/// Decision carried by a completed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalAction {
    Allow,
    Reject,
    Tempfail,
    Unknown,
}

impl ApprovalAction {
    pub fn parse(value: &str) -> Self {
        match value {
            "ALLOW" => ApprovalAction::Allow,
            "REJECT" => ApprovalAction::Reject,
            "TEMPFAIL" => ApprovalAction::Tempfail,
            _ => ApprovalAction::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalAction::Allow => "ALLOW",
            ApprovalAction::Reject => "REJECT",
            ApprovalAction::Tempfail => "TEMPFAIL",
            ApprovalAction::Unknown => "UNKNOWN",
        }
    }
}

/// Outcome of one remote call, as delivered to the completion callback.
#[derive(Debug)]
pub struct ApprovalResult {
    pub action: ApprovalAction,
    pub title: String,
    pub message: String,
    pub details: String,
    /// Locally generated correlation id, unique per call.
    pub client_trx_id: String,
    /// The decoded response payload, when one was received.
    pub raw_json: Option<Value>,
    pub elapsed_ms: u64,
    debug_values: HashMap<String, String>,
}

impl ApprovalResult {
    pub fn new() -> Self {
        Self {
            action: ApprovalAction::Unknown,
            title: String::new(),
            message: String::new(),
            details: String::new(),
            client_trx_id: client_trx_id(),
            raw_json: None,
            elapsed_ms: 0,
            debug_values: HashMap::new(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.action == ApprovalAction::Allow
    }

    /// Look up a debug value from the response's `debug` object.
    pub fn debug_value(&self, key: &str) -> &str {
        self.debug_values
            .get(key)
            .map(String::as_str)
            .unwrap_or(DEBUG_VALUE_UNSET)
    }

    pub fn set_debug_value(&mut self, key: &str, value: &str) {
        self.debug_values.insert(key.to_string(), value.to_string());
    }

    /// Remote transaction id, for cross-system log correlation.
    pub fn trx_id(&self) -> &str {
        self.debug_value("trx_id")
    }

    /// Remote-reported processing time, when the response carried one.
    pub fn req_time_ms(&self) -> Option<u64> {
        self.debug_values.get("req_time_ms")?.parse().ok()
    }

    /// Message suitable for surfacing to the caller on denial.
    pub fn user_message(&self) -> String {
        if !self.message.is_empty() {
            self.message.clone()
        } else if !self.title.is_empty() {
            self.title.clone()
        } else {
            format!("Request denied ({})", self.action.as_str())
        }
    }

    /// Synthesized ALLOW for notify-style calls while the gateway is
    /// disabled; no network is attempted.
    pub fn disabled_allow() -> Self {
        let mut result = Self::new();
        result.action = ApprovalAction::Allow;
        result.details = "API not enabled.".to_string();
        result.set_debug_value("trx_id", "api-disabled");
        result
    }

    /// Synthesized REJECT for authentication-critical calls while the
    /// gateway is disabled.
    pub fn disabled_reject() -> Self {
        let mut result = Self::new();
        result.action = ApprovalAction::Reject;
        result.title = TEMPFAIL_TITLE.to_string();
        result.message = support_message('S');
        result.details = "Approval API required for authentication but not configured".to_string();
        result.set_debug_value("trx_id", "api-disabled-auth");
        result
    }
}

impl Default for ApprovalResult {
    fn default() -> Self {
        Self::new()
    }
}

/// What the issue stage produced, before normalization.
#[derive(Debug)]
pub(crate) enum FetchOutcome {
    /// 200 with a decodable, non-null JSON body.
    Success(Value),
    /// 200 but the body was null or unreadable.
    NullBody,
    /// Transport failure or non-200 status.
    TransportError { detail: String },
}

/// Normalize a fetch outcome into the result. Returns true when the outcome
/// counts as an error (feeds the error counter).
pub(crate) fn decode_outcome(
    outcome: FetchOutcome,
    fail_open: bool,
    result: &mut ApprovalResult,
) -> bool {
    match outcome {
        FetchOutcome::TransportError { detail } => {
            result.action = ApprovalAction::Tempfail;
            result.title = TEMPFAIL_TITLE.to_string();
            result.message = support_message('N');
            result.details = detail;
            true
        }
        FetchOutcome::NullBody => {
            result.action = ApprovalAction::Tempfail;
            result.title = TEMPFAIL_TITLE.to_string();
            result.message = support_message('K');
            true
        }
        FetchOutcome::Success(json) => {
            let mut counted = false;

            match json.get("action").and_then(Value::as_str) {
                Some(action) => result.action = ApprovalAction::parse(action),
                None if fail_open => {
                    warn!(
                        trx = %result.client_trx_id,
                        "Missing action from result, failing to ALLOW"
                    );
                    result.action = ApprovalAction::Allow;
                }
                None => {
                    result.action = ApprovalAction::Tempfail;
                    result.title = TEMPFAIL_TITLE.to_string();
                    result.message = support_message('L');
                    result.details = "Missing action field from server".to_string();
                    counted = true;
                }
            }

            if let Some(title) = json.get("title").and_then(Value::as_str) {
                result.title = title.to_string();
            }
            if let Some(message) = json.get("message").and_then(Value::as_str) {
                result.message = message.to_string();
            }
            if let Some(details) = json.get("details").and_then(Value::as_str) {
                result.details = details.to_string();
            }

            if let Some(debug) = json.get("debug") {
                if let Some(trx_id) = debug.get("trx_id").and_then(Value::as_str) {
                    result.set_debug_value("trx_id", trx_id);
                }
                if let Some(req_time) = debug.get("req_time_ms").and_then(Value::as_u64) {
                    result.set_debug_value("req_time_ms", &req_time.to_string());
                }
            }

            result.raw_json = Some(json);
            counted
        }
    }
}

/// Overwrite a result for dry-run delivery: the would-be decision has
/// already been logged; the caller always sees a clean ALLOW.
pub(crate) fn apply_dry_run(result: &mut ApprovalResult) {
    result.action = ApprovalAction::Allow;
    result.title.clear();
    result.message.clear();
    result.details.clear();
    result.set_debug_value("trx_id", "dry-run-trx-id");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_parse() {
        assert_eq!(ApprovalAction::parse("ALLOW"), ApprovalAction::Allow);
        assert_eq!(ApprovalAction::parse("REJECT"), ApprovalAction::Reject);
        assert_eq!(ApprovalAction::parse("TEMPFAIL"), ApprovalAction::Tempfail);
        assert_eq!(ApprovalAction::parse("bogus"), ApprovalAction::Unknown);
    }

    #[test]
    fn test_debug_values_default_unset() {
        let result = ApprovalResult::new();
        assert_eq!(result.debug_value("trx_id"), "<not set>");
        assert_eq!(result.trx_id(), "<not set>");
        assert!(result.req_time_ms().is_none());
    }

    #[test]
    fn test_transport_error_becomes_tempfail_code_n() {
        let mut result = ApprovalResult::new();
        let counted = decode_outcome(
            FetchOutcome::TransportError {
                detail: "HTTP status 503".to_string(),
            },
            false,
            &mut result,
        );

        assert!(counted);
        assert_eq!(result.action, ApprovalAction::Tempfail);
        assert_eq!(result.title, "Temporary Server Error");
        assert!(result.message.ends_with("error code = N"));
        assert_eq!(result.details, "HTTP status 503");
    }

    #[test]
    fn test_null_body_becomes_tempfail_code_k() {
        let mut result = ApprovalResult::new();
        let counted = decode_outcome(FetchOutcome::NullBody, false, &mut result);

        assert!(counted);
        assert_eq!(result.action, ApprovalAction::Tempfail);
        assert!(result.message.ends_with("error code = K"));
    }

    #[test]
    fn test_missing_action_becomes_tempfail_code_l() {
        let mut result = ApprovalResult::new();
        let counted = decode_outcome(
            FetchOutcome::Success(json!({"title": "hi"})),
            false,
            &mut result,
        );

        assert!(counted);
        assert_eq!(result.action, ApprovalAction::Tempfail);
        assert!(result.message.ends_with("error code = L"));
        assert_eq!(result.details, "Missing action field from server");
    }

    #[test]
    fn test_missing_action_fail_open_allows() {
        let mut result = ApprovalResult::new();
        let counted = decode_outcome(FetchOutcome::Success(json!({})), true, &mut result);

        assert!(!counted);
        assert_eq!(result.action, ApprovalAction::Allow);
    }

    #[test]
    fn test_full_response_decodes() {
        let body = json!({
            "action": "REJECT",
            "title": "Banned",
            "message": "Your account is banned",
            "details": "ban expires 2026-01-01",
            "debug": {"trx_id": "abc123", "req_time_ms": 42},
        });

        let mut result = ApprovalResult::new();
        let counted = decode_outcome(FetchOutcome::Success(body), false, &mut result);

        assert!(!counted);
        assert_eq!(result.action, ApprovalAction::Reject);
        assert_eq!(result.title, "Banned");
        assert_eq!(result.message, "Your account is banned");
        assert_eq!(result.trx_id(), "abc123");
        assert_eq!(result.req_time_ms(), Some(42));
        assert!(result.raw_json.is_some());
    }

    #[test]
    fn test_dry_run_overwrites_to_clean_allow() {
        let mut result = ApprovalResult::new();
        decode_outcome(
            FetchOutcome::Success(json!({"action": "REJECT", "title": "Banned"})),
            false,
            &mut result,
        );

        apply_dry_run(&mut result);

        assert_eq!(result.action, ApprovalAction::Allow);
        assert!(result.title.is_empty());
        assert!(result.message.is_empty());
        assert!(result.details.is_empty());
        assert_eq!(result.trx_id(), "dry-run-trx-id");
    }

    #[test]
    fn test_disabled_synthesis() {
        let allow = ApprovalResult::disabled_allow();
        assert_eq!(allow.action, ApprovalAction::Allow);
        assert_eq!(allow.trx_id(), "api-disabled");

        let reject = ApprovalResult::disabled_reject();
        assert_eq!(reject.action, ApprovalAction::Reject);
        assert!(reject.message.ends_with("error code = S"));
        assert_eq!(reject.trx_id(), "api-disabled-auth");
    }

    #[test]
    fn test_user_message_fallbacks() {
        let mut result = ApprovalResult::new();
        result.action = ApprovalAction::Reject;
        assert_eq!(result.user_message(), "Request denied (REJECT)");

        result.title = "Denied".to_string();
        assert_eq!(result.user_message(), "Denied");

        result.message = "No entry".to_string();
        assert_eq!(result.user_message(), "No entry");
    }
}
