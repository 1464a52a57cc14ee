use serde::{Deserialize, Serialize};

use stockcert_core::{GrantDenial, ShareClassCode};

/// Front end → ledger.
///
/// Wire form: `{"action":"grant","share_class":"CS","share_amount":10}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LedgerRequest {
    Grant {
        share_class: ShareClassCode,
        share_amount: u64,
    },
}

/// Why a request failed. Omitted on the wire for denials.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Legitimate refusal (unknown class, not enough shares).
    #[default]
    Denied,
    /// The ledger could not process the request (log IO, malformed input).
    Internal,
}

impl FailureKind {
    pub fn is_denied(&self) -> bool {
        matches!(self, FailureKind::Denied)
    }
}

/// Ledger → front end.
///
/// Success: `{"cert_id":1,"share_class":"CS","share_amount":10}`.
/// Denial: `{"error":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LedgerResponse {
    Granted {
        cert_id: u64,
        share_class: ShareClassCode,
        share_amount: u64,
    },
    Failed {
        error: String,
        #[serde(default, skip_serializing_if = "FailureKind::is_denied")]
        kind: FailureKind,
    },
}

impl LedgerResponse {
    pub fn denied(denial: &GrantDenial) -> Self {
        Self::Failed {
            error: denial.to_string(),
            kind: FailureKind::Denied,
        }
    }

    pub fn internal(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
            kind: FailureKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cs() -> ShareClassCode {
        ShareClassCode::new("CS").unwrap()
    }

    #[test]
    fn request_wire_shape() {
        let req = LedgerRequest::Grant { share_class: cs(), share_amount: 10 };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"action": "grant", "share_class": "CS", "share_amount": 10})
        );
    }

    #[test]
    fn unknown_action_is_rejected() {
        let raw = r#"{"action":"revoke","share_class":"CS","share_amount":10}"#;
        assert!(serde_json::from_str::<LedgerRequest>(raw).is_err());
    }

    #[test]
    fn denial_reply_is_just_the_error() {
        let denial = GrantDenial::UnknownShareClass(cs());
        assert_eq!(
            serde_json::to_value(LedgerResponse::denied(&denial)).unwrap(),
            json!({"error": "unknown share class: CS"})
        );
    }

    #[test]
    fn responses_parse_by_shape() {
        let granted: LedgerResponse =
            serde_json::from_str(r#"{"cert_id":7,"share_class":"CS","share_amount":10}"#).unwrap();
        assert_eq!(
            granted,
            LedgerResponse::Granted { cert_id: 7, share_class: cs(), share_amount: 10 }
        );

        let denied: LedgerResponse = serde_json::from_str(r#"{"error":"nope"}"#).unwrap();
        assert_eq!(
            denied,
            LedgerResponse::Failed { error: "nope".into(), kind: FailureKind::Denied }
        );

        let internal: LedgerResponse =
            serde_json::from_str(r#"{"error":"disk full","kind":"internal"}"#).unwrap();
        assert_eq!(internal, LedgerResponse::internal("disk full"));
    }
}
