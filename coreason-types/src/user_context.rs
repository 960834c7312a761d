//! The authenticated caller, passed in (never authenticated by the core itself).

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// Claim recognized by the ACL gate: when `true`, the ACL check is bypassed.
pub const CLAIM_IS_SERVICE_ACCOUNT: &str = "is_service_account";

/// Per-request, immutable identity/authorization context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserContext {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub groups: BTreeSet<String>,
    #[serde(default)]
    pub claims: HashMap<String, serde_json::Value>,
}

impl UserContext {
    pub fn is_service_account(&self) -> bool {
        self.claims
            .get(CLAIM_IS_SERVICE_ACCOUNT)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_non_service_account() {
        let ctx = UserContext::default();
        assert!(!ctx.is_service_account());
    }

    #[test]
    fn recognizes_service_account_claim() {
        let mut ctx = UserContext::default();
        ctx.claims
            .insert(CLAIM_IS_SERVICE_ACCOUNT.to_string(), serde_json::json!(true));
        assert!(ctx.is_service_account());
    }

    #[test]
    fn ignores_non_boolean_claim_value() {
        let mut ctx = UserContext::default();
        ctx.claims
            .insert(CLAIM_IS_SERVICE_ACCOUNT.to_string(), serde_json::json!("yes"));
        assert!(!ctx.is_service_account());
    }
}
