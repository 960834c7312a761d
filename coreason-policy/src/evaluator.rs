//! The policy gate: evaluates an embedded policy program against a structured input via an
//! external oracle (the reference implementation shells out to Open Policy Agent's `opa`).

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tempfile::{Builder as TempFileBuilder, NamedTempFile};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::PolicyError;
use crate::input::PolicyInput;

/// Default per-call timeout for the policy oracle (§4.3.2).
pub const DEFAULT_POLICY_TIMEOUT: Duration = Duration::from_secs(5);

/// Evaluate an embedded policy program against a structured input.
#[async_trait]
pub trait PolicyEvaluator: Send + Sync {
    async fn evaluate_policy(
        &self,
        program: &str,
        input: &PolicyInput,
        timeout: Duration,
    ) -> Result<bool, PolicyError>;
}

/// Wrapper around the Open Policy Agent (`opa`) binary for evaluating Rego policies.
pub struct OpaPolicyEvaluator {
    /// Resolved once at construction time and cached; `None` means no usable binary was found.
    opa_path: Option<String>,
}

impl OpaPolicyEvaluator {
    /// Use an explicit path to the `opa` binary.
    pub fn with_path(opa_path: impl Into<String>) -> Self {
        Self {
            opa_path: Some(opa_path.into()),
        }
    }

    /// Resolve the `opa` binary from `PATH` (falling back to `./bin/opa`), once.
    pub fn discover() -> Self {
        let opa_path = which::which("opa")
            .ok()
            .or_else(|| {
                let local = std::path::Path::new("bin/opa");
                local.is_file().then(|| local.to_path_buf())
            })
            .map(|p| p.display().to_string());

        if opa_path.is_none() {
            warn!("opa binary not found; policy evaluation will fail closed");
        }

        Self { opa_path }
    }

    /// Normalize the policy program: if it declares no package, prepend `package match`;
    /// otherwise extract the declared package name (falling back to `match` if it can't be
    /// read), per §4.3.2.
    fn normalize_program(program: &str) -> (String, String) {
        if !program.contains("package ") {
            return (format!("package match\n\n{program}"), "match".to_string());
        }

        let package_name = Regex::new(r"package\s+([a-zA-Z0-9_.]+)")
            .ok()
            .and_then(|re| re.captures(program))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| "match".to_string());

        (program.to_string(), package_name)
    }
}

#[async_trait]
impl PolicyEvaluator for OpaPolicyEvaluator {
    async fn evaluate_policy(
        &self,
        program: &str,
        input: &PolicyInput,
        timeout: Duration,
    ) -> Result<bool, PolicyError> {
        if program.trim().is_empty() {
            return Ok(false);
        }

        let Some(opa_path) = &self.opa_path else {
            return Err(PolicyError::PolicyEvaluationFailed(
                "opa binary is not configured".to_string(),
            ));
        };

        let (final_policy, package_name) = Self::normalize_program(program);
        let query = format!("data.{package_name}.allow");

        let input_json = serde_json::to_vec(input).map_err(|e| PolicyError::InvalidInput(e.to_string()))?;

        // Temp-file creation and writing are blocking syscalls; push them onto the blocking
        // pool so they never stall an async worker thread. NamedTempFile removes its file on
        // drop, on every exit path below (return, `?`, panic unwind).
        let (policy_file, input_file) = tokio::task::spawn_blocking(move || -> Result<(NamedTempFile, NamedTempFile), PolicyError> {
            use std::io::Write as _;

            let mut policy_file = TempFileBuilder::new()
                .suffix(".rego")
                .tempfile()
                .map_err(|e| PolicyError::PolicyEvaluationFailed(format!("failed to create policy file: {e}")))?;
            let mut input_file = TempFileBuilder::new()
                .suffix(".json")
                .tempfile()
                .map_err(|e| PolicyError::PolicyEvaluationFailed(format!("failed to create input file: {e}")))?;

            policy_file
                .write_all(final_policy.as_bytes())
                .map_err(|e| PolicyError::PolicyEvaluationFailed(format!("failed to write policy file: {e}")))?;
            input_file
                .write_all(&input_json)
                .map_err(|e| PolicyError::PolicyEvaluationFailed(format!("failed to write input file: {e}")))?;

            Ok((policy_file, input_file))
        })
        .await
        .map_err(|e| PolicyError::PolicyEvaluationFailed(format!("blocking task panicked: {e}")))??;

        let policy_path = policy_file.path().to_path_buf();
        let input_path = input_file.path().to_path_buf();

        debug!(query = %query, "evaluating policy");

        let mut cmd = Command::new(opa_path);
        cmd.args([
            "eval",
            "--format",
            "json",
            "-d",
            &policy_path.to_string_lossy(),
            "-i",
            &input_path.to_string_lossy(),
            &query,
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(PolicyError::PolicyEvaluationFailed(format!("failed to spawn opa: {e}"))),
            Err(_) => return Err(PolicyError::PolicyTimeout(timeout)),
        };

        if !output.status.success() {
            return Err(PolicyError::PolicyEvaluationFailed(format!(
                "opa exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let parsed: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| PolicyError::PolicyEvaluationFailed(format!("failed to parse opa output: {e}")))?;

        Ok(extract_allow(&parsed))
    }
}

/// `{"result":[{"expressions":[{"value":<bool>}]}]}` — absence of `result`, an empty
/// `result` array, or a non-boolean `value` all mean "not allowed".
fn extract_allow(output: &Value) -> bool {
    output
        .get("result")
        .and_then(Value::as_array)
        .filter(|results| !results.is_empty())
        .and_then(|results| results[0].get("expressions"))
        .and_then(Value::as_array)
        .and_then(|expressions| expressions.first())
        .and_then(|expr| expr.get("value"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_program_without_package_declaration() {
        let (policy, pkg) = OpaPolicyEvaluator::normalize_program("allow { true }");
        assert_eq!(pkg, "match");
        assert!(policy.starts_with("package match"));
        assert!(policy.contains("allow { true }"));
    }

    #[test]
    fn extracts_declared_package_name() {
        let (policy, pkg) = OpaPolicyEvaluator::normalize_program("package geo.us\n\nallow { true }");
        assert_eq!(pkg, "geo.us");
        assert_eq!(policy, "package geo.us\n\nallow { true }");
    }

    #[test]
    fn falls_back_to_match_when_package_name_unreadable() {
        // A package clause is present (so the "no package" branch is not taken), but no
        // token matching the name character class follows it, so the regex capture fails.
        let (policy, pkg) = OpaPolicyEvaluator::normalize_program("package ???\nallow { true }");
        assert_eq!(pkg, "match");
        assert_eq!(policy, "package ???\nallow { true }");
    }

    #[test]
    fn extract_allow_requires_exact_boolean_true() {
        assert!(extract_allow(&serde_json::json!({
            "result": [{"expressions": [{"value": true}]}]
        })));
        assert!(!extract_allow(&serde_json::json!({
            "result": [{"expressions": [{"value": false}]}]
        })));
        assert!(!extract_allow(&serde_json::json!({"result": []})));
        assert!(!extract_allow(&serde_json::json!({})));
        assert!(!extract_allow(&serde_json::json!({
            "result": [{"expressions": [{"value": "true"}]}]
        })));
    }

    #[tokio::test]
    async fn empty_program_returns_false_without_invoking_oracle() {
        let evaluator = OpaPolicyEvaluator::with_path("/nonexistent/opa");
        let input = PolicyInput {
            subject: Default::default(),
            object: crate::input::PolicyObject {
                urn: "urn:x".into(),
                geo: "US".into(),
                sensitivity: coreason_types::DataSensitivity::Public,
                owner: "team".into(),
            },
            action: "QUERY",
        };
        let allowed = evaluator
            .evaluate_policy("   ", &input, DEFAULT_POLICY_TIMEOUT)
            .await
            .unwrap();
        assert!(!allowed);
    }

    #[tokio::test]
    async fn missing_binary_fails_closed_with_evaluation_error() {
        let evaluator = OpaPolicyEvaluator { opa_path: None };
        let input = PolicyInput {
            subject: Default::default(),
            object: crate::input::PolicyObject {
                urn: "urn:x".into(),
                geo: "US".into(),
                sensitivity: coreason_types::DataSensitivity::Public,
                owner: "team".into(),
            },
            action: "QUERY",
        };
        let err = evaluator
            .evaluate_policy("package match\nallow { true }", &input, DEFAULT_POLICY_TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, PolicyError::PolicyEvaluationFailed(_)));
    }
}
