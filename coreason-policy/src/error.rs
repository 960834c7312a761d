use thiserror::Error;

/// Errors raised by the policy gate (§4.3.2).
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("policy evaluation timed out after {0:?}")]
    PolicyTimeout(std::time::Duration),

    #[error("policy evaluation failed: {0}")]
    PolicyEvaluationFailed(String),

    #[error("policy input could not be serialized: {0}")]
    InvalidInput(String),
}
