//! Two-gate governance for the broker's dispatch pipeline: a fast ACL intersection check
//! followed by an external embedded-policy oracle, both fail-closed.

mod acl;
mod error;
mod evaluator;
mod input;

pub use acl::check_access;
pub use error::PolicyError;
pub use evaluator::{OpaPolicyEvaluator, PolicyEvaluator, DEFAULT_POLICY_TIMEOUT};
pub use input::{PolicyInput, PolicyObject};
