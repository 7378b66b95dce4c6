use serde::{Deserialize, Serialize};

/// What to do when the motion engine reports a failure.
///
/// Neither policy propagates the failure: the acquisition loop and the
/// predicates keep running either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Log the failure, skip the affected frame or reading, keep calling
    LogAndContinue,

    /// Stop calling the engine after `error_threshold` consecutive failures,
    /// then try again once `cooldown_ms` has passed
    CircuitBreaker {
        error_threshold: usize,
        cooldown_ms: u64,
    },
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        ErrorPolicy::LogAndContinue
    }
}
