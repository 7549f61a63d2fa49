use thiserror::Error;

/// Reasons a solve call ends without a conflict-free node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("Invalid task: {0}")]
    TaskInvalid(String),

    #[error("No path exists for agent {agent} without constraints")]
    PlannerFailure { agent: usize },

    #[error("Open list exhausted, no solution found")]
    OpenExhausted,

    #[error("Time limit exceeded")]
    TimedOut,

    #[error("Search cancelled")]
    Cancelled,
}
