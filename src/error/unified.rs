//! Error classification and recovery hints.

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Provider,
    Timeout,
    Configuration,
    Serialization,
    Storage,
    ToolExecution,
    Limit,
    Cancelled,
    Unknown,
}

/// Suggested recovery action for a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    Retry,
    CheckConfiguration,
    CheckToolImplementation,
    CheckStorage,
    StartNewSession,
    None,
}
