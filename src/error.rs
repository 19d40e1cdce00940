use thiserror::Error;

/// Errors raised by the debugger core and its ports.
///
/// Unresolvable breakpoint names, corrupt persisted data and engine halts are
/// deliberately absent: those are ordinary outcomes, not errors.
#[derive(Debug, Error)]
pub enum DebuggerError {
    #[error("No breakpoint at {0:#010x}")]
    BreakpointNotFound(u32),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Malformed engine payload: {0}")]
    Schema(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}
