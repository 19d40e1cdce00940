//! Execution control for interactive CPU emulators.
//!
//! The crate sits between a debugger UI and an instruction-execution engine.
//! It owns the breakpoint set, keeps it synchronized with the engine around
//! every execution batch, and sizes those batches adaptively so that long runs
//! stay fast without stalling the host.

pub mod cli;
pub mod config;
pub mod debugger;
pub mod error;
pub mod protocol;
pub mod runtime;

pub use config::DebuggerConfig;
pub use debugger::{
    Breakpoint, BreakpointStore, BreakpointSync, ExecutionScheduler, HitResult, LabelResolver,
    Session, ThroughputController,
};
pub use error::DebuggerError;

/// Crate-wide result type.
pub type Result<T> = anyhow::Result<T>;
