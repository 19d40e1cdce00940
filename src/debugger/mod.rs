//! Debugger core: breakpoint bookkeeping and execution control.

pub mod breakpoint;
pub mod labels;
pub mod scheduler;
pub mod session;
pub mod state;
pub mod sync;

pub use breakpoint::{Breakpoint, BreakpointStore};
pub use labels::LabelResolver;
pub use scheduler::{ExecutionScheduler, ThroughputController};
pub use session::{Session, SessionPorts};
pub use state::DebugState;
pub use sync::{BreakpointSync, HitResult};
