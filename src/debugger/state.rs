use super::breakpoint::Breakpoint;
use crate::runtime::CpuState;
use serde::{Deserialize, Serialize};

/// Point-in-time view of a debugging session, as reported to UIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugState {
    pub running: bool,
    pub instruction_pointer: u32,
    /// Nearest label plus offset for `instruction_pointer`.
    pub location: String,
    pub instruction_count: u64,
    pub step_size: usize,
    pub instr_per_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_state: Option<CpuState>,
    pub breakpoints: Vec<Breakpoint>,
}
