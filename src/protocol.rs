use crate::debugger::{Breakpoint, DebugState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebugRequest {
    Start,
    Stop,
    Step,
    RunTo { address: u32 },
    AddBreakpoint { address: u32, #[serde(default)] one_shot: bool },
    AddBreakByName { name: String },
    RemoveBreakpoint { address: u32 },
    ToggleBreakpoint { address: u32 },
    ListBreakpoints,
    GetState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DebugResponse {
    Ok,
    Error(String),
    Breakpoints(Vec<Breakpoint>),
    State(DebugState),
    /// Outcome of a by-name request; `None` when the name did not resolve.
    Resolved(Option<u32>),
}
