//! Contract between the debugger core and an instruction-execution engine.
//!
//! The engine owns fetch/decode/execute, memory and registers. The core only
//! drives it in bounded batches and reads back a handful of facts: state,
//! instruction pointer and the retired-instruction counter.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Engine symbol table: address to exported or imported name.
pub type ImportTable = BTreeMap<u32, String>;

/// Engine state after a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum CpuState {
    Running,
    /// Every execution context is waiting on something (a sleep, a message).
    Blocked,
    /// Stopped on an engine-registered breakpoint.
    DebugBreak,
    Exit(u32),
    Error(String),
}

impl CpuState {
    pub fn is_running(&self) -> bool {
        matches!(self, CpuState::Running)
    }
}

impl fmt::Display for CpuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CpuState::Running => write!(f, "running"),
            CpuState::Blocked => write!(f, "blocked"),
            CpuState::DebugBreak => write!(f, "debug break"),
            CpuState::Exit(code) => write!(f, "exited with code {}", code),
            CpuState::Error(msg) => write!(f, "error: {}", msg),
        }
    }
}

/// A region of the emulated address space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub addr: u32,
    pub size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    pub desc: String,
}

/// One syntactic piece of a disassembled instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionPart {
    pub kind: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub addr: u32,
    /// Raw encoding as a hex string.
    pub bytes: String,
    pub code: Vec<InstructionPart>,
    /// Operand descriptions, when the engine reports them.
    #[serde(default)]
    pub ops: Vec<String>,
}

impl Instruction {
    /// Concatenated text of all parts.
    pub fn text(&self) -> String {
        self.code.iter().map(|p| p.text.as_str()).collect()
    }
}

/// An instruction-execution engine the debugger can drive.
pub trait Engine {
    /// One-time load of a program image.
    fn load(&mut self, name: &str, image: &[u8], relocate: bool) -> Result<()>;

    /// Symbol table reported after [`Engine::load`].
    fn import_table(&self) -> ImportTable;

    /// Execute up to `max_instructions` instructions.
    fn run(&mut self, max_instructions: usize) -> CpuState;

    /// Monotonic count of retired instructions.
    fn instruction_count(&self) -> u64;

    fn instruction_pointer(&self) -> u32;

    fn register_breakpoint(&mut self, addr: u32);

    fn clear_breakpoint(&mut self, addr: u32);

    /// Try to resume any execution context waiting on a blocking condition.
    fn unblock(&mut self);

    fn memory_mappings(&self) -> Vec<Mapping>;

    /// Disassemble `count` instructions starting at `addr`.
    ///
    /// May invalidate raw views of guest memory, hence `&mut self`.
    fn disassemble(&mut self, addr: u32, count: usize) -> Vec<Instruction>;
}
