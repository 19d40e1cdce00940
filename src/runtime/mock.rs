//! Deterministic scripted engine.
//!
//! Instead of decoding machine code, a [`ScriptedEngine`] walks a fixed trace
//! of instruction addresses. It honors the parts of the engine contract the
//! debugger depends on: breakpoints stop execution *before* the instruction at
//! their address, blocking points hold execution until [`Engine::unblock`],
//! and running off the end of the trace exits the program.

use super::engine::{CpuState, Engine, ImportTable, Instruction, InstructionPart, Mapping};
use super::schema;
use crate::{DebuggerError, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// On-disk form of a scripted program, as passed to [`Engine::load`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraceFile {
    /// Address of each executed instruction, in execution order.
    pub program: Vec<u32>,
    /// Symbol table keyed by decimal or `0x` hex address.
    #[serde(default)]
    pub imports: BTreeMap<String, String>,
    /// Trace positions at which execution blocks until unblocked.
    #[serde(default)]
    pub blocks: Vec<usize>,
    #[serde(default)]
    pub exit_code: u32,
    #[serde(default)]
    pub mappings: Vec<Mapping>,
}

/// Engine calls recorded for inspection by tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCall {
    Run(usize),
    Register(u32),
    Clear(u32),
    Unblock,
}

#[derive(Debug, Default)]
pub struct ScriptedEngine {
    name: Option<String>,
    program: Vec<u32>,
    pc: usize,
    count: u64,
    blocks: BTreeSet<usize>,
    blocked: bool,
    exit_code: u32,
    state: Option<CpuState>,
    imports: ImportTable,
    mappings: Vec<Mapping>,
    breakpoints: BTreeSet<u32>,
    calls: Vec<EngineCall>,
}

impl ScriptedEngine {
    pub fn new(program: Vec<u32>) -> Self {
        Self {
            program,
            ..Self::default()
        }
    }

    pub fn with_imports(mut self, imports: ImportTable) -> Self {
        self.imports = imports;
        self
    }

    /// Block when execution reaches trace position `index`.
    pub fn with_block_at(mut self, index: usize) -> Self {
        self.blocks.insert(index);
        self
    }

    pub fn with_exit_code(mut self, code: u32) -> Self {
        self.exit_code = code;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Breakpoints currently registered with the engine.
    pub fn registered_breakpoints(&self) -> &BTreeSet<u32> {
        &self.breakpoints
    }

    pub fn calls(&self) -> &[EngineCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<EngineCall> {
        std::mem::take(&mut self.calls)
    }

    /// Instruction pointer once the trace is exhausted.
    fn end_address(&self) -> u32 {
        self.program.last().map_or(0, |a| a.wrapping_add(1))
    }
}

impl Engine for ScriptedEngine {
    fn load(&mut self, name: &str, image: &[u8], relocate: bool) -> Result<()> {
        let text = std::str::from_utf8(image)
            .map_err(|e| DebuggerError::Engine(format!("{} is not UTF-8: {}", name, e)))?;
        let trace: TraceFile = schema::decode("trace file", text)?;
        let imports = trace
            .imports
            .iter()
            .map(|(key, sym)| Ok((schema::parse_address_key(key)?, sym.clone())))
            .collect::<Result<ImportTable>>()?;
        if relocate {
            debug!("Scripted traces are position-fixed, ignoring relocation");
        }

        *self = Self {
            name: Some(name.to_string()),
            program: trace.program,
            blocks: trace.blocks.into_iter().collect(),
            exit_code: trace.exit_code,
            imports,
            mappings: trace.mappings,
            ..Self::default()
        };
        debug!("Loaded {} with {} instructions", name, self.program.len());
        Ok(())
    }

    fn import_table(&self) -> ImportTable {
        self.imports.clone()
    }

    fn run(&mut self, max_instructions: usize) -> CpuState {
        self.calls.push(EngineCall::Run(max_instructions));
        if let Some(state @ (CpuState::Exit(_) | CpuState::Error(_))) = &self.state {
            return state.clone();
        }
        if self.blocked {
            return self.finish(CpuState::Blocked);
        }

        for _ in 0..max_instructions {
            let Some(&addr) = self.program.get(self.pc) else {
                break;
            };
            if self.breakpoints.contains(&addr) {
                return self.finish(CpuState::DebugBreak);
            }
            if self.blocks.contains(&self.pc) {
                self.blocked = true;
                return self.finish(CpuState::Blocked);
            }
            self.pc += 1;
            self.count += 1;
        }

        if self.pc >= self.program.len() {
            let code = self.exit_code;
            return self.finish(CpuState::Exit(code));
        }
        self.finish(CpuState::Running)
    }

    fn instruction_count(&self) -> u64 {
        self.count
    }

    fn instruction_pointer(&self) -> u32 {
        self.program
            .get(self.pc)
            .copied()
            .unwrap_or_else(|| self.end_address())
    }

    fn register_breakpoint(&mut self, addr: u32) {
        self.calls.push(EngineCall::Register(addr));
        self.breakpoints.insert(addr);
    }

    fn clear_breakpoint(&mut self, addr: u32) {
        self.calls.push(EngineCall::Clear(addr));
        self.breakpoints.remove(&addr);
    }

    fn unblock(&mut self) {
        self.calls.push(EngineCall::Unblock);
        if self.blocked {
            self.blocked = false;
            self.blocks.remove(&self.pc);
        }
    }

    fn memory_mappings(&self) -> Vec<Mapping> {
        self.mappings.clone()
    }

    fn disassemble(&mut self, addr: u32, count: usize) -> Vec<Instruction> {
        let addrs: BTreeSet<u32> = self.program.iter().copied().collect();
        addrs
            .range(addr..)
            .take(count)
            .map(|&a| Instruction {
                addr: a,
                bytes: "90".to_string(),
                code: vec![InstructionPart {
                    kind: "mnemonic".to_string(),
                    text: "nop".to_string(),
                }],
                ops: Vec::new(),
            })
            .collect()
    }
}

impl ScriptedEngine {
    fn finish(&mut self, state: CpuState) -> CpuState {
        self.state = Some(state.clone());
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_to_exit() {
        let mut engine = ScriptedEngine::new(vec![0x10, 0x11, 0x12]).with_exit_code(7);
        assert_eq!(engine.run(2), CpuState::Running);
        assert_eq!(engine.instruction_pointer(), 0x12);
        assert_eq!(engine.run(100), CpuState::Exit(7));
        assert_eq!(engine.instruction_count(), 3);
        assert_eq!(engine.run(100), CpuState::Exit(7));
    }

    #[test]
    fn stops_before_registered_breakpoint() {
        let mut engine = ScriptedEngine::new(vec![0x10, 0x11, 0x12, 0x13]);
        engine.register_breakpoint(0x12);
        assert_eq!(engine.run(100), CpuState::DebugBreak);
        assert_eq!(engine.instruction_pointer(), 0x12);
        assert_eq!(engine.instruction_count(), 2);

        // Still parked there while the breakpoint is registered.
        assert_eq!(engine.run(100), CpuState::DebugBreak);
        assert_eq!(engine.instruction_count(), 2);

        engine.clear_breakpoint(0x12);
        assert_eq!(engine.run(1), CpuState::Running);
        assert_eq!(engine.instruction_pointer(), 0x13);
    }

    #[test]
    fn blocks_until_unblocked() {
        let mut engine = ScriptedEngine::new(vec![1, 2, 3]).with_block_at(1);
        assert_eq!(engine.run(10), CpuState::Blocked);
        assert_eq!(engine.run(10), CpuState::Blocked);
        engine.unblock();
        assert_eq!(engine.run(10), CpuState::Exit(0));
        assert_eq!(engine.instruction_count(), 3);
    }

    #[test]
    fn load_parses_trace_file() {
        let mut engine = ScriptedEngine::default();
        let trace = br#"{
            "program": [4198400, 4198401],
            "imports": {"0x401000": "main"},
            "exit_code": 2
        }"#;
        engine.load("hello.exe", trace, false).unwrap();
        assert_eq!(engine.name(), Some("hello.exe"));
        assert_eq!(
            engine.import_table().get(&0x401000).map(String::as_str),
            Some("main")
        );
        assert_eq!(engine.run(10), CpuState::Exit(2));
    }

    #[test]
    fn load_rejects_malformed_trace() {
        let mut engine = ScriptedEngine::default();
        let err = engine
            .load("bad.exe", br#"{"program": "nope"}"#, false)
            .unwrap_err();
        assert!(err.to_string().contains("program"), "{}", err);
    }

    #[test]
    fn disassembles_known_addresses() {
        let mut engine = ScriptedEngine::new(vec![0x30, 0x10, 0x20, 0x10]);
        let instrs = engine.disassemble(0x11, 5);
        let addrs: Vec<u32> = instrs.iter().map(|i| i.addr).collect();
        assert_eq!(addrs, vec![0x20, 0x30]);
    }
}
