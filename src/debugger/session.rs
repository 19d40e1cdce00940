//! User-facing debugging session.
//!
//! A [`Session`] ties one loaded engine to its persisted breakpoints and
//! label table, and exposes the operations a debugger UI issues.

use super::breakpoint::Breakpoint;
use super::labels::LabelResolver;
use super::scheduler::ExecutionScheduler;
use super::state::DebugState;
use super::BreakpointStore;
use crate::config::SchedulerConfig;
use crate::protocol::{DebugRequest, DebugResponse};
use crate::runtime::{CpuState, Engine, Host, Instruction, Mapping, SchedulePort, Storage, TickLoop};
use crate::Result;
use tracing::debug;

/// Outward-facing collaborators of a session.
pub struct SessionPorts {
    pub storage: Box<dyn Storage>,
    pub host: Box<dyn Host>,
    pub port: Box<dyn SchedulePort>,
}

pub struct Session<E: Engine> {
    scheduler: ExecutionScheduler<E>,
    labels: LabelResolver,
}

impl<E: Engine> Session<E> {
    /// Build a session over an already loaded engine.
    ///
    /// `key` identifies the program; breakpoints persist under it. `labels`
    /// are merged with the engine's symbol table.
    pub fn new(
        engine: E,
        key: &str,
        labels: impl IntoIterator<Item = (u32, String)>,
        ports: SessionPorts,
        config: &SchedulerConfig,
    ) -> Self {
        let labels = LabelResolver::new(labels, engine.import_table());
        let store = BreakpointStore::open(key, ports.storage);
        debug!(
            "Session {} with {} labels and {} breakpoints",
            key,
            labels.len(),
            store.len()
        );
        Self {
            scheduler: ExecutionScheduler::new(engine, store, ports.host, ports.port, config),
            labels,
        }
    }

    pub fn add_breakpoint(&mut self, bp: Breakpoint) -> Result<()> {
        self.scheduler.store_mut().add(bp)
    }

    /// Add a breakpoint at a label or hex address. Returns the address, or
    /// `None` (with no change) when `name` resolves to nothing.
    pub fn add_break_by_name(&mut self, name: &str) -> Result<Option<u32>> {
        let Some(addr) = self.labels.resolve_name(name) else {
            debug!("Cannot resolve breakpoint target {:?}", name);
            return Ok(None);
        };
        self.add_breakpoint(Breakpoint::new(addr))?;
        Ok(Some(addr))
    }

    pub fn remove_breakpoint(&mut self, addr: u32) -> Result<bool> {
        self.scheduler.store_mut().remove(addr)
    }

    pub fn toggle_breakpoint(&mut self, addr: u32) -> Result<Breakpoint> {
        self.scheduler.store_mut().toggle_enabled(addr)
    }

    pub fn breakpoints(&self) -> Vec<Breakpoint> {
        self.scheduler.store().list()
    }

    /// Run until `addr` via a one-shot breakpoint. An existing breakpoint at
    /// `addr` is kept as is.
    pub fn run_to(&mut self, addr: u32) -> Result<()> {
        if self.scheduler.store().get(addr).is_none() {
            self.add_breakpoint(Breakpoint::one_shot(addr))?;
        }
        self.start();
        Ok(())
    }

    pub fn start(&mut self) {
        self.scheduler.start();
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    pub fn step(&mut self) -> CpuState {
        self.scheduler.single_step()
    }

    pub fn tick(&mut self) {
        self.scheduler.tick();
    }

    /// Drain `ticks` until the current run stops.
    pub fn drive(&mut self, ticks: &TickLoop) -> usize {
        self.scheduler.drive(ticks)
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn mappings(&self) -> Vec<Mapping> {
        self.scheduler.engine().memory_mappings()
    }

    pub fn disassemble(&mut self, addr: u32, count: usize) -> Vec<Instruction> {
        self.scheduler.engine_mut().disassemble(addr, count)
    }

    pub fn labels(&self) -> &LabelResolver {
        &self.labels
    }

    pub fn scheduler(&self) -> &ExecutionScheduler<E> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut ExecutionScheduler<E> {
        &mut self.scheduler
    }

    pub fn state(&self) -> DebugState {
        let engine = self.scheduler.engine();
        let ip = engine.instruction_pointer();
        DebugState {
            running: self.scheduler.is_running(),
            instruction_pointer: ip,
            location: self.labels.describe(ip),
            instruction_count: engine.instruction_count(),
            step_size: self.scheduler.step_size(),
            instr_per_ms: self.scheduler.instr_per_ms(),
            cpu_state: self.scheduler.last_state().cloned(),
            breakpoints: self.breakpoints(),
        }
    }

    /// Apply one protocol request.
    pub fn handle(&mut self, request: DebugRequest) -> DebugResponse {
        let outcome = match request {
            DebugRequest::Start => {
                self.start();
                Ok(DebugResponse::Ok)
            }
            DebugRequest::Stop => {
                self.stop();
                Ok(DebugResponse::Ok)
            }
            DebugRequest::Step => {
                self.step();
                Ok(DebugResponse::State(self.state()))
            }
            DebugRequest::RunTo { address } => self.run_to(address).map(|_| DebugResponse::Ok),
            DebugRequest::AddBreakpoint { address, one_shot } => {
                let bp = Breakpoint {
                    one_shot,
                    ..Breakpoint::new(address)
                };
                self.add_breakpoint(bp).map(|_| DebugResponse::Ok)
            }
            DebugRequest::AddBreakByName { name } => {
                self.add_break_by_name(&name).map(DebugResponse::Resolved)
            }
            DebugRequest::RemoveBreakpoint { address } => {
                self.remove_breakpoint(address).map(|_| DebugResponse::Ok)
            }
            DebugRequest::ToggleBreakpoint { address } => {
                self.toggle_breakpoint(address).map(|_| DebugResponse::Ok)
            }
            DebugRequest::ListBreakpoints => Ok(DebugResponse::Breakpoints(self.breakpoints())),
            DebugRequest::GetState => Ok(DebugResponse::State(self.state())),
        };
        outcome.unwrap_or_else(|e| DebugResponse::Error(e.to_string()))
    }
}
