//! Batch execution with adaptive sizing.
//!
//! A run is a chain of ticks. Each tick arms the breakpoints, lets the engine
//! retire up to `step_size` instructions, disarms them and checks for a hit.
//! The [`ThroughputController`] doubles `step_size` whenever a measurable batch
//! finishes inside one frame budget, so long runs amortize the per-tick
//! overhead while a single tick stays short enough not to stall the host.

use super::breakpoint::BreakpointStore;
use super::sync::{BreakpointSync, HitResult};
use crate::config::SchedulerConfig;
use crate::runtime::{CpuState, Engine, Host, SchedulePort, StopHandle, TickLoop};
use crate::Result;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Smoothed throughput estimate and the batch size derived from it.
#[derive(Debug, Clone)]
pub struct ThroughputController {
    step_size: usize,
    instr_per_ms: f64,
    min_sample_steps: u64,
    frame_budget_ms: f64,
    smoothing: f64,
    max_step_size: Option<usize>,
}

impl ThroughputController {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            step_size: config.initial_step_size.max(1),
            instr_per_ms: 0.0,
            min_sample_steps: config.min_sample_steps,
            frame_budget_ms: config.frame_budget_ms,
            smoothing: config.smoothing,
            max_step_size: config.max_step_size,
        }
    }

    pub fn step_size(&self) -> usize {
        self.step_size
    }

    pub fn instr_per_ms(&self) -> f64 {
        self.instr_per_ms
    }

    /// Feed one batch measurement. Returns whether the step size grew.
    ///
    /// Batches of `min_sample_steps` or fewer instructions are too noisy to
    /// measure and leave the controller untouched.
    pub fn record(&mut self, steps: u64, elapsed_ms: f64) -> bool {
        if steps <= self.min_sample_steps {
            return false;
        }
        // Sub-resolution timings would divide by zero.
        let sample = steps as f64 / elapsed_ms.max(0.001);
        self.instr_per_ms = self.smoothing * sample + (1.0 - self.smoothing) * self.instr_per_ms;

        if elapsed_ms >= self.frame_budget_ms {
            return false;
        }
        let grown = match self.max_step_size {
            Some(max) => self.step_size.saturating_mul(2).min(max),
            None => self.step_size.saturating_mul(2),
        };
        if grown == self.step_size {
            return false;
        }
        debug!(
            "Batch of {} took {:.2}ms, step size {} -> {}",
            steps, elapsed_ms, self.step_size, grown
        );
        self.step_size = grown;
        true
    }
}

/// Drives an engine in ticks and owns the run/stop state.
pub struct ExecutionScheduler<E: Engine> {
    engine: E,
    store: BreakpointStore,
    sync: BreakpointSync,
    controller: ThroughputController,
    host: Box<dyn Host>,
    port: Box<dyn SchedulePort>,
    stop_handle: StopHandle,
    running: bool,
    tick_pending: bool,
    last_state: Option<CpuState>,
    last_hit: HitResult,
}

impl<E: Engine> ExecutionScheduler<E> {
    pub fn new(
        engine: E,
        store: BreakpointStore,
        host: Box<dyn Host>,
        port: Box<dyn SchedulePort>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            engine,
            store,
            sync: BreakpointSync::new(),
            controller: ThroughputController::new(config),
            host,
            port,
            stop_handle: StopHandle::new(),
            running: false,
            tick_pending: false,
            last_state: None,
            last_hit: HitResult::NoHit,
        }
    }

    /// Unblock the engine and execute exactly one instruction.
    ///
    /// Breakpoints are not armed, so stepping off one never re-triggers it.
    pub fn single_step(&mut self) -> CpuState {
        self.engine.unblock();
        let state = self.engine.run(1);
        self.last_state = Some(state.clone());
        state
    }

    /// Run one batch of up to `step_size` instructions and feed the
    /// measurement to the controller.
    pub fn run_batch(&mut self) -> CpuState {
        let started = Instant::now();
        let before = self.engine.instruction_count();
        let state = self.engine.run(self.controller.step_size());
        let steps = self.engine.instruction_count().saturating_sub(before);
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.controller.record(steps, elapsed_ms);
        state
    }

    /// One armed batch. Returns whether execution should continue.
    pub fn batch_step(&mut self) -> Result<bool> {
        self.sync.sync_in(&self.store, &mut self.engine);
        let state = self.run_batch();
        self.sync.sync_out(&mut self.engine);

        let hit = self
            .sync
            .check_hit(&mut self.store, &self.engine, self.host.as_mut())?;
        let keep_going = !hit.should_stop() && state.is_running();
        self.last_hit = hit;
        self.last_state = Some(state);
        Ok(keep_going)
    }

    /// Begin a run. No-op while already running.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.stop_handle.clear();
        self.engine.unblock();
        let ip = self.engine.instruction_pointer();
        if self.store.is_armed_at(ip) {
            debug!("Stepping off breakpoint at {:#010x}", ip);
            self.single_step();
        }
        self.last_hit = HitResult::NoHit;
        self.running = true;
        info!("Execution started at {:#010x}", ip);
        self.schedule();
    }

    /// End the run at the next tick boundary. Idempotent.
    pub fn stop(&mut self) {
        if self.running {
            info!(
                "Execution stopped at {:#010x} after {} instructions",
                self.engine.instruction_pointer(),
                self.engine.instruction_count()
            );
        }
        self.running = false;
    }

    /// Run one scheduled tick.
    pub fn tick(&mut self) {
        self.tick_pending = false;
        if !self.running {
            return;
        }
        if self.stop_handle.is_requested() {
            debug!("Stop requested");
            self.stop();
            return;
        }
        match self.batch_step() {
            Ok(true) => self.schedule(),
            Ok(false) => {
                self.report_halt();
                self.stop();
            }
            Err(e) => {
                warn!("Batch failed: {:#}", e);
                self.host.on_error(&e.to_string());
                self.stop();
            }
        }
    }

    /// Run every pending tick until the chain ends. Returns the number of
    /// ticks run.
    pub fn drive(&mut self, ticks: &TickLoop) -> usize {
        let mut count = 0;
        while ticks.next_tick().is_some() {
            self.tick();
            count += 1;
        }
        count
    }

    fn schedule(&mut self) {
        // A tick left over from before a stop() serves the new run.
        if !self.tick_pending {
            self.tick_pending = true;
            self.port.schedule_soon();
        }
    }

    fn report_halt(&mut self) {
        match &self.last_state {
            Some(CpuState::Exit(code)) => self.host.exit(*code),
            Some(CpuState::Error(msg)) => self.host.on_error(msg),
            _ => {}
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn step_size(&self) -> usize {
        self.controller.step_size()
    }

    pub fn instr_per_ms(&self) -> f64 {
        self.controller.instr_per_ms()
    }

    pub fn controller(&self) -> &ThroughputController {
        &self.controller
    }

    /// Engine state reported by the most recent step or batch.
    pub fn last_state(&self) -> Option<&CpuState> {
        self.last_state.as_ref()
    }

    pub fn last_hit(&self) -> HitResult {
        self.last_hit
    }

    /// Handle for requesting a stop from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop_handle.clone()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn store(&self) -> &BreakpointStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut BreakpointStore {
        &mut self.store
    }

    pub fn host_mut(&mut self) -> &mut dyn Host {
        self.host.as_mut()
    }
}
