use super::breakpoint::BreakpointStore;
use crate::runtime::{Engine, Host, BREAKPOINTS_TAB};
use crate::Result;
use tracing::{debug, info};

/// Outcome of checking the engine position against the breakpoint set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitResult {
    NoHit,
    /// A one-shot breakpoint fired and was consumed.
    TransientHit(u32),
    /// A standing breakpoint fired.
    PersistentHit(u32),
}

impl HitResult {
    /// Any hit stops execution.
    pub fn should_stop(&self) -> bool {
        !matches!(self, HitResult::NoHit)
    }
}

/// Arms the store's enabled breakpoints in the engine for the span of one
/// batch.
///
/// `sync_in` snapshots the enabled set; `sync_out` clears exactly that
/// snapshot, so store edits made while a batch runs only affect the next
/// batch.
#[derive(Debug, Default)]
pub struct BreakpointSync {
    armed: Vec<u32>,
}

impl BreakpointSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sync_in<E: Engine>(&mut self, store: &BreakpointStore, engine: &mut E) {
        debug_assert!(self.armed.is_empty(), "sync_in called twice without sync_out");
        self.armed = store.enabled_addresses();
        for &addr in &self.armed {
            engine.register_breakpoint(addr);
        }
    }

    pub fn sync_out<E: Engine>(&mut self, engine: &mut E) {
        for addr in self.armed.drain(..) {
            engine.clear_breakpoint(addr);
        }
    }

    /// Addresses registered by the last `sync_in` and not yet cleared.
    pub fn armed(&self) -> &[u32] {
        &self.armed
    }

    /// Compare the engine's instruction pointer with the store.
    ///
    /// One-shot breakpoints are removed (and the removal persisted). Standing
    /// hits bring the host's breakpoint view forward.
    pub fn check_hit<E: Engine>(
        &self,
        store: &mut BreakpointStore,
        engine: &E,
        host: &mut dyn Host,
    ) -> Result<HitResult> {
        let ip = engine.instruction_pointer();
        let Some(bp) = store.get(ip).filter(|bp| bp.is_enabled()) else {
            return Ok(HitResult::NoHit);
        };

        if bp.one_shot {
            store.remove(ip)?;
            debug!("One-shot breakpoint {:#010x} consumed", ip);
            return Ok(HitResult::TransientHit(ip));
        }

        info!("Breakpoint hit at {:#010x}", ip);
        host.show_tab(BREAKPOINTS_TAB);
        Ok(HitResult::PersistentHit(ip))
    }
}
