//! Cooperative "run again soon" scheduling.
//!
//! The scheduler never loops on its own. Each batch asks the port for one more
//! tick, and whoever owns the [`TickLoop`] (a UI frame callback, the CLI
//! driver) runs it. A batch is therefore never interrupted; stopping takes
//! effect at the next tick boundary.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use tracing::warn;

/// Port through which the scheduler requests its next tick.
pub trait SchedulePort {
    fn schedule_soon(&mut self);
}

/// A pending request to run one scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick;

/// Create a connected port and loop.
pub fn tick_channel() -> (ChannelPort, TickLoop) {
    let (tx, rx) = mpsc::channel();
    (ChannelPort { tx }, TickLoop { rx })
}

/// Sending half: hands ticks to the [`TickLoop`] in FIFO order.
#[derive(Debug, Clone)]
pub struct ChannelPort {
    tx: Sender<Tick>,
}

impl SchedulePort for ChannelPort {
    fn schedule_soon(&mut self) {
        if self.tx.send(Tick).is_err() {
            warn!("Tick loop is gone, dropping scheduled tick");
        }
    }
}

/// Receiving half, drained by the driver.
#[derive(Debug)]
pub struct TickLoop {
    rx: Receiver<Tick>,
}

impl TickLoop {
    /// Next pending tick, without waiting.
    pub fn next_tick(&self) -> Option<Tick> {
        self.rx.try_recv().ok()
    }
}

/// Port that only counts requests, for hosts that drive ticks by hand.
/// Clones share the counter.
#[derive(Debug, Clone, Default)]
pub struct CountingPort {
    scheduled: Rc<Cell<usize>>,
}

impl CountingPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduled(&self) -> usize {
        self.scheduled.get()
    }
}

impl SchedulePort for CountingPort {
    fn schedule_soon(&mut self) {
        self.scheduled.set(self.scheduled.get() + 1);
    }
}

/// Thread-safe stop request, honored at the next tick boundary.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub(crate) fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
