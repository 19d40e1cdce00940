//! Callbacks from the debugger core into the embedding UI.

use std::cell::RefCell;
use std::rc::Rc;

/// Breakpoint view name passed to [`Host::show_tab`] on a standing hit.
pub const BREAKPOINTS_TAB: &str = "breakpoints";

pub trait Host {
    /// The guest program exited.
    fn exit(&mut self, code: u32);

    /// Guest window contents changed and should be redrawn.
    fn on_window_changed(&mut self);

    /// Bring the named view to the front.
    fn show_tab(&mut self, name: &str);

    fn on_error(&mut self, message: &str);

    fn on_stdout(&mut self, text: &str);
}

/// A host event, as captured by [`RecordingHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Exit(u32),
    WindowChanged,
    ShowTab(String),
    Error(String),
    Stdout(String),
}

/// Host that records every callback; clones share one event log.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    events: Rc<RefCell<Vec<HostEvent>>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.borrow().clone()
    }

    pub fn take_events(&self) -> Vec<HostEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    fn push(&self, event: HostEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl Host for RecordingHost {
    fn exit(&mut self, code: u32) {
        self.push(HostEvent::Exit(code));
    }

    fn on_window_changed(&mut self) {
        self.push(HostEvent::WindowChanged);
    }

    fn show_tab(&mut self, name: &str) {
        self.push(HostEvent::ShowTab(name.to_string()));
    }

    fn on_error(&mut self, message: &str) {
        self.push(HostEvent::Error(message.to_string()));
    }

    fn on_stdout(&mut self, text: &str) {
        self.push(HostEvent::Stdout(text.to_string()));
    }
}
