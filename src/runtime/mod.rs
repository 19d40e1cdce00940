//! Ports between the debugger core and the outside world.
//!
//! Sub-modules:
//! - [`engine`]  — Engine contract and typed engine records.
//! - [`schema`]  — Boundary decoding of JSON engine payloads.
//! - [`host`]    — Callbacks into the embedding UI.
//! - [`storage`] — Durable key/value storage for breakpoint sets.
//! - [`looper`]  — Cooperative tick scheduling and stop requests.
//! - [`mock`]    — Deterministic scripted engine.

pub mod engine;
pub mod host;
pub mod looper;
pub mod mock;
pub mod schema;
pub mod storage;

pub use engine::{CpuState, Engine, ImportTable, Instruction, InstructionPart, Mapping};
pub use host::{Host, HostEvent, RecordingHost, BREAKPOINTS_TAB};
pub use looper::{tick_channel, ChannelPort, CountingPort, SchedulePort, StopHandle, Tick, TickLoop};
pub use mock::{EngineCall, ScriptedEngine, TraceFile};
pub use storage::{FileStorage, MemoryStorage, ReadOnlyStorage, Storage};
