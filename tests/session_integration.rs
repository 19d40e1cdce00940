use emu_debugger::config::SchedulerConfig;
use emu_debugger::debugger::{Breakpoint, BreakpointStore, HitResult, Session, SessionPorts};
use emu_debugger::protocol::{DebugRequest, DebugResponse};
use emu_debugger::runtime::{
    tick_channel, CpuState, Engine, EngineCall, HostEvent, MemoryStorage, RecordingHost,
    ScriptedEngine, TickLoop,
};

const BASE: u32 = 0x401000;

fn engine(len: u32) -> ScriptedEngine {
    ScriptedEngine::new((BASE..BASE + len).collect())
}

fn session(
    engine: ScriptedEngine,
    storage: &MemoryStorage,
    host: &RecordingHost,
) -> (Session<ScriptedEngine>, TickLoop) {
    let (port, ticks) = tick_channel();
    let session = Session::new(
        engine,
        "hello.exe",
        [(BASE, "main".to_string())],
        SessionPorts {
            storage: Box::new(storage.clone()),
            host: Box::new(host.clone()),
            port: Box::new(port),
        },
        &SchedulerConfig::default(),
    );
    (session, ticks)
}

#[test]
fn breakpoints_survive_across_sessions() {
    let storage = MemoryStorage::new();
    let host = RecordingHost::new();
    {
        let (mut s, _) = session(engine(32), &storage, &host);
        s.add_break_by_name("main").unwrap();
        s.add_breakpoint(Breakpoint::one_shot(BASE + 4)).unwrap();
        s.add_breakpoint(Breakpoint::new(BASE + 8)).unwrap();
        s.toggle_breakpoint(BASE + 8).unwrap();
    }
    let (s, _) = session(engine(32), &storage, &host);
    assert_eq!(
        s.breakpoints(),
        vec![
            Breakpoint::new(BASE),
            Breakpoint::one_shot(BASE + 4),
            Breakpoint { disabled: true, ..Breakpoint::new(BASE + 8) },
        ]
    );
}

#[test]
fn full_run_through_breakpoints() {
    let storage = MemoryStorage::new();
    let host = RecordingHost::new();
    let (mut s, ticks) = session(engine(64).with_exit_code(9), &storage, &host);
    s.add_breakpoint(Breakpoint::new(BASE + 10)).unwrap();
    s.add_breakpoint(Breakpoint::one_shot(BASE + 20)).unwrap();
    s.add_breakpoint(Breakpoint { disabled: true, ..Breakpoint::new(BASE + 30) }).unwrap();

    s.start();
    s.drive(&ticks);
    assert_eq!(s.scheduler().last_hit(), HitResult::PersistentHit(BASE + 10));
    assert_eq!(host.take_events(), vec![HostEvent::ShowTab("breakpoints".into())]);

    s.start();
    s.drive(&ticks);
    assert_eq!(s.scheduler().last_hit(), HitResult::TransientHit(BASE + 20));
    assert!(host.take_events().is_empty());

    // The disabled breakpoint is skipped and the program exits.
    s.start();
    s.drive(&ticks);
    assert_eq!(s.scheduler().last_hit(), HitResult::NoHit);
    assert_eq!(s.scheduler().last_state(), Some(&CpuState::Exit(9)));
    assert_eq!(host.take_events(), vec![HostEvent::Exit(9)]);

    let reloaded = BreakpointStore::open("hello.exe", Box::new(storage));
    assert_eq!(
        reloaded.list(),
        vec![
            Breakpoint::new(BASE + 10),
            Breakpoint { disabled: true, ..Breakpoint::new(BASE + 30) },
        ]
    );
}

#[test]
fn engine_never_keeps_breakpoints_between_batches() {
    let storage = MemoryStorage::new();
    let host = RecordingHost::new();
    let (mut s, ticks) = session(engine(30_000), &storage, &host);
    s.add_breakpoint(Breakpoint::new(BASE + 25_000)).unwrap();

    s.start();
    s.drive(&ticks);

    let engine = s.scheduler().engine();
    assert!(engine.registered_breakpoints().is_empty());
    let runs = engine
        .calls()
        .iter()
        .filter(|c| matches!(c, EngineCall::Run(_)))
        .count();
    let registers = engine
        .calls()
        .iter()
        .filter(|c| matches!(c, EngineCall::Register(_)))
        .count();
    let clears = engine
        .calls()
        .iter()
        .filter(|c| matches!(c, EngineCall::Clear(_)))
        .count();
    assert_eq!(registers, runs);
    assert_eq!(clears, runs);
    assert_eq!(engine.instruction_pointer(), BASE + 25_000);
}

/// Store edits between ticks take effect from the next batch on.
#[test]
fn edits_between_ticks_apply_to_next_batch() {
    let storage = MemoryStorage::new();
    let host = RecordingHost::new();
    let (mut s, ticks) = session(engine(40_000), &storage, &host);
    s.add_breakpoint(Breakpoint::new(BASE + 39_000)).unwrap();

    s.start();
    assert!(ticks.next_tick().is_some());
    s.tick();
    assert!(s.is_running());

    s.remove_breakpoint(BASE + 39_000).unwrap();
    s.add_breakpoint(Breakpoint::new(BASE + 30_000)).unwrap();
    s.drive(&ticks);

    assert_eq!(s.scheduler().engine().instruction_pointer(), BASE + 30_000);
    assert_eq!(s.scheduler().last_hit(), HitResult::PersistentHit(BASE + 30_000));
}

#[test]
fn stop_request_from_another_thread() {
    let storage = MemoryStorage::new();
    let host = RecordingHost::new();
    let (mut s, ticks) = session(engine(1_000_000), &storage, &host);
    let handle = s.scheduler().stop_handle();

    s.start();
    s.tick();
    std::thread::spawn(move || handle.request_stop())
        .join()
        .unwrap();
    s.drive(&ticks);

    assert!(!s.is_running());
    assert!(s.scheduler().engine().instruction_count() < 1_000_000);
    assert!(host.events().is_empty());
}

#[test]
fn protocol_round_trip() {
    let storage = MemoryStorage::new();
    let host = RecordingHost::new();
    let (mut s, ticks) = session(engine(16), &storage, &host);

    assert_eq!(
        s.handle(DebugRequest::AddBreakByName { name: "40100a".into() }),
        DebugResponse::Resolved(Some(BASE + 10))
    );
    assert_eq!(
        s.handle(DebugRequest::AddBreakByName { name: "nope".into() }),
        DebugResponse::Resolved(None)
    );
    assert_eq!(s.handle(DebugRequest::Start), DebugResponse::Ok);
    s.drive(&ticks);

    match s.handle(DebugRequest::GetState) {
        DebugResponse::State(state) => {
            assert!(!state.running);
            assert_eq!(state.instruction_pointer, BASE + 10);
            assert_eq!(state.location, "main+0xa");
            assert_eq!(state.cpu_state, Some(CpuState::DebugBreak));
        }
        other => panic!("unexpected response: {:?}", other),
    }
}
