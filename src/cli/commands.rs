use super::args::{BreakAction, BreakArgs, ResolveArgs, RunArgs, StoreArgs};
use super::console::ConsoleHost;
use crate::config::DebuggerConfig;
use crate::debugger::{Breakpoint, BreakpointStore, LabelResolver, Session, SessionPorts};
use crate::protocol::{DebugRequest, DebugResponse};
use crate::runtime::{schema, tick_channel, Engine, FileStorage, ImportTable, ScriptedEngine};
use crate::{DebuggerError, Result};
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Execute `break` subcommands against the persisted store.
pub fn breakpoints(args: BreakArgs, config: &DebuggerConfig) -> Result<()> {
    match args.action {
        BreakAction::Add {
            target,
            one_shot,
            labels,
            store,
        } => {
            let resolver = LabelResolver::new(load_labels(labels.as_deref())?, ImportTable::new());
            let Some(address) = resolver.resolve_name(&target) else {
                return Err(DebuggerError::InvalidArguments(format!(
                    "Cannot resolve {:?} to a label or hex address",
                    target
                ))
                .into());
            };
            let mut bps = open_store(&store, config);
            bps.add(Breakpoint {
                one_shot,
                ..Breakpoint::new(address)
            })?;
            println!("Breakpoint set at {}", resolver.describe(address).cyan());
        }
        BreakAction::Remove { address, store } => {
            let mut bps = open_store(&store, config);
            if bps.remove(address)? {
                println!("Breakpoint removed at {:#010x}", address);
            } else {
                println!("No breakpoint at {:#010x}", address);
            }
        }
        BreakAction::Toggle { address, store } => {
            let mut bps = open_store(&store, config);
            let bp = bps.toggle_enabled(address)?;
            let status = if bp.disabled { "disabled" } else { "enabled" };
            println!("Breakpoint {:#010x} {}", address, status);
        }
        BreakAction::List { store } => {
            let bps = open_store(&store, config);
            print_breakpoints(&store.session, &bps.list());
        }
    }
    Ok(())
}

/// Resolve a name the way `break add` does and print the address.
pub fn resolve(args: ResolveArgs) -> Result<()> {
    let resolver = LabelResolver::new(load_labels(args.labels.as_deref())?, ImportTable::new());
    match resolver.resolve_name(&args.name) {
        Some(addr) => {
            println!("{:#010x}", addr);
            Ok(())
        }
        None => Err(DebuggerError::InvalidArguments(format!(
            "Cannot resolve {:?} to a label or hex address",
            args.name
        ))
        .into()),
    }
}

/// Load a scripted program and execute debugger requests against it.
///
/// Each response is printed as one JSON line, followed by the final state.
pub fn run(args: RunArgs, config: &DebuggerConfig) -> Result<()> {
    let image = std::fs::read(&args.trace).map_err(|e| {
        DebuggerError::InvalidArguments(format!("Failed to read {}: {}", args.trace.display(), e))
    })?;
    let name = match args.session {
        Some(name) => name,
        None => args
            .trace
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "program".to_string()),
    };

    let mut engine = ScriptedEngine::default();
    engine.load(&name, &image, args.relocate)?;

    let requests = match &args.script {
        Some(path) => read_script(path)?,
        None => vec![DebugRequest::Start],
    };

    let (port, ticks) = tick_channel();
    let ports = SessionPorts {
        storage: Box::new(FileStorage::new(storage_dir(args.storage_dir, config))),
        host: Box::new(ConsoleHost),
        port: Box::new(port),
    };
    let mut session = Session::new(
        engine,
        &name,
        load_labels(args.labels.as_deref())?,
        ports,
        &config.scheduler,
    );

    for request in requests {
        info!("Request: {:?}", request);
        let response = session.handle(request);
        let ticks_run = session.drive(&ticks);
        if ticks_run > 0 {
            info!("Ran {} ticks", ticks_run);
        }
        println!("{}", to_json(&response)?);
    }
    println!("{}", to_json(&DebugResponse::State(session.state()))?);
    Ok(())
}

fn open_store(args: &StoreArgs, config: &DebuggerConfig) -> BreakpointStore {
    let storage = FileStorage::new(storage_dir(args.storage_dir.clone(), config));
    BreakpointStore::open(args.session.as_str(), Box::new(storage))
}

fn storage_dir(explicit: Option<PathBuf>, config: &DebuggerConfig) -> PathBuf {
    explicit.unwrap_or_else(|| config.storage.resolved_dir())
}

fn load_labels(path: Option<&Path>) -> Result<BTreeMap<u32, String>> {
    let Some(path) = path else {
        return Ok(BTreeMap::new());
    };
    let text = std::fs::read_to_string(path).map_err(|e| {
        DebuggerError::InvalidArguments(format!("Failed to read {}: {}", path.display(), e))
    })?;
    schema::parse_labels(&text)
}

fn read_script(path: &Path) -> Result<Vec<DebugRequest>> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        DebuggerError::InvalidArguments(format!("Failed to read {}: {}", path.display(), e))
    })?;
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(i, line)| schema::decode(&format!("script line {}", i + 1), line))
        .collect()
}

fn to_json(response: &DebugResponse) -> Result<String> {
    serde_json::to_string(response)
        .map_err(|e| DebuggerError::InvalidArguments(format!("Failed to encode response: {}", e)).into())
}

fn print_breakpoints(session: &str, list: &[Breakpoint]) {
    if list.is_empty() {
        println!("No breakpoints set for {}", session);
        return;
    }
    println!("{}", format!("Breakpoints for {}:", session).bold());
    for bp in list {
        let marker = if bp.disabled {
            "○".dimmed()
        } else {
            "●".red()
        };
        println!("  {} {}", marker, bp);
    }
}
