use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "emu-debug", version, about = "Breakpoints and execution control for CPU emulators")]
pub struct Cli {
    /// Increase log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log line format on stderr
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "EMU_DEBUG_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    Trace,
}

impl Verbosity {
    pub fn to_log_level(self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "debug",
            Verbosity::Trace => "trace",
        }
    }
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        match (self.quiet, self.verbose) {
            (true, _) => Verbosity::Quiet,
            (false, 0) => Verbosity::Normal,
            (false, 1) => Verbosity::Verbose,
            (false, _) => Verbosity::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage persisted breakpoints
    Break(BreakArgs),

    /// Resolve a label name or hex address
    Resolve(ResolveArgs),

    /// Run a scripted program under the debugger
    Run(RunArgs),
}

#[derive(Args, Debug)]
pub struct StoreArgs {
    /// Program identifier the breakpoints belong to
    #[arg(short, long)]
    pub session: String,

    /// Directory holding breakpoint files (overrides config)
    #[arg(long)]
    pub storage_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct BreakArgs {
    #[command(subcommand)]
    pub action: BreakAction,
}

#[derive(Subcommand, Debug)]
pub enum BreakAction {
    /// Add a breakpoint at a label or hex address
    Add {
        target: String,

        /// Remove the breakpoint after its first hit
        #[arg(long)]
        one_shot: bool,

        /// JSON label file ({"0x401000": "main", ...})
        #[arg(long)]
        labels: Option<PathBuf>,

        #[command(flatten)]
        store: StoreArgs,
    },
    /// Remove the breakpoint at an address
    Remove {
        #[arg(value_parser = parse_address)]
        address: u32,

        #[command(flatten)]
        store: StoreArgs,
    },
    /// Enable or disable the breakpoint at an address
    Toggle {
        #[arg(value_parser = parse_address)]
        address: u32,

        #[command(flatten)]
        store: StoreArgs,
    },
    /// List breakpoints
    List {
        #[command(flatten)]
        store: StoreArgs,
    },
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    pub name: String,

    /// JSON label file ({"0x401000": "main", ...})
    #[arg(long)]
    pub labels: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Trace file describing the scripted program
    #[arg(short, long)]
    pub trace: PathBuf,

    /// Program identifier (defaults to the trace file name)
    #[arg(short, long)]
    pub session: Option<String>,

    /// JSON label file merged with the program's symbols
    #[arg(long)]
    pub labels: Option<PathBuf>,

    /// JSON-lines file of debugger requests (defaults to a single Start)
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Directory holding breakpoint files (overrides config)
    #[arg(long)]
    pub storage_dir: Option<PathBuf>,

    /// Ask the engine to relocate the image
    #[arg(long)]
    pub relocate: bool,
}

/// Parse an address given as hex, with or without a `0x` prefix.
pub fn parse_address(s: &str) -> Result<u32, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u32::from_str_radix(digits, 16).map_err(|e| format!("invalid address {:?}: {}", s, e))
}
