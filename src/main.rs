use anyhow::Result;
use clap::Parser;
use emu_debugger::cli::{Cli, Commands, LogFormat};
use emu_debugger::DebuggerConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    let verbosity = cli.verbosity();

    // Initialize logging with verbosity-aware level
    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(verbosity.to_log_level())),
    );
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    match cli.log_format {
        LogFormat::Text => registry.with(fmt_layer).init(),
        LogFormat::Json => registry.with(fmt_layer.json()).init(),
    }

    let config = DebuggerConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Break(args) => {
            emu_debugger::cli::commands::breakpoints(args, &config)?;
        }
        Commands::Resolve(args) => {
            emu_debugger::cli::commands::resolve(args)?;
        }
        Commands::Run(args) => {
            emu_debugger::cli::commands::run(args, &config)?;
        }
    }

    Ok(())
}
