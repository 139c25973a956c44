//! pflogctl - drive and observe pflog logging interfaces.
//!
//! Loads the logging module from a configuration file, replays scripted
//! control-plane and injection events against it, and shows what a capture
//! consumer attached to the interfaces receives.

mod commands;
mod output;
mod pcap;
mod script;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pflogctl", version, about = "Packet filter logging interface tool")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a script of interface events.
    #[command(visible_alias = "r")]
    Replay(commands::replay::ReplayArgs),

    /// Decode a hex-encoded pflog record.
    #[command(visible_alias = "d")]
    Decode(commands::decode::DecodeArgs),

    /// Print an example configuration and script.
    Example(commands::example::ExampleArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match cli.command {
        Command::Replay(args) => commands::replay::run(args).await,
        Command::Decode(args) => commands::decode::run(args),
        Command::Example(args) => commands::example::run(args),
    }
}
