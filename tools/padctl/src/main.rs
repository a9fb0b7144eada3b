mod config_cmd;
mod env_utils;
mod layout;
mod listen;
mod logging;
mod replay;
mod stream;
mod trace;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use logging::Logger;

use config_cmd::ConfigSetOptions;
use listen::ListenOptions;
use replay::ReplayOptions;
use stream::StreamOptions;

#[derive(Debug, Parser)]
#[command(name = "padctl")]
#[command(about = "stickpad host controller CLI")]
struct Cli {
    /// Settings file (defaults to PADCTL_SETTINGS_PATH, then ./settings.toml).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Config(ConfigArgs),
    Replay(ReplayArgs),
    Stream(StreamArgs),
    Listen(ListenArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
    Set(ConfigSetArgs),
}

#[derive(Debug, Args)]
struct ConfigSetArgs {
    /// Server address; empty clears it.
    #[arg(long)]
    address: Option<String>,
    /// Server port text; empty or unparsable clears it.
    #[arg(long)]
    port: Option<String>,
    /// Accept host names instead of IPv4 literals only.
    #[arg(long)]
    any_host: bool,
}

#[derive(Debug, Args)]
struct ReplayArgs {
    trace: PathBuf,
    #[arg(long)]
    layout: Option<PathBuf>,
    #[arg(long)]
    expect: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct StreamArgs {
    trace: PathBuf,
    #[arg(long)]
    layout: Option<PathBuf>,
    /// Keep the session polling this long after the last trace event.
    #[arg(long, default_value_t = 1000)]
    linger_ms: u64,
}

#[derive(Debug, Args)]
struct ListenArgs {
    #[arg(long, default_value = "127.0.0.1:9000")]
    bind: String,
    #[arg(long)]
    quit_after: Option<usize>,
    #[arg(long)]
    once: bool,
}

fn run(cli: Cli) -> Result<()> {
    Logger::from_env()?.install()?;
    let settings_path = env_utils::settings_path(cli.settings);

    match cli.command {
        Commands::Config(args) => match args.action {
            ConfigAction::Show => config_cmd::run_show(&settings_path),
            ConfigAction::Set(set_args) => config_cmd::run_set(
                &settings_path,
                ConfigSetOptions {
                    address: set_args.address,
                    port: set_args.port,
                    any_host: set_args.any_host,
                },
            ),
        },
        Commands::Replay(args) => replay::run_replay(ReplayOptions {
            trace_path: args.trace,
            layout_path: args.layout,
            expect_path: args.expect,
        }),
        Commands::Stream(args) => stream::run_stream(StreamOptions {
            trace_path: args.trace,
            layout_path: args.layout,
            settings_path,
            linger_ms: args.linger_ms,
        }),
        Commands::Listen(args) => listen::run_listen(ListenOptions {
            bind: args.bind,
            quit_after: args.quit_after,
            once: args.once,
        }),
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}
