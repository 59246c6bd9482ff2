//! dpservice-cli - command-line client for the dpservice dataplane.

mod commands;

use std::time::Duration;

use clap::{Parser, Subcommand};
use dpservice::client::{DEFAULT_ADDRESS, DEFAULT_CONNECT_TIMEOUT};
use dpservice::output::{OutputFormat, OutputOptions};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use commands::Context;

#[derive(Parser)]
#[command(
    name = "dpservice-cli",
    version,
    about = "Command-line client for the dpservice dataplane"
)]
struct Cli {
    /// Dataplane gRPC address.
    #[arg(long, global = true, env = "DPSERVICE_ADDRESS", default_value = DEFAULT_ADDRESS)]
    address: String,

    /// Seconds to wait for the connection.
    #[arg(long, global = true, value_name = "SECONDS", default_value_t = DEFAULT_CONNECT_TIMEOUT.as_secs())]
    connect_timeout: u64,

    /// Output format (json, yaml, name, table).
    #[arg(short, long, global = true, default_value_t = OutputFormat::Name)]
    output: OutputFormat,

    /// Pretty print JSON.
    #[arg(short, long, global = true)]
    pretty: bool,

    /// Omit table headers.
    #[arg(long, global = true)]
    no_headers: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create objects from files or flags.
    #[command(visible_alias = "create")]
    Add(commands::add::AddCmd),

    /// Delete objects from files or by identity.
    #[command(visible_alias = "del")]
    Delete(commands::delete::DeleteCmd),

    /// Show a single object or service information.
    Get(commands::get::GetCmd),

    /// List objects.
    #[command(visible_alias = "ls")]
    List(commands::list::ListCmd),

    /// Initialize the dataplane service.
    Init(commands::init::InitCmd),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();

    let ctx = Context {
        address: cli.address,
        connect_timeout: Duration::from_secs(cli.connect_timeout),
        format: cli.output,
        opts: OutputOptions {
            pretty: cli.pretty,
            no_headers: cli.no_headers,
        },
    };

    let result = match cli.command {
        Command::Add(cmd) => cmd.run(&ctx).await,
        Command::Delete(cmd) => cmd.run(&ctx).await,
        Command::Get(cmd) => cmd.run(&ctx).await,
        Command::List(cmd) => cmd.run(&ctx).await,
        Command::Init(cmd) => cmd.run(&ctx).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        let code = e
            .downcast_ref::<dpservice::Error>()
            .map_or(1, dpservice::Error::exit_code);
        std::process::exit(code);
    }
}
