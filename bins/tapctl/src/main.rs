//! tapctl - create, delete, list and dump TAP devices.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tapctl", version, about = "TAP device management tool")]
struct Cli {
    /// Output JSON.
    #[arg(short = 'j', long, global = true)]
    json: bool,

    /// Pretty print JSON.
    #[arg(short = 'p', long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a persistent TAP device.
    Add(commands::add::AddArgs),

    /// Delete a persistent TAP device.
    #[command(visible_alias = "delete")]
    Del(commands::add::DelArgs),

    /// List TUN/TAP devices.
    #[command(visible_alias = "ls", visible_alias = "list")]
    Show(commands::show::ShowArgs),

    /// Print frames received on a TAP device as hex.
    Dump(commands::dump::DumpArgs),
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let output = commands::Output {
        json: cli.json,
        pretty: cli.pretty,
    };

    let result = match cli.command {
        Command::Add(args) => commands::add::run_add(args, &output),
        Command::Del(args) => commands::add::run_del(args),
        Command::Show(args) => commands::show::run(args, &output),
        Command::Dump(args) => commands::dump::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
