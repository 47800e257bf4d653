//! CLI application for splitting and delivering Certificazione Unica batches.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use commands::{batch, config, mail, matching, split};

/// CU splitter - split Certificazione Unica batches and match them to a roster
#[derive(Parser)]
#[command(name = "cusplit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split one CU batch into per-person records
    Split(split::SplitArgs),

    /// Split many CU batches
    Batch(batch::BatchArgs),

    /// Match the records of a batch against a roster
    Match(matching::MatchArgs),

    /// Prepare one message per matched record
    Mail(mail::MailArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity; RUST_LOG wins when set
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Split(args) => split::run(args, config_path),
        Commands::Batch(args) => batch::run(args, config_path),
        Commands::Match(args) => matching::run(args, config_path),
        Commands::Mail(args) => mail::run(args, config_path),
        Commands::Config(args) => config::run(args, config_path),
    }
}
