use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use jobdeck::DashboardConfig;
use jobdeck_cli::commands::*;

#[derive(Parser)]
#[command(name = "jobdeck")]
#[command(about = "Monitor and manage jobs on a remote scheduler")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "Scheduler API base URL (overrides config and JOBDECK_API_URL)")]
    api_url: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    verbose: bool,

    #[arg(short, long, global = true, help = "Suppress output except errors")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Job(JobCommand),

    #[command(about = "Live view that refreshes periodically")]
    Watch(WatchArgs),

    #[command(about = "Configuration management")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(&cli)?;

    let mut config = DashboardConfig::load().unwrap_or_else(|e| {
        if !cli.quiet {
            eprintln!("⚠️  Warning: Could not load config ({}), using defaults", e);
        }
        DashboardConfig::default()
    });
    if let Some(url) = &cli.api_url {
        config = config.with_api_base_url(url);
    }

    let result = match &cli.command {
        Commands::Job(command) => command.execute(&config).await,
        Commands::Watch(args) => args.execute(&config).await,
        Commands::Config { command } => command.execute(&config).await,
    };

    match result {
        Ok(()) => {
            if cli.verbose {
                info!("✅ Command completed successfully");
            }
        }
        Err(e) => {
            error!("❌ Command failed: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn setup_logging(cli: &Cli) -> Result<()> {
    let log_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    let env_filter = EnvFilter::from_default_env()
        .add_directive(format!("jobdeck={}", log_level).parse()?)
        .add_directive(format!("jobdeck_cli={}", log_level).parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .init();

    Ok(())
}
