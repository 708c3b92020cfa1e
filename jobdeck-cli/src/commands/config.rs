use anyhow::Result;
use clap::Subcommand;
use comfy_table::Table;
use jobdeck::DashboardConfig;
use jobdeck::config::{ENV_API_URL, ENV_PAGE_SIZE, ENV_REFRESH_SECS};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Show the effective configuration")]
    Show,
    #[command(about = "Write the current configuration to the config file")]
    Init {
        #[arg(long, help = "Overwrite an existing config file")]
        force: bool,
    },
    #[command(about = "Show configuration file path")]
    Path,
}

impl ConfigCommand {
    pub async fn execute(&self, config: &DashboardConfig) -> Result<()> {
        match self {
            ConfigCommand::Show => show_config(config),
            ConfigCommand::Init { force } => init_config(config, DashboardConfig::default_path()?, *force),
            ConfigCommand::Path => {
                println!("{}", DashboardConfig::default_path()?.display());
                Ok(())
            }
        }
    }
}

fn show_config(config: &DashboardConfig) -> Result<()> {
    println!("⚙️  jobdeck Configuration");

    let source = |key: &str| {
        if std::env::var(key).is_ok() {
            "Environment"
        } else {
            "Config File / Default"
        }
    };

    let mut table = Table::new();
    table.set_header(vec!["Setting", "Value", "Source"]);
    table.add_row(vec![
        "api_base_url".to_string(),
        config.api_base_url.clone(),
        source(ENV_API_URL).to_string(),
    ]);
    table.add_row(vec![
        "refresh_interval".to_string(),
        format!("{:?}", config.refresh_interval),
        source(ENV_REFRESH_SECS).to_string(),
    ]);
    table.add_row(vec![
        "request_timeout".to_string(),
        format!("{:?}", config.request_timeout),
        "Config File / Default".to_string(),
    ]);
    table.add_row(vec![
        "page_size".to_string(),
        config.page_size.to_string(),
        source(ENV_PAGE_SIZE).to_string(),
    ]);
    table.add_row(vec![
        "refresh_policy".to_string(),
        format!("{:?}", config.refresh_policy),
        "Config File / Default".to_string(),
    ]);
    println!("{}", table);
    Ok(())
}

/// Save `config` to `path` unless a file is already there and `force` is unset.
pub fn init_config(config: &DashboardConfig, path: PathBuf, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!(
            "⚠️  Config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
        return Ok(());
    }
    config.save_to_file(&path)?;
    println!("✅ Configuration written to {}", path.display());
    Ok(())
}
