pub mod commands;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "bootcamp-seeder")]
#[command(about = "Seed or wipe the bootcamp directory store")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "Store URL override (defaults to DATABASE_URL)")]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Import users, bootcamps, courses and reviews from a data directory")]
    Import {
        #[arg(help = "Directory holding users.json, bootcamps.json, courses.json and reviews.json", default_value = "_data")]
        dir: std::path::PathBuf,
    },

    #[command(about = "Delete all bootcamps, courses and reviews")]
    Destroy {
        #[arg(long, help = "Delete users as well")]
        users: bool,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    let mut config = crate::config::AppConfig::from_env();
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }
    let store = crate::database::open_store(&config.database).await?;
    store.migrate().await?;

    match cli.command {
        Commands::Import { dir } => {
            commands::seed::handle_import(store, &dir, config.security.bcrypt_cost, output_format).await
        }
        Commands::Destroy { users } => commands::seed::handle_destroy(store, users, output_format).await,
    }
}
