use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use scenetable::config::ServiceConfig;
use scenetable::server;
use tracing::info;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Serve {
        #[clap(short, long, default_value = "8000")]
        port: u16,
        #[clap(short, long, default_value = "scenetable.db")]
        database: String,
        #[clap(long)]
        cors_origin: Option<String>,
        /// TOML file with service settings
        #[clap(short, long)]
        config: Option<PathBuf>,
        #[clap(long)]
        upload_root: Option<PathBuf>,
        #[clap(long)]
        result_root: Option<PathBuf>,
        #[clap(long)]
        frontend_dist: Option<PathBuf>,
        /// Seconds before a processing run is abandoned
        #[clap(long)]
        processing_timeout: Option<u64>,
    },
    Db {
        #[clap(subcommand)]
        command: DbCommands,
    },
}

#[derive(Subcommand, Debug)]
enum DbCommands {
    Init {
        #[clap(short, long, default_value = "scenetable.db")]
        database: String,
    },
    Migrate {
        #[clap(subcommand)]
        direction: server::MigrateDirection,
        #[clap(short, long, default_value = "scenetable.db")]
        database: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    match args.command {
        Commands::Serve {
            port,
            database,
            cors_origin,
            config,
            upload_root,
            result_root,
            frontend_dist,
            processing_timeout,
        } => {
            let mut service_config = match config {
                Some(path) => ServiceConfig::load(&path)?,
                None => ServiceConfig::default(),
            };
            if let Some(dir) = upload_root {
                service_config.upload_root = dir;
            }
            if let Some(dir) = result_root {
                service_config.result_root = dir;
            }
            if let Some(dir) = frontend_dist {
                service_config.frontend_dist = dir;
            }
            if let Some(secs) = processing_timeout {
                service_config.processing_timeout_secs = secs;
            }

            info!("Starting server on port {}", port);
            server::start_server(port, &database, cors_origin.as_deref(), service_config).await?;
        }
        Commands::Db { command } => match command {
            DbCommands::Init { database } => {
                info!("Initialising database {}", database);
                server::migrate_database(&database, server::MigrateDirection::Up).await?;
            }
            DbCommands::Migrate {
                direction,
                database,
            } => {
                server::migrate_database(&database, direction).await?;
            }
        },
    }

    Ok(())
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("sea_orm_migration=warn,{}", log_level)))
        .without_time()
        .init();
}
