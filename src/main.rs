//! Rolodex CLI - serve and administer the person directory

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use rolodex::config::{self, RolodexConfig, ServeSettings};
use rolodex::storage::{self, Database};
use rolodex::ui::{self, Icons, TableBuilder};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "rolodex")]
#[command(version)]
#[command(about = "Person directory service - people, roles and role assignments")]
#[command(long_about = r#"
Rolodex serves a small directory of people and their roles over a REST API
backed by a SQLite database image.

Example usage:
  rolodex init
  rolodex serve --port 3001
  rolodex stats --database rolodex.db
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the REST API (and static UI files)
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Directory of static files served outside /api
        #[arg(short, long)]
        static_dir: Option<PathBuf>,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Seed an empty database with the default roles and people
    Seed {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Show row counts for each table
    Stats {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },
}

/// Load the database image, refusing to continue if it cannot be read
fn open_database(path: &Path) -> anyhow::Result<Database> {
    config::ensure_db_dir(path)?;
    Database::load(path)
        .with_context(|| format!("failed to load database from {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let file_config = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port, database, static_dir } => {
            let settings =
                ServeSettings::resolve(file_config.as_ref(), database, port, static_dir);
            tracing::info!(
                database = %settings.database.display(),
                port = settings.port,
                "starting rolodex"
            );

            let db = open_database(&settings.database)?;
            let report = storage::seed(&db)?;
            if !report.is_empty() {
                tracing::info!(
                    roles = report.roles,
                    people = report.people,
                    "database initialized with sample data"
                );
            }

            ui::header("Rolodex");
            ui::info(
                &format!("{} Database", Icons::DATABASE),
                &settings.database.display().to_string(),
            );
            rolodex::server::start_server(settings, db).await?;
        }

        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(config::default_config_path);
            config::write_config(&path, &RolodexConfig::with_defaults(), force)?;
            ui::success(&format!("Wrote config to {}", path.display()));
        }

        Commands::Seed { database } => {
            let settings = ServeSettings::resolve(file_config.as_ref(), database, None, None);
            let db = open_database(&settings.database)?;
            let report = storage::seed(&db)?;

            if report.is_empty() {
                ui::warn("Database already populated, nothing seeded.");
            } else {
                ui::section(&format!("{} Seeded {}", Icons::SEED, settings.database.display()));
                ui::summary_row(&format!("{} Roles", Icons::KEY), &report.roles.to_string());
                ui::summary_row(&format!("{} People", Icons::PERSON), &report.people.to_string());
                ui::summary_row("Assignments", &report.assignments.to_string());
            }
            db.close()?;
        }

        Commands::Stats { database } => {
            let settings = ServeSettings::resolve(file_config.as_ref(), database, None, None);
            if !settings.database.exists() {
                ui::error(&format!("No database at {}", settings.database.display()));
                anyhow::bail!("database not found");
            }
            let db = open_database(&settings.database)?;
            let stats = db.stats()?;

            println!("{} Rolodex Statistics ({:?})", Icons::STATS, settings.database);
            println!("{}", TableBuilder::from_stats(&stats).build());
        }
    }

    Ok(())
}
