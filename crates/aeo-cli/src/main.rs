mod db;
mod queries;
mod scan;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "aeo-cli")]
#[command(about = "AEO visibility command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance.
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Query set management.
    Queries {
        #[command(subcommand)]
        command: QueryCommands,
    },
    /// Run and inspect scans.
    Scan {
        #[command(subcommand)]
        command: ScanCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    Ping,
    Migrate,
    /// Load demo data from the seed file.
    Seed {
        /// Overrides `AEO_SEED_PATH`.
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
enum QueryCommands {
    /// Import a CSV file as a new query set.
    Import {
        #[arg(long)]
        project: Uuid,
        file: PathBuf,
        /// Defaults to `CSV import <date>`.
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum ScanCommands {
    /// Run a mock scan over every query of a query set.
    Run {
        #[arg(long)]
        project: Uuid,
        #[arg(long = "query-set")]
        query_set: Uuid,
        /// Seed the generator for reproducible results.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print a scan summary and its results.
    Show { scan: Uuid },
    /// Write scan results as CSV.
    Export {
        scan: Uuid,
        /// Output file; stdout when omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("aeo-cli ready; run `aeo-cli --help` for commands");
        return Ok(());
    };

    let config = aeo_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let pool_config = aeo_db::PoolConfig::from_app_config(&config);
    let pool = aeo_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => db::run_ping(&pool).await?,
            DbCommands::Migrate => db::run_migrate(&pool).await?,
            DbCommands::Seed { path } => {
                let path = path.unwrap_or_else(|| config.seed_path.clone());
                db::run_seed(&pool, &path).await?;
            }
        },
        Commands::Queries { command } => match command {
            QueryCommands::Import {
                project,
                file,
                name,
            } => {
                queries::run_import(&pool, &config, project, &file, name.as_deref()).await?;
            }
        },
        Commands::Scan { command } => match command {
            ScanCommands::Run {
                project,
                query_set,
                seed,
            } => scan::run_scan(&pool, project, query_set, seed).await?,
            ScanCommands::Show { scan } => scan::run_show(&pool, scan).await?,
            ScanCommands::Export { scan, output } => {
                scan::run_export(&pool, scan, output.as_deref()).await?;
            }
        },
    }

    Ok(())
}
