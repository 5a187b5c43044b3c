mod config;
mod generate_cmd;
mod plans_cmd;
mod serve_cmd;
mod store;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use chrono::NaiveDate;
use studyplan_core::plan::DATE_FORMAT;
use studyplan_core::runner::RunnerKind;
use studyplan_db::pool::{self, DatabaseStatus};
use studyplan_db::queries::study_plans;

use config::StudyplanConfig;

#[derive(Parser)]
#[command(
    name = "studyplan",
    about = "Turn subjects, weak topics and exam dates into a dated study plan"
)]
struct Cli {
    /// Database URL (overrides STUDYPLAN_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a studyplan config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/studyplan")]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the database if needed and run migrations
    DbInit,
    /// Serve the HTTP API
    Serve {
        /// Address to bind (defaults to config file, then 0.0.0.0)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (defaults to config file, then 5500)
        #[arg(long)]
        port: Option<u16>,
        /// How plans are generated (overrides STUDYPLAN_RUNNER)
        #[arg(long)]
        runner: Option<RunnerKind>,
    },
    /// Generate one plan: read a request, print the result envelope as JSON
    Generate {
        /// Request file (reads stdin when omitted or "-")
        file: Option<PathBuf>,
        /// Reference date, YYYY-MM-DD (defaults to today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// List stored study plans, or show one by ID
    Plans {
        /// Study plan ID to show (omit to list all)
        id: Option<i64>,
    },
    /// Print shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        server: config::ServerSection::default(),
        planner: config::PlannerSection::default(),
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url   = {db_url}");
    println!("  server         = {}:{}", cfg.server.bind, cfg.server.port);
    println!("  planner.runner = {}", cfg.planner.runner);
    println!();
    println!("Next: run `studyplan db-init` to create and migrate the database.");

    Ok(())
}

async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = StudyplanConfig::resolve(cli_db_url, None)?;

    println!("Initializing studyplan database...");

    let status = pool::ensure_database_exists(&resolved.db_config).await?;
    match status {
        DatabaseStatus::Created => println!("Created database."),
        DatabaseStatus::Existing => println!("Database already exists."),
    }

    let db_pool = pool::open_store(&resolved.db_config).await?;
    let stored = study_plans::count_study_plans(&db_pool).await?;
    println!("Schema up to date. study_plans: {stored} rows");

    db_pool.close().await;

    println!("studyplan db-init complete.");
    Ok(())
}

async fn cmd_serve(
    cli_db_url: Option<&str>,
    bind: Option<String>,
    port: Option<u16>,
    runner: Option<RunnerKind>,
) -> anyhow::Result<()> {
    let resolved = StudyplanConfig::resolve(cli_db_url, runner)?;
    let runner = resolved.planner.build_runner()?;

    let db_pool = pool::open_store(&resolved.db_config).await?;

    let state = serve_cmd::AppState::new(Arc::new(db_pool.clone()), runner);
    let bind = bind.unwrap_or(resolved.server.bind);
    let port = port.unwrap_or(resolved.server.port);
    let result = serve_cmd::run_serve(state, &bind, port).await;

    db_pool.close().await;
    result
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stderr keeps stdout clean for `generate`, whose stdout is the envelope.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { db_url, force } => {
            cmd_init(&db_url, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Serve { bind, port, runner } => {
            cmd_serve(cli.database_url.as_deref(), bind, port, runner).await?;
        }
        Commands::Generate { file, date } => {
            if !generate_cmd::run_generate(file.as_deref(), date) {
                std::process::exit(1);
            }
        }
        Commands::Plans { id } => {
            let resolved = StudyplanConfig::resolve(cli.database_url.as_deref(), None)?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = plans_cmd::run_plans(&db_pool, id).await;
            db_pool.close().await;
            result?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "studyplan", &mut std::io::stdout());
        }
    }

    Ok(())
}

#[cfg(test)]
mod test_util {
    use std::sync::{Mutex, MutexGuard};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Serialize tests that read or write process environment variables.
    pub fn lock_env() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }
}
