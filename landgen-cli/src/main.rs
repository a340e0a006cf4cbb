use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use landgen_catalog::KeywordPolicy;
use landgen_core::RecordStore;
use landgen_export::{validate_file, Exporter};
use landgen_pages::{PageSynthesizer, TriggerRunner};
use landgen_shared::{RecordId, TriggerOutcome};
use landgen_store::app_config::{Config, StoreBackend};
use landgen_store::{DbClient, MemoryStore, PgStore};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "landgen")]
#[command(about = "Landing page generation pipeline")]
#[command(version)]
struct Cli {
    /// Evaluate offer windows as of this date instead of today (YYYY-MM-DD)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve the serving branch for a page
    MatchBranch { page_id: String },

    /// Create pages for a newly added location
    NewLocation { location_id: String },

    /// Create pages after an offer's targeting changed
    OfferUpdated { offer_id: String },

    /// Create pages after a service's keyword list changed
    NewKeyword { service_id: String },

    /// Write the content artifact for the site renderer
    Export {
        /// Overrides `export.output_path`
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Check branch coordinates in a content artifact
    ValidateCoordinates {
        /// Defaults to `export.output_path`
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

/// The opened record store, plus where to persist it when it lives in memory
struct OpenStore {
    store: Arc<dyn RecordStore>,
    fixture: Option<(Arc<MemoryStore>, PathBuf)>,
}

impl OpenStore {
    async fn open(config: &Config) -> anyhow::Result<Self> {
        match config.store.backend {
            StoreBackend::Memory => {
                let path = config
                    .store
                    .fixture_path
                    .clone()
                    .map(PathBuf::from)
                    .context("store.fixture_path is required for the memory backend")?;
                let memory = Arc::new(
                    MemoryStore::from_fixture(&path)
                        .await
                        .with_context(|| format!("Failed to load fixture {}", path.display()))?,
                );
                info!(fixture = %path.display(), "Using in-memory record store");
                Ok(Self {
                    store: memory.clone(),
                    fixture: Some((memory, path)),
                })
            }
            StoreBackend::Postgres => {
                let url = config
                    .store
                    .database_url
                    .as_deref()
                    .context("store.database_url is required for the postgres backend")?;
                let db = DbClient::new(url, config.store.max_connections)
                    .await
                    .context("Failed to connect to Postgres")?;
                db.migrate().await.context("Failed to run migrations")?;
                Ok(Self {
                    store: Arc::new(PgStore::new(db.pool)),
                    fixture: None,
                })
            }
        }
    }

    /// Write the memory backend's tables back to its fixture
    async fn persist(&self) -> anyhow::Result<()> {
        if let Some((memory, path)) = &self.fixture {
            memory
                .dataset()
                .await
                .write_to(path)
                .await
                .with_context(|| format!("Failed to write fixture {}", path.display()))?;
        }
        Ok(())
    }
}

async fn open_runner(
    config: &Config,
    today: Option<NaiveDate>,
) -> anyhow::Result<(OpenStore, TriggerRunner)> {
    let opened = OpenStore::open(config).await?;
    let policy = KeywordPolicy {
        min_len: config.pipeline.min_keyword_len,
    };
    let mut runner = TriggerRunner::new(
        opened.store.clone(),
        PageSynthesizer::new(policy, config.pipeline.batch_size),
    );
    if let Some(today) = today {
        runner = runner.with_today(today);
    }
    Ok((opened, runner))
}

/// Persist, print the outcome, and map it to an exit code
async fn finish(opened: &OpenStore, outcome: &TriggerOutcome) -> anyhow::Result<ExitCode> {
    opened.persist().await?;
    println!("{}", serde_json::to_string_pretty(outcome)?);
    if outcome.is_error() {
        error!(message = %outcome.message, "Trigger finished with an error");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

async fn run(cli: Cli, config: Config) -> anyhow::Result<ExitCode> {
    match cli.command {
        Command::Export { output } => {
            let opened = OpenStore::open(&config).await?;
            let mut export = config.export.clone();
            if let Some(output) = output {
                export.output_path = output.to_string_lossy().into_owned();
            }
            let exporter = Exporter::new(opened.store, export);
            let report = exporter.run().await?;

            info!(
                pages = report.content.metadata.total_pages,
                skipped = report.rejected.len(),
                duration_ms = report.content.metadata.export_duration_ms,
                output = %exporter.config().output_path,
                "Export complete"
            );
            Ok(ExitCode::SUCCESS)
        }

        Command::ValidateCoordinates { input } => {
            let path = input.unwrap_or_else(|| PathBuf::from(&config.export.output_path));
            let report = validate_file(&path).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);

            for warning in &report.warnings {
                warn!(branch = %warning.branch_name, id = %warning.branch_id, "{}", warning.finding);
            }
            if !report.passed() {
                for issue in &report.errors {
                    error!(branch = %issue.branch_name, id = %issue.branch_id, "{}", issue.finding);
                }
                bail!(
                    "{} coordinate error(s) across {} branch(es); fix branch coordinates before building",
                    report.errors.len(),
                    report.branches_checked
                );
            }
            info!(branches = report.branches_checked, "All branch coordinates valid");
            Ok(ExitCode::SUCCESS)
        }

        Command::MatchBranch { page_id } => {
            let (opened, runner) = open_runner(&config, cli.today).await?;
            let outcome = runner.match_branch(&RecordId::new(page_id)).await?;
            finish(&opened, &outcome).await
        }

        Command::NewLocation { location_id } => {
            let (opened, runner) = open_runner(&config, cli.today).await?;
            let outcome = runner.location_created(&RecordId::new(location_id)).await?;
            finish(&opened, &outcome).await
        }

        Command::OfferUpdated { offer_id } => {
            let (opened, runner) = open_runner(&config, cli.today).await?;
            let outcome = runner.offer_updated(&RecordId::new(offer_id)).await?;
            finish(&opened, &outcome).await
        }

        Command::NewKeyword { service_id } => {
            let (opened, runner) = open_runner(&config, cli.today).await?;
            let outcome = runner.keywords_changed(&RecordId::new(service_id)).await?;
            finish(&opened, &outcome).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "landgen_cli=info,landgen_pages=info,landgen_export=info,landgen_store=info,landgen_catalog=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load config");
            return ExitCode::FAILURE;
        }
    };

    match run(cli, config).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %format!("{:#}", e), "landgen failed");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
