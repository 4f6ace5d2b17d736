//! headline-sentiment: command line entrypoint.
//! Runs pipeline stages in batch, or serves the dashboard.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use headline_sentiment::config::AppConfig;
use headline_sentiment::dashboard::{self, AppState};
use headline_sentiment::metrics::Metrics;
use headline_sentiment::pipeline::{self, PipelineBootstrap};
use headline_sentiment::sentiment::{classifier, LabelColumn, Labeler, Sentiment};

#[derive(Debug, Parser)]
#[command(name = "headline-sentiment")]
#[command(about = "Collect news headlines, label their sentiment, chart the result")]
struct Cli {
    /// TOML config file (default: $HEADLINES_CONFIG_PATH, then config/pipeline.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch the feed and write the raw CSV
    Collect {
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        days_back: Option<u32>,
    },
    /// Label the newest raw CSV and write the enriched CSV
    Label,
    /// Render charts for the newest enriched CSV
    Visualize {
        #[arg(long, value_enum, default_value_t = ColumnArg::Finbert)]
        column: ColumnArg,
        /// Sentiment whose titles feed the word cloud
        #[arg(long, default_value = "positive")]
        cloud: Sentiment,
    },
    /// collect -> label -> visualize
    Run,
    /// Serve the interactive dashboard
    Dashboard {
        #[arg(long)]
        bind: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColumnArg {
    Finbert,
    Vader,
}

impl From<ColumnArg> for LabelColumn {
    fn from(c: ColumnArg) -> Self {
        match c {
            ColumnArg::Finbert => LabelColumn::Finbert,
            ColumnArg::Vader => LabelColumn::Vader,
        }
    }
}

const DEFAULT_FILTER: &str =
    "headline_sentiment=info,ingest=info,labeler=info,viz=info,dashboard=info,tower_http=info,warn";

/// Compact logs by default; `LOG_FORMAT=json` for one JSON object per line.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let cfg = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Collect { query, days_back } => {
            let query = query.unwrap_or_else(|| cfg.query.clone());
            let days_back = days_back.map(|d| d.clamp(1, 365)).unwrap_or(cfg.days_back);
            match pipeline::run_collect(&cfg, &query, days_back).await? {
                Some(p) => println!("{}", p.display()),
                None => println!("no headlines found"),
            }
        }
        Commands::Label => {
            let labeler = Labeler::new(classifier::shared_classifier(&cfg)?);
            if let Some(p) = pipeline::run_label(&cfg, &labeler).await? {
                println!("{}", p.display());
            }
        }
        Commands::Visualize { column, cloud } => {
            for p in pipeline::run_visualize(&cfg, column.into(), cloud)? {
                println!("{}", p.display());
            }
        }
        Commands::Run => {
            let labeler = Labeler::new(classifier::shared_classifier(&cfg)?);
            for p in pipeline::run_all(&cfg, &labeler).await? {
                println!("{}", p.display());
            }
        }
        Commands::Dashboard { bind } => serve(cfg, bind).await?,
    }
    Ok(())
}

async fn serve(cfg: AppConfig, bind: Option<String>) -> Result<()> {
    let bind = bind.unwrap_or_else(|| cfg.bind.clone());
    let metrics = Metrics::init(cfg.cache_ttl().as_millis() as u64)?;

    let bootstrap = Arc::new(PipelineBootstrap::new(
        cfg.clone(),
        classifier::shared_classifier(&cfg)?,
    ));
    let state = AppState::new(&cfg, bootstrap);
    let app = dashboard::router(state).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    tracing::info!(target: "dashboard", %bind, "dashboard listening");
    axum::serve(listener, app).await.context("dashboard server")?;
    Ok(())
}
