use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bz2db::config::{parse_date, LoaderConfig, OutputTarget};
use bz2db::fetch::{BugQuery, RestClient};
use bz2db::pipeline::{LoadReport, Loader};
use bz2db::storage::{ParquetSink, SqliteSink, TableSink};
use bz2db::train::{Classifier, ReleaseCalendar};

/// Export Bugzilla bugs into a table, tagged with release train and channel
#[derive(Parser)]
#[command(name = "bz2db")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options for `load`; each overrides its environment variable
#[derive(Args)]
struct LoadArgs {
    /// Only bugs created on or after this date (YYYY-MM-DD)
    #[arg(long)]
    since: Option<String>,
    /// Write to this SQLite database
    #[arg(long, conflicts_with = "parquet")]
    sqlite: Option<PathBuf>,
    /// Write to this Parquet file instead
    #[arg(long)]
    parquet: Option<PathBuf>,
    /// Bugzilla root URL
    #[arg(long)]
    api_url: Option<String>,
    /// Bugs per page
    #[arg(long)]
    page_size: Option<usize>,
    /// Maximum pages fetched
    #[arg(long)]
    max_pages: Option<usize>,
    /// Milliseconds to wait between pages
    #[arg(long)]
    page_delay_ms: Option<u64>,
    /// Release calendar JSON ({"YYYY-MM-DD": release, ...})
    #[arg(long)]
    calendar: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch bugs and replace the bug table
    Load(LoadArgs),

    /// Classify a single bug from its creation time and version
    Classify {
        /// Creation time; the first ten characters must be YYYY-MM-DD
        #[arg(long)]
        created: String,
        /// Reported version, e.g. "47 branch" or "trunk"
        #[arg(long)]
        version: String,
        /// Release calendar JSON
        #[arg(long)]
        calendar: Option<PathBuf>,
    },

    /// Print the release calendar
    Calendar {
        /// Release calendar JSON
        #[arg(long)]
        calendar: Option<PathBuf>,
    },
}

fn load_calendar(path: Option<&std::path::Path>) -> Result<ReleaseCalendar> {
    match path {
        Some(path) => ReleaseCalendar::from_json_file(path)
            .with_context(|| format!("failed to load calendar {}", path.display())),
        None => Ok(ReleaseCalendar::firefox()),
    }
}

async fn run_load<K: TableSink>(config: &LoaderConfig, sink: K) -> Result<LoadReport> {
    let calendar = load_calendar(config.calendar_path())?;
    let client = RestClient::new(config.api_url())?;
    let mut loader = Loader::new(
        client,
        sink,
        Classifier::new(calendar),
        config.paginator(),
        BugQuery::firefox_default(config.since()),
    );
    Ok(loader.run().await?)
}

async fn load(args: LoadArgs) -> Result<()> {
    let mut builder = LoaderConfig::from_env().context("invalid environment configuration")?;
    if let Some(since) = args.since {
        builder = builder.since(parse_date(&since)?);
    }
    if let Some(path) = args.sqlite {
        builder = builder.output(OutputTarget::Sqlite(path));
    }
    if let Some(path) = args.parquet {
        builder = builder.output(OutputTarget::Parquet(path));
    }
    if let Some(url) = args.api_url {
        builder = builder.api_url(url);
    }
    if let Some(size) = args.page_size {
        builder = builder.page_size(size);
    }
    if let Some(pages) = args.max_pages {
        builder = builder.max_pages(pages);
    }
    if let Some(ms) = args.page_delay_ms {
        builder = builder.page_delay(Duration::from_millis(ms));
    }
    if let Some(path) = args.calendar {
        builder = builder.calendar_path(path);
    }
    let config = builder.build()?;

    let report = match config.output() {
        OutputTarget::Sqlite(path) => {
            let sink = SqliteSink::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            run_load(&config, sink).await?
        }
        OutputTarget::Parquet(path) => run_load(&config, ParquetSink::new(path)).await?,
    };

    println!(
        "fetched {} bugs, loaded {}, {} tracking columns",
        report.fetched,
        report.loaded,
        report.tracking_fields.len()
    );
    if !report.failures.is_empty() {
        println!("{} bugs could not be classified:", report.failures.len());
        for failure in &report.failures {
            println!("  {failure}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bz2db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match Cli::parse().command {
        Commands::Load(args) => load(args).await,
        Commands::Classify {
            created,
            version,
            calendar,
        } => {
            let classifier = Classifier::new(load_calendar(calendar.as_deref())?);
            let result = classifier.classify(&created, &version)?;
            println!(
                "train {}  channel {}  release_cycle {}",
                result.train_date, result.channel, result.release_cycle
            );
            Ok(())
        }
        Commands::Calendar { calendar } => {
            let calendar = load_calendar(calendar.as_deref())?;
            println!("{:<12} {:>7} {:>5} {:>6} {:>7}", "date", "release", "beta", "aurora", "nightly");
            for train in calendar.trains() {
                println!(
                    "{:<12} {:>7} {:>5} {:>6} {:>7}",
                    train.train_date().to_string(),
                    train.release(),
                    train.beta(),
                    train.aurora(),
                    train.nightly()
                );
            }
            Ok(())
        }
    }
}
