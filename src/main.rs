use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use classroom_insights::client::HttpSource;
use classroom_insights::db::PgSource;
use classroom_insights::feed::{Outcome, RecordFeed, ViewRequest, DEFAULT_LIMIT};
use classroom_insights::models::Granularity;
use classroom_insights::report::{self, ChartView};
use classroom_insights::source::{CsvSource, RecordSource};
use classroom_insights::{logging, Error};

#[derive(Parser)]
#[command(name = "classroom-insights")]
#[command(about = "Attendance and attention analytics over classroom monitoring sessions", long_about = None)]
struct Cli {
    /// Base URL of the analytics backend
    #[arg(long, env = "CLASSROOM_API_URL", global = true)]
    api_url: Option<String>,
    /// Postgres URL of the analytics database
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,
    /// CSV export of session rows
    #[arg(long, global = true)]
    csv: Option<PathBuf>,
    /// Maximum number of session rows to fetch
    #[arg(long, env = "CLASSROOM_LIMIT", default_value_t = DEFAULT_LIMIT, global = true)]
    limit: usize,
    #[arg(long, default_value_t = 30, global = true)]
    timeout_secs: u64,
    /// Debug logging (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print bucketed series for one chart view
    Series {
        #[arg(long, value_enum, default_value_t = Granularity::Daily)]
        granularity: Granularity,
        /// Only bucket sessions from this day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// First day of the window (inclusive)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day of the window (inclusive)
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long, value_enum, default_value_t = ChartView::Attention)]
        view: ChartView,
        /// Emit chart JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the dashboard insight summary
    Insights {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let source = open_source(&cli).await?;
    let feed = RecordFeed::new(source);

    match cli.command {
        Commands::Series {
            granularity,
            date,
            from,
            to,
            view,
            json,
        } => {
            let request = ViewRequest {
                granularity,
                selected_date: date,
                from,
                to,
                limit: cli.limit,
            };
            let Outcome::Fresh(dashboard) = feed.load(&request).await? else {
                return Ok(());
            };

            if json {
                let chart = report::chart_data(&dashboard.buckets, view);
                println!("{}", serde_json::to_string_pretty(&chart)?);
            } else {
                print!("{}", report::render_buckets(&dashboard.buckets, view));
            }
        }
        Commands::Insights { from, to, json } => {
            let request = ViewRequest {
                from,
                to,
                limit: cli.limit,
                ..ViewRequest::new(Granularity::Daily)
            };
            let Outcome::Fresh(dashboard) = feed.load(&request).await? else {
                return Ok(());
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&dashboard.insights)?);
            } else {
                print!("{}", report::render_insights(&dashboard.insights));
            }
        }
    }

    Ok(())
}

async fn open_source(cli: &Cli) -> anyhow::Result<Box<dyn RecordSource>> {
    if let Some(path) = &cli.csv {
        return Ok(Box::new(CsvSource::new(path)));
    }
    if let Some(url) = &cli.api_url {
        let source = HttpSource::new(url, Duration::from_secs(cli.timeout_secs))
            .context("failed to build HTTP client")?;
        return Ok(Box::new(source));
    }
    if let Some(url) = &cli.database_url {
        let source = PgSource::connect(url)
            .await
            .context("failed to connect to Postgres")?;
        return Ok(Box::new(source));
    }
    Err(Error::NoSource.into())
}
