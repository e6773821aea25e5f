use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pullmark::parser::{parse_log_text, ParseStrategy};
use pullmark::report::fetch_report_entries;
use pullmark::session::MarkerSession;

const API_KEY_ENV_VAR: &str = "WCL_API_KEY";

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliStrategy {
    Structured,
    BareTime,
}

impl From<CliStrategy> for ParseStrategy {
    fn from(value: CliStrategy) -> Self {
        match value {
            CliStrategy::Structured => ParseStrategy::Structured,
            CliStrategy::BareTime => ParseStrategy::BareTime,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "pullmark",
    version,
    about = "Turns raid pull times from combat log reports into video chapter timestamps"
)]
struct Cli {
    /// Recording start time, e.g. 19:30 or 7:30
    #[arg(long, short = 's')]
    start: String,

    /// File with pasted pull text; stdin is read when neither --log nor
    /// --report is given
    #[arg(long, conflicts_with = "report")]
    log: Option<PathBuf>,

    /// Combat log report URL to fetch pulls from
    #[arg(long)]
    report: Option<String>,

    /// API key for the combat log service; falls back to WCL_API_KEY
    #[arg(long)]
    api_key: Option<String>,

    /// Heuristic used for pasted text
    #[arg(long, value_enum, default_value_t = CliStrategy::Structured)]
    strategy: CliStrategy,

    /// Extra manual pull, e.g. "Queen Ansurek@20:15:00" (repeatable)
    #[arg(long = "add", value_name = "NAME@TIME")]
    add: Vec<String>,

    /// Write the chapter text to a file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let mut session = MarkerSession::new();

    if let Some(report_url) = cli.report.as_deref() {
        let api_key = resolve_api_key(cli.api_key.as_deref())?;
        let entries = fetch_report_entries(report_url, &api_key).await?;
        tracing::info!(pull_count = entries.len(), "Imported pulls from report");
        session.import(entries);
    } else if let Some(log_path) = cli.log.as_deref() {
        let text = fs::read_to_string(log_path)
            .with_context(|| format!("Failed to read log text '{}'", log_path.display()))?;
        session.import(parse_log_text(&text, cli.strategy.into())?);
    } else if cli.add.is_empty() {
        let text = io::read_to_string(io::stdin()).context("Failed to read pasted text")?;
        session.import(parse_log_text(&text, cli.strategy.into())?);
    }

    for manual_pull in &cli.add {
        let Some((name, time_text)) = manual_pull.split_once('@') else {
            bail!("Manual pull '{manual_pull}' must look like NAME@HH:MM:SS");
        };
        session
            .add_manual(name, time_text)
            .with_context(|| format!("Failed to add manual pull '{manual_pull}'"))?;
    }

    let chapter_text = session.generate(&cli.start)?;

    match cli.output.as_deref() {
        Some(output_path) => {
            fs::write(output_path, format!("{chapter_text}\n")).with_context(|| {
                format!("Failed to write chapter text '{}'", output_path.display())
            })?;
            tracing::info!(
                pull_count = session.len(),
                output_path = %output_path.display(),
                "Wrote chapter text"
            );
        }
        None => println!("{chapter_text}"),
    }

    Ok(())
}

fn resolve_api_key(flag_value: Option<&str>) -> Result<String> {
    if let Some(api_key) = flag_value {
        return Ok(api_key.to_string());
    }

    std::env::var(API_KEY_ENV_VAR).with_context(|| {
        format!("Set --api-key or the {API_KEY_ENV_VAR} environment variable to fetch reports")
    })
}
