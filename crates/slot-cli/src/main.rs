//! `slots` CLI — compute available meeting slots from a JSON request.
//!
//! ## Usage
//!
//! ```sh
//! # Request from stdin, no busy data
//! echo '{"from":"2027-01-04T00:00:00Z","to":"2027-01-08T00:00:00Z"}' | slots compute
//!
//! # Busy intervals from a JSON file
//! slots compute -i request.json --busy busy.json
//!
//! # Busy intervals from an ICS feed, reproducible sampling
//! slots compute -i request.json --ics feed.ics --seed 7
//!
//! # One file per calendar id (<dir>/<id>.ics or <dir>/<id>.json)
//! slots compute -i request.json --calendar-dir calendars/
//!
//! # List the weighting strategies
//! slots strategies
//! ```

mod calendars;

use std::io::{self, Read};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use slot_engine::pipeline::LogSink;
use slot_engine::{
    compute_slots_with, BusyInterval, BusyIntervalSource, CalendarFanOut, IcsFeedSource,
    PipelineEvent, SlotOptions, SlotRequest, StaticBusySource, Strategy,
};
use tracing_subscriber::EnvFilter;

use crate::calendars::DirectoryCalendars;

#[derive(Parser)]
#[command(name = "slots", version, about = "Find available meeting slots")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print pipeline diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute available slots for a JSON request
    Compute {
        /// Request file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// JSON file with an array of {start, end} busy intervals
        #[arg(long, conflicts_with_all = ["ics", "calendar_dir"])]
        busy: Option<String>,
        /// ICS feed with busy events
        #[arg(long, conflicts_with = "calendar_dir")]
        ics: Option<String>,
        /// Directory with one <calendar-id>.ics or .json file per calendar
        #[arg(long)]
        calendar_dir: Option<String>,
        /// Seed for reproducible sampling
        #[arg(long)]
        seed: Option<u64>,
        /// Override the current time (RFC 3339)
        #[arg(long)]
        now: Option<String>,
    },
    /// List the accepted strategy names
    Strategies,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Compute {
            input,
            output,
            busy,
            ics,
            calendar_dir,
            seed,
            now,
        } => {
            let raw = read_input(input.as_deref())?;
            let request: SlotRequest =
                serde_json::from_str(&raw).context("Failed to parse slot request")?;
            let query = request.into_query().context("Invalid slot request")?;

            let mut options = SlotOptions::new(query);
            if let Some(source) =
                build_source(busy.as_deref(), ics.as_deref(), calendar_dir.as_deref())?
            {
                options = options.with_busy_source(source);
            }
            if cli.verbose {
                let sink: LogSink =
                    Arc::new(|event: &PipelineEvent| eprintln!("[slots] {}", event));
                options = options.with_log(sink);
            }

            let now = match now {
                Some(raw) => DateTime::parse_from_rfc3339(&raw)
                    .with_context(|| format!("Invalid --now timestamp: {}", raw))?
                    .with_timezone(&Utc),
                None => Utc::now(),
            };
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_rng(&mut rand::rng()),
            };

            let slots = compute_slots_with(&options, now, &mut rng)
                .await
                .context("Failed to compute slots")?;
            let json = serde_json::to_string_pretty(&slots)?;
            write_output(output.as_deref(), &json)?;
        }
        Commands::Strategies => {
            for name in Strategy::all_names() {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Pick the busy interval source from the mutually exclusive flags.
fn build_source(
    busy: Option<&str>,
    ics: Option<&str>,
    calendar_dir: Option<&str>,
) -> Result<Option<Arc<dyn BusyIntervalSource>>> {
    if let Some(path) = busy {
        let raw = read_input(Some(path))?;
        let intervals: Vec<BusyInterval> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse busy intervals: {}", path))?;
        return Ok(Some(Arc::new(StaticBusySource::new(intervals))));
    }
    if let Some(path) = ics {
        let raw = read_input(Some(path))?;
        return Ok(Some(Arc::new(IcsFeedSource::new(raw))));
    }
    if let Some(dir) = calendar_dir {
        let fetcher = Arc::new(DirectoryCalendars::new(dir));
        return Ok(Some(Arc::new(CalendarFanOut::new(fetcher))));
    }
    Ok(None)
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
