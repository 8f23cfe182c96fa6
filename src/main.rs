#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(
    clippy::nursery,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::module_name_repetitions)]

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local};
use clap::{Parser, ValueEnum};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::report::{Report, ReportWriter};
use crate::statcast::aggregate::{classify, DEFAULT_MIN_PITCHES};
use crate::statcast::fetch::{
    load_with_fallback, CsvFileSource, DateRange, LoadOutcome, SavantClient, DEFAULT_CHUNK_DAYS,
    DEFAULT_TIMEOUT_SECS, SAVANT_CSV_URL,
};
use crate::statcast::names::PlayerDirectory;
use crate::statcast::pitch::OUT_EVENTS;
use crate::statcast::traits::{PitchSource, Season};

mod report;
mod statcast;
mod util;

const ABOUT: &str = "Out percentage by pitch type from Statcast pitch-by-pitch data.";
const LOAD_FAILED: &str = "Failed to load Statcast data. Please try again later.";

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "outpct", about = ABOUT)]
struct Opt {
    /// Season to analyze; defaults to the current year
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(2015..))]
    season: Option<Season>,

    /// Only include pitch types with at least this many pitches
    #[arg(short, long, default_value_t = DEFAULT_MIN_PITCHES, value_parser = clap::value_parser!(u32).range(1..=150))]
    min_pitches: u32,

    /// "First Last" or "Last, First"; defaults to the first player alphabetically
    #[arg(short, long)]
    player: Option<String>,

    /// Glob of local Statcast CSV exports to read instead of Baseball Savant
    #[arg(short, long)]
    input: Option<String>,

    #[arg(long, default_value = SAVANT_CSV_URL)]
    base_url: String,

    /// Days of games per Savant request
    #[arg(long, default_value_t = DEFAULT_CHUNK_DAYS, value_parser = clap::value_parser!(u32).range(1..))]
    chunk_days: u32,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Also write each table as CSV into this directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Print the players in the loaded data and exit
    #[arg(long)]
    list_players: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn build_source(opt: &Opt) -> Result<Box<dyn PitchSource>> {
    let source: Box<dyn PitchSource> = match &opt.input {
        Some(pattern) => Box::new(CsvFileSource::new(pattern)),
        None => Box::new(SavantClient::new(
            &opt.base_url,
            opt.chunk_days,
            Duration::from_secs(opt.timeout_secs),
        )?),
    };
    Ok(source)
}

fn run(opt: &Opt) -> Result<()> {
    let today = Local::now().date_naive();
    let current_year = Season::try_from(today.year())?;
    let season = opt.season.unwrap_or(current_year);
    if season > current_year {
        bail!("Season {} is after the current season {}", season, current_year);
    }

    let source = build_source(opt)?;
    let outcome = load_with_fallback(source.as_ref(), DateRange::season(season)?, today);
    match &outcome {
        LoadOutcome::Fallback { range, .. } => {
            warn!("Showing {} only; the {} season could not be loaded", range, season);
        }
        LoadOutcome::Failed(e) => error!("Failed to load data: {:?}", e),
        LoadOutcome::Requested(_) => {}
    }
    let events = outcome.into_events();
    if events.is_empty() {
        error!("{}", LOAD_FAILED);
        return Ok(());
    }

    let events = classify(events, &OUT_EVENTS);
    let directory = PlayerDirectory::from_events(&events);
    if directory.is_empty() {
        warn!("No player names in the loaded data");
        return Ok(());
    }
    info!("{} pitches from {} players", events.len(), directory.len());
    if opt.list_players {
        for name in directory.formatted_names() {
            println!("{name}");
        }
        return Ok(());
    }

    let player = match &opt.player {
        Some(query) => directory.resolve(query),
        None => directory
            .default_player()
            .context("No default player available")?,
    };

    let report = Report::build(&events, &directory, &player, season, opt.min_pitches);
    if report.is_empty() {
        warn!("{}", report.no_data_message());
    }
    match opt.format {
        OutputFormat::Table => print!("{}", report.render_table()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }
    if let Some(output_dir) = &opt.output_dir {
        ReportWriter::new(output_dir)?.write(&report)?;
    }
    Ok(())
}

#[allow(clippy::expect_used)]
fn main() {
    let opt: Opt = Opt::parse();
    let level = if opt.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to initialize trace");

    let start = Instant::now();
    if let Err(e) = run(&opt) {
        error!("{:?}", e);
        std::process::exit(1);
    }
    info!("Elapsed: {:?}", start.elapsed());
}
