use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Error, Result};
use chrono::{Days, NaiveDate};
use const_format::concatcp;
use glob::glob;
use reqwest::blocking::Client;
use tracing::{debug, error, info, warn};

use crate::statcast::pitch::PitchEvent;
use crate::statcast::reader::{read_events_from_path, read_events_from_str};
use crate::statcast::traits::{PitchSource, Season};

const SAVANT_ROOT: &str = "https://baseballsavant.mlb.com";
pub const SAVANT_CSV_URL: &str = concatcp!(SAVANT_ROOT, "/statcast_search/csv");
const USER_AGENT: &str = concatcp!("outpct-rs/", env!("CARGO_PKG_VERSION"));

pub const FALLBACK_DAYS: u64 = 21;
pub const DEFAULT_CHUNK_DAYS: u32 = 1;
/// Savant returns at most this many rows per search response.
pub const SAVANT_ROW_CAP: usize = 25_000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 180;

/// Inclusive window of game dates.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            bail!("Date range starts after it ends: {} > {}", start, end);
        }
        Ok(Self { start, end })
    }

    /// March 1 through November 30, which covers spring training through the World Series.
    pub fn season(year: Season) -> Result<Self> {
        let year = i32::from(year);
        let start = NaiveDate::from_ymd_opt(year, 3, 1).context("Invalid season start")?;
        let end = NaiveDate::from_ymd_opt(year, 11, 30).context("Invalid season end")?;
        Self::new(start, end)
    }

    pub fn trailing(today: NaiveDate, days: u64) -> Result<Self> {
        let start = today
            .checked_sub_days(Days::new(days))
            .context("Fallback window underflows the calendar")?;
        Self::new(start, today)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Consecutive sub-windows of at most `days` days that tile the whole range.
    pub fn chunks(self, days: u32) -> impl Iterator<Item = Self> {
        let step = u64::from(days.max(1));
        let mut next = Some(self.start);
        std::iter::from_fn(move || {
            let start = next?;
            let end = start
                .checked_add_days(Days::new(step - 1))
                .map_or(self.end, |d| d.min(self.end));
            next = end.succ_opt().filter(|d| *d <= self.end);
            Some(Self { start, end })
        })
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

const fn at_row_cap(rows: usize) -> bool {
    rows >= SAVANT_ROW_CAP
}

/// Statcast search CSV endpoint on Baseball Savant.
pub struct SavantClient {
    client: Client,
    base_url: String,
    chunk_days: u32,
}

impl SavantClient {
    pub fn new(base_url: &str, chunk_days: u32, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            chunk_days,
        })
    }

    fn query(range: DateRange) -> Vec<(&'static str, String)> {
        let fixed = [
            ("all", "true"),
            ("hfGT", "R|PO|S|"),
            ("player_type", "pitcher"),
            ("min_pitches", "0"),
            ("min_results", "0"),
            ("min_abs", "0"),
            ("group_by", "name"),
            ("sort_col", "pitches"),
            ("sort_order", "desc"),
            ("type", "details"),
        ];
        fixed
            .into_iter()
            .map(|(k, v)| (k, v.to_string()))
            .chain([
                ("game_date_gt", range.start.to_string()),
                ("game_date_lt", range.end.to_string()),
            ])
            .collect()
    }

    fn fetch_chunk(&self, range: DateRange) -> Result<Vec<PitchEvent>> {
        debug!("Requesting {}", range);
        let body = self
            .client
            .get(&self.base_url)
            .query(&Self::query(range))
            .send()
            .with_context(|| format!("Request for {range} failed"))?
            .error_for_status()
            .with_context(|| format!("Bad status for {range}"))?
            .text()
            .with_context(|| format!("Failed to read body for {range}"))?;
        let rows =
            read_events_from_str(&body).with_context(|| format!("Unreadable CSV for {range}"))?;
        if at_row_cap(rows.len()) {
            warn!(
                "{} returned {} rows, the Savant limit; results are likely truncated, use a smaller --chunk-days",
                range,
                rows.len()
            );
        }
        Ok(rows)
    }
}

impl PitchSource for SavantClient {
    fn fetch(&self, range: DateRange) -> Result<Vec<PitchEvent>> {
        let mut events = Vec::new();
        for chunk in range.chunks(self.chunk_days) {
            let rows = self.fetch_chunk(chunk)?;
            debug!("{}: {} pitches", chunk, rows.len());
            events.extend(rows);
        }
        Ok(events)
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

/// Local Statcast exports matched by a glob pattern.
pub struct CsvFileSource {
    pattern: String,
}

impl CsvFileSource {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
        }
    }

    fn paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths = glob(&self.pattern)
            .with_context(|| format!("Invalid input pattern {}", self.pattern))?
            .collect::<Result<Vec<PathBuf>, _>>()?;
        if paths.is_empty() {
            bail!("No files match {}", self.pattern);
        }
        paths.sort();
        Ok(paths)
    }
}

impl PitchSource for CsvFileSource {
    fn fetch(&self, range: DateRange) -> Result<Vec<PitchEvent>> {
        let mut events = Vec::new();
        for path in self.paths()? {
            let rows = read_events_from_path(&path)?;
            events.extend(
                rows.into_iter()
                    .filter(|e| e.game_date.is_none_or(|d| range.contains(d))),
            );
        }
        Ok(events)
    }

    fn describe(&self) -> String {
        self.pattern.clone()
    }
}

#[derive(Debug)]
pub enum LoadOutcome {
    Requested(Vec<PitchEvent>),
    Fallback {
        range: DateRange,
        events: Vec<PitchEvent>,
    },
    Failed(Error),
}

impl LoadOutcome {
    pub fn into_events(self) -> Vec<PitchEvent> {
        match self {
            Self::Requested(events) | Self::Fallback { events, .. } => events,
            Self::Failed(_) => vec![],
        }
    }
}

/// Tries the requested window, then once more with the trailing three weeks before
/// `today`. A second failure leaves the caller with no data and the last error to report.
pub fn load_with_fallback<S: PitchSource + ?Sized>(
    source: &S,
    requested: DateRange,
    today: NaiveDate,
) -> LoadOutcome {
    info!("Fetching Statcast data for {} from {}", requested, source.describe());
    let first_error = match source.fetch(requested) {
        Ok(events) => {
            info!("Loaded {} pitches", events.len());
            return LoadOutcome::Requested(events);
        }
        Err(e) => e,
    };
    error!("Error loading data: {:?}", first_error);

    let range = match DateRange::trailing(today, FALLBACK_DAYS) {
        Ok(range) => range,
        Err(e) => return LoadOutcome::Failed(e),
    };
    info!("Trying with a smaller date range: {}", range);
    match source.fetch(range) {
        Ok(events) => {
            info!("Loaded {} pitches with reduced date range", events.len());
            LoadOutcome::Fallback { range, events }
        }
        Err(e) => LoadOutcome::Failed(e.context(format!("Fallback fetch for {range} failed"))),
    }
}
