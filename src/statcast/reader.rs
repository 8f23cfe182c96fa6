use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use tracing::{debug, warn};

use crate::statcast::pitch::PitchEvent;

const BOM: char = '\u{feff}';

/// Parses a Statcast CSV export. Bad rows are logged and skipped; a bad header is an error.
pub fn read_events<R: Read>(source: R) -> Result<Vec<PitchEvent>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(source);
    reader.headers().context("Failed to read CSV header")?;

    let mut events = Vec::new();
    let mut skipped = 0_usize;
    for (row, result) in reader.deserialize::<PitchEvent>().enumerate() {
        match result {
            Ok(event) => events.push(event),
            Err(e) if e.is_io_error() => {
                return Err(e).context("Failed to read CSV row");
            }
            Err(e) => {
                warn!("Skipping row {}: {}", row + 1, e);
                skipped += 1;
            }
        }
    }
    debug!("Read {} rows, skipped {}", events.len(), skipped);
    Ok(events)
}

pub fn read_events_from_str(text: &str) -> Result<Vec<PitchEvent>> {
    let text = text.trim_start_matches(BOM);
    if text.trim().is_empty() {
        return Ok(vec![]);
    }
    read_events(text.as_bytes())
}

pub fn read_events_from_path(path: &Path) -> Result<Vec<PitchEvent>> {
    debug!("Reading {}", path.display());
    let mut text = String::new();
    BufReader::new(File::open(path).with_context(|| format!("Failed to open {}", path.display()))?)
        .read_to_string(&mut text)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    read_events_from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}
