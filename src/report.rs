use std::fmt::Write as _;
use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{Writer, WriterBuilder};
use fixed_map::{Key, Map};
use itertools::Itertools;
use serde::Serialize;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};
use tracing::{debug, info};

use crate::statcast::aggregate::{
    aggregate_by_player_season_pitch_type, aggregate_by_season_pitch_type, compare_to_league,
    sort_by_out_percentage, summarize, AggregateRow, ComparisonRow, PitchSummary,
};
use crate::statcast::names::PlayerDirectory;
use crate::statcast::pitch::PitchEvent;
use crate::statcast::traits::{PlayerName, Season};
use crate::util::thousands;

#[derive(Debug, Eq, PartialEq, Copy, Clone, Display, EnumIter, Key)]
#[strum(serialize_all = "snake_case")]
pub enum ReportSchema {
    PlayerBreakdown,
    LeagueAverage,
    Comparison,
    Summary,
}

/// Everything shown for one player and season.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub player: PlayerName,
    pub display_name: String,
    pub season: Season,
    pub min_pitches: u32,
    pub breakdown: Vec<AggregateRow>,
    pub summary: Option<PitchSummary>,
    pub league_average: Vec<AggregateRow>,
    pub comparison: Vec<ComparisonRow>,
}

impl Report {
    pub fn build(
        events: &[PitchEvent],
        directory: &PlayerDirectory,
        player: &str,
        season: Season,
        min_pitches: u32,
    ) -> Self {
        let player_rows = aggregate_by_player_season_pitch_type(events, player, season, min_pitches);
        let league_average = aggregate_by_season_pitch_type(events, season, min_pitches);
        let comparison = compare_to_league(&player_rows, &league_average);
        Self {
            player: player.to_string(),
            display_name: directory.display_name(player),
            season,
            min_pitches,
            summary: summarize(&player_rows),
            breakdown: sort_by_out_percentage(&player_rows),
            league_average: sort_by_out_percentage(&league_average),
            comparison,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.breakdown.is_empty()
    }

    pub fn no_data_message(&self) -> String {
        format!(
            "No pitch data available for {} in {} with at least {} pitches per type.",
            self.display_name, self.season, self.min_pitches
        )
    }

    pub fn render_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Out Percentage Analysis for {} ({})\n",
            self.display_name, self.season
        );
        if self.is_empty() {
            let _ = writeln!(out, "{}", self.no_data_message());
            return out;
        }

        let _ = writeln!(out, "Pitch Type Breakdown");
        out.push_str(&table(
            &["Pitch Type", "Total Pitches", "Outs", "Out %"],
            self.breakdown.iter().map(|r| {
                vec![
                    r.pitch_name.clone(),
                    r.total_pitches.to_string(),
                    r.out_pitch_count.to_string(),
                    percent(r.out_percentage),
                ]
            }),
        ));

        if let Some(summary) = &self.summary {
            let _ = writeln!(out, "\nSummary Statistics");
            out.push_str(&table(
                &["Metric", "Value"],
                [
                    vec!["Total Pitches".to_string(), thousands(summary.total_pitches)],
                    vec!["Total Outs".to_string(), thousands(summary.total_outs)],
                    vec!["Overall Out %".to_string(), percent(summary.overall_out_percentage)],
                ],
            ));
        }

        let _ = writeln!(out, "\n{} vs. League Average Out Percentage", self.display_name);
        out.push_str(&table(
            &["Pitch Type", self.display_name.as_str(), "League Average"],
            self.comparison.iter().map(|c| {
                vec![
                    c.pitch_name.clone(),
                    percent(c.player_out_percentage),
                    percent(c.league_out_percentage),
                ]
            }),
        ));
        out
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize report")
    }
}

fn percent(value: f64) -> String {
    format!("{value:.2}%")
}

/// Left-aligns the first column and right-aligns the rest.
fn table<I>(header: &[&str], rows: I) -> String
where
    I: IntoIterator<Item = Vec<String>>,
{
    let rows = rows.into_iter().collect_vec();
    let widths = (0..header.len())
        .map(|i| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .map(|c| c.chars().count())
                .chain([header[i].chars().count()])
                .max()
                .unwrap_or_default()
        })
        .collect_vec();
    let mut out = String::new();
    let _ = writeln!(out, "{}", table_line(header, &widths));
    let _ = writeln!(out, "{}", widths.iter().map(|w| "-".repeat(*w)).join("  "));
    for row in &rows {
        let cells = row.iter().map(String::as_str).collect_vec();
        let _ = writeln!(out, "{}", table_line(&cells, &widths));
    }
    out
}

fn table_line(cells: &[&str], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, &width))| {
            if i == 0 {
                format!("{cell:<width$}")
            } else {
                format!("{cell:>width$}")
            }
        })
        .join("  ")
        .trim_end()
        .to_string()
}

/// One CSV file per report table, named after the table.
pub struct ReportWriter {
    map: Map<ReportSchema, Writer<File>>,
}

impl ReportWriter {
    pub fn new(output_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;
        let mut map = Map::new();
        for schema in ReportSchema::iter() {
            let path = output_dir.join(format!("{schema}.csv"));
            debug!("Creating file {}", path.display());
            let writer = WriterBuilder::new()
                .has_headers(true)
                .from_path(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            map.insert(schema, writer);
        }
        Ok(Self { map })
    }

    fn write_rows<T: Serialize>(&mut self, schema: ReportSchema, rows: &[T]) -> Result<()> {
        let writer = self
            .map
            .get_mut(schema)
            .context("Failed to initialize writer for schema")?;
        for row in rows {
            writer.serialize(row)?;
        }
        Ok(())
    }

    pub fn write(&mut self, report: &Report) -> Result<()> {
        self.write_rows(ReportSchema::PlayerBreakdown, &report.breakdown)?;
        self.write_rows(ReportSchema::LeagueAverage, &report.league_average)?;
        self.write_rows(ReportSchema::Comparison, &report.comparison)?;
        let summary = report.summary.iter().cloned().collect_vec();
        self.write_rows(ReportSchema::Summary, &summary)?;
        self.flush_all()?;
        info!("Wrote {} report files", ReportSchema::iter().count());
        Ok(())
    }

    fn flush_all(&mut self) -> Result<()> {
        for (schema, writer) in self.map.iter_mut() {
            writer
                .flush()
                .with_context(|| format!("Failed to flush {schema}"))?;
        }
        Ok(())
    }
}
