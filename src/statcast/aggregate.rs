use std::collections::{BTreeMap, HashSet};

use itertools::Itertools;
use serde::Serialize;

use crate::statcast::pitch::{pitch_name, PitchEvent};
use crate::statcast::traits::{PitchCode, Season};
use crate::util::round2;

pub const DEFAULT_MIN_PITCHES: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub pitch_type: PitchCode,
    pub pitch_name: String,
    pub total_pitches: u32,
    pub out_pitch_count: u32,
    pub out_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PitchSummary {
    pub total_pitches: u64,
    pub total_outs: u64,
    pub overall_out_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub pitch_type: PitchCode,
    pub pitch_name: String,
    pub player_out_percentage: f64,
    pub league_out_percentage: f64,
}

pub fn classify(mut events: Vec<PitchEvent>, out_events: &HashSet<&str>) -> Vec<PitchEvent> {
    for event in &mut events {
        event.is_out_pitch = event.is_out(out_events);
    }
    events
}

pub fn aggregate_by_player_season_pitch_type(
    events: &[PitchEvent],
    player: &str,
    season: Season,
    min_pitches: u32,
) -> Vec<AggregateRow> {
    aggregate_by_pitch_type(
        events
            .iter()
            .filter(|e| e.player_name == player && e.game_year == season),
        min_pitches,
    )
}

/// League baseline: every pitcher's pitches for the season.
pub fn aggregate_by_season_pitch_type(
    events: &[PitchEvent],
    season: Season,
    min_pitches: u32,
) -> Vec<AggregateRow> {
    aggregate_by_pitch_type(
        events.iter().filter(|e| e.game_year == season),
        min_pitches,
    )
}

/// Groups come out in ascending pitch code order. Events without a pitch type form no group.
fn aggregate_by_pitch_type<'a>(
    events: impl Iterator<Item = &'a PitchEvent>,
    min_pitches: u32,
) -> Vec<AggregateRow> {
    let mut groups: BTreeMap<&str, (u32, u32)> = BTreeMap::new();
    for event in events {
        let Some(code) = event.pitch_type.as_deref() else {
            continue;
        };
        let (total, outs) = groups.entry(code).or_default();
        *total += 1;
        if event.is_out_pitch {
            *outs += 1;
        }
    }
    groups
        .into_iter()
        .filter(|(_, (total, _))| *total >= min_pitches)
        .map(|(code, (total, outs))| AggregateRow {
            pitch_type: code.to_string(),
            pitch_name: pitch_name(code),
            total_pitches: total,
            out_pitch_count: outs,
            out_percentage: round2(f64::from(outs) / f64::from(total) * 100.0),
        })
        .collect()
}

/// Highest out percentage first; equal percentages keep their incoming order.
pub fn sort_by_out_percentage(rows: &[AggregateRow]) -> Vec<AggregateRow> {
    rows.iter()
        .sorted_by(|a, b| b.out_percentage.total_cmp(&a.out_percentage))
        .cloned()
        .collect()
}

pub fn summarize(rows: &[AggregateRow]) -> Option<PitchSummary> {
    let total_pitches: u64 = rows.iter().map(|r| u64::from(r.total_pitches)).sum();
    if total_pitches == 0 {
        return None;
    }
    let total_outs: u64 = rows.iter().map(|r| u64::from(r.out_pitch_count)).sum();
    #[allow(clippy::cast_precision_loss)]
    let overall_out_percentage = round2(total_outs as f64 / total_pitches as f64 * 100.0);
    Some(PitchSummary {
        total_pitches,
        total_outs,
        overall_out_percentage,
    })
}

/// Pairs each of the player's pitch types with the league figure, in the player's
/// display order. A pitch type missing from the league baseline compares against zero.
pub fn compare_to_league(player: &[AggregateRow], league: &[AggregateRow]) -> Vec<ComparisonRow> {
    sort_by_out_percentage(player)
        .into_iter()
        .map(|row| {
            let league_out_percentage = league
                .iter()
                .find(|l| l.pitch_type == row.pitch_type)
                .map_or(0.0, |l| l.out_percentage);
            ComparisonRow {
                pitch_type: row.pitch_type,
                pitch_name: row.pitch_name,
                player_out_percentage: row.out_percentage,
                league_out_percentage,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::statcast::pitch::{pitch, OUT_EVENTS};

    fn classified(events: Vec<PitchEvent>) -> Vec<PitchEvent> {
        classify(events, &OUT_EVENTS)
    }

    fn scenario() -> Vec<PitchEvent> {
        classified(vec![
            pitch("Cole, Gerrit", 2023, Some("FF"), Some("strikeout")),
            pitch("Cole, Gerrit", 2023, Some("FF"), Some("ball")),
            pitch("Cole, Gerrit", 2023, Some("FF"), Some("field_out")),
            pitch("Cole, Gerrit", 2023, Some("SL"), Some("single")),
        ])
    }

    #[test]
    fn classify_marks_out_pitches() {
        let events = scenario();
        let flags = events.iter().map(|e| e.is_out_pitch).collect_vec();
        assert_eq!(flags, vec![true, false, true, false]);
    }

    #[test]
    fn classify_honors_the_given_set() {
        let only_strikeouts: HashSet<&str> = ["strikeout"].into_iter().collect();
        let events = classify(
            vec![
                pitch("Cole, Gerrit", 2023, Some("FF"), Some("strikeout")),
                pitch("Cole, Gerrit", 2023, Some("FF"), Some("field_out")),
            ],
            &only_strikeouts,
        );
        assert!(events[0].is_out_pitch);
        assert!(!events[1].is_out_pitch);
    }

    #[test]
    fn league_baseline_drops_small_groups() {
        let rows = aggregate_by_season_pitch_type(&scenario(), 2023, 2);
        assert_eq!(
            rows,
            vec![AggregateRow {
                pitch_type: "FF".to_string(),
                pitch_name: "Four-Seam Fastball".to_string(),
                total_pitches: 3,
                out_pitch_count: 2,
                out_percentage: 66.67,
            }]
        );
    }

    #[test]
    fn player_filter_matches_name_and_season() {
        let mut events = scenario();
        events.extend(classified(vec![
            pitch("Cole, Gerrit", 2022, Some("FF"), Some("strikeout")),
            pitch("Verlander, Justin", 2023, Some("FF"), Some("strikeout")),
            pitch("Verlander, Justin", 2023, Some("FF"), Some("strikeout")),
        ]));
        let cole = aggregate_by_player_season_pitch_type(&events, "Cole, Gerrit", 2023, 1);
        assert_eq!(cole.len(), 2);
        assert_eq!(cole[0].pitch_type, "FF");
        assert_eq!(cole[0].total_pitches, 3);
        assert_eq!(cole[1].pitch_type, "SL");
        assert_eq!(cole[1].out_percentage, 0.0);

        let league = aggregate_by_season_pitch_type(&events, 2023, 1);
        assert_eq!(league[0].total_pitches, 5);
        assert_eq!(league[0].out_pitch_count, 4);
        assert_eq!(league[0].out_percentage, 80.0);
    }

    #[test]
    fn exact_ties_round_to_even() {
        let mut raw = vec![pitch("Cole, Gerrit", 2023, Some("FF"), Some("strikeout"))];
        raw.extend((0..31).map(|_| pitch("Cole, Gerrit", 2023, Some("FF"), Some("ball"))));
        let rows = aggregate_by_season_pitch_type(&classified(raw), 2023, 1);
        assert_eq!(rows[0].total_pitches, 32);
        assert_eq!(rows[0].out_percentage, 3.12);
    }

    #[test]
    fn unknown_codes_label_themselves() {
        let events = classified(vec![pitch("Cole, Gerrit", 2023, Some("XY"), None)]);
        let rows = aggregate_by_season_pitch_type(&events, 2023, 1);
        assert_eq!(rows[0].pitch_name, "XY");
    }

    #[test]
    fn missing_pitch_type_forms_no_group() {
        let events = classified(vec![
            pitch("Cole, Gerrit", 2023, None, Some("strikeout")),
            pitch("Cole, Gerrit", 2023, None, Some("strikeout")),
        ]);
        assert!(aggregate_by_season_pitch_type(&events, 2023, 1).is_empty());
    }

    #[test]
    fn empty_inputs_yield_empty_outputs() {
        assert!(aggregate_by_season_pitch_type(&[], 2023, 1).is_empty());
        assert!(aggregate_by_player_season_pitch_type(&[], "Cole, Gerrit", 2023, 1).is_empty());
        assert!(aggregate_by_player_season_pitch_type(&scenario(), "Nobody, Such", 2023, 1).is_empty());
        assert!(summarize(&[]).is_none());
        assert!(compare_to_league(&[], &[]).is_empty());
    }

    #[test]
    fn summary_and_comparison() {
        let mut events = scenario();
        events.extend(classified(vec![
            pitch("Cole, Gerrit", 2023, Some("SL"), Some("strikeout")),
            pitch("Cole, Gerrit", 2023, Some("CH"), Some("force_out")),
            pitch("Ohtani, Shohei", 2023, Some("FF"), Some("walk")),
        ]));
        let player = aggregate_by_player_season_pitch_type(&events, "Cole, Gerrit", 2023, 1);
        let league = aggregate_by_season_pitch_type(&events, 2023, 2);

        let summary = summarize(&player).unwrap();
        assert_eq!(summary.total_pitches, 6);
        assert_eq!(summary.total_outs, 4);
        assert_eq!(summary.overall_out_percentage, 66.67);

        let comparison = compare_to_league(&player, &league);
        let order = comparison.iter().map(|c| c.pitch_type.as_str()).collect_vec();
        assert_eq!(order, vec!["CH", "FF", "SL"]);
        // CH has a single league pitch, below the league threshold of two.
        assert_eq!(comparison[0].league_out_percentage, 0.0);
        assert_eq!(comparison[1].league_out_percentage, 50.0);
        assert_eq!(comparison[2].league_out_percentage, 50.0);
    }

    #[test]
    fn sort_is_descending_and_stable() {
        let row = |code: &str, pct: f64| AggregateRow {
            pitch_type: code.to_string(),
            pitch_name: pitch_name(code),
            total_pitches: 10,
            out_pitch_count: 0,
            out_percentage: pct,
        };
        let sorted = sort_by_out_percentage(&[row("CH", 10.0), row("FF", 30.0), row("SL", 10.0)]);
        let order = sorted.iter().map(|r| r.pitch_type.as_str()).collect_vec();
        assert_eq!(order, vec!["FF", "CH", "SL"]);
    }

    const CODES: [&str; 5] = ["FF", "SL", "CH", "XY", "ST"];
    const OUTCOMES: [&str; 5] = ["strikeout", "single", "ball", "double_play", "walk"];

    fn arb_events() -> impl Strategy<Value = Vec<PitchEvent>> {
        prop::collection::vec(
            (0..CODES.len(), 0..=OUTCOMES.len(), prop::bool::ANY),
            0..200,
        )
        .prop_map(|picks| {
            let raw = picks
                .into_iter()
                .map(|(c, o, other_player)| {
                    let player = if other_player { "Cole, Gerrit" } else { "Gray, Sonny" };
                    pitch(player, 2023, Some(CODES[c]), OUTCOMES.get(o).copied())
                })
                .collect_vec();
            classify(raw, &OUT_EVENTS)
        })
    }

    proptest! {
        #[test]
        fn aggregate_laws(events in arb_events(), min_pitches in 1u32..=150) {
            let league = aggregate_by_season_pitch_type(&events, 2023, min_pitches);
            let player = aggregate_by_player_season_pitch_type(&events, "Cole, Gerrit", 2023, min_pitches);
            for row in league.iter().chain(&player) {
                prop_assert!(row.total_pitches >= min_pitches);
                prop_assert!(row.out_pitch_count <= row.total_pitches);
                let expected = round2(f64::from(row.out_pitch_count) / f64::from(row.total_pitches) * 100.0);
                prop_assert_eq!(row.out_percentage, expected);
            }
            prop_assert_eq!(&league, &aggregate_by_season_pitch_type(&events, 2023, min_pitches));
        }

        #[test]
        fn flag_matches_set_membership(events in arb_events()) {
            for e in &events {
                let expected = e.event_outcome.as_deref().is_some_and(|o| OUT_EVENTS.contains(o));
                prop_assert_eq!(e.is_out_pitch, expected);
            }
        }
    }
}
