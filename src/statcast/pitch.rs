use std::collections::HashSet;
use std::str::FromStr;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use serde::Deserialize;
use strum::IntoEnumIterator;
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

use crate::statcast::traits::{PitchCode, PlayerName, Season};
use crate::util::nullable;

lazy_static! {
    pub static ref OUT_EVENTS: HashSet<&'static str> =
        OutEvent::iter().map(<&'static str>::from).collect();
}

/// At-bat results that put the batter (or a runner on the play) out.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum OutEvent {
    FieldOut,
    Strikeout,
    GroundedIntoDoublePlay,
    FieldersChoiceOut,
    ForceOut,
    SacFly,
    SacBunt,
    StrikeoutDoublePlay,
    DoublePlay,
    SacFlyDoublePlay,
    OtherOut,
    TriplePlay,
    SacBuntDoublePlay,
}

#[derive(Debug, Eq, PartialEq, Copy, Clone, Hash, EnumString, EnumIter)]
pub enum PitchTypeCode {
    #[strum(serialize = "FF")]
    FourSeamFastball,
    #[strum(serialize = "SL")]
    Slider,
    #[strum(serialize = "CH")]
    Changeup,
    #[strum(serialize = "CU")]
    Curveball,
    #[strum(serialize = "SI")]
    Sinker,
    #[strum(serialize = "FC")]
    Cutter,
    #[strum(serialize = "FS")]
    Splitter,
    #[strum(serialize = "FT")]
    TwoSeamFastball,
    #[strum(serialize = "KC")]
    KnuckleCurve,
    #[strum(serialize = "EP")]
    Eephus,
    #[strum(serialize = "KN")]
    Knuckleball,
    #[strum(serialize = "SC")]
    Screwball,
    #[strum(serialize = "ST")]
    Sweeper,
    #[strum(serialize = "SV")]
    Slurve,
}

impl PitchTypeCode {
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::FourSeamFastball => "Four-Seam Fastball",
            Self::Slider => "Slider",
            Self::Changeup => "Changeup",
            Self::Curveball => "Curveball",
            Self::Sinker => "Sinker",
            Self::Cutter => "Cutter",
            Self::Splitter => "Splitter",
            Self::TwoSeamFastball => "Two-Seam Fastball",
            Self::KnuckleCurve => "Knuckle Curve",
            Self::Eephus => "Eephus",
            Self::Knuckleball => "Knuckleball",
            Self::Screwball => "Screwball",
            Self::Sweeper => "Sweeper",
            Self::Slurve => "Slurve",
        }
    }
}

/// Display label for a pitch code. Codes outside the lookup table label themselves.
pub fn pitch_name(code: &str) -> String {
    PitchTypeCode::from_str(code).map_or_else(|_| code.to_string(), |c| c.display_name().to_string())
}

/// One row of a Statcast pitch-by-pitch export. Only the columns used here are read.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PitchEvent {
    pub player_name: PlayerName,
    pub game_year: Season,
    #[serde(default, deserialize_with = "nullable")]
    pub game_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "nullable")]
    pub pitch_type: Option<PitchCode>,
    #[serde(rename = "events", default, deserialize_with = "nullable")]
    pub event_outcome: Option<String>,
    #[serde(skip)]
    pub is_out_pitch: bool,
}

impl PitchEvent {
    pub fn is_out(&self, out_events: &HashSet<&str>) -> bool {
        self.event_outcome
            .as_deref()
            .is_some_and(|outcome| out_events.contains(outcome))
    }
}

#[cfg(test)]
pub(crate) fn pitch(
    player_name: &str,
    game_year: Season,
    pitch_type: Option<&str>,
    event_outcome: Option<&str>,
) -> PitchEvent {
    PitchEvent {
        player_name: player_name.to_string(),
        game_year,
        game_date: None,
        pitch_type: pitch_type.map(String::from),
        event_outcome: event_outcome.map(String::from),
        is_out_pitch: false,
    }
}
