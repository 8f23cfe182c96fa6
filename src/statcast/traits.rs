use anyhow::Result;

use crate::statcast::fetch::DateRange;
use crate::statcast::pitch::PitchEvent;

/// Raw Statcast spelling, "Last, First".
pub type PlayerName = String;
pub type Season = u16;
pub type PitchCode = String;

/// Anything that can produce pitch-by-pitch rows for a window of game dates.
pub trait PitchSource {
    fn fetch(&self, range: DateRange) -> Result<Vec<PitchEvent>>;

    fn describe(&self) -> String;
}
