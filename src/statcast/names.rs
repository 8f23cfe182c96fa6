use bimap::BiMap;
use itertools::Itertools;
use tracing::warn;

use crate::statcast::pitch::PitchEvent;
use crate::statcast::traits::PlayerName;

/// "Last, First" becomes "First Last". Only the first comma splits, so anything after it
/// (suffixes, further commas) stays in the first-name segment.
pub fn format_player_name(raw: &str) -> String {
    match raw.split_once(',') {
        Some((last, first)) => format!("{} {}", first.trim(), last.trim()),
        None => raw.to_string(),
    }
}

/// Raw Statcast names on the left, display names on the right.
#[derive(Debug, Default)]
pub struct PlayerDirectory {
    names: BiMap<PlayerName, String>,
}

impl PlayerDirectory {
    pub fn from_events(events: &[PitchEvent]) -> Self {
        let mut names = BiMap::new();
        for raw in events
            .iter()
            .map(|e| e.player_name.as_str())
            .filter(|n| !n.trim().is_empty())
            .unique()
            .sorted()
        {
            let formatted = format_player_name(raw);
            // Two raw spellings can format identically; the later one in sorted order wins.
            if let bimap::Overwritten::Right(previous, _) =
                names.insert(raw.to_string(), formatted)
            {
                warn!("Player {} shares a display name with {}", raw, previous);
            }
        }
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn formatted_names(&self) -> Vec<&str> {
        self.names.right_values().map(String::as_str).sorted().collect()
    }

    pub fn display_name(&self, raw: &str) -> String {
        self.names
            .get_by_left(raw)
            .cloned()
            .unwrap_or_else(|| format_player_name(raw))
    }

    /// Accepts either spelling. Unknown names come back untouched so the caller ends up
    /// with an empty breakdown rather than an error.
    pub fn resolve(&self, query: &str) -> PlayerName {
        let query = query.trim();
        if self.names.contains_left(query) {
            return query.to_string();
        }
        self.names.get_by_right(query).cloned().unwrap_or_else(|| {
            warn!("Player {} not found in the loaded data", query);
            query.to_string()
        })
    }

    /// The first display name in sorted order.
    pub fn default_player(&self) -> Option<PlayerName> {
        self.formatted_names()
            .first()
            .and_then(|f| self.names.get_by_right(*f))
            .cloned()
    }
}
