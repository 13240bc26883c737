use crate::tag::Tag;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Mood {
    Peaceful,
    Content,
    Neutral,
    Reflective,
    Heavy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub region: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    pub condition: String,
    pub description: String,
    pub temp: f64,
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
}

/// Where and under which sky an entry was written. Captured once, never refreshed by saves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherContext {
    pub location: Location,
    pub weather: Weather,
    pub timestamp: DateTime<Utc>,
}

/// Metadata of the single entry stored for `date`. Bodies are kept out of it so the
/// session index stays small.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    pub date: NaiveDate,
    pub title: String,
    pub mood: Mood,
    /// Instant of the last save.
    pub timestamp: DateTime<Utc>,
    pub tags: Vec<Tag>,
    pub weather_context: Option<WeatherContext>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl JournalEntry {
    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntryWithBody {
    pub entry: JournalEntry,
    /// Opaque markup; the core never looks inside.
    pub body: String,
}

/// What an editor hands over when saving. Timestamps and the captured weather of an
/// existing entry are filled in by the session, not by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDraft {
    pub title: String,
    pub mood: Mood,
    pub tags: Vec<Tag>,
    pub body: String,
    /// `Some` replaces whatever weather the entry already carries.
    pub weather_context: Option<WeatherContext>,
}

/// Date-keyed view of every entry in a journal. One value per date, always.
pub type EntryIndex = BTreeMap<NaiveDate, JournalEntry>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn moods_round_trip_through_their_names() {
        for mood in Mood::iter() {
            assert_eq!(Mood::from_str(&mood.to_string()).unwrap(), mood);
        }
        assert_eq!(Mood::from_str("HEAVY").unwrap(), Mood::Heavy);
        assert!(Mood::from_str("ecstatic").is_err());
    }

    #[test]
    fn moods_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&Mood::Reflective).unwrap(), "\"reflective\"");
    }
}
