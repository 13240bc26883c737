use crate::error::{StoreError, StoreResult};
use chrono::{Duration, NaiveDate};
use std::str::FromStr;
use strum_macros::{AsRefStr, EnumString};

/// Format of the key identifying an entry, and of its file names.
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Relative words accepted wherever a date key is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Keyword {
    Today,
    Yesterday,
    Tomorrow,
}

impl Keyword {
    fn offset_from(self, reference: NaiveDate) -> NaiveDate {
        match self {
            Keyword::Today => reference,
            Keyword::Yesterday => reference - Duration::days(1),
            Keyword::Tomorrow => reference + Duration::days(1),
        }
    }
}

/// Formats `date` as its entry key.
///
/// ```
/// # use chrono::NaiveDate;
/// # use daybook_core::dates::date_key;
/// let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
/// assert_eq!(date_key(date), "2024-01-05");
/// ```
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// Parses a strict `YYYY-MM-DD` key. Anything else (including `2024-1-5`) is rejected,
/// so file names that merely look like dates never collide with real entries.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    if key.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(key, DATE_KEY_FORMAT).ok()
}

/// Resolves user input into a date: either a strict key or a relative [`Keyword`]
/// anchored at `reference`.
pub fn resolve_date(input: &str, reference: NaiveDate) -> StoreResult<NaiveDate> {
    let trimmed = input.trim();
    if let Some(date) = parse_date_key(trimmed) {
        return Ok(date);
    }
    Keyword::from_str(trimmed)
        .map(|k| k.offset_from(reference))
        .map_err(|_| StoreError::InvalidDate(input.to_string()))
}
