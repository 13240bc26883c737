//! Normalized tags.
//!
//! A [`Tag`] can only be built through [`Tag::parse`], so every tag held by an entry is
//! already lowercase, trimmed and hyphenated. Tag lists keep insertion order for display
//! but never hold the same tag twice.

use crate::error::{StoreError, StoreResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Lowercases, trims and collapses inner whitespace runs into a single hyphen.
///
/// ```
/// # use daybook_core::tag::normalize_tag;
/// assert_eq!(normalize_tag("  Morning   Walk "), "morning-walk");
/// assert_eq!(normalize_tag(&normalize_tag("Deep Work")), "deep-work");
/// ```
pub fn normalize_tag(raw: &str) -> String {
    WHITESPACE
        .replace_all(raw.trim(), "-")
        .to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag(String);

impl Tag {
    /// Normalizes `raw`; fails only when nothing is left afterwards.
    pub fn parse(raw: &str) -> StoreResult<Self> {
        let normalized = normalize_tag(raw);
        if normalized.is_empty() {
            return Err(StoreError::InvalidTag(raw.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Tag {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Tag::parse(&value)
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.0
    }
}

/// Appends `tag` unless already present. Returns whether the list changed.
pub fn push_unique(tags: &mut Vec<Tag>, tag: Tag) -> bool {
    if tags.contains(&tag) {
        return false;
    }
    tags.push(tag);
    true
}

/// Parses every raw tag, dropping blanks and duplicates while keeping first-seen order.
pub fn parse_tag_list<I, S>(raw: I) -> Vec<Tag>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tags = Vec::new();
    for item in raw {
        if let Ok(tag) = Tag::parse(item.as_ref()) {
            push_unique(&mut tags, tag);
        }
    }
    tags
}
