//! Tag statistics, filtering and multi-entry tag mutations.
//!
//! Everything here is pure: functions take the entry index and return new values. The
//! mutators (`rename`, `delete`, `merge`) return only the entries they changed, so the
//! caller never touches files of untouched entries.

use crate::entry::{EntryIndex, JournalEntry};
use crate::tag::{Tag, push_unique};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Every requested tag must be present.
    And,
    /// At least one requested tag must be present.
    #[default]
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagStats {
    pub count: usize,
    pub last_used: DateTime<Utc>,
    pub entry_dates: Vec<NaiveDate>,
}

pub fn all_tags(entries: &EntryIndex) -> BTreeSet<Tag> {
    entries
        .values()
        .flat_map(|e| e.tags.iter().cloned())
        .collect()
}

pub fn stats(entries: &EntryIndex) -> BTreeMap<Tag, TagStats> {
    let mut out: BTreeMap<Tag, TagStats> = BTreeMap::new();
    for entry in entries.values() {
        for tag in &entry.tags {
            out.entry(tag.clone())
                .and_modify(|s| {
                    s.count += 1;
                    s.last_used = s.last_used.max(entry.timestamp);
                    s.entry_dates.push(entry.date);
                })
                .or_insert_with(|| TagStats {
                    count: 1,
                    last_used: entry.timestamp,
                    entry_dates: vec![entry.date],
                });
        }
    }
    out
}

/// An empty `tags` slice matches everything, whatever the mode.
pub fn filter_by_tags(entries: &EntryIndex, tags: &[Tag], mode: FilterMode) -> EntryIndex {
    if tags.is_empty() {
        return entries.clone();
    }
    entries
        .iter()
        .filter(|(_, e)| match mode {
            FilterMode::And => tags.iter().all(|t| e.has_tag(t)),
            FilterMode::Or => tags.iter().any(|t| e.has_tag(t)),
        })
        .map(|(date, e)| (*date, e.clone()))
        .collect()
}

/// Case-insensitive match on titles and tags. Bodies are not indexed.
pub fn search(entries: &EntryIndex, query: &str) -> EntryIndex {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return entries.clone();
    }
    entries
        .iter()
        .filter(|(_, e)| {
            e.title.to_lowercase().contains(&needle)
                || e.tags.iter().any(|t| t.as_str().contains(&needle))
        })
        .map(|(date, e)| (*date, e.clone()))
        .collect()
}

/// Replaces `old` with `new` in every entry carrying `old`.
pub fn rename(entries: &EntryIndex, old: &Tag, new: &Tag, now: DateTime<Utc>) -> EntryIndex {
    if old == new {
        return EntryIndex::new();
    }
    rewrite(entries, now, |tags| {
        let Some(pos) = tags.iter().position(|t| t == old) else {
            return false;
        };
        if tags.contains(new) {
            tags.remove(pos);
        } else {
            tags[pos] = new.clone();
        }
        true
    })
}

/// Removes `tag` everywhere. Entries left without tags keep an empty list.
pub fn delete(entries: &EntryIndex, tag: &Tag, now: DateTime<Utc>) -> EntryIndex {
    rewrite(entries, now, |tags| {
        let before = tags.len();
        tags.retain(|t| t != tag);
        tags.len() != before
    })
}

/// Folds every tag of `sources` into `target` on entries carrying any of them.
///
/// Applying the same merge twice changes nothing the second time.
pub fn merge(entries: &EntryIndex, sources: &[Tag], target: &Tag, now: DateTime<Utc>) -> EntryIndex {
    rewrite(entries, now, |tags| {
        if !tags.iter().any(|t| t != target && sources.contains(t)) {
            return false;
        }
        // the target takes the slot of the first merged tag
        let mut merged = Vec::with_capacity(tags.len());
        for tag in tags.drain(..) {
            if sources.contains(&tag) || &tag == target {
                push_unique(&mut merged, target.clone());
            } else {
                merged.push(tag);
            }
        }
        *tags = merged;
        true
    })
}

/// Runs `edit` over a copy of every entry's tags and keeps the entries it reports as
/// changed, stamped with `now`.
fn rewrite<F>(entries: &EntryIndex, now: DateTime<Utc>, mut edit: F) -> EntryIndex
where
    F: FnMut(&mut Vec<Tag>) -> bool,
{
    let mut changed = EntryIndex::new();
    for (date, entry) in entries {
        let mut tags = entry.tags.clone();
        if !edit(&mut tags) {
            continue;
        }
        changed.insert(
            *date,
            JournalEntry {
                tags,
                updated_at: Some(now),
                ..entry.clone()
            },
        );
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Mood;
    use crate::tests::common::{d, entry, ts};
    use std::collections::BTreeSet;

    fn t(raw: &str) -> Tag {
        Tag::parse(raw).unwrap()
    }

    fn tag_names(e: &JournalEntry) -> BTreeSet<String> {
        e.tags.iter().map(|t| t.to_string()).collect()
    }

    fn names(raw: &[&str]) -> BTreeSet<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    /// Two entries from the walkthrough plus an untagged one.
    fn sample() -> EntryIndex {
        let mut idx = EntryIndex::new();
        for e in [
            entry(d(2024, 1, 15), "Morning walk", Mood::Content, &["outdoors", "gratitude"]),
            entry(d(2024, 1, 16), "Rough day", Mood::Heavy, &["work", "outdoors"]),
            entry(d(2024, 1, 17), "Nothing much", Mood::Neutral, &[]),
        ] {
            idx.insert(e.date, e);
        }
        idx
    }

    fn apply(base: &EntryIndex, changed: EntryIndex) -> EntryIndex {
        let mut next = base.clone();
        next.extend(changed);
        next
    }

    #[test]
    fn all_tags_is_a_sorted_union() {
        let tags: Vec<String> = all_tags(&sample()).iter().map(|t| t.to_string()).collect();
        assert_eq!(tags, ["gratitude", "outdoors", "work"]);
    }

    #[test]
    fn stats_track_count_dates_and_latest_use() {
        let mut idx = sample();
        idx.get_mut(&d(2024, 1, 15)).unwrap().timestamp = ts(d(2024, 1, 20), 0);
        let stats = stats(&idx);

        let outdoors = &stats[&t("outdoors")];
        assert_eq!(outdoors.count, 2);
        assert_eq!(outdoors.entry_dates, [d(2024, 1, 15), d(2024, 1, 16)]);
        assert_eq!(outdoors.last_used, ts(d(2024, 1, 20), 0));
        assert_eq!(stats[&t("work")].count, 1);
        assert_eq!(stats.len(), 3);
    }

    #[test]
    fn empty_filter_returns_everything() {
        let idx = sample();
        assert_eq!(filter_by_tags(&idx, &[], FilterMode::And), idx);
        assert_eq!(filter_by_tags(&idx, &[], FilterMode::Or), idx);
    }

    #[test]
    fn and_requires_all_or_requires_any() {
        let idx = sample();
        let and = filter_by_tags(&idx, &[t("outdoors"), t("work")], FilterMode::And);
        assert_eq!(and.keys().copied().collect::<Vec<_>>(), [d(2024, 1, 16)]);

        let or = filter_by_tags(&idx, &[t("gratitude"), t("work")], FilterMode::Or);
        assert_eq!(or.keys().copied().collect::<Vec<_>>(), [d(2024, 1, 15), d(2024, 1, 16)]);
    }

    #[test]
    fn stale_tag_names_stop_matching_after_rename() {
        let idx = sample();
        let before = filter_by_tags(&idx, &[t("Outdoors")], FilterMode::And);
        assert_eq!(before.keys().copied().collect::<Vec<_>>(), [d(2024, 1, 15), d(2024, 1, 16)]);

        let renamed = apply(&idx, rename(&idx, &t("outdoors"), &t("nature"), ts(d(2024, 2, 1), 0)));
        assert!(filter_by_tags(&renamed, &[t("outdoors")], FilterMode::And).is_empty());
    }

    #[test]
    fn rename_then_merge_walkthrough() {
        let idx = sample();
        let now = ts(d(2024, 2, 1), 0);

        let changed = rename(&idx, &t("outdoors"), &t("nature"), now);
        assert_eq!(changed.keys().copied().collect::<Vec<_>>(), [d(2024, 1, 15), d(2024, 1, 16)]);
        assert_eq!(tag_names(&changed[&d(2024, 1, 15)]), names(&["nature", "gratitude"]));
        assert_eq!(tag_names(&changed[&d(2024, 1, 16)]), names(&["work", "nature"]));
        assert!(changed.values().all(|e| e.updated_at == Some(now)));

        let idx = apply(&idx, changed);
        let merged = merge(&idx, &[t("nature"), t("work")], &t("life"), now);
        assert_eq!(tag_names(&merged[&d(2024, 1, 15)]), names(&["gratitude", "life"]));
        assert_eq!(tag_names(&merged[&d(2024, 1, 16)]), names(&["life"]));
        assert_eq!(merged[&d(2024, 1, 16)].tags.len(), 1);
    }

    #[test]
    fn rename_keeps_position_and_dedupes() {
        let mut idx = EntryIndex::new();
        let e = entry(d(2024, 1, 15), "x", Mood::Neutral, &["a", "b", "c"]);
        idx.insert(e.date, e);

        let changed = rename(&idx, &t("b"), &t("z"), ts(d(2024, 1, 15), 1));
        let order: Vec<String> = changed[&d(2024, 1, 15)].tags.iter().map(|t| t.to_string()).collect();
        assert_eq!(order, ["a", "z", "c"]);

        let changed = rename(&idx, &t("b"), &t("c"), ts(d(2024, 1, 15), 1));
        let order: Vec<String> = changed[&d(2024, 1, 15)].tags.iter().map(|t| t.to_string()).collect();
        assert_eq!(order, ["a", "c"]);
    }

    #[test]
    fn rename_to_same_normalized_name_is_a_no_op() {
        let idx = sample();
        assert!(rename(&idx, &t("Outdoors"), &t(" outdoors "), ts(d(2024, 2, 1), 0)).is_empty());
    }

    #[test]
    fn rename_round_trip_restores_tag_sets() {
        let mut idx = sample();
        let e = entry(d(2024, 1, 18), "both", Mood::Reflective, &["outdoors", "nature"]);
        idx.insert(e.date, e);
        let now = ts(d(2024, 2, 1), 0);

        let there = apply(&idx, rename(&idx, &t("outdoors"), &t("hiking"), now));
        let back = apply(&there, rename(&there, &t("hiking"), &t("outdoors"), now));
        for (date, original) in &idx {
            assert_eq!(tag_names(&back[date]), tag_names(original));
        }
    }

    #[test]
    fn delete_leaves_empty_lists_and_skips_untouched() {
        let idx = sample();
        let changed = delete(&idx, &t("work"), ts(d(2024, 2, 1), 0));
        assert_eq!(changed.keys().copied().collect::<Vec<_>>(), [d(2024, 1, 16)]);
        assert_eq!(tag_names(&changed[&d(2024, 1, 16)]), names(&["outdoors"]));

        let idx = apply(&idx, changed);
        let changed = delete(&idx, &t("outdoors"), ts(d(2024, 2, 1), 0));
        assert!(changed[&d(2024, 1, 16)].tags.is_empty());
        assert!(delete(&idx, &t("missing"), ts(d(2024, 2, 1), 0)).is_empty());
    }

    #[test]
    fn merge_is_idempotent() {
        let idx = sample();
        let now = ts(d(2024, 2, 1), 0);
        let once = apply(&idx, merge(&idx, &[t("outdoors"), t("work")], &t("life"), now));
        assert!(merge(&once, &[t("outdoors"), t("work")], &t("life"), now).is_empty());
    }

    #[test]
    fn merge_including_the_target_only_touches_other_sources() {
        let idx = sample();
        let now = ts(d(2024, 2, 1), 0);
        let changed = merge(&idx, &[t("gratitude"), t("outdoors")], &t("outdoors"), now);
        assert_eq!(changed.keys().copied().collect::<Vec<_>>(), [d(2024, 1, 15)]);
        assert_eq!(tag_names(&changed[&d(2024, 1, 15)]), names(&["outdoors"]));
    }

    #[test]
    fn search_matches_titles_and_tags() {
        let idx = sample();
        assert_eq!(search(&idx, "WALK").keys().copied().collect::<Vec<_>>(), [d(2024, 1, 15)]);
        assert_eq!(search(&idx, "work").keys().copied().collect::<Vec<_>>(), [d(2024, 1, 16)]);
        assert_eq!(search(&idx, "  ").len(), 3);
    }
}
