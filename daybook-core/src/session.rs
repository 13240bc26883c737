//! The session: which directory is open, who the journal belongs to, and the in-memory
//! index of every entry's metadata.
//!
//! The index is only ever replaced as a whole (`Arc` swap), never patched in place, and
//! it only changes after the store confirmed a write or delete.

use crate::directory::{Directory, DirectoryPicker, Permission};
use crate::entry::{EntryDraft, EntryIndex, JournalEntry, JournalEntryWithBody};
use crate::error::{StoreError, StoreResult};
use crate::store::EntryStore;
use crate::tag::{Tag, push_unique};
use crate::tag_index::{self, FilterMode};
use crate::weather::{self, WeatherProvider};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Contents of the journal's own `config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_weather: Option<bool>,
}

/// Top-level readiness of the application.
///
/// ```text
/// Uninitialized --open--> AwaitingProfile --save_profile--> Ready
///               --open (profile found)------------------->  Ready
/// Ready --clear_directory--> Uninitialized
/// any   --permission lost--> PermissionNeeded --regrant--> Ready | AwaitingProfile
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Uninitialized,
    AwaitingProfile,
    Ready,
    PermissionNeeded,
}

/// Tags currently used to narrow the visible entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagSelection {
    pub tags: Vec<Tag>,
    pub mode: FilterMode,
}

impl TagSelection {
    fn rename(&mut self, old: &Tag, new: &Tag) {
        if !self.tags.contains(old) {
            return;
        }
        let mut next = Vec::with_capacity(self.tags.len());
        for tag in self.tags.drain(..) {
            push_unique(&mut next, if &tag == old { new.clone() } else { tag });
        }
        self.tags = next;
    }

    fn remove(&mut self, gone: &[Tag]) {
        self.tags.retain(|t| !gone.contains(t));
    }
}

#[derive(Debug)]
pub enum WriteStatus {
    Written,
    /// The entry vanished (or lost half of its pair) between planning and writing.
    Missing,
    Failed(StoreError),
}

#[derive(Debug)]
pub struct TagWriteOutcome {
    pub date: NaiveDate,
    pub status: WriteStatus,
}

/// Per-entry result of a rename, merge or delete. Writes are not rolled back: entries
/// listed as written carry the new tags, failed ones still carry the old ones.
#[derive(Debug, Default)]
pub struct TagOperationReport {
    pub outcomes: Vec<TagWriteOutcome>,
}

impl TagOperationReport {
    pub fn written(&self) -> Vec<NaiveDate> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, WriteStatus::Written))
            .map(|o| o.date)
            .collect()
    }

    pub fn failed(&self) -> Vec<NaiveDate> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, WriteStatus::Failed(_)))
            .map(|o| o.date)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failed().is_empty()
    }

    /// Turns a partially failed batch into [`StoreError::TagOperationPartialFailure`].
    pub fn into_result(self) -> StoreResult<Self> {
        let failed = self.failed();
        if failed.is_empty() {
            return Ok(self);
        }
        Err(StoreError::TagOperationPartialFailure {
            attempted: self.outcomes.len(),
            failed,
        })
    }
}

#[derive(Debug)]
pub struct Session<D> {
    store: Option<EntryStore<D>>,
    profile: Option<Profile>,
    index: Arc<EntryIndex>,
    refresh_count: u64,
    /// Records the last listing could not decode.
    skipped: Vec<StoreError>,
    readiness: Readiness,
    selection: TagSelection,
}

impl<D: Directory> Default for Session<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Directory> Session<D> {
    pub fn new() -> Self {
        Self {
            store: None,
            profile: None,
            index: Arc::new(EntryIndex::new()),
            refresh_count: 0,
            skipped: Vec::new(),
            readiness: Readiness::Uninitialized,
            selection: TagSelection::default(),
        }
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn directory(&self) -> Option<&D> {
        self.store.as_ref().map(EntryStore::directory)
    }

    /// Snapshot of the index. Later changes swap in a new map and leave this one intact.
    pub fn index(&self) -> Arc<EntryIndex> {
        Arc::clone(&self.index)
    }

    pub fn refresh_count(&self) -> u64 {
        self.refresh_count
    }

    pub fn selection(&self) -> &TagSelection {
        &self.selection
    }

    pub fn set_selection(&mut self, tags: Vec<Tag>, mode: FilterMode) {
        let mut unique = Vec::with_capacity(tags.len());
        for tag in tags {
            push_unique(&mut unique, tag);
        }
        self.selection = TagSelection { tags: unique, mode };
    }

    /// Index entries matching the current tag selection.
    pub fn visible_entries(&self) -> EntryIndex {
        tag_index::filter_by_tags(&self.index, &self.selection.tags, self.selection.mode)
    }

    /// Asks the picker for a directory and opens it. A cancelled pick changes nothing.
    pub async fn choose_directory<P>(&mut self, picker: &P) -> StoreResult<Readiness>
    where
        P: DirectoryPicker<Dir = D>,
    {
        match picker.choose().await {
            Some(dir) => self.open(dir).await,
            None => Ok(self.readiness),
        }
    }

    /// Switches to `dir`, dropping everything known about the previous directory.
    pub async fn open(&mut self, dir: D) -> StoreResult<Readiness> {
        tracing::info!(directory = %dir.describe(), "opening journal directory");
        self.store = Some(EntryStore::new(dir));
        self.profile = None;
        self.index = Arc::new(EntryIndex::new());
        self.skipped.clear();
        self.selection = TagSelection::default();
        self.activate().await
    }

    /// Asks the host again for access to the current directory.
    pub async fn regrant(&mut self) -> StoreResult<Readiness> {
        let Some(store) = self.store.as_ref() else {
            return Err(StoreError::NotReady);
        };
        let permission = store.directory().request_permission().await;
        match permission {
            Permission::Granted => self.activate().await,
            _ => {
                self.set_readiness(Readiness::PermissionNeeded);
                Ok(self.readiness)
            }
        }
    }

    /// Re-checks the host permission without prompting, e.g. when the app regains focus.
    pub async fn check_permission(&mut self) -> Readiness {
        let permission = match self.store.as_ref() {
            Some(store) => store.directory().query_permission().await,
            None => return self.readiness,
        };
        if permission != Permission::Granted {
            self.set_readiness(Readiness::PermissionNeeded);
        }
        self.readiness
    }

    pub fn clear_directory(&mut self) {
        self.store = None;
        self.profile = None;
        self.index = Arc::new(EntryIndex::new());
        self.skipped.clear();
        self.selection = TagSelection::default();
        self.set_readiness(Readiness::Uninitialized);
    }

    pub async fn save_profile(&mut self, profile: Profile) -> StoreResult<Readiness> {
        if profile.name.trim().is_empty() {
            return Err(StoreError::InvalidEntry("profile name must not be empty".to_string()));
        }
        if !matches!(self.readiness, Readiness::AwaitingProfile | Readiness::Ready) {
            return Err(StoreError::NotReady);
        }
        let result = match self.store.as_ref() {
            Some(store) => store.save_profile(&profile).await,
            None => Err(StoreError::NotReady),
        };
        self.track(result)?;
        self.profile = Some(profile);
        if self.readiness == Readiness::AwaitingProfile {
            self.set_readiness(Readiness::Ready);
            self.refresh().await?;
        }
        Ok(self.readiness)
    }

    /// Bumps the refresh counter and rebuilds the index from a full listing.
    /// Returns the records that were skipped as unreadable or corrupt.
    pub async fn refresh(&mut self) -> StoreResult<&[StoreError]> {
        let result = self.ready_store()?.list().await;
        let listed = self.track(result)?;
        self.refresh_count += 1;
        tracing::debug!(
            entries = listed.entries.len(),
            skipped = listed.errors.len(),
            refresh = self.refresh_count,
            "index refreshed"
        );
        self.index = Arc::new(listed.entries);
        self.skipped = listed.errors;
        Ok(&self.skipped)
    }

    /// Records left out of the index by the most recent listing.
    pub fn skipped(&self) -> &[StoreError] {
        &self.skipped
    }

    pub async fn read_entry(&mut self, date: NaiveDate) -> StoreResult<Option<JournalEntryWithBody>> {
        let result = self.ready_store()?.read(date).await;
        self.track(result)
    }

    /// Saves `draft` as the entry for `date`, overwriting any previous save.
    ///
    /// `createdAt` and the captured weather of an existing entry are kept unless the
    /// draft carries its own weather. The index changes only if the write succeeded.
    pub async fn save_entry(&mut self, date: NaiveDate, draft: EntryDraft) -> StoreResult<JournalEntry> {
        let previous = match self.read_entry(date).await {
            Ok(Some(record)) => Some(record.entry),
            Ok(None) => None,
            Err(StoreError::CorruptEntry { name, reason }) => {
                tracing::warn!(file = %name, reason = %reason, "overwriting corrupt entry");
                None
            }
            Err(e) => return Err(e),
        }
        .or_else(|| self.index.get(&date).cloned());

        let record = compose(date, draft, previous.as_ref(), Utc::now())?;
        let result = self.ready_store()?.write(date, &record).await;
        self.track(result)?;

        let mut next = (*self.index).clone();
        next.insert(date, record.entry.clone());
        self.index = Arc::new(next);
        Ok(record.entry)
    }

    /// Like [`save_entry`](Self::save_entry), but captures weather for a brand-new entry when
    /// the profile asks for it. A failed lookup never fails the save.
    pub async fn save_entry_enriched<W: WeatherProvider>(
        &mut self,
        date: NaiveDate,
        mut draft: EntryDraft,
        provider: &W,
        today: NaiveDate,
    ) -> StoreResult<JournalEntry> {
        self.ready_store()?;
        let wants_weather = self
            .profile
            .as_ref()
            .and_then(|p| p.auto_weather)
            .unwrap_or(false);
        if wants_weather && draft.weather_context.is_none() && !self.index.contains_key(&date) {
            draft.weather_context = weather::capture(provider, date, today).await;
        }
        self.save_entry(date, draft).await
    }

    /// Deletes both files of the entry; the index drops it only once that succeeded.
    pub async fn delete_entry(&mut self, date: NaiveDate) -> StoreResult<()> {
        let result = self.ready_store()?.delete(date).await;
        self.track(result)?;
        if self.index.contains_key(&date) {
            let mut next = (*self.index).clone();
            next.remove(&date);
            self.index = Arc::new(next);
        }
        Ok(())
    }

    pub async fn rename_tag(&mut self, old: &Tag, new: &Tag) -> StoreResult<TagOperationReport> {
        self.ready_store()?;
        let changes = tag_index::rename(&self.index, old, new, Utc::now());
        let report = self.apply_tag_changes(changes).await?;
        if old != new {
            self.selection.rename(old, new);
        }
        Ok(report)
    }

    pub async fn delete_tag(&mut self, tag: &Tag) -> StoreResult<TagOperationReport> {
        self.ready_store()?;
        let changes = tag_index::delete(&self.index, tag, Utc::now());
        let report = self.apply_tag_changes(changes).await?;
        self.selection.remove(std::slice::from_ref(tag));
        Ok(report)
    }

    pub async fn merge_tags(&mut self, sources: &[Tag], target: &Tag) -> StoreResult<TagOperationReport> {
        self.ready_store()?;
        let changes = tag_index::merge(&self.index, sources, target, Utc::now());
        let report = self.apply_tag_changes(changes).await?;
        let merged_away: Vec<Tag> = sources.iter().filter(|t| *t != target).cloned().collect();
        self.selection.remove(&merged_away);
        Ok(report)
    }

    /// Writes planned tag changes one entry at a time. Each entry is re-read first so its
    /// body and other fields survive; only `tags` and `updatedAt` are replaced.
    async fn apply_tag_changes(&mut self, changes: EntryIndex) -> StoreResult<TagOperationReport> {
        let mut report = TagOperationReport::default();
        let mut written = Vec::new();
        let mut missing = Vec::new();
        {
            let store = self.ready_store()?;
            for (date, planned) in changes {
                let status = match store.read(date).await {
                    Ok(Some(mut current)) => {
                        current.entry.tags = planned.tags;
                        current.entry.updated_at = planned.updated_at;
                        match store.write(date, &current).await {
                            Ok(()) => {
                                written.push(current.entry);
                                WriteStatus::Written
                            }
                            Err(e) => WriteStatus::Failed(e),
                        }
                    }
                    Ok(None) => {
                        missing.push(date);
                        WriteStatus::Missing
                    }
                    Err(e) => WriteStatus::Failed(e),
                };
                match &status {
                    WriteStatus::Failed(error) => {
                        tracing::warn!(date = %date, error = %error, "tag update failed for entry")
                    }
                    WriteStatus::Missing => {
                        tracing::warn!(date = %date, "entry missing during tag update")
                    }
                    WriteStatus::Written => {}
                }
                report.outcomes.push(TagWriteOutcome { date, status });
            }
        }

        let lost_permission = report
            .outcomes
            .iter()
            .any(|o| matches!(&o.status, WriteStatus::Failed(e) if e.is_permission_denied()));
        if lost_permission {
            self.set_readiness(Readiness::PermissionNeeded);
        }

        // Entries found gone on disk leave the index too, so a re-run has nothing left to do.
        if !written.is_empty() || !missing.is_empty() {
            let mut next = (*self.index).clone();
            for date in missing {
                next.remove(&date);
            }
            for entry in written {
                next.insert(entry.date, entry);
            }
            self.index = Arc::new(next);
        }
        Ok(report)
    }

    async fn activate(&mut self) -> StoreResult<Readiness> {
        let Some(store) = self.store.as_ref() else {
            return Err(StoreError::NotReady);
        };
        let dir = store.directory();
        let permission = match dir.query_permission().await {
            Permission::PromptRequired => dir.request_permission().await,
            other => other,
        };
        if permission != Permission::Granted {
            self.set_readiness(Readiness::PermissionNeeded);
            return Ok(self.readiness);
        }

        let loaded = store.load_profile().await;
        match loaded {
            Ok(Some(profile)) => {
                self.profile = Some(profile);
                self.set_readiness(Readiness::Ready);
                self.refresh().await?;
            }
            Ok(None) => self.set_readiness(Readiness::AwaitingProfile),
            Err(e) if e.is_permission_denied() => self.set_readiness(Readiness::PermissionNeeded),
            Err(e) => {
                tracing::warn!(error = %e, "unreadable profile, asking for a new one");
                self.set_readiness(Readiness::AwaitingProfile);
            }
        }
        Ok(self.readiness)
    }

    fn ready_store(&self) -> StoreResult<&EntryStore<D>> {
        match (&self.store, self.readiness) {
            (Some(store), Readiness::Ready) => Ok(store),
            _ => Err(StoreError::NotReady),
        }
    }

    /// Moves to `PermissionNeeded` when the host revoked access mid-operation.
    fn track<T>(&mut self, result: StoreResult<T>) -> StoreResult<T> {
        if let Err(e) = &result {
            if e.is_permission_denied() {
                self.set_readiness(Readiness::PermissionNeeded);
            }
        }
        result
    }

    fn set_readiness(&mut self, next: Readiness) {
        if self.readiness != next {
            tracing::info!(from = ?self.readiness, to = ?next, "session readiness changed");
            self.readiness = next;
        }
    }
}

/// Builds the record to store from a draft and the entry it replaces.
fn compose(
    date: NaiveDate,
    draft: EntryDraft,
    previous: Option<&JournalEntry>,
    now: DateTime<Utc>,
) -> StoreResult<JournalEntryWithBody> {
    let title = draft.title.trim();
    if title.is_empty() {
        return Err(StoreError::InvalidEntry("title must not be empty".to_string()));
    }
    let mut tags = Vec::with_capacity(draft.tags.len());
    for tag in draft.tags {
        push_unique(&mut tags, tag);
    }
    let weather_context = draft
        .weather_context
        .or_else(|| previous.and_then(|p| p.weather_context.clone()));
    let created_at = previous.and_then(|p| p.created_at).unwrap_or(now);

    Ok(JournalEntryWithBody {
        entry: JournalEntry {
            date,
            title: title.to_string(),
            mood: draft.mood,
            timestamp: now,
            tags,
            weather_context,
            created_at: Some(created_at),
            updated_at: Some(now),
        },
        body: draft.body,
    })
}
