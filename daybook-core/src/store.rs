//! CRUD over the journal directory, one entry per date.

use crate::codec::{
    PROFILE_FILE, content_file_name, date_of_metadata_file, decode, decode_metadata, decode_profile,
    encode, encode_profile, metadata_file_name,
};
use crate::directory::Directory;
use crate::entry::{EntryIndex, JournalEntryWithBody};
use crate::error::{StoreError, StoreResult};
use crate::session::Profile;
use chrono::NaiveDate;
use std::collections::HashSet;

/// Outcome of enumerating the directory: every entry that decoded, plus the records that
/// were skipped.
#[derive(Debug, Default)]
pub struct ListResult {
    pub entries: EntryIndex,
    pub errors: Vec<StoreError>,
}

#[derive(Debug)]
pub struct EntryStore<D> {
    dir: D,
}

impl<D: Directory> EntryStore<D> {
    pub fn new(dir: D) -> Self {
        Self { dir }
    }

    pub fn directory(&self) -> &D {
        &self.dir
    }

    /// Enumerates every complete entry. A metadata document whose content file is missing
    /// is left out, exactly as [`read`](Self::read) treats it. A record that cannot be
    /// read or decoded is logged and reported in [`ListResult::errors`]; the others are
    /// still returned. Only a failure to list the directory itself is fatal.
    pub async fn list(&self) -> StoreResult<ListResult> {
        let mut result = ListResult::default();
        let names = self.dir.list_files().await?;
        let present: HashSet<&str> = names.iter().map(String::as_str).collect();
        for name in &names {
            let Some(date) = date_of_metadata_file(name) else {
                continue;
            };
            if !present.contains(content_file_name(date).as_str()) {
                tracing::debug!(date = %date, "metadata without content, leaving entry out");
                continue;
            }
            let bytes = match self.dir.read_file(name).await {
                Ok(Some(bytes)) => bytes,
                Ok(None) => continue,
                Err(error) => {
                    tracing::warn!(file = %name, error = %error, "skipping unreadable entry");
                    result.errors.push(error);
                    continue;
                }
            };
            match decode_metadata(date, &bytes) {
                Ok(entry) => {
                    result.entries.insert(date, entry);
                }
                Err(error) => {
                    tracing::warn!(file = %name, error = %error, "skipping corrupt entry");
                    result.errors.push(error);
                }
            }
        }
        Ok(result)
    }

    /// Reads the full record for `date`.
    ///
    /// Returns `Ok(None)` when either half of the pair is missing. An empty content file
    /// is a valid, empty body.
    pub async fn read(&self, date: NaiveDate) -> StoreResult<Option<JournalEntryWithBody>> {
        let Some(metadata) = self.dir.read_file(&metadata_file_name(date)).await? else {
            return Ok(None);
        };
        let Some(content) = self.dir.read_file(&content_file_name(date)).await? else {
            tracing::debug!(date = %date, "metadata without content, treating entry as absent");
            return Ok(None);
        };
        decode(date, &metadata, &content).map(Some)
    }

    /// Overwrites whatever exists for `date`. Metadata goes first, then content.
    pub async fn write(&self, date: NaiveDate, record: &JournalEntryWithBody) -> StoreResult<()> {
        if record.entry.date != date {
            return Err(StoreError::InvalidEntry(format!(
                "entry dated {} cannot be stored under {date}",
                record.entry.date
            )));
        }
        let (metadata, content) = encode(record)?;
        self.dir.write_file(&metadata_file_name(date), &metadata).await?;
        self.dir.write_file(&content_file_name(date), &content).await?;
        tracing::debug!(date = %date, "entry written");
        Ok(())
    }

    /// Removes both files. Each removal is attempted even if the other fails; a file that
    /// is already gone counts as removed.
    pub async fn delete(&self, date: NaiveDate) -> StoreResult<()> {
        let metadata = self.dir.remove_file(&metadata_file_name(date)).await;
        let content = self.dir.remove_file(&content_file_name(date)).await;
        metadata.and(content)
    }

    pub async fn load_profile(&self) -> StoreResult<Option<Profile>> {
        match self.dir.read_file(PROFILE_FILE).await? {
            Some(bytes) => decode_profile(&bytes).map(Some),
            None => Ok(None),
        }
    }

    pub async fn save_profile(&self, profile: &Profile) -> StoreResult<()> {
        let bytes = encode_profile(profile)?;
        self.dir.write_file(PROFILE_FILE, &bytes).await
    }
}
