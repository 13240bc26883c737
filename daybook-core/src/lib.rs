pub mod autosave;
pub mod codec;
pub mod config;
pub mod dates;
pub mod directory;
pub mod entry;
pub mod error;
pub mod session;
pub mod store;
pub mod tag;
pub mod tag_index;
pub mod weather;

#[cfg(test)]
mod tests;

pub use autosave::{AutoSaver, SaveEvent};
pub use config::Config;
pub use directory::{Directory, DirectoryPicker, FsDirectory, FsPicker, Permission};
pub use entry::{EntryDraft, EntryIndex, JournalEntry, JournalEntryWithBody, Mood, WeatherContext};
pub use error::{StoreError, StoreResult};
pub use session::{Profile, Readiness, Session, TagOperationReport, TagSelection, WriteStatus};
pub use store::{EntryStore, ListResult};
pub use tag::Tag;
pub use tag_index::{FilterMode, TagStats};
