use crate::directory::{Directory, Permission};
use crate::entry::{JournalEntry, JournalEntryWithBody, Mood};
use crate::error::{StoreError, StoreResult};
use crate::tag::parse_tag_list;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).expect("valid date")
}

/// Noon UTC of `date`, shifted by `minutes`.
pub fn ts(date: NaiveDate, minutes: i64) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(12, 0, 0).expect("valid time"))
        + chrono::Duration::minutes(minutes)
}

pub fn entry(date: NaiveDate, title: &str, mood: Mood, tags: &[&str]) -> JournalEntry {
    JournalEntry {
        date,
        title: title.to_string(),
        mood,
        timestamp: ts(date, 0),
        tags: parse_tag_list(tags),
        weather_context: None,
        created_at: Some(ts(date, 0)),
        updated_at: Some(ts(date, 0)),
    }
}

pub fn entry_with_body(
    date: NaiveDate,
    title: &str,
    mood: Mood,
    tags: &[&str],
    body: &str,
) -> JournalEntryWithBody {
    JournalEntryWithBody {
        entry: entry(date, title, mood, tags),
        body: body.to_string(),
    }
}

#[derive(Debug)]
struct MemoryState {
    files: BTreeMap<String, Vec<u8>>,
    permission: Permission,
    grant_on_request: bool,
    failing_writes: HashSet<String>,
}

/// In-memory [`Directory`] whose clones share the same files, so a test can keep a handle
/// after giving one to a store or session.
#[derive(Debug, Clone)]
pub struct MemoryDirectory {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                files: BTreeMap::new(),
                permission: Permission::Granted,
                grant_on_request: true,
                failing_writes: HashSet::new(),
            })),
        }
    }

    pub fn insert(&self, name: &str, bytes: &[u8]) {
        self.state.lock().unwrap().files.insert(name.to_string(), bytes.to_vec());
    }

    pub fn remove(&self, name: &str) {
        self.state.lock().unwrap().files.remove(name);
    }

    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().files.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.state.lock().unwrap().files.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.state.lock().unwrap().files.keys().cloned().collect()
    }

    /// Every later write to `name` fails with a storage error.
    pub fn fail_writes_to(&self, name: &str) {
        self.state.lock().unwrap().failing_writes.insert(name.to_string());
    }

    pub fn allow_writes_to(&self, name: &str) {
        self.state.lock().unwrap().failing_writes.remove(name);
    }

    pub fn set_permission(&self, permission: Permission, grant_on_request: bool) {
        let mut state = self.state.lock().unwrap();
        state.permission = permission;
        state.grant_on_request = grant_on_request;
    }

    fn check_access(&self, name: &str) -> StoreResult<()> {
        match self.state.lock().unwrap().permission {
            Permission::Granted => Ok(()),
            _ => Err(StoreError::PermissionDenied(name.to_string())),
        }
    }
}

impl Directory for MemoryDirectory {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn list_files(&self) -> StoreResult<Vec<String>> {
        self.check_access("memory")?;
        Ok(self.names())
    }

    async fn read_file(&self, name: &str) -> StoreResult<Option<Vec<u8>>> {
        self.check_access(name)?;
        Ok(self.get(name))
    }

    async fn write_file(&self, name: &str, bytes: &[u8]) -> StoreResult<()> {
        self.check_access(name)?;
        let mut state = self.state.lock().unwrap();
        if state.failing_writes.contains(name) {
            return Err(StoreError::storage(name, "quota exceeded"));
        }
        state.files.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn remove_file(&self, name: &str) -> StoreResult<()> {
        self.check_access(name)?;
        self.state.lock().unwrap().files.remove(name);
        Ok(())
    }

    async fn query_permission(&self) -> Permission {
        self.state.lock().unwrap().permission
    }

    async fn request_permission(&self) -> Permission {
        let mut state = self.state.lock().unwrap();
        if state.grant_on_request {
            state.permission = Permission::Granted;
        }
        state.permission
    }
}

/// Wraps a [`MemoryDirectory`] so every write takes `delay`, and records how many writes
/// were in flight at once.
#[derive(Debug, Clone)]
pub struct SlowDirectory {
    pub inner: MemoryDirectory,
    delay: Duration,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl SlowDirectory {
    pub fn new(inner: MemoryDirectory, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Directory for SlowDirectory {
    fn describe(&self) -> String {
        "slow memory".to_string()
    }

    async fn list_files(&self) -> StoreResult<Vec<String>> {
        self.inner.list_files().await
    }

    async fn read_file(&self, name: &str) -> StoreResult<Option<Vec<u8>>> {
        self.inner.read_file(name).await
    }

    async fn write_file(&self, name: &str, bytes: &[u8]) -> StoreResult<()> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        let result = self.inner.write_file(name, bytes).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn remove_file(&self, name: &str) -> StoreResult<()> {
        self.inner.remove_file(name).await
    }

    async fn query_permission(&self) -> Permission {
        self.inner.query_permission().await
    }

    async fn request_permission(&self) -> Permission {
        self.inner.request_permission().await
    }
}
