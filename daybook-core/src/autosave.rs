//! Debounced saving for open editors.
//!
//! Every edit restarts a quiet-period timer for its date; only the last draft is written
//! once edits settle. A save that already started is never interrupted, and an older
//! draft can never overwrite a newer one for the same date.

use crate::directory::Directory;
use crate::entry::{EntryDraft, JournalEntry};
use crate::error::StoreResult;
use crate::session::Session;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

/// Result of one debounced save, for status indicators.
#[derive(Debug)]
pub struct SaveEvent {
    pub date: NaiveDate,
    pub result: StoreResult<JournalEntry>,
}

#[derive(Debug, Default)]
struct DateSlot {
    generation: u64,
    /// Held while a save for this date is in flight; stores the newest generation written.
    last_saved: Arc<Mutex<u64>>,
    timer: Option<JoinHandle<()>>,
}

pub struct AutoSaver<D> {
    session: Arc<Mutex<Session<D>>>,
    quiet: Duration,
    slots: HashMap<NaiveDate, DateSlot>,
    events: mpsc::UnboundedSender<SaveEvent>,
}

impl<D: Directory + 'static> AutoSaver<D> {
    pub fn new(
        session: Arc<Mutex<Session<D>>>,
        quiet: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SaveEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let saver = Self {
            session,
            quiet,
            slots: HashMap::new(),
            events,
        };
        (saver, receiver)
    }

    /// Records an edit. Cancels the pending timer for `date` and schedules `draft`.
    pub fn edit(&mut self, date: NaiveDate, draft: EntryDraft) {
        self.prune();
        let slot = self.slots.entry(date).or_default();
        if let Some(timer) = slot.timer.take() {
            timer.abort();
        }
        slot.generation += 1;

        let generation = slot.generation;
        let last_saved = Arc::clone(&slot.last_saved);
        let session = Arc::clone(&self.session);
        let events = self.events.clone();
        let quiet = self.quiet;

        slot.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            // The write runs in its own task so aborting this timer cannot cut it short.
            let save = tokio::spawn(async move {
                let mut last = last_saved.lock().await;
                if *last > generation {
                    tracing::debug!(date = %date, generation, "dropping stale draft");
                    return;
                }
                let result = session.lock().await.save_entry(date, draft).await;
                if result.is_ok() {
                    *last = generation;
                }
                if let Err(error) = &result {
                    tracing::warn!(date = %date, error = %error, "auto-save failed");
                }
                let _ = events.send(SaveEvent { date, result });
            });
            let _ = save.await;
        }));
    }

    /// Number of dates with a timer or save still running.
    pub fn pending(&self) -> usize {
        self.slots
            .values()
            .filter(|s| s.timer.as_ref().is_some_and(|t| !t.is_finished()))
            .count()
    }

    /// Waits until every scheduled save has fired and finished.
    pub async fn flush(&mut self) {
        for slot in self.slots.values_mut() {
            if let Some(timer) = slot.timer.take() {
                let _ = timer.await;
            }
        }
        self.prune();
    }

    /// Forgets dates whose last timer is done. That timer's save queued behind every
    /// earlier save for the date, so nothing for it is still running.
    fn prune(&mut self) {
        self.slots
            .retain(|_, slot| slot.timer.as_ref().is_some_and(|t| !t.is_finished()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Mood;
    use crate::session::{Profile, Readiness};
    use crate::tests::common::{MemoryDirectory, SlowDirectory, d};
    use tokio::sync::mpsc::error::TryRecvError;

    const QUIET: Duration = Duration::from_millis(1500);

    fn draft(title: &str) -> EntryDraft {
        EntryDraft {
            title: title.to_string(),
            mood: Mood::Reflective,
            tags: Vec::new(),
            body: format!("<p>{title}</p>"),
            weather_context: None,
        }
    }

    async fn mk_saver() -> (
        AutoSaver<MemoryDirectory>,
        mpsc::UnboundedReceiver<SaveEvent>,
        Arc<Mutex<Session<MemoryDirectory>>>,
        MemoryDirectory,
    ) {
        let dir = MemoryDirectory::new();
        let mut session = Session::new();
        session.open(dir.clone()).await.unwrap();
        let ready = session
            .save_profile(Profile {
                name: "Ada".to_string(),
                auto_weather: None,
            })
            .await
            .unwrap();
        assert_eq!(ready, Readiness::Ready);
        let session = Arc::new(Mutex::new(session));
        let (saver, events) = AutoSaver::new(Arc::clone(&session), QUIET);
        (saver, events, session, dir)
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_collapse_into_one_save() {
        let (mut saver, mut events, session, _dir) = mk_saver().await;
        let date = d(2024, 1, 15);

        saver.edit(date, draft("M"));
        tokio::time::advance(Duration::from_millis(500)).await;
        saver.edit(date, draft("Mo"));
        tokio::time::advance(Duration::from_millis(500)).await;
        saver.edit(date, draft("Morning"));
        assert_eq!(saver.pending(), 1);

        saver.flush().await;
        let event = events.recv().await.unwrap();
        assert_eq!(event.date, date);
        assert_eq!(event.result.unwrap().title, "Morning");
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

        let mut session = session.lock().await;
        let stored = session.read_entry(date).await.unwrap().unwrap();
        assert_eq!(stored.body, "<p>Morning</p>");
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_is_written_before_the_quiet_period() {
        let (mut saver, mut events, _session, dir) = mk_saver().await;
        saver.edit(d(2024, 1, 15), draft("Soon"));
        tokio::time::advance(Duration::from_millis(1000)).await;
        assert!(!dir.contains("2024-01-15.json"));
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

        saver.flush().await;
        assert!(dir.contains("2024-01-15.json"));
        assert_eq!(saver.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dates_are_debounced_independently() {
        let (mut saver, mut events, session, _dir) = mk_saver().await;
        saver.edit(d(2024, 1, 15), draft("One"));
        saver.edit(d(2024, 1, 16), draft("Two"));
        saver.flush().await;

        let mut saved = vec![events.recv().await.unwrap().date, events.recv().await.unwrap().date];
        saved.sort();
        assert_eq!(saved, [d(2024, 1, 15), d(2024, 1, 16)]);
        assert_eq!(session.lock().await.index().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_saves_run_one_at_a_time_and_newest_wins() {
        let slow = SlowDirectory::new(MemoryDirectory::new(), Duration::from_millis(1000));
        let mut session = Session::new();
        session.open(slow.clone()).await.unwrap();
        session
            .save_profile(Profile {
                name: "Ada".to_string(),
                auto_weather: None,
            })
            .await
            .unwrap();
        let session = Arc::new(Mutex::new(session));
        let (mut saver, mut events) = AutoSaver::new(Arc::clone(&session), QUIET);
        let date = d(2024, 1, 15);

        saver.edit(date, draft("First"));
        // Quiet period over: the first save is now halfway through its metadata write.
        tokio::time::sleep(QUIET + Duration::from_millis(500)).await;
        assert_eq!(slow.in_flight(), 1);

        saver.edit(date, draft("Second"));
        saver.flush().await;

        let titles = [
            events.recv().await.unwrap().result.unwrap().title,
            events.recv().await.unwrap().result.unwrap().title,
        ];
        assert_eq!(titles, ["First", "Second"]);
        assert_eq!(slow.max_in_flight(), 1);

        let mut session = session.lock().await;
        let stored = session.read_entry(date).await.unwrap().unwrap();
        assert_eq!(stored.entry.title, "Second");
        assert_eq!(stored.body, "<p>Second</p>");
    }

    #[tokio::test(start_paused = true)]
    async fn finished_dates_are_forgotten() {
        let (mut saver, _events, _session, _dir) = mk_saver().await;
        saver.edit(d(2024, 1, 15), draft("One"));
        saver.edit(d(2024, 1, 16), draft("Two"));
        assert_eq!(saver.slots.len(), 2);

        saver.flush().await;
        assert!(saver.slots.is_empty());

        saver.edit(d(2024, 1, 17), draft("Three"));
        assert_eq!(saver.slots.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_reported_as_events() {
        let (mut saver, mut events, session, dir) = mk_saver().await;
        dir.fail_writes_to("2024-01-15.json");
        saver.edit(d(2024, 1, 15), draft("Doomed"));
        saver.flush().await;

        let event = events.recv().await.unwrap();
        assert!(event.result.is_err());
        assert!(session.lock().await.index().is_empty());
    }
}
