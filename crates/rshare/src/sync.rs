//! Change notification between processes sharing one store.
//!
//! A [`Watcher`] polls the store's per-key revisions and reports every key
//! that another writer touched. Nothing is merged: a page that hears about a
//! change simply re-reads everything and renders again.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::storage::{keys, Storage};

/// Keys whose changes make a page re-render.
pub const SHARED_KEYS: [&str; 3] = [keys::RIDER_REQUESTS, keys::DRIVER_POSTS, keys::HISTORY];

/// Check if a change to `key` should trigger a re-render.
#[must_use]
pub fn is_shared_key(key: &str) -> bool {
    SHARED_KEYS.contains(&key)
}

/// A key was written or removed by someone else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// The key that changed.
    pub key: String,
}

/// Keys that were added, removed, or rewritten between two snapshots, sorted.
#[must_use]
pub fn diff_revisions(before: &HashMap<String, i64>, after: &HashMap<String, i64>) -> Vec<String> {
    let mut changed: Vec<String> = after
        .iter()
        .filter(|(key, revision)| before.get(key.as_str()) != Some(*revision))
        .map(|(key, _)| key.clone())
        .chain(
            before
                .keys()
                .filter(|key| !after.contains_key(*key))
                .cloned(),
        )
        .collect();
    changed.sort();
    changed
}

/// Receiver of change notifications for one page.
pub trait ChangeHandler {
    /// Called when one of the shared lists changed.
    fn on_shared_data_change(&mut self, key: &str);
}

/// Forward `event` to `handler` if it concerns a shared key.
///
/// Returns `true` if the handler was called.
pub fn dispatch<H: ChangeHandler + ?Sized>(event: &StorageEvent, handler: &mut H) -> bool {
    if !is_shared_key(&event.key) {
        trace!("Ignoring change to {}", event.key);
        return false;
    }
    handler.on_shared_data_change(&event.key);
    true
}

/// A handle to stop a running watcher.
///
/// Clones share the same signal.
#[derive(Debug, Clone, Default)]
pub struct WatchHandle {
    stop_signal: Arc<AtomicBool>,
}

impl WatchHandle {
    /// Signal the watcher to stop at its next tick.
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Check if the stop signal has been sent.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.stop_signal.load(Ordering::SeqCst)
    }
}

/// Polls a store for writes and turns them into [`StorageEvent`]s.
///
/// The watcher has its own connection. Writes made through that connection
/// are reported too, so it should not share one with a writer.
#[derive(Debug)]
pub struct Watcher {
    storage: Storage,
    known: HashMap<String, i64>,
    interval: Duration,
    handle: WatchHandle,
}

impl Watcher {
    /// Open the store at `path` and remember its current revisions.
    ///
    /// Only writes made after this call are reported.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or read.
    pub fn open(path: impl AsRef<Path>, interval: Duration) -> Result<Self> {
        let storage = Storage::open(path)?;
        let known = storage.revisions()?;
        Ok(Self {
            storage,
            known,
            interval,
            handle: WatchHandle::default(),
        })
    }

    /// Get a handle that can stop this watcher.
    #[must_use]
    pub fn handle(&self) -> WatchHandle {
        self.handle.clone()
    }

    /// Check once for changes since the last poll.
    ///
    /// A failed read is logged and reported as no change.
    pub fn poll(&mut self) -> Vec<StorageEvent> {
        let current = match self.storage.revisions() {
            Ok(current) => current,
            Err(e) => {
                warn!("Failed to poll {}: {}", self.storage.path().display(), e);
                return Vec::new();
            }
        };

        let changed = diff_revisions(&self.known, &current);
        self.known = current;
        changed
            .into_iter()
            .map(|key| StorageEvent { key })
            .collect()
    }

    /// Poll on the configured interval, sending one event per changed key.
    ///
    /// Returns when the handle is stopped or the receiver is dropped.
    pub async fn run(mut self, tx: mpsc::Sender<StorageEvent>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(
            "Watching {} every {:?}",
            self.storage.path().display(),
            self.interval
        );

        loop {
            ticker.tick().await;
            if self.handle.should_stop() {
                debug!("Watcher stopped");
                return;
            }

            for event in self.poll() {
                debug!("Detected change to {}", event.key);
                if tx.send(event).await.is_err() {
                    debug!("Change receiver dropped; watcher exiting");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn revisions(pairs: &[(&str, i64)]) -> HashMap<String, i64> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    struct Recorder {
        keys: Vec<String>,
    }

    impl ChangeHandler for Recorder {
        fn on_shared_data_change(&mut self, key: &str) {
            self.keys.push(key.to_string());
        }
    }

    fn temp_db(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("rshare_sync_{name}_{}.db", std::process::id()))
    }

    fn cleanup(path: &Path) {
        let _ = std::fs::remove_file(path);
        let _ = std::fs::remove_file(path.with_extension("db-wal"));
        let _ = std::fs::remove_file(path.with_extension("db-shm"));
    }

    #[test]
    fn test_is_shared_key() {
        assert!(is_shared_key(keys::RIDER_REQUESTS));
        assert!(is_shared_key(keys::DRIVER_POSTS));
        assert!(is_shared_key(keys::HISTORY));
        assert!(!is_shared_key(keys::PROFILE));
        assert!(!is_shared_key("other"));
    }

    #[test]
    fn test_diff_revisions() {
        let before = revisions(&[("a", 1), ("b", 2), ("c", 3)]);
        let after = revisions(&[("a", 1), ("b", 4), ("d", 5)]);

        assert_eq!(diff_revisions(&before, &after), vec!["b", "c", "d"]);
        assert!(diff_revisions(&after, &after).is_empty());
    }

    #[test]
    fn test_dispatch_only_shared_keys() {
        let mut recorder = Recorder { keys: Vec::new() };

        let shared = StorageEvent {
            key: keys::HISTORY.to_string(),
        };
        let profile = StorageEvent {
            key: keys::PROFILE.to_string(),
        };

        assert!(dispatch(&shared, &mut recorder));
        assert!(!dispatch(&profile, &mut recorder));
        assert_eq!(recorder.keys, vec![keys::HISTORY.to_string()]);
    }

    #[test]
    fn test_watch_handle_shared_signal() {
        let a = WatchHandle::default();
        let b = a.clone();
        assert!(!b.should_stop());

        a.stop();
        assert!(b.should_stop());
    }

    #[test]
    fn test_poll_sees_other_writers() {
        let path = temp_db("poll");
        cleanup(&path);

        let writer = Storage::open(&path).unwrap();
        writer.set_raw(keys::HISTORY, "[]").unwrap();

        let mut watcher = Watcher::open(&path, Duration::from_millis(10)).unwrap();
        assert!(watcher.poll().is_empty());

        writer.set_raw(keys::RIDER_REQUESTS, "[]").unwrap();
        writer.remove(keys::HISTORY).unwrap();

        let changed: Vec<String> = watcher.poll().into_iter().map(|e| e.key).collect();
        assert_eq!(changed, vec![keys::HISTORY, keys::RIDER_REQUESTS]);
        assert!(watcher.poll().is_empty());

        drop(watcher);
        drop(writer);
        cleanup(&path);
    }

    #[tokio::test]
    async fn test_run_sends_events_until_stopped() {
        let path = temp_db("run");
        cleanup(&path);

        let writer = Storage::open(&path).unwrap();
        let watcher = Watcher::open(&path, Duration::from_millis(10)).unwrap();
        let handle = watcher.handle();

        let (tx, mut rx) = mpsc::channel(16);
        let task = tokio::spawn(watcher.run(tx));

        writer.set_raw(keys::DRIVER_POSTS, "[]").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for change")
            .expect("watcher exited early");
        assert_eq!(event.key, keys::DRIVER_POSTS);

        handle.stop();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("watcher did not stop")
            .unwrap();

        drop(writer);
        cleanup(&path);
    }
}
