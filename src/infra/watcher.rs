//! Background watcher for the notes directory.
//!
//! Wraps a native filesystem-change notification backend behind a dedicated
//! thread that polls on a coarse interval and forwards create/modify/delete
//! events for `.htm` files to subscribers in registration order. Delivery is
//! gated by an atomic enable flag so the index can suppress the echo of its
//! own writes while it mutates the directory.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tracing::{debug, warn};

/// How long the delivery loop blocks waiting for the next event batch.
/// Coarse on purpose: watcher latency is cheap, busy-spinning is not.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Errors during watcher setup.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("watch registration failed: {0}")]
    Notify(#[from] notify::Error),
}

/// Kind of filesystem change observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    Created,
    Modified,
    Deleted,
}

/// One filesystem change to a note file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEvent {
    pub kind: FileEventKind,
    pub path: PathBuf,
}

/// Whether remaining subscribers see the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// Pass the event to the next subscriber.
    Continue,
    /// Absorb the event; later subscribers are skipped.
    Stop,
}

/// Receives filesystem change events from the watcher thread.
///
/// Callbacks run on the watcher thread; implementations must hand
/// interpretation back to the control thread rather than touching the index
/// directly.
pub trait FileChangeSubscriber: Send + Sync {
    fn on_file_event(&self, event: &FileEvent) -> Propagation;
}

type SubscriberList = Arc<Mutex<Vec<Arc<dyn FileChangeSubscriber>>>>;

struct ActiveWatch {
    // Dropping the backend watcher closes the event channel, which is what
    // lets the delivery thread exit.
    watcher: RecommendedWatcher,
    shutdown: Arc<AtomicBool>,
    thread: JoinHandle<()>,
    path: PathBuf,
}

/// Watches one directory and fans events out to ordered subscribers.
///
/// All methods take `&self`; the watcher is shared between the index (which
/// brackets its own writes with [`suppress`](DirectoryWatcher::suppress))
/// and whatever owns the subscription list.
pub struct DirectoryWatcher {
    subscribers: SubscriberList,
    enabled: Arc<AtomicBool>,
    active: Mutex<Option<ActiveWatch>>,
}

impl DirectoryWatcher {
    /// Creates an inert watcher; call
    /// [`set_directory`](DirectoryWatcher::set_directory) to arm it.
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
            enabled: Arc::new(AtomicBool::new(true)),
            active: Mutex::new(None),
        }
    }

    /// Points the watcher at a directory, replacing any existing watch.
    ///
    /// The previous watch (if any) is fully stopped — handle closed, thread
    /// joined — before the new one starts, so two watchers are never active
    /// at once. On registration failure the watcher is left inert and the
    /// error is also logged; the rest of the system keeps working without
    /// change notifications.
    pub fn set_directory(&self, path: &Path) -> Result<(), WatchError> {
        self.stop();

        if !path.is_dir() {
            warn!(path = %path.display(), "cannot watch: not a directory");
            return Err(WatchError::NotADirectory(path.to_path_buf()));
        }

        let (tx, rx) = mpsc::channel();
        // The gate is checked at arrival time, on the backend's thread: an
        // event observed while delivery is disabled — including the echo of
        // the index's own writes — is dropped before it can queue up and
        // outlive the suppression window.
        let enabled = Arc::clone(&self.enabled);
        let handler = move |res: notify::Result<notify::Event>| {
            if enabled.load(Ordering::SeqCst) {
                let _ = tx.send(res);
            }
        };
        let mut watcher = match notify::recommended_watcher(handler) {
            Ok(w) => w,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "watch registration failed");
                return Err(e.into());
            }
        };
        if let Err(e) = watcher.watch(path, RecursiveMode::NonRecursive) {
            warn!(path = %path.display(), error = %e, "watch registration failed");
            return Err(e.into());
        }

        let shutdown = Arc::new(AtomicBool::new(false));
        let thread = {
            let shutdown = Arc::clone(&shutdown);
            let subscribers = Arc::clone(&self.subscribers);
            std::thread::spawn(move || delivery_loop(rx, shutdown, subscribers))
        };

        debug!(path = %path.display(), "watcher armed");
        *self.active.lock().expect("watcher lock poisoned") = Some(ActiveWatch {
            watcher,
            shutdown,
            thread,
            path: path.to_path_buf(),
        });
        Ok(())
    }

    /// Stops the current watch, if any. Closes the handle and joins the
    /// delivery thread before returning.
    pub fn stop(&self) {
        let active = self.active.lock().expect("watcher lock poisoned").take();
        if let Some(active) = active {
            active.shutdown.store(true, Ordering::SeqCst);
            // Closing the backend ends the event channel; the thread then
            // observes the shutdown flag on its next wakeup.
            drop(active.watcher);
            if active.thread.join().is_err() {
                warn!("watcher thread panicked during shutdown");
            }
            debug!(path = %active.path.display(), "watcher stopped");
        }
    }

    /// Returns the directory currently being watched.
    pub fn directory(&self) -> Option<PathBuf> {
        self.active
            .lock()
            .expect("watcher lock poisoned")
            .as_ref()
            .map(|a| a.path.clone())
    }

    /// Resumes event delivery.
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    /// Gates event delivery off without tearing the watch down. Events that
    /// arrive while disabled are dropped.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    /// Returns whether event delivery is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Disables delivery for the lifetime of the returned guard.
    ///
    /// The index wraps every mutating filesystem call in one of these so
    /// subscribers never see the echo of the index's own writes.
    pub fn suppress(&self) -> SuppressGuard<'_> {
        let was_enabled = self.enabled.swap(false, Ordering::SeqCst);
        SuppressGuard {
            watcher: self,
            was_enabled,
        }
    }

    /// Appends a subscriber. Subscribers are notified in registration
    /// order.
    pub fn subscribe(&self, subscriber: Arc<dyn FileChangeSubscriber>) {
        self.subscribers
            .lock()
            .expect("subscriber lock poisoned")
            .push(subscriber);
    }

    /// Removes a previously-registered subscriber.
    pub fn unsubscribe(&self, subscriber: &Arc<dyn FileChangeSubscriber>) {
        self.subscribers
            .lock()
            .expect("subscriber lock poisoned")
            .retain(|s| !Arc::ptr_eq(s, subscriber));
    }
}

impl Default for DirectoryWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DirectoryWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Re-enables delivery (restoring the prior state) when dropped.
pub struct SuppressGuard<'a> {
    watcher: &'a DirectoryWatcher,
    was_enabled: bool,
}

impl Drop for SuppressGuard<'_> {
    fn drop(&mut self) {
        if self.was_enabled {
            self.watcher.enabled.store(true, Ordering::SeqCst);
        }
    }
}

fn delivery_loop(
    rx: mpsc::Receiver<notify::Result<notify::Event>>,
    shutdown: Arc<AtomicBool>,
    subscribers: SubscriberList,
) {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            return;
        }
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(first) => {
                // Drain whatever else queued up during the poll interval and
                // dispatch the batch in arrival order.
                let mut batch = vec![first];
                while let Ok(next) = rx.try_recv() {
                    batch.push(next);
                }
                dispatch(batch, &subscribers);
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

fn dispatch(batch: Vec<notify::Result<notify::Event>>, subscribers: &SubscriberList) {
    for result in batch {
        let event = match result {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "watcher backend error");
                continue;
            }
        };

        let kind = match event.kind {
            notify::EventKind::Create(_) => FileEventKind::Created,
            notify::EventKind::Modify(_) => FileEventKind::Modified,
            notify::EventKind::Remove(_) => FileEventKind::Deleted,
            _ => continue,
        };

        for path in event.paths {
            // Only note files are interesting to subscribers.
            if !path
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case("htm"))
            {
                continue;
            }

            let file_event = FileEvent { kind, path };
            let subs: Vec<Arc<dyn FileChangeSubscriber>> = subscribers
                .lock()
                .expect("subscriber lock poisoned")
                .clone();
            for sub in subs {
                if sub.on_file_event(&file_event) == Propagation::Stop {
                    break;
                }
            }
        }
    }
}
