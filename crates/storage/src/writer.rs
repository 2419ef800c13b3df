//! Debounced writes.
//!
//! [`CoalescingWriter`] holds at most one pending value per key. Every
//! `schedule` call restarts that key's timer (trailing edge), so a burst of
//! edits reaches the store as a single write of the last value. Pending
//! values are written immediately by [`CoalescingWriter::flush`], which
//! callers must invoke before switching profiles or shutting down.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use ideals_core::profile::Profile;

use crate::error::StorageError;
use crate::keys;
use crate::SharedStore;

/// Default delay between the last edit and the write.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

struct PendingWrite {
    value: String,
    generation: u64,
    cancel: CancellationToken,
}

#[derive(Default)]
struct PendingWrites {
    entries: HashMap<String, PendingWrite>,
    next_generation: u64,
}

type SharedPending = Arc<Mutex<PendingWrites>>;

// ---------------------------------------------------------------------------
// CoalescingWriter
// ---------------------------------------------------------------------------

/// Trailing-edge debounced writer in front of a [`KeyValueStore`].
///
/// Scheduling requires a running tokio runtime. Dropping the writer flushes
/// whatever is still pending.
///
/// [`KeyValueStore`]: crate::kv::KeyValueStore
pub struct CoalescingWriter {
    store: SharedStore,
    delay: Duration,
    pending: SharedPending,
}

impl CoalescingWriter {
    pub fn new(store: SharedStore, delay: Duration) -> Self {
        Self {
            store,
            delay,
            pending: Arc::default(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace the pending value for `key` and restart its timer.
    pub fn schedule(&self, key: impl Into<String>, value: String) -> Result<(), StorageError> {
        let key = key.into();
        let cancel = CancellationToken::new();
        let generation = {
            let mut pending = lock(&self.pending)?;
            pending.next_generation += 1;
            let generation = pending.next_generation;
            let previous = pending.entries.insert(
                key.clone(),
                PendingWrite {
                    value,
                    generation,
                    cancel: cancel.clone(),
                },
            );
            if let Some(previous) = previous {
                previous.cancel.cancel();
            }
            generation
        };

        let store = Arc::clone(&self.store);
        let pending = Arc::clone(&self.pending);
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    write_if_current(&store, &pending, &key, generation);
                }
            }
        });
        Ok(())
    }

    /// Serialise `profile` and schedule it under its profile key.
    pub fn schedule_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        let value = serde_json::to_string(profile)?;
        self.schedule(keys::profile_key(&profile.id), value)
    }

    /// Write every pending value now.
    ///
    /// All pending values are attempted; the first failure is returned and
    /// the rest are logged.
    pub fn flush(&self) -> Result<(), StorageError> {
        let mut pending = lock(&self.pending)?;
        if pending.entries.is_empty() {
            return Ok(());
        }
        let count = pending.entries.len();
        let mut first_error = None;
        for (key, write) in pending.entries.drain() {
            write.cancel.cancel();
            if let Err(e) = self.store.set(&key, &write.value) {
                tracing::error!(key = %key, error = %e, "Failed to flush pending write");
                first_error.get_or_insert(e);
            }
        }
        tracing::debug!(count, "Flushed pending writes");
        first_error.map_or(Ok(()), Err)
    }

    /// Discard the pending write for `key`, if any.
    pub fn cancel(&self, key: &str) -> Result<bool, StorageError> {
        let mut pending = lock(&self.pending)?;
        Ok(match pending.entries.remove(key) {
            Some(write) => {
                write.cancel.cancel();
                true
            }
            None => false,
        })
    }

    pub fn has_pending(&self, key: &str) -> bool {
        lock(&self.pending).is_ok_and(|p| p.entries.contains_key(key))
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.pending).map_or(0, |p| p.entries.len())
    }
}

impl Drop for CoalescingWriter {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::error!(error = %e, "Pending writes lost on shutdown");
        }
    }
}

fn lock(pending: &SharedPending) -> Result<std::sync::MutexGuard<'_, PendingWrites>, StorageError> {
    pending
        .lock()
        .map_err(|_| StorageError::Backend("pending write lock poisoned".to_string()))
}

/// Timer expiry: write the value unless it was replaced, flushed or
/// cancelled in the meantime. The lock is held across the write so a
/// concurrent flush cannot be overtaken by an older value.
fn write_if_current(store: &SharedStore, pending: &SharedPending, key: &str, generation: u64) {
    let Ok(mut guard) = lock(pending) else {
        tracing::error!(key, "Debounced write dropped: lock poisoned");
        return;
    };
    if guard.entries.get(key).map(|w| w.generation) != Some(generation) {
        return;
    }
    let Some(write) = guard.entries.remove(key) else {
        return;
    };
    match store.set(key, &write.value) {
        Ok(()) => tracing::debug!(key, "Debounced write completed"),
        Err(e) => tracing::error!(key, error = %e, "Debounced write failed"),
    }
}
