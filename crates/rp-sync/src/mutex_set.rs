//! `MutexSet` — one exclusive lock per resource id.

use std::fmt;
use std::hash::Hash;
use std::time::{Duration, Instant};

use log::debug;
use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashSet;

use crate::wait::{CancelToken, WaitConfig, wait_until};

/// Exclusive locks keyed by resource id.
///
/// A resource is either held or free; there is no owner tracking, so any
/// caller may [`release`](Self::release) it.  Prefer [`lock`](Self::lock),
/// which hands back a guard that releases on drop.
pub struct MutexSet<K> {
    held: Mutex<FxHashSet<K>>,
    released: Condvar,
    config: WaitConfig,
}

impl<K: Eq + Hash + Clone> MutexSet<K> {
    pub fn new() -> Self {
        Self::with_config(WaitConfig::default())
    }

    pub fn with_config(config: WaitConfig) -> Self {
        Self {
            held: Mutex::new(FxHashSet::default()),
            released: Condvar::new(),
            config,
        }
    }

    pub fn config(&self) -> WaitConfig {
        self.config
    }

    pub fn set_config(&mut self, config: WaitConfig) {
        self.config = config;
    }

    /// Claim `id` if it is free.  Never blocks.
    pub fn try_acquire(&self, id: K) -> bool {
        self.held.lock().insert(id)
    }

    /// Claim `id`, waiting up to the configured timeout for it to be freed.
    pub fn acquire_or_wait(&self, id: K, cancel: Option<&CancelToken>) -> bool {
        self.acquire_or_wait_for(id, self.config.timeout, cancel)
    }

    /// Claim `id`, waiting up to `timeout`.  Returns `false` on timeout or
    /// cancellation, leaving the set untouched.
    pub fn acquire_or_wait_for(
        &self,
        id: K,
        timeout: Duration,
        cancel: Option<&CancelToken>,
    ) -> bool {
        let mut held = self.held.lock();
        wait_until(
            &self.released,
            &mut held,
            timeout,
            self.config.poll_interval,
            cancel,
            |held| {
                if held.contains(&id) {
                    false
                } else {
                    held.insert(id.clone());
                    true
                }
            },
        )
    }

    /// Non-blocking RAII variant of [`try_acquire`](Self::try_acquire).
    pub fn try_lock(&self, id: K) -> Option<MutexSetGuard<'_, K>> {
        self.try_acquire(id.clone())
            .then(|| MutexSetGuard { set: self, id })
    }

    /// Blocking RAII variant of [`acquire_or_wait`](Self::acquire_or_wait).
    pub fn lock(&self, id: K, cancel: Option<&CancelToken>) -> Option<MutexSetGuard<'_, K>> {
        self.acquire_or_wait(id.clone(), cancel)
            .then(|| MutexSetGuard { set: self, id })
    }

    /// Blocking RAII variant with an explicit timeout.
    pub fn lock_for(
        &self,
        id: K,
        timeout: Duration,
        cancel: Option<&CancelToken>,
    ) -> Option<MutexSetGuard<'_, K>> {
        self.acquire_or_wait_for(id.clone(), timeout, cancel)
            .then(|| MutexSetGuard { set: self, id })
    }

    /// Free `id`.  Returns `false` if it was not held.
    pub fn release(&self, id: &K) -> bool {
        let removed = self.held.lock().remove(id);
        if removed {
            self.released.notify_all();
        }
        removed
    }

    pub fn is_locked(&self, id: &K) -> bool {
        self.held.lock().contains(id)
    }

    /// Block until `id` is free (without claiming it).  Returns the time
    /// spent waiting; gives up early on timeout or cancellation.
    pub fn wait_unlocked(&self, id: &K, cancel: Option<&CancelToken>) -> Duration {
        let start = Instant::now();
        let mut held = self.held.lock();
        wait_until(
            &self.released,
            &mut held,
            self.config.timeout,
            self.config.poll_interval,
            cancel,
            |held| !held.contains(id),
        );
        start.elapsed()
    }

    /// Snapshot of every currently held id.
    pub fn locked_resources(&self) -> Vec<K> {
        self.held.lock().iter().cloned().collect()
    }

    /// Drop every lock.  Intended for shutdown or recovery after a crashed
    /// holder; live holders are not notified.
    pub fn force_release_all(&self) {
        let mut held = self.held.lock();
        if !held.is_empty() {
            debug!("force-releasing {} exclusive lock(s)", held.len());
            held.clear();
        }
        drop(held);
        self.released.notify_all();
    }
}

impl<K: Eq + Hash + Clone> Default for MutexSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for MutexSet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutexSet")
            .field("held", &self.held.lock().len())
            .field("config", &self.config)
            .finish()
    }
}

// ── Guard ─────────────────────────────────────────────────────────────────────

/// Holds one resource of a [`MutexSet`]; releases it when dropped.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct MutexSetGuard<'a, K: Eq + Hash + Clone> {
    set: &'a MutexSet<K>,
    id: K,
}

impl<K: Eq + Hash + Clone> MutexSetGuard<'_, K> {
    pub fn id(&self) -> &K {
        &self.id
    }
}

impl<K: Eq + Hash + Clone> Drop for MutexSetGuard<'_, K> {
    fn drop(&mut self) {
        self.set.release(&self.id);
    }
}
