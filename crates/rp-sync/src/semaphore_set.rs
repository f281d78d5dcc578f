//! `SemaphoreSet` — bounded counting locks keyed by resource id.

use std::fmt;
use std::hash::Hash;
use std::time::{Duration, Instant};

use log::debug;
use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;

use crate::wait::{CancelToken, WaitConfig, wait_until};

/// Up to `max_allowed` concurrent holders per resource id.
///
/// Ids with no holders are not stored, so the map only grows with the number
/// of resources in active use.
pub struct SemaphoreSet<K> {
    counts: Mutex<FxHashMap<K, usize>>,
    released: Condvar,
    max_allowed: usize,
    config: WaitConfig,
}

impl<K: Eq + Hash + Clone> SemaphoreSet<K> {
    /// `max_allowed` is raised to 1 if given as 0.
    pub fn new(max_allowed: usize) -> Self {
        Self::with_config(max_allowed, WaitConfig::default())
    }

    pub fn with_config(max_allowed: usize, config: WaitConfig) -> Self {
        Self {
            counts: Mutex::new(FxHashMap::default()),
            released: Condvar::new(),
            max_allowed: max_allowed.max(1),
            config,
        }
    }

    pub fn max_allowed(&self) -> usize {
        self.max_allowed
    }

    pub fn config(&self) -> WaitConfig {
        self.config
    }

    /// Take one slot of `id` if any are free.  Never blocks.
    pub fn try_acquire(&self, id: K) -> bool {
        let mut counts = self.counts.lock();
        Self::take_slot(&mut counts, id, self.max_allowed)
    }

    /// Take one slot of `id`, waiting up to the configured timeout.
    pub fn acquire_or_wait(&self, id: K, cancel: Option<&CancelToken>) -> bool {
        self.acquire_or_wait_for(id, self.config.timeout, cancel)
    }

    pub fn acquire_or_wait_for(
        &self,
        id: K,
        timeout: Duration,
        cancel: Option<&CancelToken>,
    ) -> bool {
        let max = self.max_allowed;
        let mut counts = self.counts.lock();
        wait_until(
            &self.released,
            &mut counts,
            timeout,
            self.config.poll_interval,
            cancel,
            |counts| Self::take_slot(counts, id.clone(), max),
        )
    }

    /// Give back one slot of `id`.  Returns `false` if `id` had no holders.
    pub fn release(&self, id: &K) -> bool {
        let mut counts = self.counts.lock();
        let Some(count) = counts.get_mut(id) else {
            return false;
        };
        *count -= 1;
        if *count == 0 {
            counts.remove(id);
        }
        drop(counts);
        self.released.notify_all();
        true
    }

    /// Current number of holders of `id`.
    pub fn count(&self, id: &K) -> usize {
        self.counts.lock().get(id).copied().unwrap_or(0)
    }

    pub fn is_full(&self, id: &K) -> bool {
        self.count(id) >= self.max_allowed
    }

    /// `true` while at least one holder has `id`.
    pub fn is_used(&self, id: &K) -> bool {
        self.count(id) > 0
    }

    /// Block until `id` has a free slot (without taking it).  Returns the
    /// time spent waiting.
    pub fn wait_not_full(&self, id: &K, cancel: Option<&CancelToken>) -> Duration {
        let start = Instant::now();
        let max = self.max_allowed;
        let mut counts = self.counts.lock();
        wait_until(
            &self.released,
            &mut counts,
            self.config.timeout,
            self.config.poll_interval,
            cancel,
            |counts| counts.get(id).copied().unwrap_or(0) < max,
        );
        start.elapsed()
    }

    /// Block until `id` has no holders at all.  Returns `false` on timeout or
    /// cancellation.
    pub fn wait_unused(&self, id: &K, timeout: Duration, cancel: Option<&CancelToken>) -> bool {
        let mut counts = self.counts.lock();
        wait_until(
            &self.released,
            &mut counts,
            timeout,
            self.config.poll_interval,
            cancel,
            |counts| !counts.contains_key(id),
        )
    }

    pub fn force_release_all(&self) {
        let mut counts = self.counts.lock();
        if !counts.is_empty() {
            debug!("force-releasing {} counted resource(s)", counts.len());
            counts.clear();
        }
        drop(counts);
        self.released.notify_all();
    }

    fn take_slot(counts: &mut FxHashMap<K, usize>, id: K, max: usize) -> bool {
        let count = counts.entry(id).or_insert(0);
        if *count < max {
            *count += 1;
            true
        } else {
            false
        }
    }
}

impl<K> fmt::Debug for SemaphoreSet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SemaphoreSet")
            .field("resources", &self.counts.lock().len())
            .field("max_allowed", &self.max_allowed)
            .finish()
    }
}
