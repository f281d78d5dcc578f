//! `rp-sync` — resource-keyed lock sets.
//!
//! Every primitive here guards a *set* of resources addressed by an id `K`,
//! so callers lock "index #3" or "network `seoul`" without allocating a
//! dedicated lock object per resource.  Unrelated ids never block each other.
//!
//! # Crate layout
//!
//! | Module          | Contents                                               |
//! |-----------------|--------------------------------------------------------|
//! | [`mutex_set`]   | `MutexSet` (exclusive), `MutexSetGuard`                |
//! | [`semaphore_set`] | `SemaphoreSet` (bounded counting)                    |
//! | [`rw_lock_set`] | `RwLockSet` (readers/writer, composed of the two)      |
//! | [`wait`]        | `WaitConfig`, `CancelToken`                            |
//!
//! # Waiting contract
//!
//! Blocking variants sleep on a condition variable that is notified on every
//! release.  They give up (returning `false`/`None`, never panicking) when
//! the timeout elapses or the supplied [`CancelToken`] fires.  Cancellation is
//! observed at least once per [`WaitConfig::poll_interval`].

pub mod mutex_set;
pub mod rw_lock_set;
pub mod semaphore_set;
pub mod wait;


pub use mutex_set::{MutexSet, MutexSetGuard};
pub use rw_lock_set::RwLockSet;
pub use semaphore_set::SemaphoreSet;
pub use wait::{CancelToken, WaitConfig};
