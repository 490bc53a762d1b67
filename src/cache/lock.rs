//! Poisoned-lock recovery for the cache's interior locks.
//!
//! A panic on another thread must not take the cache down with it; the
//! guards below recover the inner value and record the incident.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

fn note_poisoned(kind: &'static str, op: &'static str) {
    warn!(
        lock_kind = kind,
        op,
        outcome = "recovered",
        note = "cache state may be stale after a panic elsewhere",
        "Recovered from poisoned cache lock"
    );
}

pub(crate) fn rw_read<'a, T>(lock: &'a RwLock<T>, op: &'static str) -> RwLockReadGuard<'a, T> {
    lock.read().unwrap_or_else(|poisoned| {
        note_poisoned("rwlock.read", op);
        poisoned.into_inner()
    })
}

pub(crate) fn rw_write<'a, T>(lock: &'a RwLock<T>, op: &'static str) -> RwLockWriteGuard<'a, T> {
    lock.write().unwrap_or_else(|poisoned| {
        note_poisoned("rwlock.write", op);
        poisoned.into_inner()
    })
}

pub(crate) fn mutex_lock<'a, T>(lock: &'a Mutex<T>, op: &'static str) -> MutexGuard<'a, T> {
    lock.lock().unwrap_or_else(|poisoned| {
        note_poisoned("mutex.lock", op);
        poisoned.into_inner()
    })
}
