//! Synchronization primitives used by the queue. Under `--cfg loom` these come from
//! loom so the model checker can explore every interleaving.

use std::{sync::PoisonError, time::Instant};

#[cfg(loom)]
pub(crate) use loom::sync::{Condvar, Mutex, MutexGuard};
#[cfg(not(loom))]
pub(crate) use std::sync::{Condvar, Mutex, MutexGuard};

use crate::utils::remaining_until;

/// Lock `mutex`, recovering the guard if a previous holder panicked.
///
/// Nothing the queue does under the lock can leave its state half-updated, so a
/// poisoned lock is still safe to use.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Wait on `condvar` until notified or until `deadline` passes.
///
/// Returns `None` without waiting when the deadline has already passed. A returned
/// guard says nothing about why the wait ended; callers re-check their predicate.
#[cfg(not(loom))]
pub(crate) fn wait_until<'a, T>(
    condvar: &Condvar,
    guard: MutexGuard<'a, T>,
    deadline: Option<Instant>,
) -> Option<MutexGuard<'a, T>> {
    match deadline {
        None => Some(condvar.wait(guard).unwrap_or_else(PoisonError::into_inner)),
        Some(deadline) => {
            let remaining = remaining_until(deadline)?;
            let (guard, _timeout_result) = condvar
                .wait_timeout(guard, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            Some(guard)
        }
    }
}

// loom has no notion of time, timed waits become plain waits
#[cfg(loom)]
pub(crate) fn wait_until<'a, T>(
    condvar: &Condvar,
    guard: MutexGuard<'a, T>,
    deadline: Option<Instant>,
) -> Option<MutexGuard<'a, T>> {
    if let Some(deadline) = deadline {
        remaining_until(deadline)?;
    }

    Some(condvar.wait(guard).unwrap_or_else(PoisonError::into_inner))
}
