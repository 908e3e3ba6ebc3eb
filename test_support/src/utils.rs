// Common utilities for tests

use std::thread::{self, ScopedJoinHandle};
use std::time::{Duration, Instant};

/// How long a thread must stay inside a queue call before we treat it as blocked.
pub const BLOCK_CHECK_DELAY: Duration = Duration::from_millis(50);

/// Upper bound for a woken thread to finish before a test gives up on it.
pub const WAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Sleep with exponential growth, capped at about a millisecond.
pub fn backoff(pow: &mut u32) {
    if *pow < 10 {
        for _ in 0..(1u32 << *pow) {
            std::hint::spin_loop();
        }
        *pow += 1;
    } else {
        thread::sleep(Duration::from_micros(1 << (*pow - 10).min(10)));
        *pow = (*pow + 1).min(20);
    }
}

/// `true` if `handle` is still running after [`BLOCK_CHECK_DELAY`].
///
/// Only meaningful for threads that would otherwise return immediately, such as a
/// single `put` or `get` on a queue that is expected to make the caller wait.
pub fn stays_blocked<T>(handle: &ScopedJoinHandle<'_, T>) -> bool {
    thread::sleep(BLOCK_CHECK_DELAY);
    !handle.is_finished()
}

/// Join `handle`, panicking if it has not finished within [`WAKE_TIMEOUT`].
pub fn join_within<T>(handle: ScopedJoinHandle<'_, T>) -> T {
    let deadline = Instant::now() + WAKE_TIMEOUT;
    let mut pow = 0;

    while !handle.is_finished() {
        assert!(
            Instant::now() < deadline,
            "thread did not finish within {WAKE_TIMEOUT:?}"
        );
        backoff(&mut pow);
    }

    match handle.join() {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// Block until `condition` holds, panicking after [`WAKE_TIMEOUT`].
pub fn wait_for(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + WAKE_TIMEOUT;
    let mut pow = 0;

    while !condition() {
        assert!(
            Instant::now() < deadline,
            "condition not met within {WAKE_TIMEOUT:?}"
        );
        backoff(&mut pow);
    }
}
