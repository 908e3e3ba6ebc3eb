use std::time::{Duration, Instant};

/// Absolute deadline for a wait of `timeout`, or `None` to wait forever.
///
/// A timeout too large to add to `now` is treated as no timeout at all.
pub(crate) fn deadline_after(now: Instant, timeout: Option<Duration>) -> Option<Instant> {
    timeout.and_then(|timeout| now.checked_add(timeout))
}

/// Time left before `deadline`, or `None` once it has passed.
pub(crate) fn remaining_until(deadline: Instant) -> Option<Duration> {
    remaining_between(Instant::now(), deadline)
}

fn remaining_between(now: Instant, deadline: Instant) -> Option<Duration> {
    deadline
        .checked_duration_since(now)
        .filter(|remaining| !remaining.is_zero())
}
