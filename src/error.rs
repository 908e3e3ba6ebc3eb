use std::{error::Error as StdError, fmt};

use thiserror::Error;

/// Why a queue operation did not complete.
///
/// `Interrupted` is always checked before `Closed`, so once a queue has been
/// interrupted no operation ever reports `Closed` again.
#[derive(Error, Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum CIQueueError {
    /// A non-blocking or timed `get` found nothing to return.
    #[error("queue is empty")]
    Empty,
    /// A non-blocking or timed `put` found no room.
    #[error("queue is full")]
    Full,
    /// The queue was closed: `get` on an empty queue, or `put` once there is room.
    #[error("queue is closed")]
    Closed,
    /// The queue was interrupted and its contents discarded.
    #[error("queue was interrupted")]
    Interrupted,
}

impl CIQueueError {
    /// `true` for the two shutdown kinds, which never go away once observed.
    pub fn is_shutdown(&self) -> bool {
        matches!(self, CIQueueError::Closed | CIQueueError::Interrupted)
    }
}

/// A rejected `put`, handing the item back to the caller.
pub struct CIPutError<T> {
    kind: CIQueueError,
    item: T,
}

impl<T> CIPutError<T> {
    pub(crate) fn new(kind: CIQueueError, item: T) -> Self {
        CIPutError { kind, item }
    }

    pub fn kind(&self) -> CIQueueError {
        self.kind
    }

    /// Recover the item that was not enqueued.
    pub fn into_inner(self) -> T {
        self.item
    }

    pub fn into_parts(self) -> (CIQueueError, T) {
        (self.kind, self.item)
    }
}

// Written by hand so that `T` needs no `Debug` bound.
impl<T> fmt::Debug for CIPutError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CIPutError")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for CIPutError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "put rejected: {}", self.kind)
    }
}

impl<T> StdError for CIPutError<T> {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.kind)
    }
}

impl<T> From<CIPutError<T>> for CIQueueError {
    fn from(err: CIPutError<T>) -> Self {
        err.kind
    }
}
