use crate::CIQueueError;

/// Shutdown state of a [`CIQueue`](crate::CIQueue).
///
/// The state only ever moves forward: `Open -> Closed -> Interrupted`, or
/// straight from `Open` to `Interrupted`. `Interrupted` is absorbing.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Default)]
pub enum CIShutdownState {
    #[default]
    Open,
    /// Queued items may still be drained, nothing new is accepted.
    Closed,
    /// Queued items were discarded, every operation fails.
    Interrupted,
}

impl CIShutdownState {
    pub fn is_open(self) -> bool {
        self == CIShutdownState::Open
    }

    /// `true` for any state past `Open`.
    pub fn is_closed(self) -> bool {
        self != CIShutdownState::Open
    }

    pub fn is_interrupted(self) -> bool {
        self == CIShutdownState::Interrupted
    }

    /// Fails with `Interrupted` if the queue has been interrupted. Callers check this
    /// before anything else so that it dominates `Closed`.
    pub(crate) fn ensure_not_interrupted(self) -> Result<(), CIQueueError> {
        if self.is_interrupted() {
            return Err(CIQueueError::Interrupted);
        }

        Ok(())
    }

    /// Move `Open -> Closed`. Returns whether the state changed.
    pub(crate) fn close(&mut self) -> bool {
        if *self != CIShutdownState::Open {
            return false;
        }

        *self = CIShutdownState::Closed;
        true
    }

    /// Move to `Interrupted` from either earlier state. Returns whether the state changed.
    pub(crate) fn interrupt(&mut self) -> bool {
        if self.is_interrupted() {
            return false;
        }

        *self = CIShutdownState::Interrupted;
        true
    }
}
