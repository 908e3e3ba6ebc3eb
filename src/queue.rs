use std::{
    marker::PhantomData,
    time::{Duration, Instant},
};

use tracing::{debug, trace};

use crate::{
    CIFifoStore, CILifoStore, CIPriorityStore, CIPutError, CIQueueError, CIShutdownState, CIStore,
    sync::{self, Condvar, Mutex, MutexGuard},
    utils::deadline_after,
};

/// FIFO queue: items come out in insertion order.
pub type CIFifoQueue<T> = CIQueue<T, CIFifoStore<T>>;
/// LIFO queue: the most recently inserted item comes out first.
pub type CILifoQueue<T> = CIQueue<T, CILifoStore<T>>;
/// Priority queue: the smallest item comes out first.
pub type CIPriorityQueue<T> = CIQueue<T, CIPriorityStore<T>>;

/// State guarded by the queue mutex.
struct CIQueueInner<S> {
    store: S,
    state: CIShutdownState,
}

/// Bounded blocking queue that can be closed or interrupted.
///
/// All state lives behind one mutex. Producers wait on `not_full` while the store
/// is at capacity, consumers wait on `not_empty` while it is empty. Two shutdown
/// modes are layered on top:
///
/// * [`close`](Self::close) stops new items from entering but lets consumers drain
///   what is already queued. A producer blocked on a full queue keeps waiting for
///   room and only then fails with [`CIQueueError::Closed`].
/// * [`interrupt`](Self::interrupt) discards everything queued and makes every
///   current and future `put`/`get`/`size` fail with [`CIQueueError::Interrupted`],
///   even if the queue was closed first.
///
/// Items are ordered by the [`CIStore`] `S`.
pub struct CIQueue<T, S = CIFifoStore<T>> {
    inner: Mutex<CIQueueInner<S>>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
    _item: PhantomData<fn(T) -> T>,
}

impl<T, S: CIStore<T> + Default> CIQueue<T, S> {
    /// Create an open, empty queue holding at most `capacity` items. A capacity of 0
    /// means unbounded.
    ///
    /// # Examples
    /// ```
    /// use yep_ciq::{CIFifoQueue, CIQueueError};
    ///
    /// let queue = CIFifoQueue::new(2);
    /// queue.put(1, true, None).unwrap();
    /// queue.put(2, true, None).unwrap();
    /// assert_eq!(queue.put_nowait(3).unwrap_err().kind(), CIQueueError::Full);
    ///
    /// queue.close();
    /// assert_eq!(queue.get(true, None), Ok(1));
    /// assert_eq!(queue.get(true, None), Ok(2));
    /// assert_eq!(queue.get(true, None), Err(CIQueueError::Closed));
    /// ```
    pub fn new(capacity: usize) -> Self {
        Self::with_store(capacity, S::default())
    }
}

impl<T, S: CIStore<T>> CIQueue<T, S> {
    /// Create an open queue around an existing store.
    ///
    /// # Panics
    /// Panics if `store` already holds items. A queue always starts empty, so its
    /// capacity bound holds from the first `put`.
    pub fn with_store(capacity: usize, store: S) -> Self {
        assert!(
            store.is_empty(),
            "queue store must start empty, found {} items",
            store.len()
        );

        CIQueue {
            inner: Mutex::new(CIQueueInner {
                store,
                state: CIShutdownState::Open,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
            _item: PhantomData,
        }
    }

    /// Maximum number of queued items, 0 if unbounded.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// `true` unless the queue was created with capacity 0.
    pub fn is_bounded(&self) -> bool {
        self.capacity > 0
    }

    /// Snapshot of the shutdown state. Unlike [`size`](Self::size) this never fails.
    pub fn state(&self) -> CIShutdownState {
        self.lock().state
    }

    /// Add `item` to the queue.
    ///
    /// # Arguments
    /// * `item` - The item to enqueue.
    /// * `blocking` - When `false`, fail with `Full` instead of waiting for room.
    ///   `timeout` is ignored.
    /// * `timeout` - Upper bound on the total time spent waiting for room. `None`
    ///   waits as long as it takes.
    ///
    /// # Errors
    /// The rejected item is handed back inside the [`CIPutError`], whose kind is
    /// * `Interrupted` - the queue is interrupted, checked before anything else.
    /// * `Closed` - the queue is closed and has room. A full closed queue still makes
    ///   the caller wait for room before this is reported.
    /// * `Full` - no room and `blocking` is `false`, or `timeout` expired.
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use yep_ciq::{CIFifoQueue, CIQueueError};
    ///
    /// let queue = CIFifoQueue::new(1);
    /// queue.put("a", true, None).unwrap();
    ///
    /// let err = queue
    ///     .put("b", true, Some(Duration::from_millis(1)))
    ///     .unwrap_err();
    /// assert_eq!(err.kind(), CIQueueError::Full);
    /// assert_eq!(err.into_inner(), "b");
    /// ```
    pub fn put(
        &self,
        item: T,
        blocking: bool,
        timeout: Option<Duration>,
    ) -> Result<(), CIPutError<T>> {
        let deadline = deadline_after(Instant::now(), timeout);
        let mut inner = self.lock();

        loop {
            if let Err(kind) = inner.state.ensure_not_interrupted() {
                return Err(CIPutError::new(kind, item));
            }

            if !self.is_full_locked(&inner) {
                if inner.state.is_closed() {
                    return Err(CIPutError::new(CIQueueError::Closed, item));
                }

                inner.store.push(item);
                drop(inner);
                self.not_empty.notify_one();
                return Ok(());
            }

            if !blocking {
                return Err(CIPutError::new(CIQueueError::Full, item));
            }

            trace!(capacity = self.capacity, "producer waiting for room");
            inner = match sync::wait_until(&self.not_full, inner, deadline) {
                Some(guard) => guard,
                None => return Err(CIPutError::new(CIQueueError::Full, item)),
            };
        }
    }

    /// [`put`](Self::put) without waiting.
    pub fn put_nowait(&self, item: T) -> Result<(), CIPutError<T>> {
        self.put(item, false, None)
    }

    /// Remove and return the next item.
    ///
    /// # Arguments
    /// * `blocking` - When `false`, fail with `Empty` instead of waiting for an item.
    ///   `timeout` is ignored.
    /// * `timeout` - Upper bound on the total time spent waiting. `None` waits as long
    ///   as it takes.
    ///
    /// # Errors
    /// * `Interrupted` - the queue is interrupted, checked before anything else.
    /// * `Closed` - the queue is closed and empty. Items queued before the close are
    ///   still returned.
    /// * `Empty` - nothing queued and `blocking` is `false`, or `timeout` expired.
    pub fn get(&self, blocking: bool, timeout: Option<Duration>) -> Result<T, CIQueueError> {
        let deadline = deadline_after(Instant::now(), timeout);
        let mut inner = self.lock();

        loop {
            inner.state.ensure_not_interrupted()?;

            if let Some(item) = inner.store.pop() {
                let closed = inner.state.is_closed();
                drop(inner);
                if closed {
                    // every waiting producer fails now that there is room
                    self.not_full.notify_all();
                } else {
                    self.not_full.notify_one();
                }
                return Ok(item);
            }

            if inner.state.is_closed() {
                return Err(CIQueueError::Closed);
            }

            if !blocking {
                return Err(CIQueueError::Empty);
            }

            trace!("consumer waiting for an item");
            inner = sync::wait_until(&self.not_empty, inner, deadline)
                .ok_or(CIQueueError::Empty)?;
        }
    }

    /// [`get`](Self::get) without waiting.
    pub fn get_nowait(&self) -> Result<T, CIQueueError> {
        self.get(false, None)
    }

    /// Number of queued items.
    ///
    /// # Errors
    /// * `Interrupted` - the queue is interrupted.
    /// * `Closed` - the queue is closed and empty.
    pub fn size(&self) -> Result<usize, CIQueueError> {
        let inner = self.lock();
        inner.state.ensure_not_interrupted()?;

        let len = inner.store.len();
        if len == 0 && inner.state.is_closed() {
            return Err(CIQueueError::Closed);
        }

        Ok(len)
    }

    /// `true` if nothing is queued. Fails the same way as [`size`](Self::size).
    pub fn is_empty(&self) -> Result<bool, CIQueueError> {
        Ok(self.size()? == 0)
    }

    /// `true` if the queue is at capacity, never for an unbounded queue. Fails the
    /// same way as [`size`](Self::size).
    pub fn is_full(&self) -> Result<bool, CIQueueError> {
        let len = self.size()?;
        Ok(self.is_bounded() && len >= self.capacity)
    }

    /// Stop accepting items while letting consumers drain what is queued.
    ///
    /// Wakes every blocked producer and consumer so they can re-check the queue.
    /// Consumers of an empty queue fail with `Closed`; producers waiting on a full
    /// queue keep waiting until there is room, then fail with `Closed`. Has no effect
    /// once the queue is closed or interrupted.
    pub fn close(&self) {
        let changed = self.lock().state.close();

        self.not_empty.notify_all();
        self.not_full.notify_all();

        if changed {
            debug!("queue closed");
        }
    }

    /// Discard every queued item and fail all current and future operations with
    /// `Interrupted`.
    ///
    /// Wakes every blocked producer and consumer. Takes precedence over a previous or
    /// later [`close`](Self::close). Repeated calls have no further effect.
    pub fn interrupt(&self) {
        let (changed, discarded) = {
            let mut inner = self.lock();
            let changed = inner.state.interrupt();

            let mut discarded = Vec::with_capacity(inner.store.len());
            while let Some(item) = inner.store.pop() {
                discarded.push(item);
            }

            (changed, discarded)
        };

        self.not_empty.notify_all();
        self.not_full.notify_all();

        if changed {
            debug!(discarded = discarded.len(), "queue interrupted");
        }

        // dropped outside the lock so item destructors cannot block the queue
        drop(discarded);
    }

    fn lock(&self) -> MutexGuard<'_, CIQueueInner<S>> {
        sync::lock(&self.inner)
    }

    fn is_full_locked(&self, inner: &CIQueueInner<S>) -> bool {
        self.is_bounded() && inner.store.len() >= self.capacity
    }
}

impl<T, S: CIStore<T>> std::fmt::Debug for CIQueue<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("CIQueue")
            .field("capacity", &self.capacity)
            .field("len", &inner.store.len())
            .field("state", &inner.state)
            .finish()
    }
}
