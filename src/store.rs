use std::{
    cmp::Reverse,
    collections::{BinaryHeap, VecDeque},
};

/// Storage behind a [`CIQueue`](crate::CIQueue).
///
/// A store only decides *which* item comes out next. It does no locking and
/// no capacity checks; the queue calls it with its mutex held and never
/// pushes past capacity.
pub trait CIStore<T> {
    fn push(&mut self, item: T);

    /// Remove the next item according to the store's ordering, if any.
    fn pop(&mut self) -> Option<T>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// First in, first out.
#[derive(Debug, Clone)]
pub struct CIFifoStore<T> {
    items: VecDeque<T>,
}

impl<T> CIFifoStore<T> {
    pub fn new() -> Self {
        CIFifoStore {
            items: VecDeque::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        CIFifoStore {
            items: VecDeque::with_capacity(capacity),
        }
    }
}

impl<T> Default for CIFifoStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CIStore<T> for CIFifoStore<T> {
    fn push(&mut self, item: T) {
        self.items.push_back(item);
    }

    fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// Last in, first out.
#[derive(Debug, Clone)]
pub struct CILifoStore<T> {
    items: Vec<T>,
}

impl<T> CILifoStore<T> {
    pub fn new() -> Self {
        CILifoStore { items: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        CILifoStore {
            items: Vec::with_capacity(capacity),
        }
    }
}

impl<T> Default for CILifoStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CIStore<T> for CILifoStore<T> {
    fn push(&mut self, item: T) {
        self.items.push(item);
    }

    fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// Smallest item first. Items that compare equal come out in no particular order.
#[derive(Debug, Clone)]
pub struct CIPriorityStore<T> {
    // BinaryHeap is a max-heap
    items: BinaryHeap<Reverse<T>>,
}

impl<T: Ord> CIPriorityStore<T> {
    pub fn new() -> Self {
        CIPriorityStore {
            items: BinaryHeap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        CIPriorityStore {
            items: BinaryHeap::with_capacity(capacity),
        }
    }
}

impl<T: Ord> Default for CIPriorityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord> CIStore<T> for CIPriorityStore<T> {
    fn push(&mut self, item: T) {
        self.items.push(Reverse(item));
    }

    fn pop(&mut self) -> Option<T> {
        self.items.pop().map(|Reverse(item)| item)
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}
