//! Fixed-capacity ring buffer for rolling sample history.
//!
//! Storage is allocated once and filled with `T::default()`. Pushes write at a
//! wrap-around head index, so appending never shifts existing elements and
//! clearing never reallocates.

use std::iter::FusedIterator;

/// A fixed-capacity ring buffer that overwrites the oldest element when full.
///
/// Slots beyond `len()` hold stale or default data and are never exposed by
/// the iterators.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<T>,
    /// Index of the slot the next push will write.
    head: usize,
    len: usize,
}

impl<T: Default + Clone> RingBuffer<T> {
    /// Creates a new ring buffer with the specified capacity.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of elements the buffer can hold
    ///
    /// # Panics
    /// Panics if capacity is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be greater than 0");
        Self {
            slots: vec![T::default(); capacity],
            head: 0,
            len: 0,
        }
    }
}

impl<T> RingBuffer<T> {
    /// Pushes an element to the back of the buffer.
    ///
    /// If the buffer is at capacity, the oldest element is overwritten.
    pub fn push(&mut self, item: T) {
        let capacity = self.slots.len();
        self.slots[self.head] = item;
        self.head = (self.head + 1) % capacity;
        if self.len < capacity {
            self.len += 1;
        }
    }

    /// Returns the number of elements in the buffer.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the buffer contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the maximum capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns true once every slot holds pushed data.
    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// Returns an iterator over the elements in order (oldest to newest).
    pub fn iter(&self) -> Iter<'_, T> {
        self.latest(self.len)
    }

    /// Returns an iterator over the newest `count` elements, oldest first.
    ///
    /// `count` is clamped to `len()`.
    pub fn latest(&self, count: usize) -> Iter<'_, T> {
        let count = count.min(self.len);
        let capacity = self.slots.len();
        let start = (self.head + capacity - count) % capacity;
        Iter {
            slots: &self.slots,
            start,
            front: 0,
            back: count,
        }
    }

    /// Forgets all elements without touching the storage.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Returns a reference to the most recent element, if any.
    pub fn back(&self) -> Option<&T> {
        self.iter().next_back()
    }

    /// Returns a reference to the oldest element, if any.
    pub fn front(&self) -> Option<&T> {
        self.iter().next()
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Collects elements into a Vec.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

impl<T: PartialEq> PartialEq for RingBuffer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.capacity() == other.capacity() && self.iter().eq(other.iter())
    }
}

impl<T: Default + Clone> Default for RingBuffer<T> {
    /// Creates a ring buffer with a default capacity of 100.
    fn default() -> Self {
        Self::new(100)
    }
}

/// Chronological iterator over a [`RingBuffer`].
///
/// Cheap to clone, so a view can be walked more than once.
#[derive(Debug)]
pub struct Iter<'a, T> {
    slots: &'a [T],
    start: usize,
    front: usize,
    back: usize,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots,
            start: self.start,
            front: self.front,
            back: self.back,
        }
    }
}

impl<'a, T> Iter<'a, T> {
    fn slot(&self, offset: usize) -> &'a T {
        &self.slots[(self.start + offset) % self.slots.len()]
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let item = self.slot(self.front);
        self.front += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(self.slot(self.back))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}
