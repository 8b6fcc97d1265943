//! Fixed-capacity FIFO for absorbing network jitter.
//!
//! [`RingBuffer`] never overwrites. A push at capacity is rejected with a
//! [`BufferOverflowError`] that hands the item back, so the transport layer
//! can apply backpressure instead of silently losing command data.

use std::error::Error;
use std::fmt;

/// A push was refused because the buffer was full.
///
/// Carries the rejected item so the caller can retry or drop it explicitly.
#[derive(Clone, PartialEq, Eq)]
pub struct BufferOverflowError<T> {
    /// Capacity of the buffer that refused the push.
    pub capacity: usize,
    /// The item that was not stored.
    pub rejected: T,
}

impl<T> BufferOverflowError<T> {
    /// Take back the rejected item.
    pub fn into_inner(self) -> T {
        self.rejected
    }
}

impl<T> fmt::Debug for BufferOverflowError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferOverflowError")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for BufferOverflowError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ring buffer full (capacity {})", self.capacity)
    }
}

impl<T> Error for BufferOverflowError<T> {}

/// Bounded circular FIFO.
///
/// Storage is allocated once at construction. `head` indexes the oldest
/// item; slots outside `head..head + len` (modulo capacity) are `None`.
///
/// # Examples
///
/// ```
/// use tandem_engine::RingBuffer;
///
/// let mut ring = RingBuffer::new(2);
/// ring.push('a').unwrap();
/// ring.push('b').unwrap();
/// let err = ring.push('c').unwrap_err();
/// assert_eq!(err.into_inner(), 'c');
/// assert_eq!(ring.pop(), Some('a'));
/// ```
#[derive(Clone, Debug)]
pub struct RingBuffer<T> {
    slots: Box<[Option<T>]>,
    head: usize,
    len: usize,
}

impl<T> RingBuffer<T> {
    /// Create an empty buffer holding at most `capacity` items.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be at least 1");
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
        }
    }

    /// Append `item` at the back, or hand it back if the buffer is full.
    ///
    /// A rejected push leaves the buffer untouched.
    pub fn push(&mut self, item: T) -> Result<(), BufferOverflowError<T>> {
        if self.is_full() {
            return Err(BufferOverflowError {
                capacity: self.capacity(),
                rejected: item,
            });
        }
        let tail = (self.head + self.len) % self.capacity();
        self.slots[tail] = Some(item);
        self.len += 1;
        Ok(())
    }

    /// Remove and return the oldest item.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let item = self.slots[self.head].take();
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;
        item
    }

    /// The oldest item, without removing it.
    pub fn peek(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        self.slots[self.head].as_ref()
    }

    /// Drop every item. Capacity is unchanged.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }

    /// Items oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        (0..self.len).filter_map(move |i| self.slots[(self.head + i) % self.capacity()].as_ref())
    }

    /// Remove every item, oldest first.
    pub fn drain(&mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len);
        while let Some(item) = self.pop() {
            out.push(item);
        }
        out
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no items are stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the next push will be rejected.
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Maximum number of items.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Free slots.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.len
    }
}
