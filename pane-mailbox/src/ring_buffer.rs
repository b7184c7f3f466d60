//! Fixed-size ring of message slots.

/// A fixed-size FIFO ring buffer.
///
/// Not synchronized; the mailbox wraps it in a mutex. Unlike a byte
/// capture buffer this never overwrites: a push into a full ring hands
/// the value back.
pub struct RingBuffer<T> {
    /// The slot storage.
    slots: Box<[Option<T>]>,

    /// Index of the oldest queued value.
    read_pos: usize,

    /// Number of queued values.
    len: usize,
}

impl<T> RingBuffer<T> {
    /// Create a new ring buffer with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let slots = std::iter::repeat_with(|| None)
            .take(capacity)
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            slots,
            read_pos: 0,
            len: 0,
        }
    }

    /// Append at `(read_pos + len) % capacity`. Returns the value if full.
    pub fn push(&mut self, value: T) -> Result<(), T> {
        if self.is_full() {
            return Err(value);
        }
        let idx = (self.read_pos + self.len) % self.capacity();
        self.slots[idx] = Some(value);
        self.len += 1;
        Ok(())
    }

    /// Take the oldest value.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let value = self.slots[self.read_pos].take();
        self.read_pos = (self.read_pos + 1) % self.capacity();
        self.len -= 1;
        value
    }

    /// Peek at the oldest value.
    pub fn front(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        self.slots[self.read_pos].as_ref()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Get the capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

impl<T> std::fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity())
            .field("len", &self.len)
            .field("read_pos", &self.read_pos)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_push_pop() {
        let mut ring = RingBuffer::new(4);
        ring.push("a").unwrap();
        ring.push("b").unwrap();

        assert_eq!(ring.len(), 2);
        assert_eq!(ring.front(), Some(&"a"));
        assert_eq!(ring.pop(), Some("a"));
        assert_eq!(ring.pop(), Some("b"));
        assert_eq!(ring.pop(), None);
    }

    #[test]
    fn test_full_returns_value() {
        let mut ring = RingBuffer::new(2);
        ring.push(1).unwrap();
        ring.push(2).unwrap();

        assert!(ring.is_full());
        assert_eq!(ring.push(3), Err(3));
        assert_eq!(ring.len(), 2);
    }

    #[test]
    fn test_wraparound() {
        let mut ring = RingBuffer::new(3);
        for round in 0..10 {
            ring.push(round * 2).unwrap();
            ring.push(round * 2 + 1).unwrap();
            assert_eq!(ring.pop(), Some(round * 2));
            assert_eq!(ring.pop(), Some(round * 2 + 1));
        }
        assert!(ring.is_empty());
        assert_eq!(ring.capacity(), 3);
    }
}
