//! Ring buffer with overwrite-on-full semantics

use crate::{FifoError, Result};

/// Result of [`RingBuffer::put`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Put<T> {
    /// Value went into a free slot
    Stored,
    /// Buffer was full: the oldest unread value was dropped to make room
    Overwrote(T),
}

impl<T> Put<T> {
    /// True if this put discarded unread data
    pub fn overwrote(&self) -> bool {
        matches!(self, Put::Overwrote(_))
    }
}

/// Fixed-capacity circular FIFO
///
/// # Type Parameters
/// * `T` - Element type
/// * `N` - Capacity in elements (must be non-zero, checked at compile time)
///
/// # Overflow Policy
/// [`put`](Self::put) never fails. When the buffer already holds `N`
/// elements the oldest one is discarded and reported back through
/// [`Put::Overwrote`]. Callers that must not lose data either keep occupancy
/// below capacity themselves or use [`try_put`](Self::try_put).
///
/// # Index Wraparound
/// Indices advance over `[0, 2N)`. Power-of-two capacities wrap with a mask,
/// everything else with a compare; both produce the same sequence.
#[derive(Clone)]
pub struct RingBuffer<T: Copy, const N: usize> {
    buffer: [T; N],
    get: usize, // Read index
    put: usize, // Write index
}

impl<T: Copy, const N: usize> RingBuffer<T, N> {
    const VALID_CAPACITY: () = assert!(
        N > 0 && N <= usize::MAX / 2,
        "ring buffer capacity must be positive"
    );

    const SPAN: usize = N * 2;

    /// Create an empty buffer with every slot set to `value`
    pub const fn filled(value: T) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID_CAPACITY;

        Self {
            buffer: [value; N],
            get: 0,
            put: 0,
        }
    }

    #[inline]
    const fn advance(index: usize) -> usize {
        if N.is_power_of_two() {
            (index + 1) & (Self::SPAN - 1)
        } else if index + 1 >= Self::SPAN {
            0
        } else {
            index + 1
        }
    }

    #[inline]
    const fn slot(index: usize) -> usize {
        if index >= N {
            index - N
        } else {
            index
        }
    }

    /// Discard all unread data
    ///
    /// Only the indices are reset; slot contents stay as they were.
    pub fn clear(&mut self) {
        self.get = 0;
        self.put = 0;
    }

    /// Append a value, dropping the oldest unread one if the buffer is full
    pub fn put(&mut self, value: T) -> Put<T> {
        let outcome = if self.is_full() {
            let oldest = self.buffer[Self::slot(self.get)];
            self.get = Self::advance(self.get);
            Put::Overwrote(oldest)
        } else {
            Put::Stored
        };

        self.buffer[Self::slot(self.put)] = value;
        self.put = Self::advance(self.put);
        outcome
    }

    /// Append a value only if there is room
    ///
    /// # Errors
    /// Returns `FifoError::Full` and leaves the buffer untouched when full
    pub fn try_put(&mut self, value: T) -> Result<()> {
        if self.is_full() {
            return Err(FifoError::Full { capacity: N });
        }
        self.put(value);
        Ok(())
    }

    /// Remove and return the oldest value, or `None` if empty
    pub fn get(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        let value = self.buffer[Self::slot(self.get)];
        self.get = Self::advance(self.get);
        Some(value)
    }

    /// Oldest value without removing it
    pub fn peek(&self) -> Option<T> {
        if self.is_empty() {
            None
        } else {
            Some(self.buffer[Self::slot(self.get)])
        }
    }

    /// Number of unread values
    pub fn length(&self) -> usize {
        if self.put >= self.get {
            self.put - self.get
        } else {
            Self::SPAN + self.put - self.get
        }
    }

    /// Capacity in values
    pub const fn size(&self) -> usize {
        N
    }

    /// Slots left before the next `put` overwrites
    pub fn free(&self) -> usize {
        N - self.length()
    }

    pub fn is_empty(&self) -> bool {
        self.get == self.put
    }

    pub fn is_full(&self) -> bool {
        self.length() == N
    }

    /// Storage slot the next `get` reads from, in `[0, N)`
    pub fn pos_get(&self) -> usize {
        Self::slot(self.get)
    }

    /// Storage slot the next `put` writes to, in `[0, N)`
    pub fn pos_put(&self) -> usize {
        Self::slot(self.put)
    }

    /// Iterator that removes values until the buffer is empty
    pub fn drain(&mut self) -> Drain<'_, T, N> {
        Drain { ring: self }
    }
}

impl<const N: usize> RingBuffer<u8, N> {
    /// Create an empty byte buffer with zeroed storage
    pub const fn new() -> Self {
        Self::filled(0)
    }
}

impl<T: Copy + Default, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::filled(T::default())
    }
}

impl<T: Copy, const N: usize> core::fmt::Debug for RingBuffer<T, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &N)
            .field("length", &self.length())
            .field("pos_get", &self.pos_get())
            .field("pos_put", &self.pos_put())
            .finish()
    }
}

/// Draining iterator returned by [`RingBuffer::drain`]
pub struct Drain<'a, T: Copy, const N: usize> {
    ring: &'a mut RingBuffer<T, N>,
}

impl<T: Copy, const N: usize> Iterator for Drain<'_, T, N> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.ring.get()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.ring.length();
        (len, Some(len))
    }
}

impl<T: Copy, const N: usize> ExactSizeIterator for Drain<'_, T, N> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::vec::Vec;

    #[test]
    fn test_fifo_order() {
        let mut ring: RingBuffer<u8, 16> = RingBuffer::default();
        for i in 0..16u8 {
            assert_eq!(ring.put(i), Put::Stored);
        }
        assert_eq!(ring.length(), 16);
        assert!(ring.is_full());

        for i in 0..16u8 {
            assert_eq!(ring.get(), Some(i));
        }
        assert_eq!(ring.length(), 0);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_new_is_empty_and_zeroed() {
        let ring: RingBuffer<u8, 6> = RingBuffer::new();
        assert!(ring.is_empty());
        assert_eq!(ring.size(), 6);
        assert_eq!(ring.free(), 6);
        assert_eq!(ring.buffer, [0; 6]);
    }

    #[test]
    fn test_new_in_static() {
        static EMPTY: RingBuffer<u8, 16> = RingBuffer::new();
        assert_eq!(EMPTY.length(), 0);
        assert_eq!(EMPTY.pos_get(), EMPTY.pos_put());
    }

    #[test]
    fn test_get_on_empty() {
        let mut ring: RingBuffer<u8, 8> = RingBuffer::filled(0xAA);
        assert_eq!(ring.get(), None);
        assert_eq!(ring.peek(), None);
        // A failed get must not move the read index
        assert_eq!(ring.pos_get(), 0);
    }

    #[test]
    fn test_clear_resets_length() {
        let mut ring: RingBuffer<u8, 10> = RingBuffer::default();
        for i in 0..7 {
            ring.put(i);
        }
        ring.get();
        ring.clear();

        assert_eq!(ring.length(), 0);
        assert_eq!(ring.pos_get(), 0);
        assert_eq!(ring.pos_put(), 0);
        assert_eq!(ring.get(), None);
    }

    #[test]
    fn test_clear_keeps_storage() {
        let mut ring: RingBuffer<u8, 4> = RingBuffer::default();
        ring.put(9);
        ring.clear();
        // Nothing readable, but the slot was not erased
        assert_eq!(ring.buffer[0], 9);
    }

    #[test]
    fn test_overwrite_drops_oldest() {
        let mut ring: RingBuffer<u8, 16> = RingBuffer::default();
        for i in 0..16u8 {
            ring.put(i);
        }
        assert_eq!(ring.put(16), Put::Overwrote(0));
        assert_eq!(ring.length(), 16);

        // The 17th value landed in slot 0
        assert_eq!(ring.buffer[0], 16);

        let drained: Vec<u8> = ring.drain().collect();
        assert_eq!(drained, (1..=16).collect::<Vec<u8>>());
    }

    #[test]
    fn test_try_put_rejects_when_full() {
        let mut ring: RingBuffer<u8, 3> = RingBuffer::default();
        ring.try_put(1).unwrap();
        ring.try_put(2).unwrap();
        ring.try_put(3).unwrap();

        assert_eq!(ring.try_put(4), Err(FifoError::Full { capacity: 3 }));
        assert_eq!(ring.get(), Some(1));
        ring.try_put(4).unwrap();
        assert_eq!(ring.drain().collect::<Vec<_>>(), [2, 3, 4]);
    }

    #[test]
    fn test_length_tracks_puts_minus_gets() {
        let mut ring: RingBuffer<u16, 10> = RingBuffer::default();
        let mut expected = 0usize;
        // Enough rounds to wrap the indices several times
        for round in 0..50u16 {
            for k in 0..(round % 7) {
                if ring.free() > 0 {
                    ring.put(round * 10 + k);
                    expected += 1;
                }
            }
            for _ in 0..(round % 5) {
                if ring.get().is_some() {
                    expected -= 1;
                }
            }
            assert_eq!(ring.length(), expected);
            assert_eq!(ring.free(), 10 - expected);
        }
    }

    /// Run a mixed put/get workload against a drop-oldest `VecDeque` model
    fn check_against_model<const N: usize>() {
        let mut ring: RingBuffer<u32, N> = RingBuffer::default();
        let mut model: VecDeque<u32> = VecDeque::new();
        let mut puts = 0usize;
        let mut gets = 0usize;

        for i in 0..600u32 {
            let dropped = if model.len() == N { model.pop_front() } else { None };
            model.push_back(i);
            match dropped {
                Some(oldest) => {
                    assert_eq!(ring.put(i), Put::Overwrote(oldest));
                    gets += 1;
                }
                None => assert_eq!(ring.put(i), Put::Stored),
            }
            puts += 1;

            // Light reads most of the time, an occasional burst to empty it out
            let reads = if i % 41 == 0 { N + 2 } else { usize::from(i % 3 == 0) };
            for _ in 0..reads {
                let expected = model.pop_front();
                if expected.is_some() {
                    gets += 1;
                }
                assert_eq!(ring.get(), expected);
            }

            assert_eq!(ring.length(), model.len());
            assert_eq!(ring.pos_put(), puts % N);
            assert_eq!(ring.pos_get(), gets % N);
        }

        assert!(ring.drain().eq(model.drain(..)));
    }

    #[test]
    fn test_mask_wrap_matches_model() {
        check_against_model::<16>();
    }

    #[test]
    fn test_compare_wrap_matches_model() {
        check_against_model::<10>();
    }

    #[test]
    fn test_size_is_constant() {
        let mut ring: RingBuffer<u8, 5> = RingBuffer::default();
        assert_eq!(ring.size(), 5);
        for i in 0..12 {
            ring.put(i);
        }
        assert_eq!(ring.size(), 5);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut ring: RingBuffer<u8, 4> = RingBuffer::default();
        ring.put(0x41);
        ring.put(0x42);
        assert_eq!(ring.peek(), Some(0x41));
        assert_eq!(ring.length(), 2);
        assert_eq!(ring.get(), Some(0x41));
        assert_eq!(ring.peek(), Some(0x42));
    }

    #[test]
    fn test_drain_size_hint() {
        let mut ring: RingBuffer<u8, 4> = RingBuffer::default();
        ring.put(1);
        ring.put(2);
        let drain = ring.drain();
        assert_eq!(drain.len(), 2);
    }
}
