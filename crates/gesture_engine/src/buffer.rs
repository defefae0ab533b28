//! Fixed-capacity rolling sample buffer and borrowed window views.
//!
//! Samples are `Copy` and small, so the ring stores them inline. A window is
//! a pair of slices over the ring's storage; it borrows the buffer and
//! therefore cannot outlive the next push.

use std::fmt;

use contracts::{ContractError, Sample};
use ringbuf::{traits::*, HeapRb};

/// Bounded FIFO of samples. Pushing into a full buffer evicts the oldest.
pub struct RollingBuffer {
    ring: HeapRb<Sample>,
    evicted: u64,
}

impl fmt::Debug for RollingBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RollingBuffer")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("evicted", &self.evicted)
            .finish()
    }
}

impl RollingBuffer {
    /// Create a buffer holding at most `capacity` samples (minimum 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: HeapRb::new(capacity.max(1)),
            evicted: 0,
        }
    }

    /// Append a sample, evicting the oldest when full
    #[inline]
    pub fn push(&mut self, sample: Sample) {
        if self.ring.push_overwrite(sample).is_some() {
            self.evicted += 1;
        }
    }

    /// The trailing `n` samples, oldest first
    ///
    /// # Errors
    /// `InsufficientData` when fewer than `n` samples are buffered.
    pub fn window(&self, n: usize) -> Result<Window<'_>, ContractError> {
        let available = self.len();
        if n > available {
            return Err(ContractError::insufficient_data(n, available));
        }
        Ok(self.all().trailing(n))
    }

    /// Everything currently buffered
    pub fn all(&self) -> Window<'_> {
        let (head, tail) = self.ring.as_slices();
        Window { head, tail }
    }

    /// Most recent sample
    pub fn latest(&self) -> Option<&Sample> {
        self.all().last()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ring.occupied_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity().get()
    }

    /// Samples pushed out by newer ones since creation
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Drop all samples
    pub fn clear(&mut self) {
        self.ring.clear();
    }
}

/// Read-only ordered view over consecutive samples
#[derive(Clone, Copy)]
pub struct Window<'a> {
    head: &'a [Sample],
    tail: &'a [Sample],
}

impl fmt::Debug for Window<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a> Window<'a> {
    /// View over a contiguous slice
    pub fn from_slice(samples: &'a [Sample]) -> Self {
        Self {
            head: samples,
            tail: &[],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.head.len() + self.tail.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample at position `i`, 0 being the oldest
    #[inline]
    pub fn get(&self, i: usize) -> Option<&'a Sample> {
        if i < self.head.len() {
            self.head.get(i)
        } else {
            self.tail.get(i - self.head.len())
        }
    }

    pub fn first(&self) -> Option<&'a Sample> {
        self.get(0)
    }

    pub fn last(&self) -> Option<&'a Sample> {
        self.len().checked_sub(1).and_then(|i| self.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Sample> + 'a {
        self.head.iter().chain(self.tail.iter())
    }

    /// The last `n` samples of this window (all of it when `n >= len`)
    pub fn trailing(&self, n: usize) -> Window<'a> {
        let len = self.len();
        if n >= len {
            return *self;
        }
        let skip = len - n;
        if skip >= self.head.len() {
            Window {
                head: &self.tail[skip - self.head.len()..],
                tail: &[],
            }
        } else {
            Window {
                head: &self.head[skip..],
                tail: self.tail,
            }
        }
    }

    /// Collect one derived value per sample
    pub fn map<F>(&self, f: F) -> Vec<f64>
    where
        F: FnMut(&'a Sample) -> f64,
    {
        self.iter().map(f).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Vector3;

    fn make_sample(z: f64) -> Sample {
        Sample::new(Vector3::new(0.0, 0.0, z), Vector3::default(), Vector3::default())
    }

    fn zs(window: &Window<'_>) -> Vec<f64> {
        window.iter().map(|s| s.accel.z).collect()
    }

    #[test]
    fn test_buffer_never_exceeds_capacity() {
        let mut buffer = RollingBuffer::new(50);
        for i in 0..1000 {
            buffer.push(make_sample(i as f64));
            assert!(buffer.len() <= 50);
        }
        assert_eq!(buffer.len(), 50);
        assert_eq!(buffer.evicted(), 950);
    }

    #[test]
    fn test_buffer_keeps_most_recent() {
        let mut buffer = RollingBuffer::new(3);
        for z in [1.0, 2.0, 3.0, 4.0, 5.0] {
            buffer.push(make_sample(z));
        }
        assert_eq!(zs(&buffer.all()), vec![3.0, 4.0, 5.0]);
        assert_eq!(buffer.latest().unwrap().accel.z, 5.0);
    }

    #[test]
    fn test_window_insufficient_data() {
        let mut buffer = RollingBuffer::new(10);
        buffer.push(make_sample(1.0));
        let err = buffer.window(5).unwrap_err();
        assert!(matches!(
            err,
            ContractError::InsufficientData {
                required: 5,
                available: 1
            }
        ));
    }

    #[test]
    fn test_window_across_wrap() {
        let mut buffer = RollingBuffer::new(4);
        for z in 1..=6 {
            buffer.push(make_sample(z as f64));
        }
        let window = buffer.window(3).unwrap();
        assert_eq!(window.len(), 3);
        assert_eq!(zs(&window), vec![4.0, 5.0, 6.0]);
        assert_eq!(window.first().unwrap().accel.z, 4.0);
        assert_eq!(window.last().unwrap().accel.z, 6.0);
        assert_eq!(window.get(1).unwrap().accel.z, 5.0);
        assert!(window.get(3).is_none());
    }

    #[test]
    fn test_trailing_of_slice() {
        let samples: Vec<Sample> = (0..10).map(|z| make_sample(z as f64)).collect();
        let window = Window::from_slice(&samples);
        assert_eq!(zs(&window.trailing(2)), vec![8.0, 9.0]);
        assert_eq!(window.trailing(20).len(), 10);
    }

    #[test]
    fn test_clear() {
        let mut buffer = RollingBuffer::new(4);
        buffer.push(make_sample(1.0));
        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.latest().is_none());
    }
}
