//! Running median filter.
//!
//! Keeps the `N` most recent inputs in a ring (oldest evicted first) and
//! returns the median of the window ordered by value. Used to knock spikes out
//! of the analog pressure path.

use heapless::{Deque, Vec};

/// Fixed-window running median.
///
/// Until the window fills, the median is taken over the values seen so far.
/// For an even number of values the upper of the two middle elements is
/// returned, so the result is always one of the inputs.
pub struct MedianFilter<const N: usize> {
    window: Deque<f32, N>,
}

impl<const N: usize> MedianFilter<N> {
    pub const fn new() -> Self {
        const { assert!(N > 0, "median window must hold at least one value") };
        Self {
            window: Deque::new(),
        }
    }

    /// Push `value` into the window and return the current median.
    pub fn put_get(&mut self, value: f32) -> f32 {
        if self.window.is_full() {
            self.window.pop_front();
        }
        // There is always room after the eviction above.
        let _ = self.window.push_back(value);
        self.median().unwrap_or(value)
    }

    /// Median of the current window, `None` before the first value.
    pub fn median(&self) -> Option<f32> {
        let mut sorted: Vec<f32, N> = self.window.iter().copied().collect();
        sorted.sort_unstable_by(f32::total_cmp);
        sorted.get(sorted.len() / 2).copied()
    }

    /// Number of values currently in the window.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Forget all buffered values.
    pub fn clear(&mut self) {
        self.window.clear();
    }
}

impl<const N: usize> Default for MedianFilter<N> {
    fn default() -> Self {
        Self::new()
    }
}
