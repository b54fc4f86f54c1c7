//! Monotonic loop counters

use std::fmt;

/// Single-threaded monotonic counter with explicit reset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Counter(u64);

impl Counter {
    /// Counter starting at zero
    #[must_use]
    pub fn new() -> Self {
        Self(0)
    }

    /// Increment and return the new value
    pub fn count(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    /// Current value
    #[must_use]
    pub fn get(&self) -> u64 {
        self.0
    }

    /// Reset to zero
    pub fn reset(&mut self) {
        self.0 = 0;
    }
}

impl PartialEq<u64> for Counter {
    fn eq(&self, other: &u64) -> bool {
        self.0 == *other
    }
}

impl PartialOrd<u64> for Counter {
    fn partial_cmp(&self, other: &u64) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(other)
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_get_reset() {
        let mut counter = Counter::new();
        assert_eq!(counter.get(), 0);
        assert_eq!(counter.count(), 1);
        assert_eq!(counter.count(), 2);
        assert!(counter < 3u64);
        assert_eq!(counter, 2u64);
        counter.reset();
        assert_eq!(counter.get(), 0);
        assert_eq!(counter.to_string(), "0");
    }
}
