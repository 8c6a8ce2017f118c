//! Puts results that finish out of order back into frame order.

use std::collections::BTreeMap;

/// Holds results keyed by frame index and releases them strictly in
/// ascending index order, starting at 0.
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    next: usize,
    pending: BTreeMap<usize, T>,
}

impl<T> Default for ReorderBuffer<T> {
    fn default() -> Self {
        Self {
            next: 0,
            pending: BTreeMap::new(),
        }
    }
}

impl<T> ReorderBuffer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the result for `index`. Indices already released, or stored
    /// twice, are ignored.
    pub fn push(&mut self, index: usize, value: T) {
        if index >= self.next {
            self.pending.entry(index).or_insert(value);
        }
    }

    /// Release the next result in order, if it has arrived.
    pub fn pop_ready(&mut self) -> Option<(usize, T)> {
        let value = self.pending.remove(&self.next)?;
        let index = self.next;
        self.next += 1;
        Some((index, value))
    }

    /// Index of the next result to be released.
    pub fn next_index(&self) -> usize {
        self.next
    }

    /// Results waiting behind a gap.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_releases_in_index_order() {
        let mut buffer = ReorderBuffer::new();
        buffer.push(2, "c");
        buffer.push(1, "b");
        assert_eq!(buffer.pop_ready(), None);
        assert_eq!(buffer.pending(), 2);

        buffer.push(0, "a");
        assert_eq!(buffer.pop_ready(), Some((0, "a")));
        assert_eq!(buffer.pop_ready(), Some((1, "b")));
        assert_eq!(buffer.pop_ready(), Some((2, "c")));
        assert_eq!(buffer.pop_ready(), None);
        assert_eq!(buffer.next_index(), 3);
    }

    #[test]
    fn test_stale_and_duplicate_indices_ignored() {
        let mut buffer = ReorderBuffer::new();
        buffer.push(0, 10);
        buffer.push(0, 11);
        assert_eq!(buffer.pop_ready(), Some((0, 10)));
        buffer.push(0, 12);
        assert_eq!(buffer.pending(), 0);
    }
}
