//! Block height seam.

/// Source of the ledger's current height.
pub trait HeightProvider {
    fn current_height(&self) -> i64;
}

/// A fixed height. Handy when the caller already knows the block it is in.
impl HeightProvider for i64 {
    fn current_height(&self) -> i64 {
        *self
    }
}

/// Height set explicitly by the host (block executor, tests).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManualHeight {
    height: i64,
}

impl ManualHeight {
    #[must_use]
    pub fn new(height: i64) -> Self {
        Self { height }
    }

    pub fn set(&mut self, height: i64) {
        self.height = height;
    }

    /// Move forward `blocks` heights.
    pub fn advance(&mut self, blocks: i64) {
        self.height = self.height.saturating_add(blocks);
    }
}

impl HeightProvider for ManualHeight {
    fn current_height(&self) -> i64 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_height_set_and_advance() {
        let mut h = ManualHeight::new(20);
        assert_eq!(h.current_height(), 20);
        h.advance(10);
        assert_eq!(h.current_height(), 30);
        h.set(5);
        assert_eq!(h.current_height(), 5);
    }

    #[test]
    fn advance_saturates() {
        let mut h = ManualHeight::new(i64::MAX - 1);
        h.advance(5);
        assert_eq!(h.current_height(), i64::MAX);
    }

    #[test]
    fn fixed_height() {
        assert_eq!(42_i64.current_height(), 42);
    }
}
