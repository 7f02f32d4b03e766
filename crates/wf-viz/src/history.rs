//! History ring for the 3D waterfall
//!
//! `depth` rows of `bins` dB values in one flat buffer. `head` is the row
//! written next, so the newest row sits at `head - 1` (mod depth).

use wf_core::{ReceiverDisplayState, SENTINEL_DB};

/// Fixed-depth circular buffer of spectrum rows
#[derive(Debug, Clone)]
pub struct HistoryRing {
    depth: usize,
    bins: usize,
    head: usize,
    cells: Vec<f32>,
}

impl HistoryRing {
    /// Create a ring filled with the sentinel floor
    pub fn new(depth: usize, bins: usize) -> Self {
        Self {
            depth,
            bins,
            head: 0,
            cells: vec![SENTINEL_DB; depth * bins],
        }
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn bins(&self) -> usize {
        self.bins
    }

    #[inline]
    pub fn head(&self) -> usize {
        self.head
    }

    #[inline]
    pub fn cells(&self) -> &[f32] {
        &self.cells
    }

    /// Reallocate for a new bin count. Returns `false` if nothing changed.
    pub fn resize(&mut self, bins: usize) -> bool {
        if bins == self.bins {
            return false;
        }
        self.bins = bins;
        self.cells.clear();
        self.cells.resize(self.depth * bins, SENTINEL_DB);
        self.head = 0;
        true
    }

    /// Forget every row
    pub fn reset(&mut self) {
        self.cells.fill(SENTINEL_DB);
        self.head = 0;
    }

    /// Write the receiver's spectrum into the head row and advance.
    ///
    /// Bin `i` reads sample `i + pan`; anything outside the capture is
    /// stored as the sentinel.
    pub fn push_row(&mut self, rx: &ReceiverDisplayState, pan: i32) {
        if self.depth == 0 || self.bins == 0 {
            return;
        }
        let start = self.head * self.bins;
        let row = &mut self.cells[start..start + self.bins];
        for (i, cell) in row.iter_mut().enumerate() {
            *cell = rx.sample_at(i as i64 + pan as i64).unwrap_or(SENTINEL_DB);
        }
        self.head = (self.head + 1) % self.depth;
    }

    /// Move every row sideways by `units` bins (positive = right), filling
    /// the vacated strip with the sentinel.
    pub fn shift(&mut self, units: i32) {
        if units == 0 || self.bins == 0 {
            return;
        }
        let n = (units.unsigned_abs() as usize).min(self.bins);
        let bins = self.bins;

        for row in self.cells.chunks_exact_mut(bins) {
            if units > 0 {
                row.copy_within(0..bins - n, n);
                row[..n].fill(SENTINEL_DB);
            } else {
                row.copy_within(n..bins, 0);
                row[bins - n..].fill(SENTINEL_DB);
            }
        }
    }

    /// Row by age, 0 = newest. Ages wrap around the depth.
    pub fn row(&self, age: usize) -> &[f32] {
        let idx = (self.head + self.depth - 1 - age % self.depth) % self.depth;
        &self.cells[idx * self.bins..(idx + 1) * self.bins]
    }

    #[inline]
    pub fn newest(&self) -> &[f32] {
        self.row(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wf_core::WaterfallMode;

    fn receiver(samples: Vec<f32>) -> ReceiverDisplayState {
        let mut rx = ReceiverDisplayState::new(0, WaterfallMode::Mesh3D, 48_000, samples.len());
        rx.pixel_samples = samples;
        rx
    }

    #[test]
    fn test_new_ring_is_sentinel() {
        let ring = HistoryRing::new(4, 8);
        assert_eq!(ring.cells().len(), 32);
        assert!(ring.cells().iter().all(|&c| c == SENTINEL_DB));
        assert_eq!(ring.head(), 0);
    }

    #[test]
    fn test_push_advances_head_and_wraps() {
        let mut ring = HistoryRing::new(3, 2);
        for v in 0..4 {
            ring.push_row(&receiver(vec![v as f32; 2]), 0);
        }
        assert_eq!(ring.head(), 1);
        assert_eq!(ring.newest(), &[3.0, 3.0]);
        assert_eq!(ring.row(1), &[2.0, 2.0]);
        assert_eq!(ring.row(2), &[1.0, 1.0]);
    }

    #[test]
    fn test_out_of_range_source_is_sentinel() {
        let mut ring = HistoryRing::new(3, 4);
        ring.push_row(&receiver(vec![-50.0, -60.0, -70.0]), 1);
        assert_eq!(ring.newest(), &[-60.0, -70.0, SENTINEL_DB, SENTINEL_DB]);

        ring.push_row(&receiver(vec![-50.0, -60.0, -70.0]), -2);
        assert_eq!(ring.newest(), &[SENTINEL_DB, SENTINEL_DB, -50.0, -60.0]);
    }

    #[test]
    fn test_shift_conservation() {
        let mut ring = HistoryRing::new(3, 6);
        for r in 0..3 {
            let row: Vec<f32> = (0..6).map(|i| -(r * 10 + i) as f32).collect();
            ring.push_row(&receiver(row), 0);
        }
        let before = ring.cells().to_vec();

        ring.shift(-2);
        ring.shift(2);

        for (row_before, row_after) in before.chunks(6).zip(ring.cells().chunks(6)) {
            assert_eq!(&row_after[2..], &row_before[2..]);
            assert_eq!(&row_after[..2], &[SENTINEL_DB, SENTINEL_DB]);
        }
    }

    #[test]
    fn test_shift_right_fills_left() {
        let mut ring = HistoryRing::new(3, 4);
        ring.push_row(&receiver(vec![1.0, 2.0, 3.0, 4.0]), 0);
        ring.shift(1);
        assert_eq!(ring.newest(), &[SENTINEL_DB, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_shift_past_width_clears() {
        let mut ring = HistoryRing::new(3, 4);
        ring.push_row(&receiver(vec![1.0; 4]), 0);
        ring.shift(9);
        assert!(ring.cells().iter().all(|&c| c == SENTINEL_DB));
    }

    #[test]
    fn test_resize_resets() {
        let mut ring = HistoryRing::new(3, 4);
        ring.push_row(&receiver(vec![1.0; 4]), 0);

        assert!(!ring.resize(4));
        assert_eq!(ring.head(), 1);

        assert!(ring.resize(5));
        assert_eq!(ring.bins(), 5);
        assert_eq!(ring.head(), 0);
        assert_eq!(ring.cells().len(), 15);
        assert!(ring.cells().iter().all(|&c| c == SENTINEL_DB));
    }

    #[test]
    fn test_reset() {
        let mut ring = HistoryRing::new(3, 4);
        ring.push_row(&receiver(vec![1.0; 4]), 0);
        ring.reset();
        assert_eq!(ring.head(), 0);
        assert!(ring.cells().iter().all(|&c| c == SENTINEL_DB));
    }
}
