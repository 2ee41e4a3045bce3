use serde::Serialize;

pub const DEFAULT_OVERSCAN: usize = 5;

/// Items to materialize for one viewport position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibleRange {
    pub start_index: usize,
    /// Exclusive.
    pub end_index: usize,
    pub total_extent: f64,
    /// Start offset of each materialized item, `start_index + i` at `[i]`.
    pub item_offsets: Vec<f64>,
}

impl VisibleRange {
    pub fn empty(total_extent: f64) -> Self {
        VisibleRange {
            start_index: 0,
            end_index: 0,
            total_extent,
            item_offsets: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.start_index == self.end_index
    }
}

/// `offsets[i]` is where item `i` starts; `offsets[n]` is the total extent.
fn prefix_offsets(extents: &[f64]) -> Vec<f64> {
    let mut offsets = Vec::with_capacity(extents.len() + 1);
    let mut acc = 0.0;
    offsets.push(acc);
    for extent in extents {
        acc += extent.max(0.0);
        offsets.push(acc);
    }
    offsets
}

/// Items intersecting `[scroll_offset, scroll_offset + container_height]`,
/// widened by `overscan` items on each side.
pub fn compute_visible_range(
    scroll_offset: f64,
    container_height: f64,
    extents: &[f64],
    overscan: usize,
) -> VisibleRange {
    let n = extents.len();
    let offsets = prefix_offsets(extents);
    let total = offsets[n];
    if n == 0 || container_height <= 0.0 {
        return VisibleRange::empty(total);
    }

    let top = scroll_offset.clamp(0.0, total);
    let bottom = top + container_height;

    // First item whose end lies past the top edge.
    let first = offsets[1..].partition_point(|&end| end <= top).min(n - 1);
    // Items starting before the bottom edge.
    let last = offsets[..n].partition_point(|&start| start < bottom).max(first + 1);

    let start_index = first.saturating_sub(overscan);
    let end_index = last.saturating_add(overscan).min(n);
    VisibleRange {
        start_index,
        end_index,
        total_extent: total,
        item_offsets: offsets[start_index..end_index].to_vec(),
    }
}

/// Scroll state for a variable-extent list: every item starts at the
/// estimated extent and is corrected once measured.
#[derive(Debug, Clone)]
pub struct Virtualizer {
    estimate: f64,
    measured: Vec<Option<f64>>,
    scroll_offset: f64,
    viewport_height: f64,
    overscan: usize,
}

impl Virtualizer {
    pub fn new(estimate: f64, viewport_height: f64, overscan: usize) -> Self {
        Virtualizer {
            estimate: estimate.max(0.0),
            measured: Vec::new(),
            scroll_offset: 0.0,
            viewport_height: viewport_height.max(0.0),
            overscan,
        }
    }

    pub fn count(&self) -> usize {
        self.measured.len()
    }

    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    pub fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    pub fn estimate(&self) -> f64 {
        self.estimate
    }

    pub fn extent(&self, index: usize) -> f64 {
        self.measured
            .get(index)
            .copied()
            .flatten()
            .unwrap_or(self.estimate)
    }

    pub fn extents(&self) -> Vec<f64> {
        (0..self.count()).map(|i| self.extent(i)).collect()
    }

    pub fn offset_of(&self, index: usize) -> f64 {
        (0..index.min(self.count())).map(|i| self.extent(i)).sum()
    }

    pub fn total_extent(&self) -> f64 {
        self.offset_of(self.count())
    }

    pub fn max_scroll(&self) -> f64 {
        (self.total_extent() - self.viewport_height).max(0.0)
    }

    /// Collection size changed. Measurements are per position, so callers
    /// that reorder items must also call `clear_measurements`.
    pub fn set_count(&mut self, count: usize) {
        self.measured.resize(count, None);
        self.clamp_scroll();
    }

    /// Forget every measurement; all items go back to the estimate.
    pub fn clear_measurements(&mut self) {
        self.measured.iter_mut().for_each(|m| *m = None);
        self.clamp_scroll();
    }

    /// New estimate (density changed); every measurement is stale.
    pub fn set_estimate(&mut self, estimate: f64) {
        self.estimate = estimate.max(0.0);
        self.clear_measurements();
    }

    pub fn set_viewport_height(&mut self, height: f64) {
        self.viewport_height = height.max(0.0);
        self.clamp_scroll();
    }

    pub fn scroll_to(&mut self, offset: f64) {
        self.scroll_offset = offset;
        self.clamp_scroll();
    }

    /// Record the real extent of one item. An item starting above the
    /// viewport top shifts the scroll offset by the correction so visible
    /// content stays put. Returns true if anything changed.
    pub fn measure(&mut self, index: usize, extent: f64) -> bool {
        if index >= self.count() || !extent.is_finite() {
            log::debug!("Ignoring measurement {extent} for item {index} of {}", self.count());
            return false;
        }
        let extent = extent.max(0.0);
        let old = self.extent(index);
        self.measured[index] = Some(extent);
        if old == extent {
            return false;
        }
        let delta = extent - old;
        if self.offset_of(index) < self.scroll_offset {
            self.scroll_offset += delta;
        }
        self.clamp_scroll();
        true
    }

    pub fn visible_range(&self) -> VisibleRange {
        compute_visible_range(
            self.scroll_offset,
            self.viewport_height,
            &self.extents(),
            self.overscan,
        )
    }

    fn clamp_scroll(&mut self) {
        let max = self.max_scroll();
        if !self.scroll_offset.is_finite() {
            self.scroll_offset = 0.0;
        }
        self.scroll_offset = self.scroll_offset.clamp(0.0, max);
    }
}
