//! Window calculation for virtual scrolling
//!
//! Maps a pixel scroll offset onto the slice of the current view that has
//! to be materialised. One viewport of rows is kept behind the visible
//! area and one ahead of it, so a window spans three viewports:
//!
//! DataView (sorted/filtered positions)
//!     → RenderWindow (rows [start, end) + vertical offset)
//!         → RenderTarget (only those rows exist)

use std::ops::Range;

/// How many viewports of rows a window spans
pub const OVERSCAN_FACTOR: usize = 3;

/// The materialised slice of the view
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderWindow {
    /// Half-open range of view positions
    pub rows: Range<usize>,
    /// Vertical translation of the rendered block, in pixels
    pub render_offset: u64,
}

impl RenderWindow {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Compute the window for a scroll position
///
/// `start = max(0, floor(offset / row_height) - capacity)`,
/// `end = min(total_rows, start + capacity * 3)`. A zero row height counts
/// as one pixel, and a scroll position past the content yields an empty
/// window at the end rather than an inverted range.
pub fn calculate_window(
    offset_px: u64,
    row_height: u32,
    capacity: usize,
    total_rows: usize,
) -> RenderWindow {
    if total_rows == 0 {
        return RenderWindow::default();
    }

    let row_height = u64::from(row_height.max(1));
    let first_visible = usize::try_from(offset_px / row_height).unwrap_or(usize::MAX);
    let start = first_visible.saturating_sub(capacity);
    let end = total_rows.min(start.saturating_add(capacity.saturating_mul(OVERSCAN_FACTOR)));
    let start = start.min(end);

    RenderWindow {
        rows: start..end,
        render_offset: start as u64 * row_height,
    }
}

/// Scroll position plus the fixed geometry of the rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollState {
    /// Pixels scrolled from the top of the full list
    pub offset_px: u64,
    /// Uniform height of every row
    pub row_height: u32,
    /// Rows that fit in the visible area
    pub capacity: usize,
}

impl ScrollState {
    pub fn new(row_height: u32, viewport_height: u32) -> Self {
        let row_height = row_height.max(1);
        Self {
            offset_px: 0,
            row_height,
            capacity: Self::capacity_for(viewport_height, row_height),
        }
    }

    /// Rows needed to cover a viewport, rounded up, never zero
    pub fn capacity_for(viewport_height: u32, row_height: u32) -> usize {
        let rows = viewport_height.div_ceil(row_height.max(1));
        (rows as usize).max(1)
    }

    pub fn with_offset(mut self, offset_px: u64) -> Self {
        self.offset_px = offset_px;
        self
    }

    pub fn resized(mut self, viewport_height: u32) -> Self {
        self.capacity = Self::capacity_for(viewport_height, self.row_height);
        self
    }

    pub fn at_top(self) -> Self {
        self.with_offset(0)
    }

    /// Window over a view of `total_rows` rows at this position
    pub fn window(&self, total_rows: usize) -> RenderWindow {
        calculate_window(self.offset_px, self.row_height, self.capacity, total_rows)
    }

    /// Total height of a list of `total_rows` rows
    pub fn content_height(&self, total_rows: usize) -> u64 {
        total_rows as u64 * u64::from(self.row_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_at_top() {
        let window = calculate_window(0, 50, 20, 1000);
        assert_eq!(window.rows, 0..60);
        assert_eq!(window.render_offset, 0);
    }

    #[test]
    fn test_window_scrolled() {
        let window = calculate_window(5000, 50, 20, 1000);
        assert_eq!(window.rows, 80..140);
        assert_eq!(window.render_offset, 4000);
    }

    #[test]
    fn test_window_within_first_viewport_keeps_start() {
        // floor(900 / 50) = 18 is still inside the lookbehind buffer
        let window = calculate_window(900, 50, 20, 1000);
        assert_eq!(window.rows, 0..60);
    }

    #[test]
    fn test_window_clamped_at_end() {
        let window = calculate_window(49_000, 50, 20, 1000);
        assert_eq!(window.rows, 960..1000);
        assert_eq!(window.render_offset, 48_000);
    }

    #[test]
    fn test_empty_dataset() {
        for offset in [0, 50, 1_000_000] {
            let window = calculate_window(offset, 50, 20, 0);
            assert!(window.is_empty());
            assert_eq!(window.render_offset, 0);
        }
    }

    #[test]
    fn test_scrolled_past_content() {
        let window = calculate_window(1_000_000, 50, 20, 10);
        assert!(window.is_empty());
        assert!(window.rows.start <= window.rows.end);
    }

    #[test]
    fn test_zero_row_height() {
        let window = calculate_window(100, 0, 10, 1000);
        assert_eq!(window.rows, 90..120);
    }

    #[test]
    fn test_capacity_rounds_up() {
        assert_eq!(ScrollState::capacity_for(1000, 50), 20);
        assert_eq!(ScrollState::capacity_for(1010, 50), 21);
        assert_eq!(ScrollState::capacity_for(0, 50), 1);
    }

    #[test]
    fn test_scroll_state_window() {
        let state = ScrollState::new(50, 1000).with_offset(5000);
        assert_eq!(state.capacity, 20);
        assert_eq!(state.window(1000).rows, 80..140);
        assert_eq!(state.at_top().window(1000).rows, 0..60);
        assert_eq!(state.content_height(1000), 50_000);
    }
}
