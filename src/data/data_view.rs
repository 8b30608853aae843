use std::cmp::Ordering;
use std::ops::Range;
use std::sync::Arc;

use crate::data::datatable::{ColumnKind, Row};
use crate::data::datavalue_compare::compare_directed;
use crate::data::filter::FilterState;

/// Sort order for columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

/// A view over an immutable row snapshot that can filter and sort
/// without modifying the underlying rows
#[derive(Clone, Debug)]
pub struct DataView {
    /// The snapshot taken at load time
    source: Arc<[Row]>,

    /// Positions into `source`, in display order
    visible_rows: Vec<usize>,
}

impl DataView {
    /// Create a view showing every source row in load order
    pub fn new(source: Arc<[Row]>) -> Self {
        let row_count = source.len();
        Self {
            source,
            visible_rows: (0..row_count).collect(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Arc::from(Vec::<Row>::new()))
    }

    /// Create a view of the source rows that pass `filter`, in load order
    pub fn filtered(source: Arc<[Row]>, filter: &FilterState) -> Self {
        let visible_rows = filter.apply(&source);
        Self {
            source,
            visible_rows,
        }
    }

    /// Stable sort of the visible rows by one field
    ///
    /// Declared kinds give a total order, so the std sort applies. Untyped
    /// columns infer a type per pair, which isn't transitive across mixed
    /// values, so they go through a merge sort that accepts any comparator.
    pub fn sort_by(&mut self, field: &str, kind: ColumnKind, order: SortOrder) {
        let source = &self.source;
        let compare = |a: &usize, b: &usize| {
            compare_directed(source[*a].value(field), source[*b].value(field), kind, order)
        };

        if kind == ColumnKind::Auto {
            merge_sort_by(&mut self.visible_rows, compare);
        } else {
            self.visible_rows.sort_by(compare);
        }
    }

    /// Show every source row again, in load order
    pub fn reset(&mut self) {
        self.visible_rows = (0..self.source.len()).collect();
    }

    /// Number of rows in the view
    pub fn row_count(&self) -> usize {
        self.visible_rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible_rows.is_empty()
    }

    /// Number of rows in the snapshot
    pub fn source_row_count(&self) -> usize {
        self.source.len()
    }

    /// Get a row by its position in the view
    pub fn get_row(&self, index: usize) -> Option<&Row> {
        let row_idx = *self.visible_rows.get(index)?;
        self.source.get(row_idx)
    }

    /// Rows in a view range, paired with their view position
    pub fn rows_in(&self, range: Range<usize>) -> impl Iterator<Item = (usize, &Row)> + '_ {
        let end = range.end.min(self.visible_rows.len());
        let start = range.start.min(end);
        self.visible_rows[start..end]
            .iter()
            .enumerate()
            .filter_map(move |(offset, &row_idx)| {
                self.source.get(row_idx).map(|row| (start + offset, row))
            })
    }

    /// All rows in display order
    pub fn rows(&self) -> impl Iterator<Item = &Row> + '_ {
        self.rows_in(0..self.visible_rows.len()).map(|(_, row)| row)
    }

    /// The snapshot this view reads from
    pub fn source(&self) -> &Arc<[Row]> {
        &self.source
    }

    /// Visible positions into the snapshot
    pub fn visible_row_indices(&self) -> &[usize] {
        &self.visible_rows
    }
}

/// Stable top-down merge sort; never panics on inconsistent comparators
fn merge_sort_by<F>(items: &mut Vec<usize>, mut compare: F)
where
    F: FnMut(&usize, &usize) -> Ordering,
{
    if items.len() < 2 {
        return;
    }
    let mut scratch = items.clone();
    let len = items.len();
    merge_pass(&mut scratch, items, 0, len, &mut compare);
}

/// Sorts `dst[lo..hi]`, using `src[lo..hi]` (same contents) as scratch
fn merge_pass<F>(src: &mut [usize], dst: &mut [usize], lo: usize, hi: usize, compare: &mut F)
where
    F: FnMut(&usize, &usize) -> Ordering,
{
    if hi - lo < 2 {
        return;
    }
    let mid = lo + (hi - lo) / 2;
    // Sort both halves into src, then merge back into dst
    merge_pass(dst, src, lo, mid, compare);
    merge_pass(dst, src, mid, hi, compare);

    let (mut i, mut j) = (lo, mid);
    for slot in dst[lo..hi].iter_mut() {
        // Take from the left on ties to keep the sort stable
        let take_left = j >= hi || (i < mid && compare(&src[i], &src[j]) != Ordering::Greater);
        if take_left {
            *slot = src[i];
            i += 1;
        } else {
            *slot = src[j];
            j += 1;
        }
    }
}
