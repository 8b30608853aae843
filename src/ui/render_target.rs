//! Seams between the grid engine and whatever displays it
//!
//! The engine never touches a concrete display. It writes through a
//! `RenderTarget` and reads scroll geometry through a `Viewport`, both
//! handed to it at construction.

use std::collections::HashMap;

use crate::data::datatable::DisplayFragment;

/// Sort indicator shown in a header cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortIndicator {
    /// Column isn't the active sort
    #[default]
    Neutral,
    Ascending,
    Descending,
}

impl SortIndicator {
    pub fn is_active(self) -> bool {
        !matches!(self, SortIndicator::Neutral)
    }
}

/// One header cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCell {
    pub label: String,
    pub field: String,
    pub indicator: SortIndicator,
    /// Clicking sorts by this column
    pub clickable: bool,
}

/// Display surface primitives the engine needs
pub trait RenderTarget {
    /// Remove header, rows and layout
    fn clear(&mut self);

    /// Set the relative widths of the columns
    fn set_columns(&mut self, widths: &[u16]);

    fn clear_header(&mut self);

    fn append_header_cell(&mut self, cell: &HeaderCell);

    /// Remove every materialised data row (and the placeholder)
    fn remove_rows(&mut self);

    /// Append one data row; `index` is its position in the full view
    fn append_row(&mut self, index: usize, cells: Vec<DisplayFragment>);

    /// Show a single message spanning `span` columns instead of rows
    fn append_placeholder(&mut self, text: &str, span: usize);

    /// Translate the rendered block down by `offset_px`
    fn set_vertical_offset(&mut self, offset_px: u64);

    /// Current text of a filter input
    fn filter_input(&self, field: &str) -> Option<String>;

    fn set_filter_input(&mut self, field: &str, value: &str);
}

/// Scroll geometry of the visible area
pub trait Viewport {
    /// Visible height in pixels
    fn viewport_height(&self) -> u32;

    /// Pixels scrolled from the top
    fn scroll_offset(&self) -> u64;

    fn scroll_to(&mut self, offset_px: u64);
}

/// A row as it was handed to a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRow {
    pub index: usize,
    pub cells: Vec<DisplayFragment>,
}

/// In-memory target that records what the engine rendered
#[derive(Debug, Clone, Default)]
pub struct RecordingTarget {
    pub column_widths: Vec<u16>,
    pub header: Vec<HeaderCell>,
    pub rows: Vec<RenderedRow>,
    pub placeholder: Option<(String, usize)>,
    pub vertical_offset: u64,
    pub filter_inputs: HashMap<String, String>,
    /// Times the header was cleared for a redraw
    pub header_renders: usize,
    /// Times the data rows were replaced
    pub row_renders: usize,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text of one column across the materialised rows
    pub fn column_text(&self, column: usize) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|row| row.cells.get(column).map(|cell| cell.text.clone()))
            .collect()
    }

    pub fn filter_input_text(&self, field: &str) -> Option<&str> {
        self.filter_inputs.get(field).map(String::as_str)
    }

    /// View positions of the materialised rows
    pub fn row_indices(&self) -> Vec<usize> {
        self.rows.iter().map(|row| row.index).collect()
    }
}

impl RenderTarget for RecordingTarget {
    fn clear(&mut self) {
        self.column_widths.clear();
        self.header.clear();
        self.rows.clear();
        self.placeholder = None;
        self.vertical_offset = 0;
    }

    fn set_columns(&mut self, widths: &[u16]) {
        self.column_widths = widths.to_vec();
    }

    fn clear_header(&mut self) {
        self.header.clear();
        self.header_renders += 1;
    }

    fn append_header_cell(&mut self, cell: &HeaderCell) {
        self.header.push(cell.clone());
    }

    fn remove_rows(&mut self) {
        self.rows.clear();
        self.placeholder = None;
        self.row_renders += 1;
    }

    fn append_row(&mut self, index: usize, cells: Vec<DisplayFragment>) {
        self.rows.push(RenderedRow { index, cells });
    }

    fn append_placeholder(&mut self, text: &str, span: usize) {
        self.placeholder = Some((text.to_string(), span));
    }

    fn set_vertical_offset(&mut self, offset_px: u64) {
        self.vertical_offset = offset_px;
    }

    fn filter_input(&self, field: &str) -> Option<String> {
        self.filter_inputs.get(field).cloned()
    }

    fn set_filter_input(&mut self, field: &str, value: &str) {
        self.filter_inputs
            .insert(field.to_string(), value.to_string());
    }
}

/// Viewport with a fixed height and a settable scroll offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedViewport {
    pub height: u32,
    pub offset: u64,
}

impl FixedViewport {
    pub fn new(height: u32) -> Self {
        Self { height, offset: 0 }
    }
}

impl Viewport for FixedViewport {
    fn viewport_height(&self) -> u32 {
        self.height
    }

    fn scroll_offset(&self) -> u64 {
        self.offset
    }

    fn scroll_to(&mut self, offset_px: u64) {
        self.offset = offset_px;
    }
}
