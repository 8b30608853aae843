//! Grid state and the pure action reducer
//!
//! Every user action is a `GridAction`. `GridState::update` applies one in
//! place and returns a `RenderInstruction` describing what the display has
//! to redo; `reduce` is the by-value form. Nothing here touches a display;
//! `GridEngine` applies the instructions.

use std::sync::Arc;
use tracing::debug;

use crate::data::data_view::{DataView, SortOrder};
use crate::data::datatable::{ColumnDescriptor, Row};
use crate::data::filter::FilterState;
use crate::ui::render_target::{HeaderCell, SortIndicator};
use crate::ui::viewport::{RenderWindow, ScrollState};

/// Active sort column and direction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortState {
    pub field: Option<String>,
    pub order: SortOrder,
}

impl SortState {
    pub fn none() -> Self {
        Self::default()
    }

    /// State after the header of `field` is clicked
    ///
    /// The active column flips direction; any other column starts ascending.
    pub fn next(&self, field: &str) -> Self {
        if self.field.as_deref() == Some(field) {
            Self {
                field: self.field.clone(),
                order: self.order.toggled(),
            }
        } else {
            Self {
                field: Some(field.to_string()),
                order: SortOrder::Ascending,
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.field.is_some()
    }

    pub fn indicator(&self, field: &str) -> SortIndicator {
        match (&self.field, self.order) {
            (Some(active), SortOrder::Ascending) if active == field => SortIndicator::Ascending,
            (Some(active), SortOrder::Descending) if active == field => SortIndicator::Descending,
            _ => SortIndicator::Neutral,
        }
    }
}

/// User intents the grid reacts to
#[derive(Debug, Clone)]
pub enum GridAction {
    /// Replace the dataset with a fresh snapshot
    Load(Vec<Row>),
    /// Header of a column was clicked
    Sort(String),
    /// Filter submitted
    Filter(FilterState),
    /// Filters and sort cleared
    Reset,
    /// Viewport scrolled to a pixel offset
    Scroll(u64),
    /// Viewport height changed
    Resize(u32),
}

/// What the display has to redo after an action
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderInstruction {
    /// Clear the surface and set column widths again
    pub relayout: bool,
    /// Header cells to draw
    pub header: Option<Vec<HeaderCell>>,
    /// Slice of the view to materialise
    pub window: Option<RenderWindow>,
    /// Blank every filter input
    pub clear_filter_inputs: bool,
    /// Move the viewport to this offset first
    pub scroll_to: Option<u64>,
}

impl RenderInstruction {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

/// Everything the grid knows, as a single value
#[derive(Debug, Clone)]
pub struct GridState {
    columns: Arc<[ColumnDescriptor]>,
    view: DataView,
    sort: SortState,
    filter: FilterState,
    scroll: ScrollState,
}

impl GridState {
    /// Empty grid; rows arrive with `GridAction::Load`
    pub fn new(columns: Arc<[ColumnDescriptor]>, scroll: ScrollState) -> Self {
        Self {
            columns,
            view: DataView::empty(),
            sort: SortState::none(),
            filter: FilterState::new(),
            scroll,
        }
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn view(&self) -> &DataView {
        &self.view
    }

    pub fn sort(&self) -> &SortState {
        &self.sort
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn scroll(&self) -> ScrollState {
        self.scroll
    }

    pub fn column(&self, field: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|col| col.field == field)
    }

    /// Header cells reflecting the current sort
    pub fn header(&self) -> Vec<HeaderCell> {
        self.columns
            .iter()
            .map(|col| HeaderCell {
                label: col.label.clone(),
                field: col.field.clone(),
                indicator: self.sort.indicator(&col.field),
                clickable: col.sortable,
            })
            .collect()
    }

    /// Window at the current scroll position
    pub fn window(&self) -> RenderWindow {
        self.scroll.window(self.view.row_count())
    }

    /// Apply an action, returning the new state
    pub fn reduce(mut self, action: GridAction) -> (Self, RenderInstruction) {
        let instruction = self.update(action);
        (self, instruction)
    }

    /// Apply an action in place
    pub fn update(&mut self, action: GridAction) -> RenderInstruction {
        match action {
            GridAction::Load(rows) => self.load(rows),
            GridAction::Sort(field) => self.sort_by(&field),
            GridAction::Filter(filter) => self.apply_filter(filter),
            GridAction::Reset => self.reset(),
            GridAction::Scroll(offset_px) => self.scroll_to(offset_px),
            GridAction::Resize(height) => self.resize(height),
        }
    }

    /// Record the viewport offset without rendering anything
    pub fn track_offset(&mut self, offset_px: u64) {
        self.scroll = self.scroll.with_offset(offset_px);
    }

    fn load(&mut self, rows: Vec<Row>) -> RenderInstruction {
        debug!(target: "grid", "Loading {} rows", rows.len());
        self.view = DataView::new(Arc::from(rows));
        self.sort = SortState::none();
        self.filter = FilterState::new();
        self.scroll = self.scroll.at_top();

        self.full_render(true)
    }

    fn sort_by(&mut self, field: &str) -> RenderInstruction {
        let kind = self
            .column(field)
            .filter(|col| col.sortable)
            .map(|col| col.kind);
        let Some(kind) = kind else {
            debug!(target: "grid", "Ignoring sort on '{}' (not a sortable column)", field);
            return RenderInstruction::none();
        };

        self.sort = self.sort.next(field);
        debug!(target: "grid", "Sorting by '{}' {:?}", field, self.sort.order);
        self.view.sort_by(field, kind, self.sort.order);

        RenderInstruction {
            header: Some(self.header()),
            window: Some(self.window()),
            ..RenderInstruction::none()
        }
    }

    fn apply_filter(&mut self, filter: FilterState) -> RenderInstruction {
        self.filter = filter.restricted_to(&self.columns);
        self.view = DataView::filtered(Arc::clone(self.view.source()), &self.filter);
        self.reapply_sort();
        self.scroll = self.scroll.at_top();
        debug!(
            target: "grid",
            "Filter {:?} kept {} of {} rows",
            self.filter,
            self.view.row_count(),
            self.view.source_row_count()
        );

        self.full_render(false)
    }

    fn reset(&mut self) -> RenderInstruction {
        debug!(target: "grid", "Resetting filters and sort");
        self.filter = FilterState::new();
        self.sort = SortState::none();
        self.view.reset();
        self.scroll = self.scroll.at_top();

        self.full_render(true)
    }

    fn scroll_to(&mut self, offset_px: u64) -> RenderInstruction {
        self.track_offset(offset_px);
        RenderInstruction {
            window: Some(self.window()),
            ..RenderInstruction::none()
        }
    }

    fn resize(&mut self, viewport_height: u32) -> RenderInstruction {
        self.scroll = self.scroll.resized(viewport_height);
        RenderInstruction {
            window: Some(self.window()),
            ..RenderInstruction::none()
        }
    }

    /// Sort the filtered view again by the active sort, if any
    fn reapply_sort(&mut self) {
        let Some(field) = self.sort.field.clone() else {
            return;
        };
        let kind = self.column(&field).map(|col| col.kind).unwrap_or_default();
        self.view.sort_by(&field, kind, self.sort.order);
    }

    fn full_render(&self, clear_filter_inputs: bool) -> RenderInstruction {
        RenderInstruction {
            relayout: true,
            header: Some(self.header()),
            window: Some(self.window()),
            clear_filter_inputs,
            scroll_to: Some(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::datatable::{CellValue, ColumnKind};

    fn columns() -> Arc<[ColumnDescriptor]> {
        Arc::from(vec![
            ColumnDescriptor::new("Name", "name")
                .sortable(true)
                .filterable(true),
            ColumnDescriptor::new("Age", "age")
                .sortable(true)
                .filterable(true)
                .with_kind(ColumnKind::Number),
            ColumnDescriptor::new("Note", "note"),
        ])
    }

    fn rows() -> Vec<Row> {
        [("John", 45.0), ("Amy", 22.0), ("Joan", 60.0)]
            .iter()
            .map(|(name, age)| {
                [
                    ("name", CellValue::String(name.to_string())),
                    ("age", CellValue::Number(*age)),
                    ("note", CellValue::String("n".to_string())),
                ]
                .into_iter()
                .collect()
            })
            .collect()
    }

    fn loaded() -> GridState {
        GridState::new(columns(), ScrollState::new(50, 1000))
            .reduce(GridAction::Load(rows()))
            .0
    }

    fn names(state: &GridState) -> Vec<String> {
        state
            .view()
            .rows()
            .map(|row| row.value("name").to_string())
            .collect()
    }

    #[test]
    fn test_sort_state_toggles() {
        let sort = SortState::none().next("age");
        assert_eq!(sort.order, SortOrder::Ascending);
        let sort = sort.next("age");
        assert_eq!(sort.order, SortOrder::Descending);
        let sort = sort.next("age");
        assert_eq!(sort.order, SortOrder::Ascending);
        let sort = sort.next("name");
        assert_eq!(sort.field.as_deref(), Some("name"));
        assert_eq!(sort.order, SortOrder::Ascending);
    }

    #[test]
    fn test_load_renders_everything() {
        let (state, instruction) = GridState::new(columns(), ScrollState::new(50, 1000))
            .reduce(GridAction::Load(rows()));
        assert_eq!(state.view().row_count(), 3);
        assert!(instruction.relayout);
        assert_eq!(instruction.header.map(|h| h.len()), Some(3));
        assert_eq!(instruction.window.map(|w| w.rows), Some(0..3));
    }

    #[test]
    fn test_sort_updates_header_and_window_only() {
        let (state, instruction) = loaded().reduce(GridAction::Sort("age".into()));
        assert_eq!(names(&state), vec!["Amy", "John", "Joan"]);
        assert!(!instruction.relayout);
        assert!(instruction.scroll_to.is_none());
        let header = instruction.header.unwrap();
        assert_eq!(header[1].indicator, SortIndicator::Ascending);
        assert_eq!(header[0].indicator, SortIndicator::Neutral);
    }

    #[test]
    fn test_sort_on_unsortable_column_is_noop() {
        let (state, instruction) = loaded().reduce(GridAction::Sort("note".into()));
        assert!(instruction.is_noop());
        assert!(!state.sort().is_active());

        let (_, instruction) = state.reduce(GridAction::Sort("missing".into()));
        assert!(instruction.is_noop());
    }

    #[test]
    fn test_filter_keeps_active_sort() {
        let (state, _) = loaded().reduce(GridAction::Sort("age".into()));
        let (state, _) = state.reduce(GridAction::Sort("age".into()));
        let (state, instruction) =
            state.reduce(GridAction::Filter(FilterState::new().with_prefix("name", "jo")));

        assert_eq!(names(&state), vec!["Joan", "John"]);
        assert_eq!(state.sort().order, SortOrder::Descending);
        assert_eq!(instruction.scroll_to, Some(0));
        assert!(!instruction.clear_filter_inputs);
    }

    #[test]
    fn test_filter_ignores_unfilterable_fields() {
        let (state, _) =
            loaded().reduce(GridAction::Filter(FilterState::new().with_prefix("note", "zzz")));
        assert_eq!(state.view().row_count(), 3);
        assert!(state.filter().is_empty());
    }

    #[test]
    fn test_reset_restores_original_order() {
        let (state, _) = loaded().reduce(GridAction::Sort("name".into()));
        let (state, _) =
            state.reduce(GridAction::Filter(FilterState::new().with_prefix("name", "j")));
        let (state, instruction) = state.reduce(GridAction::Reset);

        assert_eq!(names(&state), vec!["John", "Amy", "Joan"]);
        assert!(!state.sort().is_active());
        assert!(instruction.clear_filter_inputs);
        assert!(instruction
            .header
            .unwrap()
            .iter()
            .all(|cell| cell.indicator == SortIndicator::Neutral));
    }

    #[test]
    fn test_scroll_only_touches_window() {
        let (state, instruction) = loaded().reduce(GridAction::Scroll(500));
        assert_eq!(state.scroll().offset_px, 500);
        assert!(instruction.header.is_none());
        assert!(!instruction.relayout);
        assert!(instruction.window.is_some());
    }

    #[test]
    fn test_tracked_offset_carries_into_sort() {
        let mut state = loaded();
        state.track_offset(5000);
        let instruction = state.update(GridAction::Sort("age".into()));

        assert_eq!(state.scroll().offset_px, 5000);
        assert_eq!(state.sort().field.as_deref(), Some("age"));
        // Past the three rows, so the window is empty at the end
        assert_eq!(instruction.window.map(|w| w.rows), Some(3..3));
        assert!(instruction.scroll_to.is_none());
    }

    #[test]
    fn test_resize_changes_capacity() {
        let (state, _) = loaded().reduce(GridAction::Resize(100));
        assert_eq!(state.scroll().capacity, 2);
    }
}
