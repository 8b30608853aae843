//! GridEngine - applies grid actions to a display
//!
//! The engine owns the `GridState`, a `RenderTarget` and a `Viewport`.
//! Each user action runs the pure reducer and then replays the resulting
//! `RenderInstruction` on the target. Scroll events go through a
//! `Throttle` so bursts recompute the window at most once per interval.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::data::data_source::DataSource;
use crate::data::datatable::{ColumnDescriptor, Row};
use crate::data::filter::FilterState;
use crate::throttle::Throttle;
use crate::ui::grid_state::{GridAction, GridState, RenderInstruction};
use crate::ui::render_target::{RenderTarget, Viewport};
use crate::ui::viewport::{RenderWindow, ScrollState};

/// Default time between two scroll recomputations
pub const DEFAULT_SCROLL_THROTTLE_MS: u64 = 50;

/// Default uniform row height in pixels
pub const DEFAULT_ROW_HEIGHT: u32 = 50;

/// Notifications a host forwards from its display
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridEvent {
    /// A header cell was clicked
    SortClicked(String),
    /// The filter button was pressed
    FilterClicked,
    /// The reset button was pressed
    ResetClicked,
    /// The viewport reported a new scroll position
    Scrolled,
    /// The viewport changed size
    Resized,
}

/// Engine settings that aren't column configuration
#[derive(Debug, Clone)]
pub struct GridSettings {
    pub row_height: u32,
    pub scroll_throttle_ms: u64,
    /// Text shown when there are no rows
    pub placeholder: String,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            row_height: DEFAULT_ROW_HEIGHT,
            scroll_throttle_ms: DEFAULT_SCROLL_THROTTLE_MS,
            placeholder: "No data found".to_string(),
        }
    }
}

pub struct GridEngine<T: RenderTarget, V: Viewport> {
    state: GridState,
    target: T,
    viewport: V,
    throttle: Throttle,
    placeholder: String,
}

impl<T: RenderTarget, V: Viewport> GridEngine<T, V> {
    pub fn new(columns: Vec<ColumnDescriptor>, target: T, viewport: V, settings: GridSettings) -> Self {
        let scroll = ScrollState::new(settings.row_height, viewport.viewport_height());
        Self {
            state: GridState::new(Arc::from(columns), scroll),
            target,
            viewport,
            throttle: Throttle::new(settings.scroll_throttle_ms),
            placeholder: settings.placeholder,
        }
    }

    /// Fetch from `source` and show the rows
    ///
    /// A failed fetch is logged and shown as an empty grid.
    pub async fn load<S: DataSource + ?Sized>(&mut self, source: &S) {
        let rows = match source.fetch().await {
            Ok(rows) => {
                info!(target: "grid", "Fetched {} rows from {}", rows.len(), source.describe());
                rows
            }
            Err(e) => {
                error!(target: "grid", "Error fetching data from {}: {:#}", source.describe(), e);
                Vec::new()
            }
        };
        self.load_rows(rows);
    }

    /// Show an already fetched set of rows
    pub fn load_rows(&mut self, rows: Vec<Row>) {
        self.dispatch(GridAction::Load(rows));
    }

    /// Sort by a column, or flip the direction if it is already active
    pub fn sort(&mut self, field: &str) {
        self.dispatch(GridAction::Sort(field.to_string()));
    }

    /// Filter using the text currently in the target's filter inputs
    pub fn apply_filter(&mut self) {
        let filter = FilterState::from_inputs(
            self.state
                .columns()
                .iter()
                .filter(|col| col.filterable)
                .filter_map(|col| {
                    self.target
                        .filter_input(&col.field)
                        .map(|text| (col.field.clone(), text))
                })
                .collect::<Vec<_>>(),
        );
        self.filter(filter);
    }

    pub fn filter(&mut self, filter: FilterState) {
        self.dispatch(GridAction::Filter(filter));
    }

    pub fn reset(&mut self) {
        self.dispatch(GridAction::Reset);
    }

    /// Scroll notification; runs now or is coalesced into a trailing run
    pub fn on_scroll(&mut self, now: Instant) {
        if self.throttle.submit(now) {
            self.recompute_scroll();
        }
    }

    /// Run a coalesced scroll whose interval has elapsed; call from the
    /// host's event loop tick
    pub fn poll_scroll(&mut self, now: Instant) {
        if self.throttle.poll(now) {
            self.recompute_scroll();
        }
    }

    /// Re-read the viewport height
    pub fn resize(&mut self) {
        let height = self.viewport.viewport_height();
        self.dispatch(GridAction::Resize(height));
    }

    pub fn handle_event(&mut self, event: GridEvent, now: Instant) {
        match event {
            GridEvent::SortClicked(field) => self.sort(&field),
            GridEvent::FilterClicked => self.apply_filter(),
            GridEvent::ResetClicked => self.reset(),
            GridEvent::Scrolled => self.on_scroll(now),
            GridEvent::Resized => self.resize(),
        }
    }

    pub fn state(&self) -> &GridState {
        &self.state
    }

    /// The window currently materialised
    pub fn window(&self) -> RenderWindow {
        self.state.window()
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    /// Whether a coalesced scroll is waiting
    pub fn scroll_pending(&self) -> bool {
        self.throttle.is_pending()
    }

    /// How long until a coalesced scroll can run
    pub fn scroll_wait(&self, now: Instant) -> Option<Duration> {
        self.throttle.time_remaining(now)
    }

    fn recompute_scroll(&mut self) {
        let offset = self.viewport.scroll_offset();
        self.dispatch(GridAction::Scroll(offset));
    }

    fn dispatch(&mut self, action: GridAction) {
        // A coalesced scroll still waiting is folded into this action, which
        // recomputes the window anyway
        if !matches!(action, GridAction::Scroll(_)) && self.throttle.is_pending() {
            self.state.track_offset(self.viewport.scroll_offset());
            self.throttle.cancel();
        }

        let instruction = self.state.update(action);
        self.apply(instruction);
    }

    fn apply(&mut self, instruction: RenderInstruction) {
        if instruction.is_noop() {
            return;
        }

        if let Some(offset) = instruction.scroll_to {
            self.viewport.scroll_to(offset);
        }

        if instruction.clear_filter_inputs {
            for col in self.state.columns().iter().filter(|col| col.filterable) {
                self.target.set_filter_input(&col.field, "");
            }
        }

        if instruction.relayout {
            let widths: Vec<u16> = self.state.columns().iter().map(|col| col.width).collect();
            self.target.clear();
            self.target.set_columns(&widths);
        }

        if let Some(header) = instruction.header {
            self.target.clear_header();
            for cell in &header {
                self.target.append_header_cell(cell);
            }
        }

        if let Some(window) = instruction.window {
            self.render_window(&window);
        }
    }

    fn render_window(&mut self, window: &RenderWindow) {
        self.target.remove_rows();

        if window.is_empty() {
            let span = self.state.columns().len();
            self.target.append_placeholder(&self.placeholder, span);
            self.target.set_vertical_offset(window.render_offset);
            return;
        }

        debug!(
            target: "grid",
            "Rendering rows {:?} of {} at offset {}px",
            window.rows,
            self.state.view().row_count(),
            window.render_offset
        );

        let columns = self.state.columns();
        for (index, row) in self.state.view().rows_in(window.rows.clone()) {
            let cells = columns.iter().map(|col| col.display(row)).collect();
            self.target.append_row(index, cells);
        }
        self.target.set_vertical_offset(window.render_offset);
    }
}
