//! Interactive terminal front-end for the grid
//!
//! Each grid row is drawn as one terminal line. The viewport still works
//! in pixels: one line stands for `row_height` pixels, so the engine's
//! window arithmetic is unchanged and the surface only has to skip the
//! lookbehind rows of the materialised block when drawing.

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame, Terminal,
};
use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant};
use tracing::debug;
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::cell_renderer::{fragment_text, tone_style};
use crate::config::config::DisplayConfig;
use crate::data::datatable::{ColumnDescriptor, DisplayFragment};
use crate::ui::grid_engine::{GridEngine, GridEvent, GridSettings};
use crate::ui::render_target::{HeaderCell, RenderTarget, RenderedRow, Viewport};
use crate::utils::logging::LogRingBuffer;

/// Lines taken by the filter bar, table border, header and status line
const CHROME_LINES: u16 = 7;

/// Poll timeout when no scroll is waiting
const IDLE_TICK: Duration = Duration::from_millis(100);

/// Rows moved per mouse wheel notch
const WHEEL_ROWS: i64 = 3;

/// RenderTarget that keeps what the engine materialised for drawing
#[derive(Debug, Default)]
pub struct TerminalSurface {
    widths: Vec<u16>,
    header: Vec<HeaderCell>,
    rows: Vec<RenderedRow>,
    placeholder: Option<String>,
    vertical_offset: u64,
    filter_inputs: HashMap<String, Input>,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self) -> &[HeaderCell] {
        &self.header
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    pub fn materialised_rows(&self) -> &[RenderedRow] {
        &self.rows
    }

    /// Rows that fall inside the viewport
    pub fn visible_rows<'a>(
        &'a self,
        viewport: &TerminalViewport,
    ) -> impl Iterator<Item = &'a RenderedRow> + 'a {
        let row_height = u64::from(viewport.row_height());
        let skip = viewport.scroll_offset().saturating_sub(self.vertical_offset) / row_height;
        self.rows
            .iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::from(viewport.lines()))
    }

    pub fn filter(&self, field: &str) -> Option<&Input> {
        self.filter_inputs.get(field)
    }

    /// Feed a key event to the filter input of `field`
    pub fn edit_filter(&mut self, field: &str, event: &Event) {
        self.filter_inputs
            .entry(field.to_string())
            .or_default()
            .handle_event(event);
    }
}

impl RenderTarget for TerminalSurface {
    fn clear(&mut self) {
        self.widths.clear();
        self.header.clear();
        self.rows.clear();
        self.placeholder = None;
        self.vertical_offset = 0;
    }

    fn set_columns(&mut self, widths: &[u16]) {
        self.widths = widths.to_vec();
    }

    fn clear_header(&mut self) {
        self.header.clear();
    }

    fn append_header_cell(&mut self, cell: &HeaderCell) {
        self.header.push(cell.clone());
    }

    fn remove_rows(&mut self) {
        self.rows.clear();
        self.placeholder = None;
    }

    fn append_row(&mut self, index: usize, cells: Vec<DisplayFragment>) {
        self.rows.push(RenderedRow { index, cells });
    }

    fn append_placeholder(&mut self, text: &str, _span: usize) {
        self.placeholder = Some(text.to_string());
    }

    fn set_vertical_offset(&mut self, offset_px: u64) {
        self.vertical_offset = offset_px;
    }

    fn filter_input(&self, field: &str) -> Option<String> {
        self.filter_inputs
            .get(field)
            .map(|input| input.value().to_string())
    }

    fn set_filter_input(&mut self, field: &str, value: &str) {
        self.filter_inputs
            .insert(field.to_string(), Input::new(value.to_string()));
    }
}

/// Viewport measured in terminal lines, reported in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalViewport {
    row_height: u32,
    lines: u16,
    offset_px: u64,
}

impl TerminalViewport {
    pub fn new(row_height: u32, lines: u16) -> Self {
        Self {
            row_height: row_height.max(1),
            lines: lines.max(1),
            offset_px: 0,
        }
    }

    pub fn row_height(&self) -> u32 {
        self.row_height
    }

    pub fn lines(&self) -> u16 {
        self.lines
    }

    pub fn set_lines(&mut self, lines: u16) {
        self.lines = lines.max(1);
    }

    pub fn first_visible_row(&self) -> usize {
        usize::try_from(self.offset_px / u64::from(self.row_height)).unwrap_or(usize::MAX)
    }

    /// Largest offset that still shows a full page
    pub fn max_offset(&self, total_rows: usize) -> u64 {
        let last_page_start = total_rows.saturating_sub(usize::from(self.lines));
        last_page_start as u64 * u64::from(self.row_height)
    }

    /// Move by whole rows, clamped to the content
    pub fn scroll_rows(&mut self, delta: i64, total_rows: usize) {
        let step = i128::from(delta) * i128::from(self.row_height);
        let target = (i128::from(self.offset_px) + step).max(0);
        let target = u64::try_from(target).unwrap_or(u64::MAX);
        self.offset_px = target.min(self.max_offset(total_rows));
    }

    pub fn scroll_to_end(&mut self, total_rows: usize) {
        self.offset_px = self.max_offset(total_rows);
    }
}

impl Viewport for TerminalViewport {
    fn viewport_height(&self) -> u32 {
        u32::from(self.lines).saturating_mul(self.row_height)
    }

    fn scroll_offset(&self) -> u64 {
        self.offset_px
    }

    fn scroll_to(&mut self, offset_px: u64) {
        self.offset_px = offset_px;
    }
}

/// Interactive grid: engine plus keyboard handling and drawing
pub struct TerminalGrid {
    engine: GridEngine<TerminalSurface, TerminalViewport>,
    display: DisplayConfig,
    title: String,
    selected_column: usize,
    /// Field whose filter input has focus
    editing: Option<String>,
    status_message: String,
    logs: Option<LogRingBuffer>,
    should_quit: bool,
}

impl TerminalGrid {
    pub fn new(
        columns: Vec<ColumnDescriptor>,
        settings: GridSettings,
        display: DisplayConfig,
        title: impl Into<String>,
    ) -> Self {
        let viewport = TerminalViewport::new(settings.row_height, 1);
        Self {
            engine: GridEngine::new(columns, TerminalSurface::new(), viewport, settings),
            display,
            title: title.into(),
            selected_column: 0,
            editing: None,
            status_message: "s sort | / filter | Enter apply | r reset | q quit".to_string(),
            logs: None,
            should_quit: false,
        }
    }

    /// Show the latest log entry in the status line
    pub fn with_logs(mut self, logs: LogRingBuffer) -> Self {
        self.logs = Some(logs);
        self
    }

    pub fn engine(&self) -> &GridEngine<TerminalSurface, TerminalViewport> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut GridEngine<TerminalSurface, TerminalViewport> {
        &mut self.engine
    }

    pub fn selected_column(&self) -> usize {
        self.selected_column
    }

    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Match the viewport to a terminal of `height` lines
    pub fn sync_size(&mut self, height: u16) {
        let lines = height.saturating_sub(CHROME_LINES).max(1);
        if lines != self.engine.viewport().lines() {
            debug!(target: "terminal", "Viewport now {} lines", lines);
            self.engine.viewport_mut().set_lines(lines);
            self.engine.handle_event(GridEvent::Resized, Instant::now());
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if let Some(field) = self.editing.clone() {
            match key.code {
                KeyCode::Enter => {
                    self.editing = None;
                    self.engine.handle_event(GridEvent::FilterClicked, now);
                    let view = self.engine.state().view();
                    self.status_message =
                        format!("{} of {} rows match", view.row_count(), view.source_row_count());
                }
                KeyCode::Esc => self.editing = None,
                _ => self
                    .engine
                    .target_mut()
                    .edit_filter(&field, &Event::Key(key)),
            }
            return;
        }

        let page = i64::from(self.engine.viewport().lines());
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }
            KeyCode::Down | KeyCode::Char('j') => self.scroll(1, now),
            KeyCode::Up | KeyCode::Char('k') => self.scroll(-1, now),
            KeyCode::PageDown => self.scroll(page, now),
            KeyCode::PageUp => self.scroll(-page, now),
            KeyCode::Home | KeyCode::Char('g') => {
                self.engine.viewport_mut().scroll_to(0);
                self.engine.handle_event(GridEvent::Scrolled, now);
            }
            KeyCode::End | KeyCode::Char('G') => {
                let total = self.engine.state().view().row_count();
                self.engine.viewport_mut().scroll_to_end(total);
                self.engine.handle_event(GridEvent::Scrolled, now);
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.selected_column = self.selected_column.saturating_sub(1);
            }
            KeyCode::Right | KeyCode::Char('l') => {
                let last = self.engine.state().columns().len().saturating_sub(1);
                self.selected_column = (self.selected_column + 1).min(last);
            }
            KeyCode::Char('s') => self.sort_selected(now),
            KeyCode::Char('/') => self.edit_selected(),
            KeyCode::Char('r') => {
                self.engine.handle_event(GridEvent::ResetClicked, now);
                self.status_message = "Filters and sort cleared".to_string();
            }
            _ => {}
        }
    }

    fn selected_descriptor(&self) -> Option<&ColumnDescriptor> {
        self.engine.state().columns().get(self.selected_column)
    }

    fn sort_selected(&mut self, now: Instant) {
        let Some(column) = self.selected_descriptor() else {
            return;
        };
        if !column.sortable {
            self.status_message = format!("'{}' is not sortable", column.label);
            return;
        }
        let field = column.field.clone();
        self.engine.handle_event(GridEvent::SortClicked(field), now);
    }

    fn edit_selected(&mut self) {
        let Some(column) = self.selected_descriptor() else {
            return;
        };
        if !column.filterable {
            self.status_message = format!("'{}' has no filter", column.label);
            return;
        }
        let field = column.field.clone();
        self.status_message = format!("Filter {} (Enter to apply, Esc to leave)", column.label);
        self.editing = Some(field);
    }

    fn scroll(&mut self, rows: i64, now: Instant) {
        let total = self.engine.state().view().row_count();
        let before = self.engine.viewport().scroll_offset();
        self.engine.viewport_mut().scroll_rows(rows, total);
        if self.engine.viewport().scroll_offset() != before {
            self.engine.handle_event(GridEvent::Scrolled, now);
        }
    }

    /// Event loop; returns when the user quits
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            self.sync_size(terminal.size()?.height);
            terminal.draw(|f| self.draw(f))?;

            let timeout = self
                .engine
                .scroll_wait(Instant::now())
                .unwrap_or(IDLE_TICK);
            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key, Instant::now())
                    }
                    Event::Mouse(mouse) => match mouse.kind {
                        MouseEventKind::ScrollDown => self.scroll(WHEEL_ROWS, Instant::now()),
                        MouseEventKind::ScrollUp => self.scroll(-WHEEL_ROWS, Instant::now()),
                        _ => {}
                    },
                    _ => {}
                }
            }

            self.engine.poll_scroll(Instant::now());
            if self.should_quit {
                return Ok(());
            }
        }
    }

    pub fn draw(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Filter inputs
                Constraint::Min(3),    // Grid
                Constraint::Length(1), // Status bar
            ])
            .split(f.area());

        self.draw_filters(f, chunks[0]);
        self.draw_table(f, chunks[1]);
        self.draw_status(f, chunks[2]);
    }

    fn draw_filters(&self, f: &mut Frame, area: Rect) {
        let surface = self.engine.target();
        let mut spans = Vec::new();
        let mut cursor = None;
        let mut x = area.x + 1;

        for col in self.engine.state().columns().iter().filter(|c| c.filterable) {
            let label = format!("{}: ", col.label);
            let input = surface.filter(&col.field);
            let value = input.map(|i| i.value()).unwrap_or("");
            let focused = self.editing.as_deref() == Some(col.field.as_str());

            if focused {
                let offset = input.map(|i| i.visual_cursor()).unwrap_or(0);
                cursor = Some(x + label.chars().count() as u16 + offset as u16 + 1);
            }
            x += (label.chars().count() + value.chars().count() + 4) as u16;

            spans.push(Span::styled(label, Style::default().fg(Color::Cyan)));
            let style = if focused {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            spans.push(Span::styled(format!("[{}]", value), style));
            spans.push(Span::raw("  "));
        }

        let filters = Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL).title("Filters"));
        f.render_widget(filters, area);

        if let Some(cx) = cursor {
            f.set_cursor_position((cx.min(area.right().saturating_sub(2)), area.y + 1));
        }
    }

    fn draw_table(&self, f: &mut Frame, area: Rect) {
        let surface = self.engine.target();
        let view = self.engine.state().view();
        let title = format!(
            "{} ({} of {} rows)",
            self.title,
            view.row_count(),
            view.source_row_count()
        );

        if let Some(text) = surface.placeholder() {
            let empty = Paragraph::new(text.to_string())
                .block(Block::default().borders(Borders::ALL).title(title))
                .style(Style::default().fg(Color::Yellow));
            f.render_widget(empty, area);
            return;
        }

        let header = Row::new(surface.header().iter().enumerate().map(|(i, cell)| {
            let mut style = header_style(cell);
            if i == self.selected_column {
                style = style.fg(Color::Yellow).add_modifier(Modifier::UNDERLINED);
            }
            Cell::from(self.display.header_label(cell)).style(style)
        }));

        let rows = surface
            .visible_rows(self.engine.viewport())
            .map(|row| {
                Row::new(row.cells.iter().map(|fragment| {
                    Cell::from(fragment_text(fragment)).style(tone_style(fragment.tone))
                }))
            });

        let widths: Vec<Constraint> = surface.widths.iter().map(|w| Constraint::Fill(*w)).collect();

        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title))
            .column_spacing(1);
        f.render_widget(table, area);
    }

    fn draw_status(&self, f: &mut Frame, area: Rect) {
        let viewport = self.engine.viewport();
        let total = self.engine.state().view().row_count();
        let first = viewport.first_visible_row().min(total);
        let last = (first + usize::from(viewport.lines())).min(total);

        let mut text = format!(
            "Rows {}-{} of {} | {}",
            first + usize::from(total > 0),
            last,
            total,
            self.status_message
        );
        if let Some(entry) = self.logs.as_ref().and_then(|logs| logs.latest()) {
            text.push_str(" | ");
            text.push_str(&entry.message);
        }
        f.render_widget(
            Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
            area,
        );
    }
}

/// Header style: the active sort stands out, other sortable columns are dimmed
fn header_style(cell: &HeaderCell) -> Style {
    if cell.indicator.is_active() {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else if cell.clickable {
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    }
}

/// Take over the terminal, run the grid, and restore the terminal
pub fn run_terminal_grid(grid: &mut TerminalGrid) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = grid.run(&mut terminal);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}
