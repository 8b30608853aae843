use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use std::collections::HashMap;

use crate::cell_renderer::fragment_text;
use crate::config::config::DisplayConfig;
use crate::data::datatable::{DisplayFragment, Tone};
use crate::ui::render_target::{HeaderCell, RenderTarget};

/// Non-interactive target that prints the materialised window as a table
pub struct TablePrinter {
    display: DisplayConfig,
    header: Vec<HeaderCell>,
    rows: Vec<(usize, Vec<DisplayFragment>)>,
    placeholder: Option<(String, usize)>,
    vertical_offset: u64,
    filter_inputs: HashMap<String, String>,
}

impl TablePrinter {
    pub fn new(display: DisplayConfig) -> Self {
        Self {
            display,
            header: Vec::new(),
            rows: Vec::new(),
            placeholder: None,
            vertical_offset: 0,
            filter_inputs: HashMap::new(),
        }
    }

    /// Build the table for what is currently materialised
    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);

        let mut headers = vec![Cell::new("#").add_attribute(Attribute::Bold)];
        headers.extend(self.header.iter().map(|cell| {
            let header = Cell::new(self.display.header_label(cell)).add_attribute(Attribute::Bold);
            if cell.clickable && !cell.indicator.is_active() {
                header.fg(Color::DarkGrey)
            } else {
                header
            }
        }));
        table.set_header(headers);

        if let Some((text, _)) = &self.placeholder {
            table.add_row(vec![
                Cell::new(""),
                Cell::new(text).set_alignment(CellAlignment::Center),
            ]);
            return table;
        }

        for (index, cells) in &self.rows {
            let mut row = vec![Cell::new(index + 1).fg(Color::DarkGrey)];
            row.extend(cells.iter().map(fragment_cell));
            table.add_row(row);
        }
        table
    }

    /// One-line summary of the window
    pub fn summary(&self, total_rows: usize) -> String {
        match (self.rows.first(), self.rows.last()) {
            (Some((first, _)), Some((last, _))) => format!(
                "Rows {}-{} of {} (offset {}px)",
                first + 1,
                last + 1,
                total_rows,
                self.vertical_offset
            ),
            _ => format!("0 of {} rows", total_rows),
        }
    }

    pub fn print(&self, total_rows: usize) {
        println!("{}", self.to_table());
        println!("\n{}", self.summary(total_rows));
    }
}

fn fragment_cell(fragment: &DisplayFragment) -> Cell {
    let cell = Cell::new(fragment_text(fragment));
    match fragment.tone {
        Tone::Plain => cell,
        Tone::Good => cell.fg(Color::Green),
        Tone::Warning => cell.fg(Color::Rgb { r: 255, g: 165, b: 0 }),
        Tone::Alert => cell.fg(Color::Red).add_attribute(Attribute::Bold),
    }
}

impl RenderTarget for TablePrinter {
    fn clear(&mut self) {
        self.header.clear();
        self.rows.clear();
        self.placeholder = None;
        self.vertical_offset = 0;
    }

    // Column widths are left to comfy-table's dynamic arrangement
    fn set_columns(&mut self, _widths: &[u16]) {}

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
        self.rows.push((index, cells));
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
