//! User interface layer
//!
//! The grid engine and its display seams, plus the terminal and printed
//! front-ends.

pub mod grid_engine;
pub mod grid_state;
pub mod render_target;
pub mod table_printer;
pub mod terminal_grid;
pub mod viewport;
