pub mod cell_renderer;
pub mod config;
pub mod data;
pub mod throttle;
pub mod ui;
pub mod utils;
