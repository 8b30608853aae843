//! Configuration module
//!
//! Grid geometry, the data source and the column layout, read from a
//! TOML file.

pub mod config;
