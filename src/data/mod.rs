//! Data layer: rows, the comparator, filtering and the sorted/filtered view
//!
//! The snapshot taken at load time is never modified; everything the grid
//! shows is a `DataView` of positions into it.

pub mod data_source;
pub mod data_view;
pub mod datatable;
pub mod datavalue_compare;
pub mod filter;
