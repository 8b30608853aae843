//! Per-field prefix filtering
//!
//! A filter is a set of field → prefix constraints. A row passes when the
//! lowercased text of every constrained field starts with its prefix.

use std::collections::BTreeMap;

use crate::data::datatable::{ColumnDescriptor, Row};

/// Active prefix constraints, keyed by field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    /// Normalised (trimmed, lowercased, non-empty) prefixes
    prefixes: BTreeMap<String, String>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw field/input pairs, normalising every prefix
    pub fn from_inputs<I, K, V>(inputs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut state = Self::new();
        for (field, prefix) in inputs {
            state.set(field, prefix.as_ref());
        }
        state
    }

    pub fn with_prefix(mut self, field: impl Into<String>, prefix: &str) -> Self {
        self.set(field, prefix);
        self
    }

    /// Set or clear the constraint on a field; blank input clears it
    pub fn set(&mut self, field: impl Into<String>, prefix: &str) {
        let field = field.into();
        let normalised = prefix.trim().to_lowercase();
        if normalised.is_empty() {
            self.prefixes.remove(&field);
        } else {
            self.prefixes.insert(field, normalised);
        }
    }

    pub fn prefix(&self, field: &str) -> Option<&str> {
        self.prefixes.get(field).map(String::as_str)
    }

    /// True when no field is constrained
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Drop constraints on fields that aren't filterable columns
    pub fn restricted_to(&self, columns: &[ColumnDescriptor]) -> Self {
        let prefixes = self
            .prefixes
            .iter()
            .filter(|(field, _)| {
                columns
                    .iter()
                    .any(|col| col.filterable && &col.field == *field)
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self { prefixes }
    }

    /// Whether a row satisfies every constraint
    ///
    /// An absent or null value fails any constraint on its field.
    pub fn matches(&self, row: &Row) -> bool {
        self.prefixes.iter().all(|(field, prefix)| match row.get(field) {
            Some(value) if !value.is_null() => {
                value.to_string().to_lowercase().starts_with(prefix.as_str())
            }
            _ => false,
        })
    }

    /// Positions of the rows that pass, in their original order
    pub fn apply(&self, rows: &[Row]) -> Vec<usize> {
        rows.iter()
            .enumerate()
            .filter(|(_, row)| self.matches(row))
            .map(|(idx, _)| idx)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::datatable::CellValue;

    fn people() -> Vec<Row> {
        ["John", "Amy", "Joan", "jonas"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                [
                    ("name", CellValue::String(name.to_string())),
                    ("age", CellValue::Number(20.0 + i as f64)),
                ]
                .into_iter()
                .collect()
            })
            .collect()
    }

    #[test]
    fn test_prefix_is_case_insensitive() {
        let filter = FilterState::new().with_prefix("name", "  JO ");
        assert_eq!(filter.prefix("name"), Some("jo"));
        assert_eq!(filter.apply(&people()), vec![0, 2, 3]);
    }

    #[test]
    fn test_empty_prefix_is_identity() {
        let rows = people();
        let filter = FilterState::new().with_prefix("name", "   ");
        assert!(filter.is_empty());
        assert_eq!(filter.apply(&rows), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_constraints_are_conjunctive() {
        let filter = FilterState::from_inputs([("name", "jo"), ("age", "22")]);
        assert_eq!(filter.apply(&people()), vec![2]);
    }

    #[test]
    fn test_numbers_match_their_text() {
        let filter = FilterState::new().with_prefix("age", "2");
        assert_eq!(filter.apply(&people()).len(), 4);
    }

    #[test]
    fn test_missing_or_null_field_fails() {
        let rows: Vec<Row> = vec![
            [("name", CellValue::Null)].into_iter().collect(),
            [("other", CellValue::String("x".into()))].into_iter().collect(),
        ];
        let filter = FilterState::new().with_prefix("name", "a");
        assert!(filter.apply(&rows).is_empty());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let rows = people();
        let filter = FilterState::new().with_prefix("name", "jo");
        let once: Vec<Row> = filter
            .apply(&rows)
            .into_iter()
            .map(|i| rows[i].clone())
            .collect();
        let twice: Vec<Row> = filter
            .apply(&once)
            .into_iter()
            .map(|i| once[i].clone())
            .collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_restricted_to_filterable_columns() {
        let columns = vec![
            ColumnDescriptor::new("Name", "name").filterable(true),
            ColumnDescriptor::new("Age", "age").filterable(false),
        ];
        let filter = FilterState::from_inputs([("name", "a"), ("age", "2"), ("zip", "9")])
            .restricted_to(&columns);
        assert_eq!(filter.len(), 1);
        assert_eq!(filter.prefix("name"), Some("a"));
    }
}
