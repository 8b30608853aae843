use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

static NULL_VALUE: CellValue = CellValue::Null;

/// Declared value kind of a column
///
/// `Auto` keeps the per-pair inference (boolean, date, number, text);
/// the other kinds coerce every value of the column to one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    #[default]
    Auto,
    Text,
    Number,
    Boolean,
    DateTime,
}

/// A single scalar cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
}

impl CellValue {
    /// Convert a JSON value; arrays and objects keep their JSON text
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => CellValue::Null,
            JsonValue::Bool(b) => CellValue::Boolean(*b),
            JsonValue::Number(n) => n
                .as_f64()
                .map(CellValue::Number)
                .unwrap_or_else(|| CellValue::String(n.to_string())),
            JsonValue::String(s) => CellValue::String(s.clone()),
            JsonValue::Array(_) | JsonValue::Object(_) => CellValue::String(value.to_string()),
        }
    }

    /// Infer a value from raw text (CSV cells)
    pub fn infer_from_string(value: &str) -> Self {
        if value.is_empty() || value.eq_ignore_ascii_case("null") {
            return CellValue::Null;
        }

        if value.eq_ignore_ascii_case("true") {
            return CellValue::Boolean(true);
        }
        if value.eq_ignore_ascii_case("false") {
            return CellValue::Boolean(false);
        }

        match value.parse::<f64>() {
            Ok(n) if n.is_finite() => CellValue::Number(n),
            _ => CellValue::String(value.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// JavaScript-style truthiness, used when a value meets a boolean
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Boolean(b) => *b,
            CellValue::Number(n) => *n != 0.0 && !n.is_nan(),
            CellValue::String(s) => !s.is_empty() && !s.eq_ignore_ascii_case("false"),
            CellValue::Null => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{}", s),
            // Integral numbers print without a trailing ".0"
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Boolean(b) => write!(f, "{}", b),
            CellValue::Null => write!(f, ""),
        }
    }
}

/// A record keyed by field name; rows have no identity besides position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    fields: HashMap<String, CellValue>,
}

impl Row {
    pub fn new(fields: HashMap<String, CellValue>) -> Self {
        Self { fields }
    }

    /// Build a row from a JSON object; anything else yields `None`
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        let obj = value.as_object()?;
        Some(
            obj.iter()
                .map(|(k, v)| (k.clone(), CellValue::from_json(v)))
                .collect(),
        )
    }

    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.fields.get(field)
    }

    /// Value of a field, `Null` when absent
    pub fn value(&self, field: &str) -> &CellValue {
        self.fields.get(field).unwrap_or(&NULL_VALUE)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, CellValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, CellValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Visual tone a renderer can attach to a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Plain,
    Good,
    Warning,
    Alert,
}

/// What a cell displays after its column renderer ran
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisplayFragment {
    pub text: String,
    pub tone: Tone,
    /// Draw a status marker in front of the text
    pub marker: bool,
}

impl DisplayFragment {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::Plain,
            marker: false,
        }
    }

    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    pub fn with_marker(mut self) -> Self {
        self.marker = true;
        self
    }
}

/// Pure value → display function supplied per column
pub type CellRenderFn = Arc<dyn Fn(&CellValue, &Row) -> DisplayFragment + Send + Sync>;

/// Column configuration, fixed for the lifetime of a grid
#[derive(Clone)]
pub struct ColumnDescriptor {
    pub label: String,
    pub field: String,
    pub sortable: bool,
    pub filterable: bool,
    /// Relative width in fractional units
    pub width: u16,
    pub kind: ColumnKind,
    pub renderer: Option<CellRenderFn>,
}

impl ColumnDescriptor {
    pub fn new(label: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            field: field.into(),
            sortable: false,
            filterable: false,
            width: 1,
            kind: ColumnKind::Auto,
            renderer: None,
        }
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    pub fn with_width(mut self, width: u16) -> Self {
        self.width = width.max(1);
        self
    }

    pub fn with_kind(mut self, kind: ColumnKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_renderer<F>(mut self, renderer: F) -> Self
    where
        F: Fn(&CellValue, &Row) -> DisplayFragment + Send + Sync + 'static,
    {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    /// Produce the display fragment for this column of a row
    pub fn display(&self, row: &Row) -> DisplayFragment {
        let value = row.value(&self.field);
        match &self.renderer {
            Some(render) => render(value, row),
            None => DisplayFragment::text(value.to_string()),
        }
    }
}

impl fmt::Debug for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("label", &self.label)
            .field("field", &self.field)
            .field("sortable", &self.sortable)
            .field("filterable", &self.filterable)
            .field("width", &self.width)
            .field("kind", &self.kind)
            .field("renderer", &self.renderer.is_some())
            .finish()
    }
}
