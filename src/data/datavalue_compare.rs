use crate::data::data_view::SortOrder;
use crate::data::datatable::{CellValue, ColumnKind};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use std::cmp::Ordering;

/// Date-time layouts tried after RFC 3339
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Date-only layouts, interpreted as midnight
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parse a calendar date-time from text
///
/// Bare numbers are never dates, even though some of them would fit
/// a permissive layout.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() || text.parse::<f64>().is_ok() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .map(|date| date.and_time(NaiveTime::MIN))
}

fn as_datetime(value: &CellValue) -> Option<NaiveDateTime> {
    match value {
        CellValue::String(s) => parse_datetime(s),
        _ => None,
    }
}

fn as_number(value: &CellValue) -> Option<f64> {
    match value {
        CellValue::Number(n) if !n.is_nan() => Some(*n),
        CellValue::String(s) => s.trim().parse::<f64>().ok().filter(|n| !n.is_nan()),
        _ => None,
    }
}

fn as_boolean(value: &CellValue) -> Option<bool> {
    match value {
        CellValue::Boolean(b) => Some(*b),
        CellValue::Number(n) if !n.is_nan() => Some(*n != 0.0),
        CellValue::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Locale-style text ordering: case-insensitive first, and on a case-only
/// tie lowercase sorts before uppercase
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// Compare two values of an untyped column
///
/// Checks run in a fixed order per pair: boolean, date-time, number,
/// then text. A pair containing a boolean always compares as booleans.
pub fn compare_auto(a: &CellValue, b: &CellValue) -> Ordering {
    if matches!(a, CellValue::Boolean(_)) || matches!(b, CellValue::Boolean(_)) {
        return a.is_truthy().cmp(&b.is_truthy());
    }

    if let (Some(da), Some(db)) = (as_datetime(a), as_datetime(b)) {
        return da.cmp(&db);
    }

    if let (Some(na), Some(nb)) = (as_number(a), as_number(b)) {
        return na.total_cmp(&nb);
    }

    compare_text(&a.to_string(), &b.to_string())
}

/// Values that can't be coerced to the column kind sort first
fn compare_coerced<T, F, C>(a: &CellValue, b: &CellValue, coerce: F, cmp: C) -> Ordering
where
    F: Fn(&CellValue) -> Option<T>,
    C: Fn(&T, &T) -> Ordering,
{
    match (coerce(a), coerce(b)) {
        (Some(x), Some(y)) => cmp(&x, &y),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
    }
}

/// Compare two values according to the declared column kind
pub fn compare_values(a: &CellValue, b: &CellValue, kind: ColumnKind) -> Ordering {
    match kind {
        ColumnKind::Auto => compare_auto(a, b),
        ColumnKind::Text => compare_coerced(
            a,
            b,
            |v| (!v.is_null()).then(|| v.to_string()),
            |x, y| compare_text(x, y),
        ),
        ColumnKind::Number => compare_coerced(a, b, as_number, |x, y| x.total_cmp(y)),
        ColumnKind::Boolean => compare_coerced(a, b, as_boolean, |x, y| x.cmp(y)),
        ColumnKind::DateTime => compare_coerced(a, b, as_datetime, |x, y| x.cmp(y)),
    }
}

/// Compare with the sort direction applied
pub fn compare_directed(a: &CellValue, b: &CellValue, kind: ColumnKind, order: SortOrder) -> Ordering {
    let cmp = compare_values(a, b, kind);
    match order {
        SortOrder::Ascending => cmp,
        SortOrder::Descending => cmp.reverse(),
    }
}
