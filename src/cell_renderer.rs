use std::sync::Arc;

use ratatui::style::{Color, Modifier, Style};

use crate::data::datatable::{CellRenderFn, CellValue, DisplayFragment, Row, Tone};

/// Marker drawn in front of a cell whose fragment asks for one
pub const MARKER_GLYPH: &str = "●";

/// Built-in renderers a column can name in config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedRenderer {
    /// Truthy values show "Yes", everything else "No"
    YesNo,
    /// Numeric value with a coloured marker by band
    AgeBand,
}

impl NamedRenderer {
    /// Look a renderer up by its config name
    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().replace('-', "_").as_str() {
            "yes_no" | "yesno" => Some(NamedRenderer::YesNo),
            "age_band" | "ageband" => Some(NamedRenderer::AgeBand),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NamedRenderer::YesNo => "yes_no",
            NamedRenderer::AgeBand => "age_band",
        }
    }

    pub fn render_fn(self) -> CellRenderFn {
        match self {
            NamedRenderer::YesNo => Arc::new(|value: &CellValue, _: &Row| yes_no(value)),
            NamedRenderer::AgeBand => Arc::new(|value: &CellValue, _: &Row| age_band(value)),
        }
    }

    pub fn all() -> &'static [NamedRenderer] {
        &[NamedRenderer::YesNo, NamedRenderer::AgeBand]
    }
}

pub fn yes_no(value: &CellValue) -> DisplayFragment {
    DisplayFragment::text(if value.is_truthy() { "Yes" } else { "No" })
}

/// Under 30 is good, up to 50 a warning, older an alert
pub fn age_band(value: &CellValue) -> DisplayFragment {
    let age = match value {
        CellValue::Number(n) if !n.is_nan() => *n,
        CellValue::String(s) => match s.trim().parse::<f64>() {
            Ok(n) if !n.is_nan() => n,
            _ => return DisplayFragment::text(value.to_string()),
        },
        _ => return DisplayFragment::text(value.to_string()),
    };

    let tone = if age < 30.0 {
        Tone::Good
    } else if age <= 50.0 {
        Tone::Warning
    } else {
        Tone::Alert
    };
    DisplayFragment::text(value.to_string())
        .with_tone(tone)
        .with_marker()
}

/// Terminal style for a tone
pub fn tone_style(tone: Tone) -> Style {
    match tone {
        Tone::Plain => Style::default(),
        Tone::Good => Style::default().fg(Color::Green),
        Tone::Warning => Style::default().fg(Color::Rgb(255, 165, 0)),
        Tone::Alert => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

/// Cell text with the marker prefixed when the fragment asks for one
pub fn fragment_text(fragment: &DisplayFragment) -> String {
    if fragment.marker {
        format!("{} {}", MARKER_GLYPH, fragment.text)
    } else {
        fragment.text.clone()
    }
}
