use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::cell_renderer::NamedRenderer;
use crate::data::datatable::{ColumnDescriptor, ColumnKind};
use crate::ui::grid_engine::{GridSettings, DEFAULT_ROW_HEIGHT, DEFAULT_SCROLL_THROTTLE_MS};
use crate::ui::render_target::{HeaderCell, SortIndicator};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub grid: GridConfig,
    pub source: SourceConfig,
    pub display: DisplayConfig,
    pub columns: Vec<ColumnConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Uniform row height in pixels
    pub row_height: u32,

    /// Minimum time between two scroll recomputations
    pub scroll_throttle_ms: u64,

    /// Text shown when there are no rows
    pub placeholder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Endpoint returning a JSON array of records
    pub url: String,

    /// Local JSON or CSV file, used instead of the url when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Use Unicode glyphs for the sort indicators
    pub use_glyphs: bool,

    pub ascending_glyph: String,

    pub descending_glyph: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub label: String,
    pub field: String,
    pub sortable: bool,
    pub filterable: bool,
    /// Relative width
    pub width: u16,
    pub kind: ColumnKind,
    /// Name of a built-in renderer, e.g. "yes_no" or "age_band"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renderer: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            source: SourceConfig::default(),
            display: DisplayConfig::default(),
            columns: default_columns(),
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            row_height: DEFAULT_ROW_HEIGHT,
            scroll_throttle_ms: DEFAULT_SCROLL_THROTTLE_MS,
            placeholder: "No data found".to_string(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000/users".to_string(),
            file: None,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            use_glyphs: true,
            ascending_glyph: "▲".to_string(),
            descending_glyph: "▼".to_string(),
        }
    }
}

impl DisplayConfig {
    /// ASCII indicators for terminals without glyph support
    pub fn simple() -> Self {
        Self {
            use_glyphs: false,
            ascending_glyph: "^".to_string(),
            descending_glyph: "v".to_string(),
        }
    }

    /// Header label with the sort indicator appended
    ///
    /// Sortable columns that aren't the active sort show the ascending
    /// glyph too; displays tell them apart from the active column by style.
    pub fn header_label(&self, cell: &HeaderCell) -> String {
        match cell.indicator {
            SortIndicator::Neutral if !cell.clickable => cell.label.clone(),
            SortIndicator::Neutral | SortIndicator::Ascending => {
                format!("{} {}", cell.label, self.ascending_glyph)
            }
            SortIndicator::Descending => format!("{} {}", cell.label, self.descending_glyph),
        }
    }
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            label: String::new(),
            field: String::new(),
            sortable: false,
            filterable: false,
            width: 1,
            kind: ColumnKind::Auto,
            renderer: None,
        }
    }
}

impl ColumnConfig {
    fn new(label: &str, field: &str, width: u16) -> Self {
        Self {
            label: label.to_string(),
            field: field.to_string(),
            sortable: true,
            filterable: true,
            width,
            ..Self::default()
        }
    }

    fn unfilterable(mut self) -> Self {
        self.filterable = false;
        self
    }

    fn with_renderer(mut self, name: &str) -> Self {
        self.renderer = Some(name.to_string());
        self
    }

    /// Build the runtime descriptor; unknown renderer names fall back to text
    pub fn to_descriptor(&self) -> ColumnDescriptor {
        let mut descriptor = ColumnDescriptor::new(&self.label, &self.field)
            .sortable(self.sortable)
            .filterable(self.filterable)
            .with_width(self.width)
            .with_kind(self.kind);

        if let Some(name) = &self.renderer {
            match NamedRenderer::by_name(name) {
                Some(renderer) => descriptor.renderer = Some(renderer.render_fn()),
                None => warn!(
                    target: "config",
                    "Unknown renderer '{}' for column '{}', showing plain text",
                    name,
                    self.field
                ),
            }
        }
        descriptor
    }
}

/// The users grid
fn default_columns() -> Vec<ColumnConfig> {
    vec![
        ColumnConfig::new("Name", "name", 2),
        ColumnConfig::new("Age", "age", 1).with_renderer("age_band"),
        ColumnConfig::new("Address", "address", 3),
        ColumnConfig::new("Is Logged In", "isLoggedIn", 1)
            .unfilterable()
            .with_renderer("yes_no"),
        ColumnConfig::new("Is WFH Today", "isWfHToday", 1)
            .unfilterable()
            .with_renderer("yes_no"),
    ]
}

impl Config {
    /// Load config from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        if !config.display.use_glyphs {
            config.display = DisplayConfig::simple();
        }

        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;

        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("vgrid").join("config.toml"))
    }

    /// Column descriptors for the engine, in config order
    pub fn column_descriptors(&self) -> Vec<ColumnDescriptor> {
        self.columns
            .iter()
            .filter(|col| !col.field.is_empty())
            .map(ColumnConfig::to_descriptor)
            .collect()
    }

    pub fn grid_settings(&self) -> GridSettings {
        GridSettings {
            row_height: self.grid.row_height,
            scroll_throttle_ms: self.grid.scroll_throttle_ms,
            placeholder: self.grid.placeholder.clone(),
        }
    }

    /// Initialize config with a setup wizard
    pub fn init_wizard() -> Result<Self> {
        println!("vgrid Configuration Setup");
        println!("=========================");

        let mut config = Config::default();

        let answer = prompt("Does your terminal support Unicode glyphs? (y/n) [y]: ")?;
        if answer.eq_ignore_ascii_case("n") {
            config.display = DisplayConfig::simple();
        }

        let answer = prompt(&format!("Data source URL [{}]: ", config.source.url))?;
        if !answer.is_empty() {
            config.source.url = answer;
        }

        config.save()?;

        println!("\nConfiguration saved to: {:?}", Config::get_config_path()?);
        println!("You can edit this file directly to customize further.");

        Ok(config)
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# vgrid Configuration File
# Location: ~/.config/vgrid/config.toml (Linux)
#           ~/Library/Application Support/vgrid/config.toml (macOS)
#           %APPDATA%\vgrid\config.toml (Windows)

[grid]
# Height of every row in pixels; the terminal maps this to one line
row_height = 50

# Minimum milliseconds between two window recomputations while scrolling
scroll_throttle_ms = 50

# Shown across the grid when there are no rows
placeholder = "No data found"

[source]
# Endpoint returning a JSON array of records
url = "http://localhost:3000/users"

# Load a local .json or .csv file instead of the url
# file = "/path/to/users.json"

[display]
# Set to false for ASCII sort indicators (^ and v)
use_glyphs = true
ascending_glyph = "▲"
descending_glyph = "▼"

# One [[columns]] table per column, in display order.
# kind: "auto", "text", "number", "boolean" or "datetime"
# renderer: "yes_no" or "age_band"
[[columns]]
label = "Name"
field = "name"
sortable = true
filterable = true
width = 2

[[columns]]
label = "Age"
field = "age"
sortable = true
filterable = true
width = 1
renderer = "age_band"

[[columns]]
label = "Address"
field = "address"
sortable = true
filterable = true
width = 3

[[columns]]
label = "Is Logged In"
field = "isLoggedIn"
sortable = true
filterable = false
width = 1
renderer = "yes_no"

[[columns]]
label = "Is WFH Today"
field = "isWfHToday"
sortable = true
filterable = false
width = 1
renderer = "yes_no"
"#
        .to_string()
    }
}

fn prompt(question: &str) -> Result<String> {
    print!("{}", question);
    std::io::Write::flush(&mut std::io::stdout())?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
