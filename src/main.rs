use anyhow::{Context, Result};
use crossterm::style::Stylize;
use std::path::PathBuf;
use std::time::Instant;

use vgrid::config::config::Config;
use vgrid::data::data_source::{file_source, DataSource, HttpJsonSource};
use vgrid::ui::grid_engine::{GridEngine, GridEvent};
use vgrid::ui::render_target::FixedViewport;
use vgrid::ui::table_printer::TablePrinter;
use vgrid::ui::terminal_grid::{run_terminal_grid, TerminalGrid};

/// Rows per page when printing instead of running the terminal grid
const PRINT_PAGE_ROWS: u32 = 20;

fn print_help() {
    println!("{}", "vgrid - Virtualized data grid".blue().bold());
    println!();
    println!("{}", "Usage:".yellow());
    println!("  vgrid [OPTIONS] [FILE.csv|FILE.json]");
    println!();
    println!("{}", "Options:".yellow());
    println!("  {}        - Fetch rows from a JSON endpoint", "--url URL".green());
    println!("  {}      - Load a JSON file", "--file PATH".green());
    println!("  {}       - Load a CSV file", "--csv PATH".green());
    println!("  {}    - Use this config file", "--config PATH".green());
    println!("  {}          - Print the grid instead of opening it", "--print".green());
    println!("  {}      - With --print, scroll to this pixel offset first", "--scroll PX".green());
    println!("  {}    - Initialize configuration with wizard", "--init-config".green());
    println!("  {} - Generate config file with defaults", "--generate-config".green());
    println!();
    println!("{}", "Keys:".yellow());
    println!("  {}  - Scroll", "Up/Down PgUp/PgDn Home/End".green());
    println!("  {}             - Select column", "Left/Right".green());
    println!("  {}                      - Sort selected column", "s".green());
    println!("  {}                      - Edit the selected column's filter", "/".green());
    println!("  {}                  - Apply filter", "Enter".green());
    println!("  {}                      - Reset filters and sort", "r".green());
    println!("  {}                      - Quit", "q".green());
    println!();
}

/// Value following `flag`, if present
fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|pos| args.get(pos + 1))
        .cloned()
}

fn generate_config() -> Result<()> {
    let path = Config::get_config_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Error creating config directory {:?}", parent))?;
    }
    std::fs::write(&path, Config::create_default_with_comments())
        .with_context(|| format!("Error writing config file {:?}", path))?;
    println!("Configuration file created at: {:?}", path);
    println!("Edit this file to choose the data source and columns.");
    Ok(())
}

fn select_source(args: &[String], config: &Config) -> Box<dyn DataSource> {
    if let Some(url) = flag_value(args, "--url") {
        return Box::new(HttpJsonSource::new(&url));
    }

    let file_flag = flag_value(args, "--file").or_else(|| flag_value(args, "--csv"));
    let positional = args
        .iter()
        .skip(1)
        .filter(|arg| !arg.starts_with("--"))
        .find(|arg| arg.ends_with(".csv") || arg.ends_with(".json"))
        .cloned();

    match file_flag
        .or(positional)
        .map(PathBuf::from)
        .or_else(|| config.source.file.clone())
    {
        Some(path) => file_source(path),
        None => Box::new(HttpJsonSource::new(&config.source.url)),
    }
}

fn print_grid(config: &Config, source: &dyn DataSource, scroll_px: u64) -> Result<()> {
    vgrid::utils::logging::init_stderr_tracing();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;

    let viewport = FixedViewport::new(print_page_height(config.grid.row_height));
    let mut engine = GridEngine::new(
        config.column_descriptors(),
        TablePrinter::new(config.display.clone()),
        viewport,
        config.grid_settings(),
    );
    runtime.block_on(engine.load(source));

    if scroll_px > 0 {
        engine.viewport_mut().offset = scroll_px;
        engine.handle_event(GridEvent::Scrolled, Instant::now());
    }

    engine.target().print(engine.state().view().row_count());
    Ok(())
}

fn run_interactive(config: &Config, source: &dyn DataSource) -> Result<()> {
    let logs = vgrid::utils::logging::init_tracing();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;

    let mut grid = TerminalGrid::new(
        config.column_descriptors(),
        config.grid_settings(),
        config.display.clone(),
        source.describe(),
    )
    .with_logs(logs);
    runtime.block_on(grid.engine_mut().load(source));

    run_terminal_grid(&mut grid)
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_help();
        return Ok(());
    }

    if args.contains(&"--init-config".to_string()) {
        let config = Config::init_wizard()?;
        println!("\nConfiguration initialized successfully!");
        if !config.display.use_glyphs {
            println!("Note: Simple mode enabled (ASCII sort indicators)");
        }
        return Ok(());
    }

    if args.contains(&"--generate-config".to_string()) {
        return generate_config();
    }

    let config = match flag_value(&args, "--config") {
        Some(path) => Config::load_from(&PathBuf::from(path))?,
        None => Config::load()?,
    };

    let source = select_source(&args, &config);

    if args.contains(&"--print".to_string()) {
        let scroll_px = match flag_value(&args, "--scroll") {
            Some(px) => px
                .parse()
                .with_context(|| format!("Invalid --scroll value '{}'", px))?,
            None => 0,
        };
        return print_grid(&config, source.as_ref(), scroll_px);
    }

    run_interactive(&config, source.as_ref())
}

/// Viewport height for one printed page of rows
fn print_page_height(row_height: u32) -> u32 {
    row_height.max(1).saturating_mul(PRINT_PAGE_ROWS)
}
