#[cfg(test)]
mod grid_engine_tests {
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::time::{Duration, Instant};
    use vgrid::cell_renderer::NamedRenderer;
    use vgrid::data::data_source::{DataSource, StaticSource};
    use vgrid::data::datatable::{CellValue, ColumnDescriptor, ColumnKind, Row, Tone};
    use vgrid::ui::grid_engine::{GridEngine, GridEvent, GridSettings};
    use vgrid::ui::render_target::{FixedViewport, RecordingTarget, SortIndicator};

    type Engine = GridEngine<RecordingTarget, FixedViewport>;

    struct FailingSource;

    #[async_trait]
    impl DataSource for FailingSource {
        async fn fetch(&self) -> Result<Vec<Row>> {
            Err(anyhow!("connection refused"))
        }

        fn describe(&self) -> String {
            "http://localhost:3000/users".to_string()
        }
    }

    fn columns() -> Vec<ColumnDescriptor> {
        let mut age = ColumnDescriptor::new("Age", "age")
            .sortable(true)
            .filterable(true);
        age.renderer = Some(NamedRenderer::AgeBand.render_fn());

        vec![
            ColumnDescriptor::new("Name", "name")
                .sortable(true)
                .filterable(true),
            age,
            ColumnDescriptor::new("Address", "address"),
        ]
    }

    fn user(name: &str, age: f64, address: &str) -> Row {
        [
            ("name", CellValue::String(name.to_string())),
            ("age", CellValue::Number(age)),
            ("address", CellValue::String(address.to_string())),
        ]
        .into_iter()
        .collect()
    }

    fn users() -> Vec<Row> {
        vec![
            user("John", 45.0, "1 High St"),
            user("Amy", 22.0, "2 Low Rd"),
            user("Joan", 60.0, "3 Mid Ave"),
        ]
    }

    fn numbered(count: usize) -> Vec<Row> {
        (0..count)
            .map(|i| user(&format!("user{:04}", i), (i % 90) as f64, "somewhere"))
            .collect()
    }

    fn engine(settings: GridSettings) -> Engine {
        GridEngine::new(
            columns(),
            RecordingTarget::new(),
            FixedViewport::new(1000),
            settings,
        )
    }

    async fn loaded(rows: Vec<Row>) -> Engine {
        let mut engine = engine(GridSettings::default());
        engine.load(&StaticSource::new(rows)).await;
        engine
    }

    #[tokio::test]
    async fn test_load_renders_header_and_rows() {
        let engine = loaded(users()).await;
        let target = engine.target();

        assert_eq!(target.column_widths, vec![1, 1, 1]);
        let labels: Vec<&str> = target.header.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Name", "Age", "Address"]);
        assert!(target.header[0].clickable);
        assert!(!target.header[2].clickable);
        assert_eq!(target.column_text(0), vec!["John", "Amy", "Joan"]);
        assert_eq!(target.vertical_offset, 0);
        assert!(target.placeholder.is_none());
    }

    #[tokio::test]
    async fn test_renderer_output_reaches_target() {
        let engine = loaded(users()).await;
        let ages: Vec<Tone> = engine.target().rows.iter().map(|r| r.cells[1].tone).collect();
        assert_eq!(ages, vec![Tone::Warning, Tone::Good, Tone::Alert]);
    }

    #[tokio::test]
    async fn test_sort_toggles_direction() {
        let mut engine = loaded(users()).await;
        let now = Instant::now();

        engine.handle_event(GridEvent::SortClicked("age".into()), now);
        assert_eq!(engine.target().column_text(1), vec!["22", "45", "60"]);
        assert_eq!(engine.target().header[1].indicator, SortIndicator::Ascending);
        assert_eq!(engine.target().header[0].indicator, SortIndicator::Neutral);

        engine.handle_event(GridEvent::SortClicked("age".into()), now);
        assert_eq!(engine.target().column_text(1), vec!["60", "45", "22"]);
        assert_eq!(engine.target().header[1].indicator, SortIndicator::Descending);

        engine.handle_event(GridEvent::SortClicked("name".into()), now);
        assert_eq!(engine.target().column_text(0), vec!["Amy", "Joan", "John"]);
        assert_eq!(engine.target().header[0].indicator, SortIndicator::Ascending);
        assert_eq!(engine.target().header[1].indicator, SortIndicator::Neutral);
    }

    #[tokio::test]
    async fn test_sort_on_unsortable_column_renders_nothing() {
        let mut engine = loaded(users()).await;
        let header_renders = engine.target().header_renders;
        let row_renders = engine.target().row_renders;

        engine.handle_event(GridEvent::SortClicked("address".into()), Instant::now());

        assert_eq!(engine.target().header_renders, header_renders);
        assert_eq!(engine.target().row_renders, row_renders);
        assert_eq!(engine.target().column_text(0), vec!["John", "Amy", "Joan"]);
    }

    #[tokio::test]
    async fn test_filter_reads_inputs() {
        let mut engine = loaded(users()).await;
        engine
            .target_mut()
            .filter_inputs
            .insert("name".to_string(), "jo".to_string());

        engine.handle_event(GridEvent::FilterClicked, Instant::now());

        assert_eq!(engine.target().column_text(0), vec!["John", "Joan"]);
        assert_eq!(engine.state().view().source_row_count(), 3);
        // Inputs keep what the user typed
        assert_eq!(engine.target().filter_input_text("name"), Some("jo"));
    }

    #[tokio::test]
    async fn test_filters_are_conjunctive_and_case_insensitive() {
        let mut engine = loaded(users()).await;
        let inputs = &mut engine.target_mut().filter_inputs;
        inputs.insert("name".to_string(), "JO".to_string());
        inputs.insert("age".to_string(), "6".to_string());

        engine.handle_event(GridEvent::FilterClicked, Instant::now());
        assert_eq!(engine.target().column_text(0), vec!["Joan"]);
    }

    #[tokio::test]
    async fn test_filter_with_no_match_shows_placeholder() {
        let mut engine = loaded(users()).await;
        engine
            .target_mut()
            .filter_inputs
            .insert("name".to_string(), "zz".to_string());

        engine.handle_event(GridEvent::FilterClicked, Instant::now());

        assert!(engine.target().rows.is_empty());
        assert_eq!(
            engine.target().placeholder,
            Some(("No data found".to_string(), 3))
        );
    }

    #[tokio::test]
    async fn test_reset_restores_original_order_and_clears_inputs() {
        let mut engine = loaded(users()).await;
        let now = Instant::now();
        engine.handle_event(GridEvent::SortClicked("age".into()), now);
        engine
            .target_mut()
            .filter_inputs
            .insert("name".to_string(), "j".to_string());
        engine.handle_event(GridEvent::FilterClicked, now);

        engine.handle_event(GridEvent::ResetClicked, now);

        let target = engine.target();
        assert_eq!(target.column_text(0), vec!["John", "Amy", "Joan"]);
        assert!(target
            .header
            .iter()
            .all(|cell| cell.indicator == SortIndicator::Neutral));
        assert_eq!(target.filter_input_text("name"), Some(""));
        assert_eq!(target.filter_input_text("age"), Some(""));
    }

    #[tokio::test]
    async fn test_fetch_failure_shows_empty_grid() {
        let mut engine = engine(GridSettings::default());
        engine.load(&FailingSource).await;

        let target = engine.target();
        assert_eq!(target.header.len(), 3);
        assert!(target.rows.is_empty());
        assert_eq!(
            target.placeholder,
            Some(("No data found".to_string(), 3))
        );
        assert_eq!(engine.state().view().source_row_count(), 0);
    }

    #[tokio::test]
    async fn test_only_window_is_materialised() {
        let mut engine = loaded(numbered(1000)).await;
        assert_eq!(engine.target().row_indices(), (0..60).collect::<Vec<_>>());

        engine.viewport_mut().offset = 5000;
        engine.handle_event(GridEvent::Scrolled, Instant::now());

        assert_eq!(engine.target().row_indices(), (80..140).collect::<Vec<_>>());
        assert_eq!(engine.target().vertical_offset, 4000);
        assert_eq!(engine.target().column_text(0)[0], "user0080");
    }

    #[tokio::test]
    async fn test_scroll_does_not_redraw_header() {
        let mut engine = loaded(numbered(200)).await;
        let header_renders = engine.target().header_renders;
        let row_renders = engine.target().row_renders;

        engine.viewport_mut().offset = 2500;
        engine.handle_event(GridEvent::Scrolled, Instant::now());

        assert_eq!(engine.target().header_renders, header_renders);
        assert_eq!(engine.target().row_renders, row_renders + 1);
    }

    #[tokio::test]
    async fn test_sort_keeps_scroll_position() {
        let mut engine = loaded(numbered(1000)).await;
        let now = Instant::now();
        engine.viewport_mut().offset = 5000;
        engine.handle_event(GridEvent::Scrolled, now);

        engine.handle_event(GridEvent::SortClicked("name".into()), now);

        assert_eq!(engine.viewport().offset, 5000);
        assert_eq!(engine.target().row_indices(), (80..140).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_sort_during_coalesced_scroll_uses_latest_offset() {
        let mut engine = loaded(numbered(1000)).await;
        let start = Instant::now();

        engine.viewport_mut().offset = 1500;
        engine.on_scroll(start);
        engine.viewport_mut().offset = 5000;
        engine.on_scroll(start + Duration::from_millis(10));
        assert!(engine.scroll_pending());

        engine.handle_event(
            GridEvent::SortClicked("name".into()),
            start + Duration::from_millis(20),
        );
        assert!(!engine.scroll_pending());
        assert_eq!(engine.state().scroll().offset_px, 5000);
        assert_eq!(engine.target().row_indices().first(), Some(&80));
        assert_eq!(engine.target().vertical_offset, 4000);

        // Nothing left over to move the window later
        engine.poll_scroll(start + Duration::from_millis(500));
        assert_eq!(engine.target().row_indices().first(), Some(&80));
    }

    #[tokio::test]
    async fn test_resize_during_coalesced_scroll_uses_latest_offset() {
        let mut engine = loaded(numbered(1000)).await;
        let start = Instant::now();

        engine.on_scroll(start);
        engine.viewport_mut().offset = 5000;
        engine.viewport_mut().height = 500;
        engine.on_scroll(start + Duration::from_millis(10));
        engine.handle_event(GridEvent::Resized, start + Duration::from_millis(20));

        // 100 rows scrolled past, 10 rows of overscan behind
        assert_eq!(engine.target().row_indices(), (90..120).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_filter_scrolls_to_top() {
        let mut engine = loaded(numbered(1000)).await;
        let now = Instant::now();
        engine.viewport_mut().offset = 5000;
        engine.handle_event(GridEvent::Scrolled, now);

        engine
            .target_mut()
            .filter_inputs
            .insert("name".to_string(), "user00".to_string());
        engine.handle_event(GridEvent::FilterClicked, now);

        assert_eq!(engine.viewport().offset, 0);
        assert_eq!(engine.target().row_indices(), (0..60).collect::<Vec<_>>());
        assert_eq!(engine.state().view().row_count(), 100);
    }

    #[tokio::test]
    async fn test_scroll_bursts_are_throttled() {
        let mut engine = loaded(numbered(1000)).await;
        let start = Instant::now();
        let row_renders = engine.target().row_renders;

        engine.viewport_mut().offset = 1500;
        engine.on_scroll(start);
        assert_eq!(engine.target().row_renders, row_renders + 1);

        for (ms, offset) in [(10, 2500), (20, 3500), (30, 5000)] {
            engine.viewport_mut().offset = offset;
            engine.on_scroll(start + Duration::from_millis(ms));
        }
        assert_eq!(engine.target().row_renders, row_renders + 1);
        assert!(engine.scroll_pending());

        engine.poll_scroll(start + Duration::from_millis(40));
        assert_eq!(engine.target().row_renders, row_renders + 1);

        // Trailing run sees the final position
        engine.poll_scroll(start + Duration::from_millis(50));
        assert_eq!(engine.target().row_renders, row_renders + 2);
        assert_eq!(engine.target().row_indices().first(), Some(&80));
        assert!(!engine.scroll_pending());
    }

    #[tokio::test]
    async fn test_resize_recomputes_window() {
        let mut engine = loaded(numbered(1000)).await;
        engine.viewport_mut().height = 500;
        engine.handle_event(GridEvent::Resized, Instant::now());

        assert_eq!(engine.state().scroll().capacity, 10);
        assert_eq!(engine.target().row_indices(), (0..30).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_reload_replaces_dataset() {
        let mut engine = loaded(users()).await;
        engine.handle_event(GridEvent::SortClicked("age".into()), Instant::now());

        engine.load_rows(vec![user("Zed", 30.0, "9 End Rd")]);

        assert_eq!(engine.target().column_text(0), vec!["Zed"]);
        assert!(!engine.state().sort().is_active());
    }

    #[tokio::test]
    async fn test_typed_column_sorts_numerically() {
        let columns = vec![ColumnDescriptor::new("Score", "score")
            .sortable(true)
            .with_kind(ColumnKind::Number)];
        let mut engine = GridEngine::new(
            columns,
            RecordingTarget::new(),
            FixedViewport::new(1000),
            GridSettings::default(),
        );
        let rows: Vec<Row> = ["10", "9", "n/a", "100"]
            .iter()
            .map(|s| [("score", CellValue::String(s.to_string()))].into_iter().collect())
            .collect();
        engine.load_rows(rows);

        engine.sort("score");
        assert_eq!(engine.target().column_text(0), vec!["n/a", "9", "10", "100"]);
    }
}
