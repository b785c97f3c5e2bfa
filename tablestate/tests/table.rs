use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use tablestate::column::Column;
use tablestate::interaction::{
    CaptureHandle, ColumnOrderChange, HeaderElement, HeaderRect, PointerCapture, SlideTransition,
};
use tablestate::persistence::{MemoryBackend, StorageBackend};
use tablestate::pipeline::SortDirection;
use tablestate::row::{Record, RowKey};
use tablestate::state::State;
use tablestate::table::{
    ColumnStyle, Environment, ManualFilterChange, ManualSortChange, TableOptions, TableState,
};
use tablestate::value::Value;

// =============================================================================
// Fixtures
// =============================================================================

fn columns() -> Vec<Column<Record>> {
    vec![
        Column::new("id", "ID").sortable(),
        Column::new("name", "Name").sortable().filterable(),
        Column::new("status", "Status").filterable(),
    ]
}

fn rows() -> Vec<Record> {
    vec![
        Record::new().set("id", 3).set("name", "Alice").set("status", "open"),
        Record::new().set("id", 1).set("name", "bob").set("status", "closed"),
        Record::new().set("id", 2).set("name", "ALBERT").set("status", "open"),
    ]
}

fn ids(rows: &[Record]) -> Vec<i64> {
    rows.iter()
        .filter_map(|row| match row.get("id") {
            Some(Value::Int(id)) => Some(*id),
            _ => None,
        })
        .collect()
}

fn keys(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

fn table_with(options: TableOptions<Record>) -> TableState<Record> {
    let table = TableState::new(State::new(columns()), State::new(rows()), options);
    table.mount();
    table
}

/// Options with header drag-and-drop switched on.
fn draggable() -> TableOptions<Record> {
    TableOptions::new().column_dnd(true)
}

fn table() -> TableState<Record> {
    table_with(draggable())
}

fn persistent(backend: &Arc<MemoryBackend>) -> TableOptions<Record> {
    draggable()
        .storage_namespace("t")
        .storage(backend.clone())
}

fn stored(backend: &MemoryBackend, key: &str) -> Option<serde_json::Value> {
    backend
        .get(key)
        .unwrap()
        .map(|raw| serde_json::from_str(&raw).unwrap())
}

#[derive(Clone, Default)]
struct CountingCapture {
    captured: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl CountingCapture {
    fn counts(&self) -> (usize, usize) {
        (
            self.captured.load(Ordering::SeqCst),
            self.released.load(Ordering::SeqCst),
        )
    }
}

impl PointerCapture for CountingCapture {
    fn capture(&self) -> CaptureHandle {
        self.captured.fetch_add(1, Ordering::SeqCst);
        let released = Arc::clone(&self.released);
        CaptureHandle::new(move || {
            released.fetch_add(1, Ordering::SeqCst);
        })
    }
}

#[derive(Default)]
struct FakeHeader {
    rect: Mutex<Option<HeaderRect>>,
    slides: Mutex<Vec<SlideTransition>>,
}

impl FakeHeader {
    fn at(left: f64, width: f64) -> Arc<Self> {
        let header = Self::default();
        header.place(left, width);
        Arc::new(header)
    }

    fn place(&self, left: f64, width: f64) {
        *self.rect.lock().unwrap() = Some(HeaderRect { left, width });
    }
}

impl HeaderElement for FakeHeader {
    fn bounds(&self) -> Option<HeaderRect> {
        *self.rect.lock().unwrap()
    }

    fn animate(&self, transition: SlideTransition) {
        self.slides.lock().unwrap().push(transition);
    }
}

// =============================================================================
// Views
// =============================================================================

#[test]
fn test_initial_views() {
    let table = table();
    assert_eq!(table.column_order(), keys(&["id", "name", "status"]));
    assert_eq!(table.visible_columns().len(), 3);
    assert_eq!(ids(&table.sorted_rows()), [3, 1, 2]);
    assert_eq!(table.filter("name"), Value::from(""));
}

#[test]
fn test_layout_is_reconciled_before_mount() {
    let table = TableState::new(State::new(columns()), State::new(rows()), TableOptions::new());
    assert_eq!(table.column_order(), keys(&["id", "name", "status"]));
}

#[test]
fn test_views_are_memoized() {
    let table = table();
    let first = table.sorted_rows();
    let second = table.sorted_rows();
    assert!(Arc::ptr_eq(&first, &second));

    table.set_filter("name", "al");
    let third = table.sorted_rows();
    assert!(!Arc::ptr_eq(&first, &third));
}

#[test]
fn test_row_updates_flow_through() {
    let table = table();
    table.rows().update(|rows| rows.push(Record::new().set("id", 4).set("name", "Dan")));
    assert_eq!(ids(&table.sorted_rows()), [3, 1, 2, 4]);
}

#[test]
fn test_column_changes_reconcile_layout() {
    let table = table();
    table.drag_start("status");
    table.drop("id");
    table.columns().update(|cols| {
        cols.retain(|c| c.key != "id");
        cols.push(Column::new("email", "Email"));
    });
    assert_eq!(table.column_order(), keys(&["status", "name", "email"]));
    assert!(table.filters().contains_key("email"));
    assert!(!table.filters().contains_key("id"));
}

#[test]
fn test_column_changes_show_hidden_columns_again() {
    let table = table();
    table.toggle_column("status");
    table.set_columns(columns());
    assert_eq!(table.enabled_column_keys(), keys(&["id", "name", "status"]));
}

#[test]
fn test_row_key() {
    let table = table();
    let rows = table.sorted_rows();
    assert_eq!(table.row_key(&rows[0], 0), "3");
    assert_eq!(table.row_key(&Record::new(), 5), "5");

    let custom = table_with(TableOptions::new().row_key(RowKey::function(|row: &Record, _| {
        row.get("name").map(Value::to_text).unwrap_or_default()
    })));
    assert_eq!(custom.row_key(&rows[0], 0), "Alice");
}

#[test]
fn test_display_value_uses_formatter() {
    let table = table();
    let column = Column::new("name", "Name").formatter(|value: &Value, _: &Record| {
        value.to_text().to_uppercase()
    });
    let row = Record::new().set("name", "ada");
    assert_eq!(table.display_value(&row, &column), Value::from("ADA"));
    assert_eq!(table.display_value(&row, &Column::new("name", "Name")), Value::from("ada"));
}

#[test]
fn test_dirty_flag() {
    let table = table();
    assert!(table.is_dirty());
    table.clear_dirty();
    table.toggle_sort("id");
    assert!(table.is_dirty());
}

// =============================================================================
// Sorting
// =============================================================================

#[test]
fn test_sort_cycle() {
    let table = table();
    assert_eq!(table.toggle_sort("id"), Some(SortDirection::Asc));
    assert_eq!(ids(&table.sorted_rows()), [1, 2, 3]);
    assert_eq!(table.toggle_sort("id"), Some(SortDirection::Desc));
    assert_eq!(ids(&table.sorted_rows()), [3, 2, 1]);
    assert_eq!(table.toggle_sort("id"), None);
    assert_eq!(ids(&table.sorted_rows()), [3, 1, 2]);
    assert!(table.sort().is_none());
}

#[test]
fn test_sorting_another_column_restarts_ascending() {
    let table = table();
    table.toggle_sort("id");
    table.toggle_sort("id");
    assert_eq!(table.toggle_sort("name"), Some(SortDirection::Asc));
    assert_eq!(table.sort_direction("id"), None);
    assert_eq!(table.sort_direction("name"), Some(SortDirection::Asc));
}

#[test]
fn test_unsortable_and_unknown_columns_ignored() {
    let table = table();
    assert_eq!(table.toggle_sort("status"), None);
    assert_eq!(table.toggle_sort("ghost"), None);
    assert!(table.sort().is_none());
}

#[test]
fn test_sort_function_column_notifies_instead_of_sorting() {
    let notices: Arc<Mutex<Vec<ManualSortChange<Record>>>> = Arc::default();
    let sink = notices.clone();
    let table = TableState::new(
        State::new(vec![
            Column::new("id", "ID")
                .sortable()
                .sort_function(|_: &Record, _: &Record| std::cmp::Ordering::Less),
        ]),
        State::new(rows()),
        TableOptions::new().on_manual_sort_change(move |change| {
            sink.lock().unwrap().push(change.clone());
        }),
    );
    table.mount();

    table.toggle_sort("id");
    assert_eq!(ids(&table.sorted_rows()), [3, 1, 2]);
    table.toggle_sort("id");
    assert_eq!(ids(&table.sorted_rows()), [3, 1, 2]);

    let notices = notices.lock().unwrap();
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[0].column_key, "id");
    assert_eq!(notices[0].direction, Some(SortDirection::Asc));
    assert_eq!(notices[1].direction, Some(SortDirection::Desc));
    assert_eq!(ids(&notices[0].rows), [3, 1, 2]);
    assert!(notices[0].column.has_sort_function());
}

#[test]
fn test_manual_sort_table_notifies_for_every_column() {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = count.clone();
    let table = table_with(TableOptions::new().manual_sort(true).on_manual_sort_change(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));
    table.toggle_sort("name");
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(ids(&table.sorted_rows()), [3, 1, 2]);

    table.set_manual_sort(false);
    table.toggle_sort("name");
    assert_eq!(count.load(Ordering::SeqCst), 1);
    // desc by name: bob, alice, albert
    assert_eq!(ids(&table.sorted_rows()), [1, 3, 2]);
}

#[test]
fn test_clear_sort() {
    let table = table();
    table.toggle_sort("id");
    table.clear_sort();
    assert!(table.sort().is_none());
    assert_eq!(ids(&table.sorted_rows()), [3, 1, 2]);
}

// =============================================================================
// Filtering
// =============================================================================

#[test]
fn test_filter_case_insensitive() {
    let table = table();
    table.set_filter("name", "AL");
    assert_eq!(ids(&table.filtered_rows()), [3, 2]);
    assert_eq!(table.filter("name"), Value::from("AL"));
}

#[test]
fn test_filter_and_sort_compose() {
    let table = table();
    table.set_filter("status", "open");
    table.toggle_sort("id");
    assert_eq!(ids(&table.sorted_rows()), [2, 3]);
}

#[test]
fn test_filter_on_hidden_column_still_applies() {
    let table = table();
    table.toggle_column("status");
    table.set_filter("status", "closed");
    assert_eq!(ids(&table.sorted_rows()), [1]);
}

#[test]
fn test_clear_filters() {
    let table = table();
    table.set_filter("name", "bob");
    table.clear_filters();
    assert_eq!(ids(&table.sorted_rows()), [3, 1, 2]);
    assert_eq!(table.filters().len(), 3);
}

#[test]
fn test_filter_function_column_notifies() {
    let notices: Arc<Mutex<Vec<ManualFilterChange<Record>>>> = Arc::default();
    let sink = notices.clone();
    let mut cols = columns();
    cols[2] = Column::new("status", "Status").filter_function(|row: &Record, value: &Value| {
        row.get("status") == Some(value)
    });
    let table = TableState::new(
        State::new(cols),
        State::new(rows()),
        TableOptions::new().on_manual_filter_change(move |change| {
            sink.lock().unwrap().push(change.clone());
        }),
    );
    table.mount();

    table.set_filter("status", "closed");
    // The delegate column does not narrow rows locally.
    assert_eq!(ids(&table.filtered_rows()), [3, 1, 2]);
    table.set_filter("name", "bob");
    let notices = notices.lock().unwrap();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].column_key, "status");
    assert_eq!(notices[0].value, Value::from("closed"));
    assert_eq!(notices[0].filters.get("status"), Some(&Value::from("closed")));
    assert_eq!(ids(&notices[0].rows), [3, 1, 2]);

    let narrowed = notices[0].column.apply_filter_function(&rows(), &notices[0].value);
    assert_eq!(ids(&narrowed), [1]);
}

#[test]
fn test_manual_filter_table_leaves_rows_alone() {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = count.clone();
    let table = table_with(TableOptions::new().manual_filter(true).on_manual_filter_change(
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        },
    ));
    table.set_filter("name", "zzz");
    assert_eq!(ids(&table.filtered_rows()), [3, 1, 2]);
    assert_eq!(count.load(Ordering::SeqCst), 1);

    table.clear_filters();
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

// =============================================================================
// Visibility
// =============================================================================

#[test]
fn test_toggle_column() {
    let table = table();
    assert!(table.toggle_column("name"));
    assert!(!table.is_column_enabled("name"));
    let visible: Vec<String> = table.visible_columns().iter().map(|c| c.key.clone()).collect();
    assert_eq!(visible, keys(&["id", "status"]));
    // Hidden columns keep their place in the order.
    assert_eq!(table.column_order(), keys(&["id", "name", "status"]));

    assert!(table.toggle_column("name"));
    assert_eq!(table.enabled_column_keys(), keys(&["id", "status", "name"]));
}

#[test]
fn test_toggle_column_rejects_sole_column() {
    let table = table();
    assert!(table.toggle_column("id"));
    assert!(table.toggle_column("name"));
    assert!(!table.toggle_column("status"));
    assert_eq!(table.enabled_column_keys(), keys(&["status"]));
    assert!(!table.toggle_column("ghost"));
}

// =============================================================================
// Drag Reorder
// =============================================================================

#[test]
fn test_drag_and_drop_reorders() {
    let changes: Arc<Mutex<Vec<ColumnOrderChange>>> = Arc::default();
    let sink = changes.clone();
    let table = table_with(draggable().on_column_order_change(move |change| {
        sink.lock().unwrap().push(change.clone());
    }));

    table.drag_start("id");
    assert_eq!(table.drag_source().as_deref(), Some("id"));
    table.drag_over("status");
    assert_eq!(table.drag_over_key().as_deref(), Some("status"));

    let change = table.drop("status").unwrap();
    assert_eq!(change.order, keys(&["name", "status", "id"]));
    assert_eq!(table.column_order(), keys(&["name", "status", "id"]));
    assert!(table.drag_source().is_none());
    assert!(table.drag_over_key().is_none());
    assert_eq!(changes.lock().unwrap().as_slice(), [change]);
}

#[test]
fn test_drop_backward() {
    let table = table();
    table.drag_start("status");
    let change = table.drop("id").unwrap();
    assert_eq!(change.order, keys(&["status", "id", "name"]));
}

#[test]
fn test_drop_on_self_or_without_source_is_noop() {
    let table = table();
    assert!(table.drop("name").is_none());

    table.drag_start("name");
    assert!(table.drop("name").is_none());
    assert!(table.drag_source().is_none());

    table.drag_start("name");
    assert!(table.drop("ghost").is_none());
    assert_eq!(table.column_order(), keys(&["id", "name", "status"]));
}

#[test]
fn test_drag_over_and_leave() {
    let table = table();
    table.drag_over("name");
    assert!(table.drag_over_key().is_none());

    table.drag_start("id");
    table.drag_over("id");
    assert!(table.drag_over_key().is_none());
    table.drag_over("name");
    table.drag_leave("status");
    assert_eq!(table.drag_over_key().as_deref(), Some("name"));
    table.drag_leave("name");
    assert!(table.drag_over_key().is_none());

    table.drag_end();
    assert!(table.drag_source().is_none());
}

#[test]
fn test_drag_is_off_by_default() {
    let table = table_with(TableOptions::new());
    table.drag_start("id");
    assert!(table.drag_source().is_none());
    table.drag_over("name");
    assert!(table.drag_over_key().is_none());
    assert!(table.drop("status").is_none());
    assert_eq!(table.column_order(), keys(&["id", "name", "status"]));
}

#[test]
fn test_drag_disabled() {
    let table = table_with(TableOptions::new().column_dnd(false));
    table.drag_start("id");
    assert!(table.drag_source().is_none());
    assert!(table.drop("name").is_none());

    table.set_column_dnd(true);
    table.drag_start("id");
    table.set_column_dnd(false);
    assert!(table.drop("name").is_none());
    assert!(table.drag_source().is_none());
    assert_eq!(table.column_order(), keys(&["id", "name", "status"]));
}

#[test]
fn test_order_callback_can_read_table() {
    let slot: Arc<OnceLock<TableState<Record>>> = Arc::default();
    let seen: Arc<Mutex<Vec<String>>> = Arc::default();
    let (slot_ref, sink) = (slot.clone(), seen.clone());
    let table = table_with(draggable().on_column_order_change(move |_| {
        if let Some(table) = slot_ref.get() {
            *sink.lock().unwrap() = table.column_order();
        }
    }));
    let _ = slot.set(table.clone());

    table.drag_start("id");
    table.drop("name");
    assert_eq!(*seen.lock().unwrap(), keys(&["name", "id", "status"]));
}

#[test]
fn test_reorder_animation_flush() {
    let table = table();
    let headers = [
        ("id", FakeHeader::at(0.0, 140.0)),
        ("name", FakeHeader::at(140.0, 140.0)),
        ("status", FakeHeader::at(280.0, 140.0)),
    ];
    for (key, header) in &headers {
        table.register_header(key, Some(header.clone() as Arc<dyn HeaderElement>));
    }

    assert!(table.flush_reorder_animation().is_empty());

    table.drag_start("id");
    table.drop("status");
    // Host renders name, status, id.
    headers[1].1.place(0.0, 140.0);
    headers[2].1.place(140.0, 140.0);
    headers[0].1.place(280.0, 140.0);

    let slides = table.flush_reorder_animation();
    let offsets: Vec<(&str, f64)> = slides
        .iter()
        .map(|s| (s.column_key.as_str(), s.transition.from_offset))
        .collect();
    assert_eq!(offsets, [("id", -280.0), ("name", 140.0), ("status", 140.0)]);
    assert_eq!(headers[0].1.slides.lock().unwrap().len(), 1);

    // Flushing again finds nothing pending.
    assert!(table.flush_reorder_animation().is_empty());
}

#[test]
fn test_reduced_motion_skips_animation() {
    let table = table_with(draggable().reduced_motion(true));
    let header = FakeHeader::at(0.0, 140.0);
    table.register_header("id", Some(header.clone() as Arc<dyn HeaderElement>));

    table.drag_start("id");
    table.drop("name");
    header.place(140.0, 140.0);
    assert!(table.flush_reorder_animation().is_empty());
    assert!(header.slides.lock().unwrap().is_empty());
}

// =============================================================================
// Resize
// =============================================================================

#[test]
fn test_resize_from_stored_width() {
    let backend = Arc::new(MemoryBackend::new());
    backend.set("t:widths", r#"{"name": 200}"#).unwrap();
    let table = table_with(persistent(&backend));

    table.resize_start(100.0, "name");
    let state = table.active_resize().unwrap();
    assert_eq!(state.column_key, "name");
    assert_eq!(state.start_width, 200.0);

    assert_eq!(table.resize_move(130.0), Some(230.0));
    assert_eq!(table.column_width("name"), Some(230.0));
    assert_eq!(table.resize_move(-1000.0), Some(140.0));
    assert_eq!(table.column_width("name"), Some(140.0));

    table.resize_end();
    assert!(table.active_resize().is_none());
    assert_eq!(table.resize_move(500.0), None);
    assert_eq!(stored(&backend, "t:widths").unwrap()["name"].as_f64(), Some(140.0));
}

#[test]
fn test_resize_start_width_falls_back_to_header_then_minimum() {
    let table = table();
    table.register_header("id", Some(FakeHeader::at(0.0, 180.0) as Arc<dyn HeaderElement>));
    table.resize_start(0.0, "id");
    assert_eq!(table.active_resize().unwrap().start_width, 180.0);
    table.resize_end();

    table.resize_start(0.0, "name");
    assert_eq!(table.active_resize().unwrap().start_width, 140.0);
    assert_eq!(table.resize_move(10.0), Some(150.0));
}

#[test]
fn test_column_style() {
    let table = table();
    assert_eq!(table.column_style("name"), ColumnStyle::default());
    assert!(table.column_style("name").css().is_empty());

    table.resize_start(0.0, "name");
    table.resize_move(90.0);
    table.resize_end();
    let style = table.column_style("name");
    assert_eq!(style.width, Some(230.0));
    assert_eq!(style.css(), "width: 230px; min-width: 230px;");
}

#[test]
fn test_resize_cancels_drag_and_blocks_new_drags() {
    let table = table();
    table.drag_start("id");
    table.resize_start(0.0, "name");
    assert!(table.drag_source().is_none());
    assert!(table.is_resizing());

    table.drag_start("status");
    assert!(table.drag_source().is_none());

    // Ending a drag never touches the resize.
    table.drag_end();
    assert!(table.is_resizing());
}

#[test]
fn test_capture_released_on_every_exit() {
    let capture = CountingCapture::default();
    let table = table_with(TableOptions::new().pointer_capture(capture.clone()));

    table.resize_start(0.0, "id");
    assert_eq!(capture.counts(), (1, 0));
    table.resize_end();
    assert_eq!(capture.counts(), (1, 1));

    table.resize_start(0.0, "id");
    table.resize_start(0.0, "name");
    assert_eq!(capture.counts(), (3, 2));
    assert_eq!(table.active_resize().unwrap().column_key, "name");

    table.teardown();
    assert_eq!(capture.counts(), (3, 3));
    assert!(!table.is_resizing());

    table.resize_start(0.0, "id");
    drop(table);
    assert_eq!(capture.counts(), (4, 4));
}

/// Capture backed by a single flag, the way a host toggles pointer capture.
#[derive(Clone, Default)]
struct FlagCapture {
    held: Arc<AtomicBool>,
}

impl PointerCapture for FlagCapture {
    fn capture(&self) -> CaptureHandle {
        self.held.store(true, Ordering::SeqCst);
        let held = Arc::clone(&self.held);
        CaptureHandle::new(move || held.store(false, Ordering::SeqCst))
    }
}

#[test]
fn test_restarting_resize_keeps_capture_held() {
    let capture = FlagCapture::default();
    let table = table_with(TableOptions::new().pointer_capture(capture.clone()));

    table.resize_start(100.0, "id");
    table.resize_start(200.0, "name");
    assert!(table.is_resizing());
    assert!(capture.held.load(Ordering::SeqCst));
    assert_eq!(table.active_resize().unwrap().column_key, "name");

    table.resize_end();
    assert!(!capture.held.load(Ordering::SeqCst));
}

#[test]
fn test_server_environment_is_inert() {
    let backend = Arc::new(MemoryBackend::new());
    let capture = CountingCapture::default();
    let table = table_with(
        persistent(&backend)
            .environment(Environment::Server)
            .pointer_capture(capture.clone()),
    );

    table.resize_start(0.0, "id");
    assert!(table.active_resize().is_none());
    assert_eq!(capture.counts(), (0, 0));
    table.toggle_column("id");
    assert!(backend.is_empty());
    assert_eq!(table.environment(), Environment::Server);
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_mount_saves_once_loaded() {
    let backend = Arc::new(MemoryBackend::new());
    let table = TableState::new(State::new(columns()), State::new(rows()), persistent(&backend));
    table.toggle_column("status");
    assert!(backend.is_empty());

    table.mount();
    assert_eq!(stored(&backend, "t:order"), Some(serde_json::json!(["id", "name", "status"])));
    assert_eq!(stored(&backend, "t:enabledColumns"), Some(serde_json::json!(["id", "name"])));
    assert_eq!(stored(&backend, "t:widths"), Some(serde_json::json!({})));
}

#[test]
fn test_changes_are_persisted() {
    let backend = Arc::new(MemoryBackend::new());
    let table = table_with(persistent(&backend));

    table.drag_start("id");
    table.drop("status");
    assert_eq!(stored(&backend, "t:order"), Some(serde_json::json!(["name", "status", "id"])));

    table.toggle_column("name");
    assert_eq!(stored(&backend, "t:enabledColumns"), Some(serde_json::json!(["id", "status"])));
}

#[test]
fn test_mount_restores_layout() {
    let backend = Arc::new(MemoryBackend::new());
    backend.set("t:order", r#"["status", "id"]"#).unwrap();
    backend.set("t:enabledColumns", r#"["status", "name"]"#).unwrap();
    backend.set("t:widths", r#"{"name": 50, "id": 260}"#).unwrap();
    let table = table_with(persistent(&backend));

    assert_eq!(table.column_order(), keys(&["status", "id", "name"]));
    let visible: Vec<String> = table.visible_columns().iter().map(|c| c.key.clone()).collect();
    assert_eq!(visible, keys(&["status", "name"]));
    // Too narrow to restore.
    assert_eq!(table.column_width("name"), None);
    assert_eq!(table.column_width("id"), Some(260.0));
}

#[test]
fn test_layout_survives_a_new_table() {
    let backend = Arc::new(MemoryBackend::new());
    let first = table_with(persistent(&backend));
    first.drag_start("status");
    first.drop("id");
    first.resize_start(0.0, "name");
    first.resize_move(60.0);
    first.resize_end();
    drop(first);

    let second = table_with(persistent(&backend));
    assert_eq!(second.column_order(), keys(&["status", "id", "name"]));
    assert_eq!(second.column_width("name"), Some(200.0));
}

#[test]
fn test_malformed_storage_falls_back_to_defaults() {
    let backend = Arc::new(MemoryBackend::new());
    backend.set("t:order", "{{{").unwrap();
    backend.set("t:widths", r#"{"id": 300}"#).unwrap();
    let table = table_with(persistent(&backend));

    assert_eq!(table.column_order(), keys(&["id", "name", "status"]));
    assert_eq!(table.enabled_column_keys(), keys(&["id", "name", "status"]));
    assert!(table.column_widths().is_empty());
    // The defaults are written back.
    assert_eq!(stored(&backend, "t:order"), Some(serde_json::json!(["id", "name", "status"])));
}

#[test]
fn test_storage_namespace_change() {
    let backend = Arc::new(MemoryBackend::new());
    let table = table_with(persistent(&backend));
    table.set_storage_namespace("u");
    assert_eq!(table.storage_namespace().as_deref(), Some("u"));
    assert_eq!(stored(&backend, "u:order"), Some(serde_json::json!(["id", "name", "status"])));
}

#[test]
fn test_reset_layout() {
    let backend = Arc::new(MemoryBackend::new());
    let table = table_with(persistent(&backend));
    table.drag_start("id");
    table.drop("status");
    table.toggle_column("name");

    table.reset_layout();
    assert_eq!(table.column_order(), keys(&["id", "name", "status"]));
    assert_eq!(table.enabled_column_keys(), keys(&["id", "name", "status"]));
    assert!(backend.is_empty());

    // The next change writes again.
    table.toggle_column("name");
    assert_eq!(stored(&backend, "t:enabledColumns"), Some(serde_json::json!(["id", "status"])));
}
