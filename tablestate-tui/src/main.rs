//! Terminal demo for the `tablestate` engine.
//!
//! Drag headers to reorder, drag a header's right edge to resize, click a
//! header to sort. Layout survives restarts through the SQLite backend.

mod app;
mod dataset;
mod header;
mod paths;
mod terminal;

use std::fs::{self, File};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info};
use simplelog::{Config, LevelFilter, WriteLogger};
use tablestate::{MemoryBackend, Record, State, StorageBackend, TableOptions, TableState};
use tablestate_sqlite::SqliteBackend;

use crate::app::App;
use crate::header::TerminalCapture;
use crate::terminal::Terminal;

#[derive(Parser)]
#[command(name = "tablestate-tui")]
#[command(about = "Interactive table with persisted column layout", long_about = None)]
#[command(version)]
struct Cli {
    /// Storage namespace for the saved layout
    #[arg(short, long, default_value = "people")]
    namespace: String,

    /// Keep the layout in memory only
    #[arg(long)]
    memory: bool,

    /// Skip the header slide after a reorder
    #[arg(long)]
    reduced_motion: bool,
}

fn init_logging() {
    let Some(path) = paths::log_file() else { return };
    if let Some(dir) = path.parent() {
        if let Err(e) = fs::create_dir_all(dir) {
            eprintln!("Failed to create log directory {}: {}", dir.display(), e);
            return;
        }
        if let Err(e) = paths::archive_logs(dir, paths::KEPT_LOGS) {
            eprintln!("Failed to rotate logs in {}: {}", dir.display(), e);
        }
    }
    let file = match File::create(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to create log file {}: {}", path.display(), e);
            return;
        }
    };
    if let Err(e) = WriteLogger::init(LevelFilter::Debug, Config::default(), file) {
        eprintln!("Failed to initialize logger: {}", e);
    }
}

fn open_storage(memory: bool) -> Arc<dyn StorageBackend> {
    if !memory && let Some(path) = paths::layouts_db() {
        match SqliteBackend::open(&path) {
            Ok(backend) => {
                info!("Layouts stored in {}", path.display());
                return Arc::new(backend);
            }
            Err(e) => error!("Failed to open {}: {}", path.display(), e),
        }
    }
    info!("Layouts kept in memory");
    Arc::new(MemoryBackend::new())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let columns = State::new(dataset::columns());
    let rows = State::new(dataset::rows());
    let capture = TerminalCapture::default();

    let sorted_rows = rows.clone();
    let options = TableOptions::<Record>::new()
        .storage_namespace(cli.namespace)
        .storage(open_storage(cli.memory))
        .column_dnd(true)
        .reduced_motion(cli.reduced_motion)
        .pointer_capture(capture.clone())
        .on_column_order_change(|change| {
            info!("Column order is now {}", change.order.join(", "));
        })
        .on_manual_sort_change(move |change| {
            let rows = match change.direction {
                Some(_) => change.column.apply_sort_function(&change.rows, change.direction),
                None => dataset::by_id(&change.rows),
            };
            sorted_rows.set(rows);
        });
    let table = TableState::new(columns, rows, options);

    let result = Terminal::new().and_then(|mut terminal| App::new(table, capture).run(&mut terminal));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Terminal error: {}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
