//! Event capture for simulation runs.
//!
//! A [`TableSubscriber`] turns every `tracing` event into one row of a table named after
//! the event's target. Columns appear as fields are first seen, so the schema is whatever
//! the simulation emits.
//!
//! ```ignore
//! // In simulation code:
//! tracing::info!(target: "step", step, gini, unemployment);
//!
//! // In a test or driver:
//! let mut run = instrument::RunRecorder::new("data/runs", "baseline_seed42");
//! // ... run simulation ...
//! let steps = &run.get()["step"];
//! // run drops -> data/runs/baseline_seed42/{step,shock,...}.{parquet,csv} + _ready
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Record};
use tracing::{Event, Id, Metadata, Subscriber};

// === COLUMNS ===

/// One recorded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U64(u64),
    I64(i64),
    F64(f64),
    Bool(bool),
    Str(String),
}

/// Values of one field across all rows of a table.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    U64(Vec<u64>),
    I64(Vec<i64>),
    F64(Vec<f64>),
    Bool(Vec<bool>),
    Str(Vec<String>),
}

impl ColumnData {
    /// Empty column of `value`'s type, pre-filled with `rows` defaults.
    fn for_value(value: &Value, rows: usize) -> Self {
        match value {
            Value::U64(_) => ColumnData::U64(vec![0; rows]),
            Value::I64(_) => ColumnData::I64(vec![0; rows]),
            Value::F64(_) => ColumnData::F64(vec![0.0; rows]),
            Value::Bool(_) => ColumnData::Bool(vec![false; rows]),
            Value::Str(_) => ColumnData::Str(vec![String::new(); rows]),
        }
    }

    /// Append a value; ignored if its type does not match the column's.
    fn push(&mut self, value: Value) {
        match (self, value) {
            (ColumnData::U64(v), Value::U64(x)) => v.push(x),
            (ColumnData::I64(v), Value::I64(x)) => v.push(x),
            (ColumnData::F64(v), Value::F64(x)) => v.push(x),
            (ColumnData::Bool(v), Value::Bool(x)) => v.push(x),
            (ColumnData::Str(v), Value::Str(x)) => v.push(x),
            _ => {}
        }
    }

    fn pad_to(&mut self, rows: usize) {
        let missing = rows.saturating_sub(self.len());
        match self {
            ColumnData::U64(v) => v.extend(std::iter::repeat_n(0, missing)),
            ColumnData::I64(v) => v.extend(std::iter::repeat_n(0, missing)),
            ColumnData::F64(v) => v.extend(std::iter::repeat_n(0.0, missing)),
            ColumnData::Bool(v) => v.extend(std::iter::repeat_n(false, missing)),
            ColumnData::Str(v) => v.extend(std::iter::repeat_n(String::new(), missing)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::U64(v) => v.len(),
            ColumnData::I64(v) => v.len(),
            ColumnData::F64(v) => v.len(),
            ColumnData::Bool(v) => v.len(),
            ColumnData::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_f64(&self) -> Option<&[f64]> {
        match self {
            ColumnData::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<&[u64]> {
        match self {
            ColumnData::U64(v) => Some(v),
            _ => None,
        }
    }
}

// === TABLES ===

/// Rows recorded under one target. Every column always holds `rows` values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTable {
    pub columns: BTreeMap<String, ColumnData>,
    pub rows: usize,
}

impl EventTable {
    /// Append one row. Fields missing from the row are filled with defaults; columns
    /// first seen in this row are back-filled for earlier rows.
    pub fn push_row(&mut self, fields: Vec<(String, Value)>) {
        let rows = self.rows;
        for (name, value) in fields {
            let column = self
                .columns
                .entry(name)
                .or_insert_with(|| ColumnData::for_value(&value, rows));
            // Repeated field names within a row keep the first value
            if column.len() == rows {
                column.push(value);
            }
        }
        self.rows += 1;
        for column in self.columns.values_mut() {
            column.pad_to(self.rows);
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns.get(name)
    }

    /// Convert to a polars DataFrame, columns in name order.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let columns = self
            .columns
            .iter()
            .map(|(name, data)| match data {
                ColumnData::U64(v) => Column::new(name.into(), v),
                ColumnData::I64(v) => Column::new(name.into(), v),
                ColumnData::F64(v) => Column::new(name.into(), v),
                ColumnData::Bool(v) => Column::new(name.into(), v),
                ColumnData::Str(v) => Column::new(name.into(), v),
            })
            .collect();
        DataFrame::new(columns)
    }
}

/// All tables captured on this thread, keyed by event target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recorder {
    pub tables: BTreeMap<String, EventTable>,
}

impl Recorder {
    pub fn table(&self, target: &str) -> Option<&EventTable> {
        self.tables.get(target)
    }

    pub fn to_dataframes(&self) -> PolarsResult<BTreeMap<String, DataFrame>> {
        self.tables
            .iter()
            .map(|(name, table)| Ok((name.clone(), table.to_dataframe()?)))
            .collect()
    }
}

thread_local! {
    static RECORDER: RefCell<Recorder> = RefCell::default();
}

// === SUBSCRIBER ===

#[derive(Default)]
struct RowVisitor {
    fields: Vec<(String, Value)>,
}

impl RowVisitor {
    fn put(&mut self, field: &Field, value: Value) {
        self.fields.push((field.name().to_string(), value));
    }
}

impl Visit for RowVisitor {
    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::U64(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::I64(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, Value::F64(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::Bool(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::Str(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, Value::Str(format!("{:?}", value)));
    }
}

/// Subscriber that records info-level events into the thread-local [`Recorder`].
/// Spans are ignored.
pub struct TableSubscriber;

impl Subscriber for TableSubscriber {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.is_event() && *metadata.level() <= tracing::Level::INFO
    }

    fn new_span(&self, _span: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let mut visitor = RowVisitor::default();
        event.record(&mut visitor);
        let target = event.metadata().target().to_string();
        RECORDER.with(|r| {
            r.borrow_mut()
                .tables
                .entry(target)
                .or_default()
                .push_row(visitor.fields)
        });
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

/// Install [`TableSubscriber`] as the global default. Later calls are no-ops.
pub fn install_subscriber() {
    let _ = tracing::subscriber::set_global_default(TableSubscriber);
}

/// Take everything recorded on this thread so far.
pub fn drain() -> Recorder {
    RECORDER.with(|r| std::mem::take(&mut *r.borrow_mut()))
}

pub fn clear() {
    RECORDER.with(|r| *r.borrow_mut() = Recorder::default());
}

// === EXPORT ===

fn io_error(error: std::io::Error) -> PolarsError {
    PolarsError::IO {
        error: error.into(),
        msg: None,
    }
}

/// Write each frame to `{dir}/{name}.parquet`.
pub fn save_parquet(dfs: &mut BTreeMap<String, DataFrame>, dir: &Path) -> PolarsResult<()> {
    std::fs::create_dir_all(dir).map_err(io_error)?;
    for (name, df) in dfs.iter_mut() {
        let file = std::fs::File::create(dir.join(format!("{}.parquet", name))).map_err(io_error)?;
        ParquetWriter::new(file).finish(df)?;
    }
    Ok(())
}

/// Write each frame to `{dir}/{name}.csv` with a header row.
pub fn save_csv(dfs: &mut BTreeMap<String, DataFrame>, dir: &Path) -> PolarsResult<()> {
    std::fs::create_dir_all(dir).map_err(io_error)?;
    for (name, df) in dfs.iter_mut() {
        let file = std::fs::File::create(dir.join(format!("{}.csv", name))).map_err(io_error)?;
        CsvWriter::new(file).include_header(true).finish(df)?;
    }
    Ok(())
}

/// Replace anything but ASCII alphanumerics, `-` and `_` with `_`; cap at 60 chars.
fn sanitize(name: &str) -> String {
    name.chars()
        .take(60)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Scoped capture of one simulation run.
///
/// Creation clears this thread's recorder and installs the subscriber. On drop, every
/// table is written as parquet and CSV under `{parent}/{run_name}/`, followed by an empty
/// `_ready` file once all tables are on disk. Runs that recorded nothing write nothing.
pub struct RunRecorder {
    run_dir: PathBuf,
    run_name: String,
    frames: Option<BTreeMap<String, DataFrame>>,
}

impl RunRecorder {
    pub fn new(parent: impl Into<PathBuf>, name: &str) -> Self {
        let run_name = sanitize(name);
        let run_dir = parent.into().join(&run_name);
        clear();
        install_subscriber();
        Self {
            run_dir,
            run_name,
            frames: None,
        }
    }

    /// Frames recorded so far. The first call drains the thread-local recorder; later
    /// calls return the cached frames. Tables that fail to convert are skipped.
    pub fn get(&mut self) -> &BTreeMap<String, DataFrame> {
        self.frames.get_or_insert_with(drain_frames)
    }

    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    fn write(&self, frames: &mut BTreeMap<String, DataFrame>) -> PolarsResult<()> {
        save_parquet(frames, &self.run_dir)?;
        save_csv(frames, &self.run_dir)?;
        std::fs::File::create(self.run_dir.join("_ready")).map_err(io_error)?;
        Ok(())
    }
}

fn drain_frames() -> BTreeMap<String, DataFrame> {
    drain()
        .tables
        .iter()
        .filter_map(|(name, table)| table.to_dataframe().ok().map(|df| (name.clone(), df)))
        .collect()
}

impl Drop for RunRecorder {
    fn drop(&mut self) {
        let mut frames = self.frames.take().unwrap_or_else(drain_frames);
        if frames.is_empty() {
            return;
        }
        match self.write(&mut frames) {
            Ok(()) => eprintln!(
                "RunRecorder: wrote {} tables to {}",
                frames.len(),
                self.run_dir.display()
            ),
            Err(e) => eprintln!("RunRecorder({}): write failed: {}", self.run_name, e),
        }
    }
}
