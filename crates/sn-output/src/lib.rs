//! `sn-output` — reporters and output writers for the rust_sn simulator.
//!
//! Four backends, two of them behind Cargo features:
//!
//! | Feature   | Backend     | Files created                                                     |
//! |-----------|-------------|-------------------------------------------------------------------|
//! | *(none)*  | CSV         | `agent_values.csv`, `model_values.csv`, `tick_summaries.csv`, `failures.csv` |
//! | *(none)*  | Memory      | none; rows stay in `MemoryWriter`                                 |
//! | `sqlite`  | SQLite      | `output.db`                                                       |
//! | `parquet` | Parquet     | one `.parquet` file per table                                     |
//!
//! All backends implement [`OutputWriter`] and are driven by
//! [`ReporterObserver`], which implements `sn_sim::SimObserver`.  The model
//! never opens files itself.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sn_output::{CsvWriter, ReporterConfig, ReporterObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = ReporterObserver::new(writer, 0, ReporterConfig::default());
//! model.run(&mut obs)?;
//! if let Some(e) = obs.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod memory;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "parquet")]
pub mod parquet;

#[cfg(test)]
mod tests;

pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use memory::MemoryWriter;
pub use observer::{ReporterConfig, ReporterObserver, AGENT_COUNT};
pub use row::{AgentValueRow, FailureRow, ModelValueRow, TickSummaryRow};
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;

#[cfg(feature = "parquet")]
pub use parquet::ParquetWriter;
