//! Dataset sinks: the container side of the writer.
//!
//! The schema builder and marshaller only speak [`DatasetSink`]. A
//! [`SinkFactory`] opens a sink on a path; the orchestrator owns the temp
//! path and the final rename.

mod memory;
mod netcdf4;

use std::path::Path;

use crate::encoder::{AttrValue, Values, VarSpec};
use crate::error::Result;

pub use self::memory::{JsonSinkFactory, MemoryDataset, MemorySink, MemoryVariable};
pub use self::netcdf4::{NetCdfSink, NetCdfSinkFactory};

/// A write-once dataset under construction.
pub trait DatasetSink {
    fn add_dimension(&mut self, name: &str, len: usize) -> Result<()>;

    fn add_global_attribute(&mut self, name: &str, value: AttrValue) -> Result<()>;

    fn declare_variable(&mut self, spec: &VarSpec) -> Result<()>;

    /// Write the full contents of a declared variable.
    fn put_values(&mut self, name: &str, values: Values) -> Result<()>;

    /// Flush and close. The file at the sink's path is complete afterwards.
    fn close(self: Box<Self>) -> Result<()>;
}

/// Opens sinks for a given output format.
pub trait SinkFactory: Send + Sync {
    fn create(&self, path: &Path) -> Result<Box<dyn DatasetSink>>;

    /// Short format name for logs.
    fn format_name(&self) -> &'static str;
}
