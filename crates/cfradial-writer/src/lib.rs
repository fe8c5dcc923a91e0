//! CF-Radial writer for radar and lidar volumes.
//!
//! A [`CfRadialWriter`] borrows a [`radx_model::Volume`], resolves its gate
//! layout and optional metadata groups, declares the full CF-Radial schema
//! and writes every variable to a temp file that is renamed into place only
//! once complete. Output goes through a [`DatasetSink`]: NetCDF-4 via the
//! `netcdf` crate, or a JSON dump of the same dataset.
//!
//! # Example
//!
//! ```ignore
//! use cfradial_writer::{CfRadialWriter, WriterConfig};
//!
//! let mut writer = CfRadialWriter::new(WriterConfig::default())?;
//! writer.write_to_dir(&volume, Path::new("/data/cfradial"), true, false)?;
//! for path in writer.write_paths() {
//!     println!("wrote {}", path.display());
//! }
//! ```

pub mod config;
pub mod context;
pub mod dimensions;
pub mod encoder;
pub mod error;
pub mod layout;
pub mod marshal;
pub mod names;
pub mod path;
pub mod presence;
pub mod schema;
pub mod sink;
pub mod variables;
pub mod writer;

pub use config::{FileNameMode, OutputFormat, WriterConfig};
pub use context::WriteContext;
pub use dimensions::DimensionPlan;
pub use encoder::{AttrValue, NcType, Values, VarSpec};
pub use error::{Result, WriterError};
pub use layout::GateLayout;
pub use presence::Presence;
pub use schema::Schema;
pub use sink::{
    DatasetSink, JsonSinkFactory, MemoryDataset, MemorySink, MemoryVariable, NetCdfSink,
    NetCdfSinkFactory, SinkFactory,
};
pub use writer::CfRadialWriter;
