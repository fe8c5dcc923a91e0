//! Error types for CF-Radial writing.

use std::path::PathBuf;

use radx_model::ModelError;
use thiserror::Error;

/// Result type for writer operations.
pub type Result<T> = std::result::Result<T, WriterError>;

/// Errors raised while writing a volume.
///
/// Every variant except `Rename` means the temporary file has been removed.
#[derive(Error, Debug)]
pub enum WriterError {
    /// A dimension, attribute or variable could not be declared.
    #[error("schema declaration failed: {0}")]
    SchemaDeclaration(String),

    /// Variable data could not be written.
    #[error("data write failed: {0}")]
    DataWrite(String),

    /// The temporary output file could not be opened or closed.
    #[error("cannot open output file {path}: {message}")]
    OpenFailed { path: PathBuf, message: String },

    /// The output directory could not be created.
    #[error("cannot make output dir {path}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Publishing the finished temp file failed. The temp file is kept.
    #[error("cannot rename tmp file: {tmp} to: {path}: {source}")]
    Rename {
        tmp: PathBuf,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A field expected to exist was not found in the volume.
    #[error("field not found: {0}")]
    FieldNotFound(String),

    /// A user global attribute value could not be parsed for its type.
    #[error("invalid attribute {name}: {message}")]
    InvalidAttribute { name: String, message: String },

    /// The volume cannot be written as it stands.
    #[error("invalid volume: {0}")]
    InvalidVolume(String),

    /// One sweep of a split write failed; remaining sweeps were not written.
    #[error("writing sweep {sweep_number} failed: {source}")]
    SweepWrite {
        sweep_number: i32,
        #[source]
        source: Box<WriterError>,
    },

    /// Invalid writer configuration.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WriterError {
    /// Create a SchemaDeclaration error.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::SchemaDeclaration(msg.into())
    }

    /// Create a DataWrite error.
    pub fn data_write(msg: impl Into<String>) -> Self {
        Self::DataWrite(msg.into())
    }

    /// Create an InvalidAttribute error.
    pub fn invalid_attribute(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            name: name.into(),
            message: msg.into(),
        }
    }

    /// True for the one failure that leaves the temp file on disk.
    pub fn keeps_tmp_file(&self) -> bool {
        match self {
            WriterError::Rename { .. } => true,
            WriterError::SweepWrite { source, .. } => source.keeps_tmp_file(),
            _ => false,
        }
    }
}

impl From<ModelError> for WriterError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::FieldNotFound(name) => WriterError::FieldNotFound(name),
            other => WriterError::InvalidVolume(other.to_string()),
        }
    }
}

impl From<netcdf::Error> for WriterError {
    fn from(err: netcdf::Error) -> Self {
        WriterError::DataWrite(format!("NetCDF error: {}", err))
    }
}

impl From<serde_json::Error> for WriterError {
    fn from(err: serde_json::Error) -> Self {
        WriterError::DataWrite(format!("JSON error: {}", err))
    }
}
