//! Recording sink.
//!
//! Keeps the whole dataset in memory with the same structural checks a
//! NetCDF file enforces, and can dump it as JSON on close. Used for the
//! `json` output format and throughout the tests.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DatasetSink, SinkFactory};
use crate::encoder::{AttrValue, NcType, Values, VarSpec};
use crate::error::{Result, WriterError};

/// A declared variable and, once written, its data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryVariable {
    pub spec: VarSpec,
    pub values: Option<Values>,
}

impl MemoryVariable {
    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.spec.attribute(name)
    }
}

/// Everything a sink was asked to store, in call order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryDataset {
    pub dimensions: Vec<(String, usize)>,
    pub global_attributes: Vec<(String, AttrValue)>,
    pub variables: Vec<MemoryVariable>,
}

impl MemoryDataset {
    /// Read a dataset previously dumped by the JSON sink.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    pub fn dimension(&self, name: &str) -> Option<usize> {
        self.dimensions
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, len)| *len)
    }

    pub fn global_attribute(&self, name: &str) -> Option<&AttrValue> {
        self.global_attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Text value of a global attribute.
    pub fn global_str(&self, name: &str) -> Option<&str> {
        self.global_attribute(name).and_then(|v| v.as_str())
    }

    pub fn variable(&self, name: &str) -> Option<&MemoryVariable> {
        self.variables.iter().find(|v| v.spec.name == name)
    }

    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.spec.name.as_str()).collect()
    }

    /// Expected value count for a variable: the product of its dimensions,
    /// excluding the string length for text.
    fn expected_len(&self, spec: &VarSpec) -> Result<usize> {
        let dims: &[String] = if spec.nc_type == NcType::Char {
            spec.dims.split_last().map(|(_, rest)| rest).unwrap_or(&[])
        } else {
            &spec.dims
        };
        let mut len = 1usize;
        for dim in dims {
            let dim_len = self.dimension(dim).ok_or_else(|| {
                WriterError::data_write(format!("{}: unknown dimension {}", spec.name, dim))
            })?;
            len *= dim_len;
        }
        Ok(len)
    }
}

/// In-memory sink, optionally dumped as JSON to `path` on close.
#[derive(Debug, Default)]
pub struct MemorySink {
    path: Option<PathBuf>,
    dataset: MemoryDataset,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json_output(path: &Path) -> Self {
        Self {
            path: Some(path.to_path_buf()),
            dataset: MemoryDataset::default(),
        }
    }

    pub fn dataset(&self) -> &MemoryDataset {
        &self.dataset
    }
}

impl DatasetSink for MemorySink {
    fn add_dimension(&mut self, name: &str, len: usize) -> Result<()> {
        if self.dataset.dimension(name).is_some() {
            return Err(WriterError::schema(format!("dimension {} already exists", name)));
        }
        if len == 0 {
            return Err(WriterError::schema(format!("dimension {} has zero length", name)));
        }
        self.dataset.dimensions.push((name.to_string(), len));
        Ok(())
    }

    fn add_global_attribute(&mut self, name: &str, value: AttrValue) -> Result<()> {
        if let Some(slot) = self
            .dataset
            .global_attributes
            .iter_mut()
            .find(|(n, _)| n == name)
        {
            slot.1 = value;
        } else {
            self.dataset.global_attributes.push((name.to_string(), value));
        }
        Ok(())
    }

    fn declare_variable(&mut self, spec: &VarSpec) -> Result<()> {
        if self.dataset.variable(&spec.name).is_some() {
            return Err(WriterError::schema(format!(
                "variable {} already exists",
                spec.name
            )));
        }
        for dim in &spec.dims {
            if self.dataset.dimension(dim).is_none() {
                return Err(WriterError::schema(format!(
                    "variable {}: unknown dimension {}",
                    spec.name, dim
                )));
            }
        }
        if spec.nc_type == NcType::Char && spec.dims.is_empty() {
            return Err(WriterError::schema(format!(
                "char variable {} needs a string length dimension",
                spec.name
            )));
        }
        self.dataset.variables.push(MemoryVariable {
            spec: spec.clone(),
            values: None,
        });
        Ok(())
    }

    fn put_values(&mut self, name: &str, values: Values) -> Result<()> {
        let spec = self
            .dataset
            .variable(name)
            .map(|v| v.spec.clone())
            .ok_or_else(|| WriterError::data_write(format!("variable {} not declared", name)))?;

        if values.nc_type() != spec.nc_type {
            return Err(WriterError::data_write(format!(
                "variable {}: type {} written to {} variable",
                name,
                values.nc_type().as_str(),
                spec.nc_type.as_str()
            )));
        }
        let expected = self.dataset.expected_len(&spec)?;
        if values.len() != expected {
            return Err(WriterError::data_write(format!(
                "variable {}: {} values for {} slots",
                name,
                values.len(),
                expected
            )));
        }

        if let Some(var) = self
            .dataset
            .variables
            .iter_mut()
            .find(|v| v.spec.name == name)
        {
            if var.values.is_some() {
                return Err(WriterError::data_write(format!(
                    "variable {} written twice",
                    name
                )));
            }
            var.values = Some(values);
        }
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let file = File::create(path).map_err(|e| WriterError::OpenFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let mut out = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut out, &self.dataset)?;
        out.flush().map_err(|e| WriterError::OpenFailed {
            path: path.clone(),
            message: format!("flushing: {}", e),
        })?;
        debug!(path = %path.display(), "Wrote JSON dataset");
        Ok(())
    }
}

/// Factory for the `json` output format.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSinkFactory;

impl SinkFactory for JsonSinkFactory {
    fn create(&self, path: &Path) -> Result<Box<dyn DatasetSink>> {
        Ok(Box::new(MemorySink::with_json_output(path)))
    }

    fn format_name(&self) -> &'static str {
        "json"
    }
}
