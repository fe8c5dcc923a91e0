//! NetCDF-4 sink backed by the `netcdf` crate.

use std::path::{Path, PathBuf};
use std::sync::Once;

use netcdf::AttributeValue;
use tracing::debug;

use super::{DatasetSink, SinkFactory};
use crate::encoder::{AttrValue, NcType, Values, VarSpec};
use crate::error::{Result, WriterError};

/// Silence HDF5's automatic error printing to stderr.
///
/// Errors are reported through `WriterError`; the HDF5 diagnostic stack
/// only adds noise. Safe to call more than once.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 with null handlers disables the default
        // error printer, which is a documented use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

fn to_nc_attr(value: AttrValue) -> AttributeValue {
    match value {
        AttrValue::Str(s) => AttributeValue::Str(s),
        AttrValue::Int(v) => AttributeValue::Int(v),
        AttrValue::Short(v) => AttributeValue::Short(v),
        AttrValue::Byte(v) => AttributeValue::Schar(v),
        AttrValue::Float(v) => AttributeValue::Float(v),
        AttrValue::Double(v) => AttributeValue::Double(v),
        AttrValue::Ints(v) => AttributeValue::Ints(v),
        AttrValue::Doubles(v) => AttributeValue::Doubles(v),
    }
}

/// Sink writing a NetCDF-4 (HDF5) file.
///
/// Fixed-width text variables are stored as NC_STRING over their leading
/// dimensions; the string length dimension stays declared in the file.
pub struct NetCdfSink {
    path: PathBuf,
    file: netcdf::FileMut,
}

impl NetCdfSink {
    pub fn create(path: &Path) -> Result<Self> {
        silence_hdf5_errors();

        let file = netcdf::create(path).map_err(|e| WriterError::OpenFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    fn variable_mut(&mut self, name: &str) -> Result<netcdf::VariableMut<'_>> {
        self.file
            .variable_mut(name)
            .ok_or_else(|| WriterError::data_write(format!("variable {} not declared", name)))
    }
}

impl DatasetSink for NetCdfSink {
    fn add_dimension(&mut self, name: &str, len: usize) -> Result<()> {
        if len == 0 {
            // A zero length would declare an unlimited dimension
            return Err(WriterError::schema(format!("dimension {} has zero length", name)));
        }
        self.file
            .add_dimension(name, len)
            .map_err(|e| WriterError::schema(format!("adding dimension {}: {}", name, e)))?;
        Ok(())
    }

    fn add_global_attribute(&mut self, name: &str, value: AttrValue) -> Result<()> {
        self.file
            .add_attribute(name, to_nc_attr(value))
            .map_err(|e| WriterError::schema(format!("adding global attribute {}: {}", name, e)))?;
        Ok(())
    }

    fn declare_variable(&mut self, spec: &VarSpec) -> Result<()> {
        let dims: Vec<&str> = spec.dims.iter().map(|d| d.as_str()).collect();
        let declare_err =
            |e: netcdf::Error| WriterError::schema(format!("adding variable {}: {}", spec.name, e));

        let mut var = match spec.nc_type {
            NcType::Double => self.file.add_variable::<f64>(&spec.name, &dims),
            NcType::Float => self.file.add_variable::<f32>(&spec.name, &dims),
            NcType::Int => self.file.add_variable::<i32>(&spec.name, &dims),
            NcType::Short => self.file.add_variable::<i16>(&spec.name, &dims),
            NcType::Byte => self.file.add_variable::<i8>(&spec.name, &dims),
            NcType::Char => {
                let leading = dims.split_last().map(|(_, rest)| rest).unwrap_or(&[]);
                self.file.add_string_variable(&spec.name, leading)
            }
        }
        .map_err(declare_err)?;

        if let Some(level) = spec.deflate_level {
            if spec.nc_type != NcType::Char {
                var.set_compression(level, true).map_err(|e| {
                    WriterError::schema(format!("compressing variable {}: {}", spec.name, e))
                })?;
            }
        }

        for (name, value) in &spec.attributes {
            var.put_attribute(name, to_nc_attr(value.clone()))
                .map_err(|e| {
                    WriterError::schema(format!(
                        "adding attribute {} to variable {}: {}",
                        name, spec.name, e
                    ))
                })?;
        }
        Ok(())
    }

    fn put_values(&mut self, name: &str, values: Values) -> Result<()> {
        let mut var = self.variable_mut(name)?;
        let write_err =
            |e: netcdf::Error| WriterError::data_write(format!("writing variable {}: {}", name, e));

        match values {
            Values::Double(v) => var.put_values(&v, ..).map_err(write_err)?,
            Values::Float(v) => var.put_values(&v, ..).map_err(write_err)?,
            Values::Int(v) => var.put_values(&v, ..).map_err(write_err)?,
            Values::Short(v) => var.put_values(&v, ..).map_err(write_err)?,
            Values::Byte(v) => var.put_values(&v, ..).map_err(write_err)?,
            Values::Text(rows) => {
                if var.dimensions().is_empty() {
                    if let Some(text) = rows.first() {
                        var.put_string(text, ..).map_err(write_err)?;
                    }
                } else {
                    for (ii, text) in rows.iter().enumerate() {
                        var.put_string(text, [ii]).map_err(write_err)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<()> {
        let NetCdfSink { path, file } = *self;
        // nc_close flushes the HDF5 buffers, so its status decides success
        file.close().map_err(|e| WriterError::OpenFailed {
            path: path.clone(),
            message: format!("closing: {}", e),
        })?;
        debug!(path = %path.display(), "Closed NetCDF file");
        Ok(())
    }
}

/// Factory for the `netcdf` output format.
#[derive(Debug, Default, Clone, Copy)]
pub struct NetCdfSinkFactory;

impl SinkFactory for NetCdfSinkFactory {
    fn create(&self, path: &Path) -> Result<Box<dyn DatasetSink>> {
        Ok(Box::new(NetCdfSink::create(path)?))
    }

    fn format_name(&self) -> &'static str {
        "netcdf"
    }
}
