//! Writer configuration.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WriterError};

/// Container format of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// NetCDF-4 file with the `.nc` extension.
    Netcdf,
    /// JSON dump of the dataset, for inspection.
    Json,
}

impl FromStr for OutputFormat {
    type Err = WriterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "netcdf" | "nc" | "netcdf4" => Ok(Self::Netcdf),
            "json" => Ok(Self::Json),
            _ => Err(WriterError::Config(format!(
                "unknown output format '{}', use netcdf or json",
                s
            ))),
        }
    }
}

impl OutputFormat {
    /// File extension including the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Netcdf => ".nc",
            Self::Json => ".json",
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Netcdf
    }
}

/// Which volume times appear in file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileNameMode {
    /// `<start>_to_<end>`
    StartAndEnd,
    StartOnly,
    EndOnly,
}

impl Default for FileNameMode {
    fn default() -> Self {
        Self::StartAndEnd
    }
}

/// Options controlling layout, compression and file naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    pub format: OutputFormat,

    /// Deflate field variables.
    pub compressed: bool,
    /// Deflate level (1-9).
    pub compression_level: i32,
    /// Write fields ragged over `n_points` even for uniform geometry.
    pub force_ragged: bool,
    /// One file per sweep instead of one per volume.
    pub write_individual_sweeps: bool,

    pub file_prefix: String,
    pub file_suffix: String,
    pub file_name_mode: FileNameMode,
    pub include_instrument_name: bool,
    pub include_site_name: bool,
    pub include_volume_number: bool,
    pub include_scan_name: bool,
    pub include_scan_type: bool,
    pub include_subsecs: bool,
    /// Join date and time with '-' rather than '_'.
    pub hyphen_datetime: bool,
    pub append_year_dir: bool,
    pub append_day_dir: bool,

    /// Name recorded in the history attribute.
    pub writer_name: String,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Netcdf,
            compressed: true,
            compression_level: 4,
            force_ragged: false,
            write_individual_sweeps: false,
            file_prefix: "cfrad.".to_string(),
            file_suffix: String::new(),
            file_name_mode: FileNameMode::StartAndEnd,
            include_instrument_name: true,
            include_site_name: false,
            include_volume_number: false,
            include_scan_name: true,
            include_scan_type: true,
            include_subsecs: true,
            hyphen_datetime: false,
            append_year_dir: false,
            append_day_dir: false,
            writer_name: "CfRadialWriter".to_string(),
        }
    }
}

fn env_bool(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|val| val.to_lowercase() == "true" || val == "1")
}

impl WriterConfig {
    /// Apply `CFRAD_*` environment overrides in place.
    pub fn apply_env(&mut self) {
        if let Some(format) = std::env::var("CFRAD_FORMAT")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.format = format;
        }
        if let Some(val) = env_bool("CFRAD_COMPRESSED") {
            self.compressed = val;
        }
        if let Ok(val) = std::env::var("CFRAD_COMPRESSION_LEVEL") {
            if let Ok(level) = val.parse() {
                self.compression_level = level;
            }
        }
        if let Some(val) = env_bool("CFRAD_FORCE_RAGGED") {
            self.force_ragged = val;
        }
        if let Some(val) = env_bool("CFRAD_WRITE_INDIVIDUAL_SWEEPS") {
            self.write_individual_sweeps = val;
        }
        if let Ok(val) = std::env::var("CFRAD_FILE_PREFIX") {
            self.file_prefix = val;
        }
        if let Ok(val) = std::env::var("CFRAD_FILE_SUFFIX") {
            self.file_suffix = val;
        }
        if let Some(val) = env_bool("CFRAD_APPEND_YEAR_DIR") {
            self.append_year_dir = val;
        }
        if let Some(val) = env_bool("CFRAD_APPEND_DAY_DIR") {
            self.append_day_dir = val;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.compressed && !(1..=9).contains(&self.compression_level) {
            return Err(WriterError::Config(format!(
                "compression_level must be 1-9, got {}",
                self.compression_level
            )));
        }
        if self.file_prefix.contains('/') || self.file_suffix.contains('/') {
            return Err(WriterError::Config(
                "file_prefix and file_suffix must not contain '/'".to_string(),
            ));
        }
        Ok(())
    }

    /// Deflate level for field variables, if compression applies.
    pub fn deflate_level(&self) -> Option<i32> {
        if self.compressed && self.format == OutputFormat::Netcdf {
            Some(self.compression_level)
        } else {
            None
        }
    }
}
