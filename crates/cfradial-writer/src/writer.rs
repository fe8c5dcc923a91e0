//! Write orchestrator: temp file, schema, data, close, rename.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use radx_model::{RadxTime, Volume};
use tracing::{debug, info, warn};

use crate::config::{OutputFormat, WriterConfig};
use crate::context::WriteContext;
use crate::error::{Result, WriterError};
use crate::marshal;
use crate::path::{compose_dir, compose_file_name, compose_sweep_file_name, file_time};
use crate::schema::Schema;
use crate::sink::{DatasetSink, JsonSinkFactory, NetCdfSinkFactory, SinkFactory};

/// Temp file path in `dir`: `tmp.<pid>.<secs>.<usecs>.tmp`.
pub fn tmp_path(dir: &Path) -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    dir.join(format!(
        "tmp.{}.{}.{:06}.tmp",
        std::process::id(),
        now.as_secs(),
        now.subsec_micros()
    ))
}

fn make_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| WriterError::DirectoryCreate {
        path: dir.to_path_buf(),
        source,
    })
}

/// Writes radar volumes as CF-Radial files.
///
/// A write either publishes a complete file at its final path or leaves
/// that path untouched. Every public write call clears and then fills the
/// error text and the write history.
pub struct CfRadialWriter {
    config: WriterConfig,
    factory: Box<dyn SinkFactory>,
    error_str: String,
    write_paths: Vec<PathBuf>,
    write_data_times: Vec<RadxTime>,
    path_in_use: PathBuf,
    dir_in_use: PathBuf,
}

impl std::fmt::Debug for CfRadialWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CfRadialWriter")
            .field("format", &self.factory.format_name())
            .field("path_in_use", &self.path_in_use)
            .field("n_written", &self.write_paths.len())
            .finish()
    }
}

impl CfRadialWriter {
    /// Create a writer using the sink for the configured format.
    pub fn new(config: WriterConfig) -> Result<Self> {
        let factory: Box<dyn SinkFactory> = match config.format {
            OutputFormat::Netcdf => Box::new(NetCdfSinkFactory),
            OutputFormat::Json => Box::new(JsonSinkFactory),
        };
        Self::with_sink_factory(config, factory)
    }

    /// Create a writer with an explicit sink factory.
    pub fn with_sink_factory(config: WriterConfig, factory: Box<dyn SinkFactory>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            factory,
            error_str: String::new(),
            write_paths: Vec::new(),
            write_data_times: Vec::new(),
            path_in_use: PathBuf::new(),
            dir_in_use: PathBuf::new(),
        })
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Accumulated error text from the last write call.
    pub fn error_str(&self) -> &str {
        &self.error_str
    }

    /// Files published by the last write call.
    pub fn write_paths(&self) -> &[PathBuf] {
        &self.write_paths
    }

    /// Start time of the data in each published file.
    pub fn write_data_times(&self) -> &[RadxTime] {
        &self.write_data_times
    }

    /// Final path of the most recent file attempt.
    pub fn path_in_use(&self) -> &Path {
        &self.path_in_use
    }

    pub fn dir_in_use(&self) -> &Path {
        &self.dir_in_use
    }

    fn clear(&mut self) {
        self.error_str.clear();
        self.write_paths.clear();
        self.write_data_times.clear();
    }

    fn add_error(&mut self, context: &str, err: &WriterError) {
        self.error_str
            .push_str(&format!("ERROR - CfRadialWriter::{}\n  {}\n", context, err));
    }

    /// Write a volume below `dir`, naming the file from the volume.
    ///
    /// Delegates to [`write_sweeps_to_dir`](Self::write_sweeps_to_dir) when
    /// the writer is configured for one file per sweep.
    pub fn write_to_dir(
        &mut self,
        vol: &Volume,
        dir: &Path,
        add_day_dir: bool,
        add_year_dir: bool,
    ) -> Result<()> {
        self.clear();
        let result = if self.config.write_individual_sweeps {
            self.sweeps_to_dir(vol, dir, add_day_dir, add_year_dir)
        } else {
            self.volume_to_dir(vol, dir, add_day_dir, add_year_dir)
        };
        if let Err(err) = &result {
            self.add_error("write_to_dir", err);
        }
        result
    }

    /// Write a volume to an explicit final path.
    pub fn write_to_path(&mut self, vol: &Volume, path: &Path) -> Result<()> {
        self.clear();
        let result = self.volume_to_path(vol, path);
        if let Err(err) = &result {
            self.add_error("write_to_path", err);
        }
        result
    }

    /// Write one file per sweep below `dir`. Stops at the first failure.
    pub fn write_sweeps_to_dir(
        &mut self,
        vol: &Volume,
        dir: &Path,
        add_day_dir: bool,
        add_year_dir: bool,
    ) -> Result<()> {
        self.clear();
        let result = self.sweeps_to_dir(vol, dir, add_day_dir, add_year_dir);
        if let Err(err) = &result {
            self.add_error("write_sweeps_to_dir", err);
        }
        result
    }

    fn volume_to_dir(
        &mut self,
        vol: &Volume,
        dir: &Path,
        add_day_dir: bool,
        add_year_dir: bool,
    ) -> Result<()> {
        let out_dir = compose_dir(dir, &file_time(vol, &self.config), add_year_dir, add_day_dir);
        self.dir_in_use = out_dir.clone();
        make_dir(&out_dir)?;

        let path = out_dir.join(compose_file_name(vol, &self.config));
        self.volume_to_path(vol, &path)
    }

    fn sweeps_to_dir(
        &mut self,
        vol: &Volume,
        dir: &Path,
        add_day_dir: bool,
        add_year_dir: bool,
    ) -> Result<()> {
        if vol.sweeps.is_empty() {
            return Err(WriterError::InvalidVolume("volume has no sweeps".to_string()));
        }

        for (index, sweep) in vol.sweeps.iter().enumerate() {
            let sweep_number = sweep.sweep_number;
            if let Err(err) = self.sweep_to_dir(vol, index, dir, add_day_dir, add_year_dir) {
                warn!(sweep_number, error = %err, "Sweep write failed, stopping");
                return Err(WriterError::SweepWrite {
                    sweep_number,
                    source: Box::new(err),
                });
            }
        }

        info!(
            n_sweeps = vol.sweeps.len(),
            dir = %dir.display(),
            "Wrote volume as individual sweep files"
        );
        Ok(())
    }

    fn sweep_to_dir(
        &mut self,
        vol: &Volume,
        index: usize,
        dir: &Path,
        add_day_dir: bool,
        add_year_dir: bool,
    ) -> Result<()> {
        let sub = vol.sweep_subvolume(index)?;
        let out_dir = compose_dir(dir, &file_time(&sub, &self.config), add_year_dir, add_day_dir);
        self.dir_in_use = out_dir.clone();
        make_dir(&out_dir)?;

        let name = compose_sweep_file_name(&sub, &sub.sweeps[0], &self.config);
        self.volume_to_path(&sub, &out_dir.join(name))
    }

    /// The whole-volume write. Does not clear history, so sweep writes
    /// accumulate.
    fn volume_to_path(&mut self, vol: &Volume, path: &Path) -> Result<()> {
        self.path_in_use = path.to_path_buf();

        let ctx = WriteContext::new(vol, &self.config)?;
        let schema = Schema::build(&ctx, &self.config.writer_name)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let tmp = tmp_path(&dir);
        debug!(
            tmp = %tmp.display(),
            path = %path.display(),
            format = self.factory.format_name(),
            "Opening temp file"
        );

        let mut sink = match self.factory.create(&tmp) {
            Ok(sink) => sink,
            Err(err) => {
                remove_tmp(&tmp);
                return Err(err);
            }
        };

        let written = schema
            .declare(sink.as_mut())
            .and_then(|_| marshal::write_data(&ctx, schema.meta_vars, sink.as_mut()));
        let closed = match written {
            Ok(()) => sink.close(),
            Err(err) => {
                close_quietly(sink);
                Err(err)
            }
        };
        if let Err(err) = closed {
            remove_tmp(&tmp);
            return Err(err);
        }

        fs::rename(&tmp, path).map_err(|source| WriterError::Rename {
            tmp: tmp.clone(),
            path: path.to_path_buf(),
            source,
        })?;

        info!(
            path = %path.display(),
            n_rays = ctx.n_rays(),
            n_sweeps = vol.sweeps.len(),
            n_fields = ctx.fields.len(),
            n_gates_vary = ctx.layout.n_gates_vary,
            "Wrote CF-Radial file"
        );
        self.write_paths.push(path.to_path_buf());
        self.write_data_times.push(vol.start_time);
        Ok(())
    }
}

fn close_quietly(sink: Box<dyn DatasetSink>) {
    if let Err(err) = sink.close() {
        debug!(error = %err, "Close after failed write also failed");
    }
}

fn remove_tmp(tmp: &Path) {
    if !tmp.exists() {
        return;
    }
    if let Err(err) = fs::remove_file(tmp) {
        warn!(tmp = %tmp.display(), error = %err, "Could not remove temp file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tmp_path_shape() {
        let tmp = tmp_path(Path::new("/data/out"));
        assert_eq!(tmp.parent(), Some(Path::new("/data/out")));
        let name = tmp.file_name().and_then(|n| n.to_str()).unwrap();
        assert!(name.starts_with(&format!("tmp.{}.", std::process::id())));
        assert!(name.ends_with(".tmp"));
        assert_eq!(name.split('.').count(), 5);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = WriterConfig {
            compression_level: 0,
            ..Default::default()
        };
        assert!(matches!(
            CfRadialWriter::new(config),
            Err(WriterError::Config(_))
        ));
    }
}
