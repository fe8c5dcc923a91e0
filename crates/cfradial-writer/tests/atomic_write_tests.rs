//! Atomic publication: a failed write never leaves a partial file at the
//! final path, and only a failed rename keeps the temp file.

use std::fs;
use std::path::Path;

use cfradial_writer::{
    AttrValue, CfRadialWriter, DatasetSink, MemorySink, OutputFormat, SinkFactory, Values,
    VarSpec, WriterConfig, WriterError,
};
use test_utils::{files_under, tmp_files_under, uniform_volume};

/// Step at which the injected sink fails.
#[derive(Debug, Clone, Copy, PartialEq)]
enum FailAt {
    Dimension,
    Attribute,
    Declare,
    /// Fail on the `put_values` call for this variable.
    Put(&'static str),
    Close,
}

/// JSON sink that creates its file on open and fails at a chosen step.
struct FailingSink {
    inner: Box<MemorySink>,
    fail_at: FailAt,
}

fn injected(step: &str) -> WriterError {
    WriterError::data_write(format!("injected failure at {}", step))
}

impl DatasetSink for FailingSink {
    fn add_dimension(&mut self, name: &str, len: usize) -> cfradial_writer::Result<()> {
        if self.fail_at == FailAt::Dimension {
            return Err(injected("dimension"));
        }
        self.inner.add_dimension(name, len)
    }

    fn add_global_attribute(&mut self, name: &str, value: AttrValue) -> cfradial_writer::Result<()> {
        if self.fail_at == FailAt::Attribute {
            return Err(injected("attribute"));
        }
        self.inner.add_global_attribute(name, value)
    }

    fn declare_variable(&mut self, spec: &VarSpec) -> cfradial_writer::Result<()> {
        if self.fail_at == FailAt::Declare {
            return Err(injected("declare"));
        }
        self.inner.declare_variable(spec)
    }

    fn put_values(&mut self, name: &str, values: Values) -> cfradial_writer::Result<()> {
        if let FailAt::Put(target) = self.fail_at {
            if target == name {
                return Err(injected(name));
            }
        }
        self.inner.put_values(name, values)
    }

    fn close(self: Box<Self>) -> cfradial_writer::Result<()> {
        let FailingSink { inner, fail_at } = *self;
        inner.close()?;
        if fail_at == FailAt::Close {
            return Err(injected("close"));
        }
        Ok(())
    }
}

struct FailingFactory(FailAt);

impl SinkFactory for FailingFactory {
    fn create(&self, path: &Path) -> cfradial_writer::Result<Box<dyn DatasetSink>> {
        // a real container exists on disk as soon as it is opened
        fs::write(path, b"partial")?;
        Ok(Box::new(FailingSink {
            inner: Box::new(MemorySink::with_json_output(path)),
            fail_at: self.0,
        }))
    }

    fn format_name(&self) -> &'static str {
        "failing"
    }
}

fn json_config() -> WriterConfig {
    WriterConfig {
        format: OutputFormat::Json,
        ..Default::default()
    }
}

fn failing_writer(step: FailAt) -> CfRadialWriter {
    CfRadialWriter::with_sink_factory(json_config(), Box::new(FailingFactory(step))).unwrap()
}

// ============================================================================
// Failure at each step leaves nothing behind
// ============================================================================

#[test]
fn test_failure_at_any_step_leaves_no_files() {
    let vol = uniform_volume(5, 20);
    let steps = [
        FailAt::Dimension,
        FailAt::Attribute,
        FailAt::Declare,
        FailAt::Put("volume_number"),
        FailAt::Put("azimuth"),
        FailAt::Put("DBZ"),
        FailAt::Close,
    ];

    for step in steps {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = failing_writer(step);

        let result = writer.write_to_dir(&vol, dir.path(), false, false);
        assert!(result.is_err(), "{:?} should fail", step);
        assert!(
            files_under(dir.path()).is_empty(),
            "{:?} left {:?}",
            step,
            files_under(dir.path())
        );
        assert!(!writer.path_in_use().exists());
        assert!(writer.write_paths().is_empty());
    }
}

#[test]
fn test_failure_keeps_existing_file_untouched() {
    let vol = uniform_volume(3, 5);
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("volume.json");
    fs::write(&target, b"previous contents").unwrap();

    let mut writer = failing_writer(FailAt::Put("DBZ"));
    assert!(writer.write_to_path(&vol, &target).is_err());

    assert_eq!(fs::read(&target).unwrap(), b"previous contents");
    assert!(tmp_files_under(dir.path()).is_empty());
}

#[test]
fn test_successful_write_replaces_existing_file() {
    let vol = uniform_volume(3, 5);
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("volume.json");
    fs::write(&target, b"previous contents").unwrap();

    let mut writer = CfRadialWriter::new(json_config()).unwrap();
    writer.write_to_path(&vol, &target).unwrap();

    let ds = cfradial_writer::MemoryDataset::from_json_file(&target).unwrap();
    assert_eq!(ds.dimension("time"), Some(3));
    assert!(tmp_files_under(dir.path()).is_empty());
    assert_eq!(writer.write_paths(), &[target.clone()]);
    assert_eq!(writer.write_data_times(), &[vol.start_time]);
}

// ============================================================================
// Rename failure keeps the temp file
// ============================================================================

#[test]
fn test_rename_failure_keeps_tmp_file() {
    let vol = uniform_volume(3, 5);
    let dir = tempfile::tempdir().unwrap();
    // a non-empty directory cannot be replaced by a file
    let target = dir.path().join("occupied");
    fs::create_dir(&target).unwrap();
    fs::write(target.join("keep"), b"x").unwrap();

    let mut writer = CfRadialWriter::new(json_config()).unwrap();
    let err = writer.write_to_path(&vol, &target).unwrap_err();

    assert!(matches!(err, WriterError::Rename { .. }), "{}", err);
    assert!(err.to_string().starts_with("cannot rename tmp file: "));
    let tmps = tmp_files_under(dir.path());
    assert_eq!(tmps.len(), 1);
    assert!(target.is_dir());
    assert!(writer.error_str().contains("cannot rename tmp file"));
}

// ============================================================================
// Error text
// ============================================================================

#[test]
fn test_error_str_names_the_call() {
    let vol = uniform_volume(3, 5);
    let dir = tempfile::tempdir().unwrap();
    let mut writer = failing_writer(FailAt::Declare);

    writer.write_to_dir(&vol, dir.path(), false, false).unwrap_err();
    let text = writer.error_str();
    assert!(text.starts_with("ERROR - CfRadialWriter::write_to_dir\n"), "{}", text);
    assert!(text.contains("injected failure at declare"));

    writer
        .write_to_path(&vol, &dir.path().join("x.json"))
        .unwrap_err();
    assert!(writer.error_str().starts_with("ERROR - CfRadialWriter::write_to_path\n"));
    assert!(!writer.error_str().contains("write_to_dir"));
}

#[test]
fn test_error_str_cleared_by_next_success() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = CfRadialWriter::new(json_config()).unwrap();

    let empty = radx_model::Volume::default();
    let err = writer.write_to_dir(&empty, dir.path(), false, false).unwrap_err();
    assert!(matches!(err, WriterError::InvalidVolume(_)));
    assert!(!writer.error_str().is_empty());

    writer
        .write_to_dir(&uniform_volume(2, 3), dir.path(), false, false)
        .unwrap();
    assert!(writer.error_str().is_empty());
    assert_eq!(writer.write_paths().len(), 1);
}

#[test]
fn test_unwritable_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"file, not dir").unwrap();

    let mut writer = CfRadialWriter::new(json_config()).unwrap();
    let err = writer
        .write_to_dir(&uniform_volume(2, 3), &blocker.join("sub"), false, false)
        .unwrap_err();
    assert!(matches!(err, WriterError::DirectoryCreate { .. }), "{}", err);
    assert!(writer.error_str().contains("cannot make output dir"));
}
