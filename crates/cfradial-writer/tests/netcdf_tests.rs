//! NetCDF-4 output read back with the `netcdf` crate.

use std::path::PathBuf;

use cfradial_writer::{CfRadialWriter, WriterConfig};
use netcdf::AttributeValue;
use radx_model::Volume;
use test_utils::{
    assert_all_approx_eq, ragged_volume, ray_gate_values, tmp_files_under, uniform_volume,
    VolumeBuilder, NYQUIST_MPS, VEL_SCALE,
};

fn write_nc(vol: &Volume, dir: &std::path::Path) -> PathBuf {
    let mut writer = CfRadialWriter::new(WriterConfig::default()).unwrap();
    writer.write_to_dir(vol, dir, false, false).unwrap();
    writer.write_paths()[0].clone()
}

fn global_str(file: &netcdf::File, name: &str) -> Option<String> {
    match file.attribute(name)?.value().ok()? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn test_rectangular_netcdf_round_trip() {
    let vol = uniform_volume(5, 100);
    let dir = tempfile::tempdir().unwrap();
    let path = write_nc(&vol, dir.path());
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("nc"));
    assert!(tmp_files_under(dir.path()).is_empty());

    let file = netcdf::open(&path).unwrap();
    assert_eq!(file.dimension("time").unwrap().len(), 5);
    assert_eq!(file.dimension("range").unwrap().len(), 100);
    assert!(file.dimension("n_points").is_none());
    assert_eq!(global_str(&file, "Conventions").as_deref(), Some("CF-1.6"));
    assert_eq!(global_str(&file, "n_gates_vary").as_deref(), Some("false"));

    let dbz: Vec<f32> = file.variable("DBZ").unwrap().get_values(..).unwrap();
    assert_eq!(dbz.len(), 500);
    assert_eq!(&dbz[100..200], ray_gate_values(1, 100).as_slice());

    let time: Vec<f64> = file.variable("time").unwrap().get_values(..).unwrap();
    assert_all_approx_eq!(time, &[0.0, 1.0, 2.0, 3.0, 4.0], 1e-9);
}

#[test]
fn test_ragged_netcdf_round_trip() {
    let vol = ragged_volume(&[100, 100, 100, 80, 100]);
    let dir = tempfile::tempdir().unwrap();
    let path = write_nc(&vol, dir.path());

    let file = netcdf::open(&path).unwrap();
    assert_eq!(file.dimension("n_points").unwrap().len(), 480);
    assert_eq!(global_str(&file, "n_gates_vary").as_deref(), Some("true"));

    let n_gates: Vec<i32> = file.variable("ray_n_gates").unwrap().get_values(..).unwrap();
    assert_eq!(n_gates, vec![100, 100, 100, 80, 100]);
    let start: Vec<i32> = file
        .variable("ray_start_index")
        .unwrap()
        .get_values(..)
        .unwrap();
    assert_eq!(start, vec![0, 100, 200, 300, 380]);
}

#[test]
fn test_packed_field_keeps_scale_and_offset() {
    let vol = VolumeBuilder::new()
        .rays_per_sweep(2)
        .gates(11)
        .with_velocity()
        .build();
    let dir = tempfile::tempdir().unwrap();
    let path = write_nc(&vol, dir.path());

    let file = netcdf::open(&path).unwrap();
    let vel = file.variable("VEL").unwrap();
    let raw: Vec<i16> = vel.get_values(..).unwrap();
    assert_eq!(raw[0], -2500);
    assert_eq!(raw[10], 2500);

    let scale = vel.attribute_value("scale_factor").unwrap().unwrap();
    assert_eq!(f32::try_from(scale).unwrap(), VEL_SCALE as f32);
    let upper = vel.attribute_value("fold_limit_upper").unwrap().unwrap();
    assert_eq!(f32::try_from(upper).unwrap(), NYQUIST_MPS as f32);
}

#[test]
fn test_text_variables_stored_per_row() {
    let vol = VolumeBuilder::new().sweeps(2).rays_per_sweep(2).gates(3).build();
    let dir = tempfile::tempdir().unwrap();
    let path = write_nc(&vol, dir.path());

    let file = netcdf::open(&path).unwrap();
    let mode = file.variable("sweep_mode").unwrap();
    assert_eq!(mode.get_string([0]).unwrap(), "azimuth_surveillance");
    assert_eq!(mode.get_string([1]).unwrap(), "azimuth_surveillance");
}
