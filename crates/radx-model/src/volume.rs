//! The volume aggregate: metadata, sweeps, rays and calibrations.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calib::{Calibration, CorrectionFactors};
use crate::constants::missing_meta_double;
use crate::enums::{InstrumentType, PlatformType, PrimaryAxis, SweepMode};
use crate::error::{ModelError, ModelResult};
use crate::field::Field;
use crate::ray::Ray;
use crate::sweep::Sweep;
use crate::time::RadxTime;

/// Rays within this many degrees of zenith count as vertically pointing.
const VERT_POINTING_TOLERANCE_DEG: f64 = 2.5;

/// Radar-specific instrument parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarParams {
    pub antenna_gain_db_h: f64,
    pub antenna_gain_db_v: f64,
    pub beam_width_deg_h: f64,
    pub beam_width_deg_v: f64,
    pub receiver_bandwidth_mhz: f64,
}

impl Default for RadarParams {
    fn default() -> Self {
        let m = missing_meta_double();
        Self {
            antenna_gain_db_h: m,
            antenna_gain_db_v: m,
            beam_width_deg_h: m,
            beam_width_deg_v: m,
            receiver_bandwidth_mhz: m,
        }
    }
}

/// Lidar-specific instrument parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LidarParams {
    pub constant: f64,
    pub pulse_energy_j: f64,
    pub peak_power_w: f64,
    pub aperture_diam_cm: f64,
    pub aperture_efficiency: f64,
    pub field_of_view_mrad: f64,
    pub beam_divergence_mrad: f64,
}

impl Default for LidarParams {
    fn default() -> Self {
        let m = missing_meta_double();
        Self {
            constant: m,
            pulse_energy_j: m,
            peak_power_w: m,
            aperture_diam_cm: m,
            aperture_efficiency: m,
            field_of_view_mrad: m,
            beam_divergence_mrad: m,
        }
    }
}

/// Declared type of a user-supplied global attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserAttrType {
    String,
    Int,
    Double,
    IntArray,
    DoubleArray,
}

/// A free-form global attribute. The value is kept as text and parsed
/// according to `attr_type` when written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAttribute {
    pub name: String,
    #[serde(rename = "type")]
    pub attr_type: UserAttrType,
    pub value: String,
}

/// A full radar or lidar volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Volume {
    pub version: String,
    pub title: String,
    pub institution: String,
    pub references: String,
    pub source: String,
    pub history: String,
    pub comment: String,
    pub author: String,
    pub original_format: String,
    pub driver: String,
    pub created: String,
    pub status_xml: String,

    pub instrument_name: String,
    pub site_name: String,
    pub scan_name: String,
    pub scan_id: i32,
    pub volume_number: i32,
    pub instrument_type: InstrumentType,
    pub platform_type: PlatformType,
    pub primary_axis: PrimaryAxis,

    pub start_time: RadxTime,
    pub end_time: RadxTime,
    pub ray_times_increase: bool,
    /// Set when platform motion has already been folded into ray angles.
    pub georefs_applied: bool,

    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
    pub sensor_ht_agl_m: f64,

    pub frequency_hz: Vec<f64>,
    pub radar: RadarParams,
    pub lidar: LidarParams,
    pub user_attributes: Vec<UserAttribute>,

    pub sweeps: Vec<Sweep>,
    pub rays: Vec<Ray>,
    pub calibrations: Vec<Calibration>,
    pub correction_factors: Option<CorrectionFactors>,
}

impl Default for Volume {
    fn default() -> Self {
        let m = missing_meta_double();
        Self {
            version: String::new(),
            title: String::new(),
            institution: String::new(),
            references: String::new(),
            source: String::new(),
            history: String::new(),
            comment: String::new(),
            author: String::new(),
            original_format: String::new(),
            driver: String::new(),
            created: String::new(),
            status_xml: String::new(),
            instrument_name: String::new(),
            site_name: String::new(),
            scan_name: String::new(),
            scan_id: 0,
            volume_number: m as i32,
            instrument_type: InstrumentType::default(),
            platform_type: PlatformType::default(),
            primary_axis: PrimaryAxis::default(),
            start_time: RadxTime::default(),
            end_time: RadxTime::default(),
            ray_times_increase: true,
            georefs_applied: false,
            latitude_deg: m,
            longitude_deg: m,
            altitude_km: m,
            sensor_ht_agl_m: m,
            frequency_hz: Vec::new(),
            radar: RadarParams::default(),
            lidar: LidarParams::default(),
            user_attributes: Vec::new(),
            sweeps: Vec::new(),
            rays: Vec::new(),
            calibrations: Vec::new(),
            correction_factors: None,
        }
    }
}

impl Volume {
    /// Load a volume document. `.yaml`/`.yml` files are read as YAML,
    /// everything else as JSON.
    pub fn from_path(path: &Path) -> ModelResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
            .unwrap_or(false);

        let vol: Volume = if is_yaml {
            serde_yaml::from_str(&text)?
        } else {
            serde_json::from_str(&text)?
        };

        debug!(
            path = %path.display(),
            n_rays = vol.rays.len(),
            n_sweeps = vol.sweeps.len(),
            "Loaded volume document"
        );
        Ok(vol)
    }

    pub fn n_rays(&self) -> usize {
        self.rays.len()
    }

    pub fn n_sweeps(&self) -> usize {
        self.sweeps.len()
    }

    /// Largest gate count over all rays.
    pub fn max_n_gates(&self) -> usize {
        self.rays.iter().map(|r| r.n_gates).max().unwrap_or(0)
    }

    /// Field names in the order they are first seen across rays.
    pub fn unique_field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for ray in &self.rays {
            for field in &ray.fields {
                if !names.iter().any(|n| n == &field.name) {
                    names.push(field.name.clone());
                }
            }
        }
        names
    }

    /// First occurrence of a field, used as the canonical definition of its
    /// type, units and attributes.
    pub fn field_template(&self, name: &str) -> ModelResult<&Field> {
        self.rays
            .iter()
            .find_map(|r| r.field(name))
            .ok_or_else(|| ModelError::FieldNotFound(name.to_string()))
    }

    /// The named field on every ray, `None` where a ray lacks it.
    ///
    /// Fails only when no ray carries the field at all.
    pub fn field_over_rays(&self, name: &str) -> ModelResult<Vec<Option<&Field>>> {
        let fields: Vec<Option<&Field>> = self.rays.iter().map(|r| r.field(name)).collect();
        if fields.iter().all(|f| f.is_none()) {
            return Err(ModelError::FieldNotFound(name.to_string()));
        }
        Ok(fields)
    }

    /// Check the structural invariants the writers rely on.
    pub fn validate(&self) -> ModelResult<()> {
        let n_rays = self.rays.len();
        let mut next_start = 0usize;

        for sweep in &self.sweeps {
            if sweep.start_ray_index > sweep.end_ray_index {
                return Err(ModelError::invalid_sweep_range(
                    sweep.sweep_number,
                    format!(
                        "start index {} after end index {}",
                        sweep.start_ray_index, sweep.end_ray_index
                    ),
                ));
            }
            if sweep.end_ray_index >= n_rays {
                return Err(ModelError::invalid_sweep_range(
                    sweep.sweep_number,
                    format!("end index {} beyond {} rays", sweep.end_ray_index, n_rays),
                ));
            }
            if sweep.start_ray_index < next_start {
                return Err(ModelError::invalid_sweep_range(
                    sweep.sweep_number,
                    "overlaps the previous sweep",
                ));
            }
            next_start = sweep.end_ray_index + 1;
        }

        for (ii, ray) in self.rays.iter().enumerate() {
            if let Some(idx) = ray.calib_index {
                if idx >= self.calibrations.len() {
                    return Err(ModelError::invalid_ray(
                        ii,
                        format!(
                            "calibration index {} beyond {} calibrations",
                            idx,
                            self.calibrations.len()
                        ),
                    ));
                }
            }
            for field in &ray.fields {
                if field.n_gates() > ray.n_gates {
                    return Err(ModelError::invalid_ray(
                        ii,
                        format!(
                            "field {} has {} gates, ray has {}",
                            field.name,
                            field.n_gates(),
                            ray.n_gates
                        ),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Set start and end time to the earliest and latest ray times.
    ///
    /// Ray order is not assumed to be time order.
    pub fn load_times_from_rays(&mut self) {
        let earliest = self.rays.iter().map(|ray| ray.time).min();
        let latest = self.rays.iter().map(|ray| ray.time).max();
        if let (Some(start), Some(end)) = (earliest, latest) {
            self.start_time = start;
            self.end_time = end;
        }
    }

    /// True when ray times never decrease through the volume.
    pub fn check_ray_times_increase(&self) -> bool {
        self.rays.windows(2).all(|w| w[1].time >= w[0].time)
    }

    /// Copy the volume metadata and only the rays of one sweep.
    ///
    /// The new volume has a single sweep whose ray range starts at zero, and
    /// its start and end times come from the sliced rays.
    pub fn sweep_subvolume(&self, sweep_index: usize) -> ModelResult<Volume> {
        let sweep = self
            .sweeps
            .get(sweep_index)
            .ok_or(ModelError::SweepOutOfRange {
                index: sweep_index,
                n_sweeps: self.sweeps.len(),
            })?;

        let rays = self
            .rays
            .get(sweep.start_ray_index..=sweep.end_ray_index)
            .ok_or_else(|| {
                ModelError::invalid_sweep_range(sweep.sweep_number, "ray range outside volume")
            })?
            .to_vec();

        let mut sub_sweep = sweep.clone();
        sub_sweep.start_ray_index = 0;
        sub_sweep.end_ray_index = rays.len() - 1;

        let mut sub = Volume {
            sweeps: vec![sub_sweep],
            rays,
            ..self.metadata_only()
        };
        sub.load_times_from_rays();
        sub.ray_times_increase = sub.check_ray_times_increase();
        Ok(sub)
    }

    /// Clone everything except sweeps and rays.
    fn metadata_only(&self) -> Volume {
        Volume {
            version: self.version.clone(),
            title: self.title.clone(),
            institution: self.institution.clone(),
            references: self.references.clone(),
            source: self.source.clone(),
            history: self.history.clone(),
            comment: self.comment.clone(),
            author: self.author.clone(),
            original_format: self.original_format.clone(),
            driver: self.driver.clone(),
            created: self.created.clone(),
            status_xml: self.status_xml.clone(),
            instrument_name: self.instrument_name.clone(),
            site_name: self.site_name.clone(),
            scan_name: self.scan_name.clone(),
            scan_id: self.scan_id,
            volume_number: self.volume_number,
            instrument_type: self.instrument_type,
            platform_type: self.platform_type,
            primary_axis: self.primary_axis,
            start_time: self.start_time,
            end_time: self.end_time,
            ray_times_increase: self.ray_times_increase,
            georefs_applied: self.georefs_applied,
            latitude_deg: self.latitude_deg,
            longitude_deg: self.longitude_deg,
            altitude_km: self.altitude_km,
            sensor_ht_agl_m: self.sensor_ht_agl_m,
            frequency_hz: self.frequency_hz.clone(),
            radar: self.radar.clone(),
            lidar: self.lidar.clone(),
            user_attributes: self.user_attributes.clone(),
            sweeps: Vec::new(),
            rays: Vec::new(),
            calibrations: self.calibrations.clone(),
            correction_factors: self.correction_factors,
        }
    }

    /// Sweep mode covering the most non-transition rays.
    ///
    /// Rays pointing within 2.5 degrees of zenith count as vertical pointing
    /// regardless of their sweep's mode.
    pub fn predominant_sweep_mode(&self) -> SweepMode {
        if self.sweeps.is_empty() {
            return SweepMode::AzimuthSurveillance;
        }

        let mut counts: HashMap<SweepMode, usize> = HashMap::new();
        for sweep in &self.sweeps {
            let end = sweep.end_ray_index.min(self.rays.len().saturating_sub(1));
            if self.rays.is_empty() || sweep.start_ray_index > end {
                continue;
            }
            for ray in &self.rays[sweep.start_ray_index..=end] {
                if ray.antenna_transition {
                    continue;
                }
                let mode = if (ray.elevation_deg - 90.0).abs() < VERT_POINTING_TOLERANCE_DEG {
                    SweepMode::VerticalPointing
                } else {
                    sweep.sweep_mode
                };
                *counts.entry(mode).or_insert(0) += 1;
            }
        }

        // Ties resolve to the mode declared first in the sweep list
        let mut best = SweepMode::AzimuthSurveillance;
        let mut best_count = 0usize;
        for mode in self
            .sweeps
            .iter()
            .map(|s| s.sweep_mode)
            .chain(std::iter::once(SweepMode::VerticalPointing))
        {
            let count = counts.get(&mode).copied().unwrap_or(0);
            if count > best_count {
                best = mode;
                best_count = count;
            }
        }
        best
    }

    /// One-line description for logs and the command line.
    pub fn summary(&self) -> String {
        format!(
            "{} {} vol {}: {} sweeps, {} rays, {} fields, max {} gates, {} to {}",
            if self.instrument_name.is_empty() { "unnamed" } else { self.instrument_name.as_str() },
            self.instrument_type,
            self.volume_number,
            self.sweeps.len(),
            self.rays.len(),
            self.unique_field_names().len(),
            self.max_n_gates(),
            self.start_time,
            self.end_time
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ray_at(secs: i64, elev: f64, fields: &[&str]) -> Ray {
        let mut ray = Ray {
            time: RadxTime::from_secs(secs),
            elevation_deg: elev,
            azimuth_deg: 0.0,
            ..Default::default()
        };
        for name in fields {
            ray.add_field(Field::new_fl32(name, "dBZ", vec![1.0; 4]));
        }
        ray
    }

    fn two_sweep_volume() -> Volume {
        let mut vol = Volume {
            rays: vec![
                ray_at(100, 0.5, &["DBZ"]),
                ray_at(101, 0.5, &["DBZ", "VEL"]),
                ray_at(102, 1.5, &["ZDR"]),
                ray_at(103, 1.5, &["DBZ"]),
                ray_at(104, 1.5, &["DBZ"]),
            ],
            sweeps: vec![
                Sweep::new(0, SweepMode::AzimuthSurveillance, 0, 1),
                Sweep::new(1, SweepMode::Rhi, 2, 4),
            ],
            ..Default::default()
        };
        vol.load_times_from_rays();
        vol
    }

    #[test]
    fn test_unique_field_names_first_seen_order() {
        let vol = two_sweep_volume();
        assert_eq!(vol.unique_field_names(), vec!["DBZ", "VEL", "ZDR"]);
    }

    #[test]
    fn test_field_template_missing_is_error() {
        let vol = two_sweep_volume();
        assert!(vol.field_template("VEL").is_ok());
        match vol.field_template("KDP") {
            Err(ModelError::FieldNotFound(name)) => assert_eq!(name, "KDP"),
            other => panic!("expected FieldNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_field_over_rays() {
        let vol = two_sweep_volume();
        let vel = vol.field_over_rays("VEL").unwrap();
        assert_eq!(vel.len(), 5);
        assert!(vel[1].is_some());
        assert_eq!(vel.iter().filter(|f| f.is_none()).count(), 4);
        assert!(matches!(
            vol.field_over_rays("KDP"),
            Err(ModelError::FieldNotFound(_))
        ));
    }

    #[test]
    fn test_sweep_subvolume_slices_rays_and_times() {
        let vol = two_sweep_volume();
        let sub = vol.sweep_subvolume(1).unwrap();
        assert_eq!(sub.n_rays(), 3);
        assert_eq!(sub.sweeps.len(), 1);
        assert_eq!(sub.sweeps[0].start_ray_index, 0);
        assert_eq!(sub.sweeps[0].end_ray_index, 2);
        assert_eq!(sub.sweeps[0].sweep_number, 1);
        assert_eq!(sub.start_time.secs, 102);
        assert_eq!(sub.end_time.secs, 104);

        assert!(matches!(
            vol.sweep_subvolume(2),
            Err(ModelError::SweepOutOfRange { index: 2, n_sweeps: 2 })
        ));
    }

    #[test]
    fn test_sweep_subvolume_times_span_out_of_order_rays() {
        let mut vol = two_sweep_volume();
        vol.rays[2].time = RadxTime::from_secs(105);
        vol.rays[3].time = RadxTime::new(100, 500_000_000);
        vol.rays[4].time = RadxTime::from_secs(103);

        let sub = vol.sweep_subvolume(1).unwrap();
        assert_eq!(sub.start_time, RadxTime::new(100, 500_000_000));
        assert_eq!(sub.end_time, RadxTime::from_secs(105));
        assert!(sub.start_time <= sub.end_time);
        assert!(!sub.ray_times_increase);
    }

    #[test]
    fn test_load_times_from_rays_uses_extremes() {
        let mut vol = two_sweep_volume();
        vol.rays[0].time = RadxTime::from_secs(110);
        vol.rays[4].time = RadxTime::from_secs(90);
        vol.load_times_from_rays();
        assert_eq!(vol.start_time.secs, 90);
        assert_eq!(vol.end_time.secs, 110);
    }

    #[test]
    fn test_validate_rejects_overlap_and_bad_calib() {
        let mut vol = two_sweep_volume();
        assert!(vol.validate().is_ok());

        vol.sweeps[1].start_ray_index = 1;
        assert!(matches!(
            vol.validate(),
            Err(ModelError::InvalidSweepRange { sweep_number: 1, .. })
        ));

        let mut vol = two_sweep_volume();
        vol.rays[0].calib_index = Some(0);
        assert!(matches!(vol.validate(), Err(ModelError::InvalidRay { ray_index: 0, .. })));
    }

    #[test]
    fn test_predominant_sweep_mode() {
        let vol = two_sweep_volume();
        assert_eq!(vol.predominant_sweep_mode(), SweepMode::Rhi);

        let mut vert = two_sweep_volume();
        for ray in &mut vert.rays {
            ray.elevation_deg = 89.0;
        }
        assert_eq!(vert.predominant_sweep_mode(), SweepMode::VerticalPointing);

        let empty = Volume::default();
        assert_eq!(empty.predominant_sweep_mode(), SweepMode::AzimuthSurveillance);
    }

    #[test]
    fn test_ray_times_increase() {
        let mut vol = two_sweep_volume();
        assert!(vol.check_ray_times_increase());
        vol.rays[3].time = RadxTime::from_secs(50);
        assert!(!vol.check_ray_times_increase());
    }
}
