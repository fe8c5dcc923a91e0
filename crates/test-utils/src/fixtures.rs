//! Volume fixtures for writer tests.
//!
//! Gate data follows [`ray_gate_values`](crate::ray_gate_values), so a value
//! read back from a file identifies the ray and gate it came from.

use radx_model::{
    Calibration, CorrectionFactors, Field, FieldData, Georeference, PerChannel, PerPol,
    PlatformType, RadxTime, Ray, Sweep, SweepMode, Volume, MISSING_SI16,
};

use crate::generators::{packed_velocity_gates, ray_gate_values};

/// 2013-06-02T03:04:05Z, start time of every fixture volume.
pub const BASE_TIME_SECS: i64 = 1_370_142_245;

/// Fixed site used by fixture volumes (Marshall, Colorado).
pub const SITE_LAT: f64 = 39.950;
pub const SITE_LON: f64 = -105.195;
pub const SITE_ALT_KM: f64 = 1.742;

pub const START_RANGE_KM: f64 = 0.15;
pub const GATE_SPACING_KM: f64 = 0.15;

/// Velocity packing used for the optional `VEL` field.
pub const VEL_SCALE: f64 = 0.01;
pub const VEL_OFFSET: f64 = 0.0;
pub const NYQUIST_MPS: f64 = 25.0;

/// Builder for synthetic volumes.
///
/// # Example
///
/// ```
/// use test_utils::VolumeBuilder;
///
/// let vol = VolumeBuilder::new().sweeps(2).rays_per_sweep(10).gates(50).build();
/// assert_eq!(vol.rays.len(), 20);
/// assert_eq!(vol.sweeps.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct VolumeBuilder {
    n_sweeps: usize,
    rays_per_sweep: usize,
    n_gates: usize,
    gate_overrides: Vec<(usize, usize)>,
    sweep_mode: SweepMode,
    with_velocity: bool,
    ray_interval_ms: u32,
}

impl Default for VolumeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl VolumeBuilder {
    pub fn new() -> Self {
        Self {
            n_sweeps: 1,
            rays_per_sweep: 5,
            n_gates: 100,
            gate_overrides: Vec::new(),
            sweep_mode: SweepMode::AzimuthSurveillance,
            with_velocity: false,
            ray_interval_ms: 1000,
        }
    }

    pub fn sweeps(mut self, n_sweeps: usize) -> Self {
        self.n_sweeps = n_sweeps;
        self
    }

    pub fn rays_per_sweep(mut self, n_rays: usize) -> Self {
        self.rays_per_sweep = n_rays;
        self
    }

    pub fn gates(mut self, n_gates: usize) -> Self {
        self.n_gates = n_gates;
        self
    }

    /// Give one ray (volume-wide index) a different gate count.
    pub fn ray_gates(mut self, ray_index: usize, n_gates: usize) -> Self {
        self.gate_overrides.push((ray_index, n_gates));
        self
    }

    pub fn mode(mut self, mode: SweepMode) -> Self {
        self.sweep_mode = mode;
        self
    }

    /// Add a packed 16-bit `VEL` field next to `DBZ`.
    pub fn with_velocity(mut self) -> Self {
        self.with_velocity = true;
        self
    }

    pub fn ray_interval_ms(mut self, ms: u32) -> Self {
        self.ray_interval_ms = ms;
        self
    }

    fn gates_for(&self, ray_index: usize) -> usize {
        self.gate_overrides
            .iter()
            .rev()
            .find(|(idx, _)| *idx == ray_index)
            .map(|(_, n)| *n)
            .unwrap_or(self.n_gates)
    }

    fn ray_time(&self, ray_index: usize) -> RadxTime {
        let total_ms = ray_index as u64 * self.ray_interval_ms as u64;
        RadxTime::new(
            BASE_TIME_SECS + (total_ms / 1000) as i64,
            ((total_ms % 1000) * 1_000_000) as u32,
        )
    }

    pub fn build(&self) -> Volume {
        let rhi = self.sweep_mode.is_rhi_like();
        let mut rays = Vec::new();
        let mut sweeps = Vec::new();

        for sweep_index in 0..self.n_sweeps {
            let fixed_angle = if rhi {
                270.0 + sweep_index as f64 * 0.5
            } else {
                0.5 + sweep_index as f64
            };
            let start = rays.len();

            for jj in 0..self.rays_per_sweep {
                let ii = rays.len();
                let n_gates = self.gates_for(ii);
                let mut ray = Ray {
                    time: self.ray_time(ii),
                    nyquist_mps: NYQUIST_MPS,
                    n_samples: 64,
                    ..Default::default()
                };
                if rhi {
                    ray.azimuth_deg = fixed_angle;
                    ray.elevation_deg = jj as f64 * 2.0;
                } else {
                    ray.azimuth_deg = (jj as f64 * 360.0 / self.rays_per_sweep as f64) % 360.0;
                    ray.elevation_deg = fixed_angle;
                }
                ray.set_range_geom(START_RANGE_KM, GATE_SPACING_KM);
                ray.add_field(dbz_field(ray_gate_values(ii, n_gates)));
                if self.with_velocity {
                    ray.add_field(vel_field(n_gates));
                }
                rays.push(ray);
            }

            let mut sweep = Sweep::new(
                sweep_index as i32 + 1,
                self.sweep_mode,
                start,
                rays.len() - 1,
            );
            sweep.fixed_angle_deg = fixed_angle;
            sweeps.push(sweep);
        }

        let mut vol = Volume {
            title: "Synthetic test volume".to_string(),
            institution: "Test Institution".to_string(),
            instrument_name: "SPOL".to_string(),
            site_name: "Marshall".to_string(),
            scan_name: "SUR".to_string(),
            volume_number: 12,
            latitude_deg: SITE_LAT,
            longitude_deg: SITE_LON,
            altitude_km: SITE_ALT_KM,
            sensor_ht_agl_m: 8.0,
            frequency_hz: vec![2.809e9],
            sweeps,
            rays,
            ..Default::default()
        };
        vol.load_times_from_rays();
        vol
    }
}

/// Float reflectivity field.
pub fn dbz_field(values: Vec<f32>) -> Field {
    let mut field = Field::new_fl32("DBZ", "dBZ", values);
    field.long_name = "reflectivity".to_string();
    field.standard_name = "equivalent_reflectivity_factor".to_string();
    field
}

/// Packed 16-bit radial velocity field that folds at the Nyquist velocity.
pub fn vel_field(n_gates: usize) -> Field {
    let mut field = Field::with_data(
        "VEL",
        "m/s",
        FieldData::Si16 {
            values: packed_velocity_gates(n_gates, NYQUIST_MPS, VEL_SCALE, VEL_OFFSET),
            missing: MISSING_SI16,
        },
    );
    field.long_name = "radial_velocity".to_string();
    field.standard_name = "radial_velocity_of_scatterers_away_from_instrument".to_string();
    field.scale = VEL_SCALE;
    field.offset = VEL_OFFSET;
    field.folds = true;
    field.fold_limit_lower = -NYQUIST_MPS;
    field.fold_limit_upper = NYQUIST_MPS;
    field
}

/// Single sweep, uniform gates, `DBZ` only.
pub fn uniform_volume(n_rays: usize, n_gates: usize) -> Volume {
    VolumeBuilder::new()
        .rays_per_sweep(n_rays)
        .gates(n_gates)
        .build()
}

/// Single sweep with per-ray gate counts.
pub fn ragged_volume(gates_per_ray: &[usize]) -> Volume {
    let n_max = gates_per_ray.iter().copied().max().unwrap_or(0);
    let mut builder = VolumeBuilder::new()
        .rays_per_sweep(gates_per_ray.len())
        .gates(n_max);
    for (ii, n) in gates_per_ray.iter().enumerate() {
        builder = builder.ray_gates(ii, *n);
    }
    builder.build()
}

/// Distinct, recognizable correction values.
pub fn correction_factors() -> CorrectionFactors {
    CorrectionFactors {
        azimuth: 0.1,
        elevation: 0.2,
        range: 0.3,
        longitude: 0.4,
        latitude: 0.5,
        pressure_altitude: 0.6,
        altitude: 0.7,
        eastward_velocity: 0.8,
        northward_velocity: 0.9,
        vertical_velocity: 1.0,
        heading: 1.1,
        roll: 1.2,
        pitch: 1.3,
        drift: 1.4,
        rotation: 1.5,
        tilt: 1.6,
    }
}

/// A plausible S-band calibration.
pub fn calibration(name: &str) -> Calibration {
    Calibration {
        name: name.to_string(),
        time: RadxTime::from_secs(BASE_TIME_SECS - 3600),
        pulse_width_usec: 1.0,
        xmit_power_dbm: PerPol { h: 85.0, v: 85.2 },
        two_way_waveguide_loss_db: PerPol { h: 3.1, v: 3.2 },
        radar_constant: PerPol { h: 70.1, v: 70.3 },
        antenna_gain_db: PerPol { h: 45.0, v: 45.1 },
        noise_dbm: PerChannel {
            hc: -77.1,
            vc: -77.3,
            hx: -77.5,
            vx: -77.7,
        },
        base_dbz_1km: PerChannel {
            hc: -48.0,
            vc: -47.9,
            hx: -47.8,
            vx: -47.7,
        },
        k_squared_water: 0.93,
        dbz_correction: 0.0,
        zdr_correction: 0.25,
        system_phidp_deg: -145.0,
        ..Default::default()
    }
}

/// Attach two calibrations; the first half of the rays use the first one.
pub fn with_calibrations(mut vol: Volume) -> Volume {
    vol.calibrations = vec![calibration("cal_a"), calibration("cal_b")];
    let half = vol.rays.len() / 2;
    for (ii, ray) in vol.rays.iter_mut().enumerate() {
        ray.calib_index = Some(if ii < half { 0 } else { 1 });
    }
    vol
}

/// Make the volume airborne, with a georeference on every ray.
///
/// Heading, roll and pitch are set; the other optional members stay missing.
pub fn with_georefs(mut vol: Volume) -> Volume {
    vol.platform_type = PlatformType::Aircraft;
    for (ii, ray) in vol.rays.iter_mut().enumerate() {
        ray.georeference = Some(Georeference {
            time: ray.time,
            latitude_deg: SITE_LAT + ii as f64 * 0.001,
            longitude_deg: SITE_LON - ii as f64 * 0.001,
            altitude_km_msl: 5.0,
            altitude_km_agl: 3.2,
            heading_deg: 90.0 + ii as f64,
            roll_deg: 1.5,
            pitch_deg: -0.5,
            ..Default::default()
        });
    }
    vol
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_volume() {
        let vol = uniform_volume(5, 100);
        assert_eq!(vol.rays.len(), 5);
        assert!(vol.rays.iter().all(|r| r.n_gates == 100));
        assert_eq!(vol.start_time, RadxTime::from_secs(BASE_TIME_SECS));
        assert_eq!(vol.end_time, RadxTime::from_secs(BASE_TIME_SECS + 4));
        assert!(vol.validate().is_ok());
    }

    #[test]
    fn test_ragged_volume() {
        let vol = ragged_volume(&[100, 100, 100, 80, 100]);
        let gates: Vec<usize> = vol.rays.iter().map(|r| r.n_gates).collect();
        assert_eq!(gates, vec![100, 100, 100, 80, 100]);
    }

    #[test]
    fn test_multi_sweep_ranges() {
        let vol = VolumeBuilder::new()
            .sweeps(3)
            .rays_per_sweep(4)
            .gates(10)
            .build();
        assert_eq!(vol.sweeps[2].start_ray_index, 8);
        assert_eq!(vol.sweeps[2].end_ray_index, 11);
        assert_eq!(vol.sweeps[2].sweep_number, 3);
        assert!(vol.validate().is_ok());
    }

    #[test]
    fn test_sub_second_ray_times() {
        let vol = VolumeBuilder::new()
            .rays_per_sweep(3)
            .ray_interval_ms(250)
            .build();
        assert_eq!(vol.rays[2].time, RadxTime::new(BASE_TIME_SECS, 500_000_000));
    }

    #[test]
    fn test_calibration_indices_valid() {
        let vol = with_calibrations(uniform_volume(4, 10));
        assert!(vol.validate().is_ok());
        assert_eq!(vol.rays[3].calib_index, Some(1));
    }
}
