//! Rays: one transmitted beam and its gate data.

use serde::{Deserialize, Serialize};

use crate::constants::{missing_meta_double, MISSING_META_DOUBLE};
use crate::field::Field;
use crate::georef::Georeference;
use crate::time::RadxTime;

/// One beam. Field arrays hold `n_gates` values each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ray {
    pub time: RadxTime,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub pulse_width_usec: f64,
    pub prt_sec: f64,
    pub prt_ratio: f64,
    pub nyquist_mps: f64,
    pub unambig_range_km: f64,
    pub antenna_transition: bool,
    pub georefs_applied: bool,
    pub n_samples: i32,
    /// Index into the volume calibration list.
    pub calib_index: Option<usize>,
    pub measured_xmit_power_dbm_h: f64,
    pub measured_xmit_power_dbm_v: f64,
    pub true_scan_rate_dps: f64,
    pub estimated_noise_dbm_hc: f64,
    pub estimated_noise_dbm_vc: f64,
    pub estimated_noise_dbm_hx: f64,
    pub estimated_noise_dbm_vx: f64,
    pub start_range_km: f64,
    pub gate_spacing_km: f64,
    pub n_gates: usize,
    pub fields: Vec<Field>,
    pub georeference: Option<Georeference>,
}

impl Default for Ray {
    fn default() -> Self {
        let m = missing_meta_double();
        Self {
            time: RadxTime::default(),
            azimuth_deg: m,
            elevation_deg: m,
            pulse_width_usec: m,
            prt_sec: m,
            prt_ratio: m,
            nyquist_mps: m,
            unambig_range_km: m,
            antenna_transition: false,
            georefs_applied: false,
            n_samples: 0,
            calib_index: None,
            measured_xmit_power_dbm_h: m,
            measured_xmit_power_dbm_v: m,
            true_scan_rate_dps: m,
            estimated_noise_dbm_hc: m,
            estimated_noise_dbm_vc: m,
            estimated_noise_dbm_hx: m,
            estimated_noise_dbm_vx: m,
            start_range_km: 0.0,
            gate_spacing_km: MISSING_META_DOUBLE,
            n_gates: 0,
            fields: Vec::new(),
            georeference: None,
        }
    }
}

impl Ray {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Set the gate geometry shared by every field on the ray.
    pub fn set_range_geom(&mut self, start_range_km: f64, gate_spacing_km: f64) {
        self.start_range_km = start_range_km;
        self.gate_spacing_km = gate_spacing_km;
    }

    /// Attach a field, growing the ray's gate count to fit it.
    pub fn add_field(&mut self, field: Field) {
        self.n_gates = self.n_gates.max(field.n_gates());
        self.fields.push(field);
    }
}
