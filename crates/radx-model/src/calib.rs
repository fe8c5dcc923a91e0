//! Radar calibration snapshots and volume-wide correction factors.

use serde::{Deserialize, Serialize};

use crate::constants::missing_meta_double;
use crate::time::RadxTime;

/// One value per receiver channel: co- and cross-polar, H and V.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerChannel {
    pub hc: f64,
    pub vc: f64,
    pub hx: f64,
    pub vx: f64,
}

impl Default for PerChannel {
    fn default() -> Self {
        let m = missing_meta_double();
        Self {
            hc: m,
            vc: m,
            hx: m,
            vx: m,
        }
    }
}

/// H and V polarization pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerPol {
    pub h: f64,
    pub v: f64,
}

impl Default for PerPol {
    fn default() -> Self {
        let m = missing_meta_double();
        Self { h: m, v: m }
    }
}

/// A named, timed radar calibration. Rays refer to it by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub name: String,
    pub time: RadxTime,
    pub pulse_width_usec: f64,
    pub xmit_power_dbm: PerPol,
    pub two_way_waveguide_loss_db: PerPol,
    pub two_way_radome_loss_db: PerPol,
    pub receiver_mismatch_loss_db: f64,
    pub k_squared_water: f64,
    pub radar_constant: PerPol,
    pub antenna_gain_db: PerPol,
    pub noise_dbm: PerChannel,
    pub i0_dbm: PerChannel,
    pub receiver_gain_db: PerChannel,
    pub receiver_slope_db: PerChannel,
    pub dynamic_range_db: PerChannel,
    pub base_dbz_1km: PerChannel,
    pub sun_power_dbm: PerChannel,
    pub noise_source_power_dbm: PerPol,
    pub power_measure_loss_db: PerPol,
    pub coupler_forward_loss_db: PerPol,
    pub dbz_correction: f64,
    pub zdr_correction: f64,
    pub ldr_correction_db: PerPol,
    pub system_phidp_deg: f64,
    pub test_power_dbm: PerPol,
}

impl Default for Calibration {
    fn default() -> Self {
        let m = missing_meta_double();
        Self {
            name: String::new(),
            time: RadxTime::default(),
            pulse_width_usec: m,
            xmit_power_dbm: PerPol::default(),
            two_way_waveguide_loss_db: PerPol::default(),
            two_way_radome_loss_db: PerPol::default(),
            receiver_mismatch_loss_db: m,
            k_squared_water: m,
            radar_constant: PerPol::default(),
            antenna_gain_db: PerPol::default(),
            noise_dbm: PerChannel::default(),
            i0_dbm: PerChannel::default(),
            receiver_gain_db: PerChannel::default(),
            receiver_slope_db: PerChannel::default(),
            dynamic_range_db: PerChannel::default(),
            base_dbz_1km: PerChannel::default(),
            sun_power_dbm: PerChannel::default(),
            noise_source_power_dbm: PerPol::default(),
            power_measure_loss_db: PerPol::default(),
            coupler_forward_loss_db: PerPol::default(),
            dbz_correction: m,
            zdr_correction: m,
            ldr_correction_db: PerPol::default(),
            system_phidp_deg: m,
            test_power_dbm: PerPol::default(),
        }
    }
}

/// Systematic corrections applied to pointing, position and motion.
///
/// Unlike georeference members these are all-or-nothing: the record is
/// either attached to a volume or it is not.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionFactors {
    pub azimuth: f64,
    pub elevation: f64,
    pub range: f64,
    pub longitude: f64,
    pub latitude: f64,
    pub pressure_altitude: f64,
    pub altitude: f64,
    pub eastward_velocity: f64,
    pub northward_velocity: f64,
    pub vertical_velocity: f64,
    pub heading: f64,
    pub roll: f64,
    pub pitch: f64,
    pub drift: f64,
    pub rotation: f64,
    pub tilt: f64,
}
