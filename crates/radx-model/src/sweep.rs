//! Sweeps: contiguous runs of rays sharing one scan strategy.

use serde::{Deserialize, Serialize};

use crate::constants::missing_meta_double;
use crate::enums::{FollowMode, PolarizationMode, PrtMode, SweepMode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sweep {
    pub sweep_number: i32,
    #[serde(default)]
    pub sweep_mode: SweepMode,
    #[serde(default)]
    pub polarization_mode: PolarizationMode,
    #[serde(default)]
    pub prt_mode: PrtMode,
    #[serde(default)]
    pub follow_mode: FollowMode,
    #[serde(default)]
    pub fixed_angle_deg: f64,
    #[serde(default = "missing_meta_double")]
    pub target_scan_rate_dps: f64,
    /// First ray of the sweep, index into the volume ray list.
    pub start_ray_index: usize,
    /// Last ray of the sweep, inclusive.
    pub end_ray_index: usize,
    #[serde(default)]
    pub rays_are_indexed: bool,
    #[serde(default = "missing_meta_double")]
    pub angle_res_deg: f64,
    #[serde(default = "missing_meta_double")]
    pub intermed_freq_hz: f64,
}

impl Sweep {
    pub fn new(sweep_number: i32, sweep_mode: SweepMode, start_ray_index: usize, end_ray_index: usize) -> Self {
        Self {
            sweep_number,
            sweep_mode,
            polarization_mode: PolarizationMode::default(),
            prt_mode: PrtMode::default(),
            follow_mode: FollowMode::default(),
            fixed_angle_deg: 0.0,
            target_scan_rate_dps: missing_meta_double(),
            start_ray_index,
            end_ray_index,
            rays_are_indexed: false,
            angle_res_deg: missing_meta_double(),
            intermed_freq_hz: missing_meta_double(),
        }
    }

    pub fn n_rays(&self) -> usize {
        self.end_ray_index + 1 - self.start_ray_index
    }
}
