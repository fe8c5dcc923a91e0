//! Dimension planning.

use radx_model::Volume;

use crate::layout::GateLayout;
use crate::names::dims;

/// Width of short fixed-length strings.
pub const STRING_LENGTH_SHORT: usize = 8;
/// Width of medium fixed-length strings.
pub const STRING_LENGTH_MEDIUM: usize = 32;

/// Dimensions needed to write one volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionPlan {
    pub n_times: usize,
    pub n_range: usize,
    /// Declared only for the ragged layout.
    pub n_points: Option<usize>,
    pub n_sweeps: usize,
    pub n_calibs: Option<usize>,
    pub n_frequencies: Option<usize>,
    pub status_xml_len: usize,
}

impl DimensionPlan {
    pub fn plan(vol: &Volume, layout: &GateLayout) -> Self {
        Self {
            n_times: vol.rays.len(),
            // Rays with no gates still need a non-empty range axis
            n_range: layout.max_n_gates.max(1),
            n_points: if layout.n_gates_vary {
                Some(layout.n_points.max(1))
            } else {
                None
            },
            n_sweeps: vol.sweeps.len(),
            n_calibs: non_zero(vol.calibrations.len()),
            n_frequencies: non_zero(vol.frequency_hz.len()),
            status_xml_len: vol.status_xml.len() + 1,
        }
    }

    /// Every dimension to declare, in declaration order.
    pub fn dimensions(&self) -> Vec<(&'static str, usize)> {
        let mut out = vec![(dims::TIME, self.n_times), (dims::RANGE, self.n_range)];
        if let Some(n_points) = self.n_points {
            out.push((dims::N_POINTS, n_points));
        }
        out.push((dims::SWEEP, self.n_sweeps));
        out.push((dims::STRING_LENGTH_8, STRING_LENGTH_SHORT));
        out.push((dims::STRING_LENGTH_32, STRING_LENGTH_MEDIUM));
        out.push((dims::STATUS_XML_LENGTH, self.status_xml_len));
        if let Some(n_calibs) = self.n_calibs {
            out.push((dims::R_CALIB, n_calibs));
        }
        if let Some(n_frequencies) = self.n_frequencies {
            out.push((dims::FREQUENCY, n_frequencies));
        }
        out
    }
}

fn non_zero(n: usize) -> Option<usize> {
    if n == 0 {
        None
    } else {
        Some(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radx_model::{Calibration, Field, Ray, Sweep, SweepMode};

    fn volume(gates: &[usize]) -> Volume {
        Volume {
            rays: gates
                .iter()
                .map(|n| {
                    let mut ray = Ray::default();
                    ray.set_range_geom(0.0, 0.25);
                    ray.add_field(Field::new_fl32("DBZ", "dBZ", vec![0.0; *n]));
                    ray
                })
                .collect(),
            sweeps: vec![Sweep::new(0, SweepMode::AzimuthSurveillance, 0, gates.len() - 1)],
            status_xml: "<ok/>".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_rectangular_plan() {
        let vol = volume(&[100; 5]);
        let plan = DimensionPlan::plan(&vol, &GateLayout::resolve(&vol, false));
        assert_eq!(plan.n_times, 5);
        assert_eq!(plan.n_range, 100);
        assert_eq!(plan.n_points, None);
        assert_eq!(plan.n_calibs, None);
        assert_eq!(plan.status_xml_len, 6);

        let names: Vec<&str> = plan.dimensions().iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec!["time", "range", "sweep", "string_length_8", "string_length_32", "status_xml_length"]
        );
    }

    #[test]
    fn test_ragged_plan_with_calibs_and_frequencies() {
        let mut vol = volume(&[100, 100, 100, 80, 100]);
        vol.calibrations.push(Calibration::default());
        vol.frequency_hz = vec![2.8e9, 2.9e9];
        let plan = DimensionPlan::plan(&vol, &GateLayout::resolve(&vol, false));

        assert_eq!(plan.n_points, Some(480));
        assert_eq!(plan.n_range, 100);
        let dims = plan.dimensions();
        assert!(dims.contains(&("n_points", 480)));
        assert!(dims.contains(&("r_calib", 1)));
        assert!(dims.contains(&("frequency", 2)));
    }
}
