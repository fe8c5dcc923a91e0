//! Gate layout: rectangular (time x range) or ragged (n_points).

use radx_model::Volume;

/// Start range and spacing closer than this (km) count as equal.
const GEOM_TOLERANCE_KM: f64 = 1.0e-5;

/// Per-ray gate geometry and the storage layout chosen for field data.
#[derive(Debug, Clone, PartialEq)]
pub struct GateLayout {
    /// Fields are stored ragged over `n_points` with per-ray side arrays.
    pub n_gates_vary: bool,
    /// Start range or gate spacing differ between rays, so the range
    /// coordinate is written per ray.
    pub geom_varies: bool,
    pub max_n_gates: usize,
    pub n_points: usize,
    pub ray_n_gates: Vec<usize>,
    /// Offset of each ray's first gate in the ragged array.
    pub ray_start_index: Vec<usize>,
}

impl GateLayout {
    /// Inspect every ray once. `force_ragged` selects the ragged layout even
    /// when all rays share the same geometry.
    pub fn resolve(vol: &Volume, force_ragged: bool) -> Self {
        let ray_n_gates: Vec<usize> = vol.rays.iter().map(|r| r.n_gates).collect();

        let counts_vary = ray_n_gates.windows(2).any(|w| w[0] != w[1]);

        let geom_varies = match vol.rays.first() {
            Some(ray0) if vol.rays.len() > 1 => vol.rays.iter().skip(1).any(|r| {
                (r.start_range_km - ray0.start_range_km).abs() > GEOM_TOLERANCE_KM
                    || (r.gate_spacing_km - ray0.gate_spacing_km).abs() > GEOM_TOLERANCE_KM
            }),
            _ => false,
        };

        let mut ray_start_index = Vec::with_capacity(ray_n_gates.len());
        let mut n_points = 0usize;
        for n_gates in &ray_n_gates {
            ray_start_index.push(n_points);
            n_points += n_gates;
        }

        Self {
            n_gates_vary: counts_vary || geom_varies || force_ragged,
            geom_varies,
            max_n_gates: ray_n_gates.iter().copied().max().unwrap_or(0),
            n_points,
            ray_n_gates,
            ray_start_index,
        }
    }

    pub fn n_rays(&self) -> usize {
        self.ray_n_gates.len()
    }
}
