//! Gate value generators with predictable, verifiable patterns.

/// Gate values for one ray: `ray_index * 1000 + gate`.
///
/// Any gate in a written file can be traced back to its ray and gate index.
///
/// # Example
///
/// ```
/// use test_utils::ray_gate_values;
///
/// let gates = ray_gate_values(2, 4);
/// assert_eq!(gates, vec![2000.0, 2001.0, 2002.0, 2003.0]);
/// ```
pub fn ray_gate_values(ray_index: usize, n_gates: usize) -> Vec<f32> {
    (0..n_gates)
        .map(|gate| (ray_index * 1000 + gate) as f32)
        .collect()
}

/// Reflectivity-like values (dBZ) falling off with range, with a
/// deterministic ripple per ray.
pub fn reflectivity_gates(ray_index: usize, n_gates: usize) -> Vec<f32> {
    (0..n_gates)
        .map(|gate| {
            let falloff = 50.0 - 40.0 * gate as f32 / n_gates.max(1) as f32;
            let ripple = ((ray_index * 7 + gate * 3) % 11) as f32 - 5.0;
            falloff + ripple
        })
        .collect()
}

/// Packed 16-bit velocities for a field with the given scale and offset,
/// ramping from `-nyquist` to `+nyquist` across the ray.
pub fn packed_velocity_gates(n_gates: usize, nyquist: f64, scale: f64, offset: f64) -> Vec<i16> {
    (0..n_gates)
        .map(|gate| {
            let frac = if n_gates > 1 {
                gate as f64 / (n_gates - 1) as f64
            } else {
                0.5
            };
            let physical = -nyquist + 2.0 * nyquist * frac;
            ((physical - offset) / scale).round() as i16
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_gate_values() {
        let gates = ray_gate_values(3, 5);
        assert_eq!(gates.len(), 5);
        assert_eq!(gates[0], 3000.0);
        assert_eq!(gates[4], 3004.0);
    }

    #[test]
    fn test_reflectivity_gates_range() {
        let gates = reflectivity_gates(1, 100);
        assert_eq!(gates.len(), 100);
        assert!(gates.iter().all(|v| (4.0..=56.0).contains(v)));
    }

    #[test]
    fn test_packed_velocity_gates_endpoints() {
        let gates = packed_velocity_gates(11, 25.0, 0.01, 0.0);
        assert_eq!(gates[0], -2500);
        assert_eq!(gates[10], 2500);
        assert_eq!(gates[5], 0);
    }
}
