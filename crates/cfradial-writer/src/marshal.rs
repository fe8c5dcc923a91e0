//! Field data marshaller.
//!
//! Writes metadata variables in schema order, then gathers each field
//! across rays into one buffer and writes it in a single call. Rays that
//! lack a field, and gates past the end of a short ray, hold the fill value.

use radx_model::{Field, FieldData};
use tracing::debug;

use crate::context::{FieldPlan, WriteContext};
use crate::encoder::Values;
use crate::error::Result;
use crate::sink::DatasetSink;
use crate::variables::MetaVar;

/// A gate value type the writer can store.
trait GateValue: Copy + PartialEq {
    /// The gate slice and missing value when `data` already has this type.
    fn same_type(data: &FieldData) -> Option<(&[Self], Self)>;
    /// Pack a physical value with the target scale and offset.
    fn encode(physical: f64, scale: f64, offset: f64) -> Self;
    fn into_values(buf: Vec<Self>) -> Values;
}

macro_rules! float_gate {
    ($ty:ty, $variant:ident, $values:ident) => {
        impl GateValue for $ty {
            fn same_type(data: &FieldData) -> Option<(&[Self], Self)> {
                match data {
                    FieldData::$variant { values, missing } => Some((values.as_slice(), *missing)),
                    _ => None,
                }
            }

            fn encode(physical: f64, _scale: f64, _offset: f64) -> Self {
                physical as $ty
            }

            fn into_values(buf: Vec<Self>) -> Values {
                Values::$values(buf)
            }
        }
    };
}

macro_rules! int_gate {
    ($ty:ty, $variant:ident, $values:ident) => {
        impl GateValue for $ty {
            fn same_type(data: &FieldData) -> Option<(&[Self], Self)> {
                match data {
                    FieldData::$variant { values, missing } => Some((values.as_slice(), *missing)),
                    _ => None,
                }
            }

            fn encode(physical: f64, scale: f64, offset: f64) -> Self {
                let scale = if scale == 0.0 { 1.0 } else { scale };
                let packed = ((physical - offset) / scale).round();
                packed.clamp(<$ty>::MIN as f64, <$ty>::MAX as f64) as $ty
            }

            fn into_values(buf: Vec<Self>) -> Values {
                Values::$values(buf)
            }
        }
    };
}

float_gate!(f64, Fl64, Double);
float_gate!(f32, Fl32, Float);
int_gate!(i32, Si32, Int);
int_gate!(i16, Si16, Short);
int_gate!(i8, Si08, Byte);

/// Copy one ray's gates into `row`, mapping missing values to `fill`.
///
/// Same-typed data with the template's packing is copied directly; anything
/// else goes through physical values.
fn copy_gates<T: GateValue>(field: &Field, template: &Field, fill: T, row: &mut [T]) {
    let same_packing = field.scale == template.scale && field.offset == template.offset;
    if let Some((src, src_missing)) = T::same_type(&field.data).filter(|_| same_packing) {
        for (dst, val) in row.iter_mut().zip(src) {
            *dst = if *val == src_missing { fill } else { *val };
        }
        return;
    }
    for (gate, dst) in row.iter_mut().enumerate() {
        *dst = match field.physical_value(gate) {
            Some(val) => T::encode(val, template.scale, template.offset),
            None => fill,
        };
    }
}

fn gather<T: GateValue>(ctx: &WriteContext, plan: &FieldPlan, fill: T) -> Result<Values> {
    let layout = &ctx.layout;
    let ragged = layout.n_gates_vary;
    let n_range = ctx.plan.n_range;
    let total = match ctx.plan.n_points {
        Some(n_points) if ragged => n_points,
        _ => ctx.n_rays() * n_range,
    };
    let mut buf = vec![fill; total];

    for (ii, field) in ctx.vol.field_over_rays(&plan.name)?.into_iter().enumerate() {
        let Some(field) = field else {
            continue;
        };
        let (start, width) = if ragged {
            (layout.ray_start_index[ii], layout.ray_n_gates[ii])
        } else {
            (ii * n_range, n_range)
        };
        let n_gates = field.n_gates().min(width);
        copy_gates(field, plan.template, fill, &mut buf[start..start + n_gates]);
    }

    Ok(T::into_values(buf))
}

/// Gather one field into the on-disk type of its first definition.
pub fn field_values(ctx: &WriteContext, plan: &FieldPlan) -> Result<Values> {
    match &plan.template.data {
        FieldData::Fl64 { missing, .. } => gather(ctx, plan, *missing),
        FieldData::Fl32 { missing, .. } => gather(ctx, plan, *missing),
        FieldData::Si32 { missing, .. } => gather(ctx, plan, *missing),
        FieldData::Si16 { missing, .. } => gather(ctx, plan, *missing),
        FieldData::Si08 { missing, .. } => gather(ctx, plan, *missing),
    }
}

/// Write every metadata variable, in order, then every field.
pub fn write_data(
    ctx: &WriteContext,
    meta_vars: Vec<MetaVar>,
    sink: &mut dyn DatasetSink,
) -> Result<()> {
    for var in meta_vars {
        sink.put_values(&var.spec.name, var.values)?;
    }
    for plan in &ctx.fields {
        let values = field_values(ctx, plan)?;
        debug!(field = %plan.name, variable = %plan.var_name, n_values = values.len(), "Writing field");
        sink.put_values(&plan.var_name, values)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WriterConfig;
    use radx_model::{Ray, Sweep, SweepMode, Volume, MISSING_FL32};

    fn ray(values: Option<Vec<f32>>, n_gates: usize) -> Ray {
        let mut ray = Ray::default();
        ray.set_range_geom(0.0, 0.25);
        if let Some(values) = values {
            ray.add_field(Field::new_fl32("DBZ", "dBZ", values));
        }
        ray.add_field(Field::new_fl32("SNR", "dB", vec![0.0; n_gates]));
        ray
    }

    fn volume(rays: Vec<Ray>) -> Volume {
        let n = rays.len();
        Volume {
            rays,
            sweeps: vec![Sweep::new(0, SweepMode::AzimuthSurveillance, 0, n - 1)],
            ..Default::default()
        }
    }

    fn dbz(ctx: &WriteContext) -> Values {
        let plan = ctx.fields.iter().find(|f| f.name == "DBZ").unwrap();
        field_values(ctx, plan).unwrap()
    }

    #[test]
    fn test_rectangular_pads_short_and_absent_rays() {
        let config = WriterConfig::default();
        let m = MISSING_FL32;
        let vol = volume(vec![
            ray(Some(vec![1.0, 2.0, 3.0]), 3),
            ray(Some(vec![4.0, m, 6.0]), 3),
            ray(None, 3),
            ray(Some(vec![7.0]), 3),
        ]);
        let ctx = WriteContext::new(&vol, &config).unwrap();
        assert!(!ctx.layout.n_gates_vary);
        assert_eq!(
            dbz(&ctx),
            Values::Float(vec![1.0, 2.0, 3.0, 4.0, m, 6.0, m, m, m, 7.0, m, m])
        );
    }

    #[test]
    fn test_ragged_uses_start_indices() {
        let config = WriterConfig::default();
        let m = MISSING_FL32;
        let vol = volume(vec![
            ray(Some(vec![1.0, 2.0]), 2),
            ray(None, 3),
            ray(Some(vec![5.0]), 1),
        ]);
        let ctx = WriteContext::new(&vol, &config).unwrap();
        assert!(ctx.layout.n_gates_vary);
        assert_eq!(ctx.layout.ray_start_index, vec![0, 2, 5]);
        assert_eq!(dbz(&ctx), Values::Float(vec![1.0, 2.0, m, m, m, 5.0]));
    }

    #[test]
    fn test_converts_to_template_type() {
        let config = WriterConfig::default();
        let mut first = Field::with_data(
            "DBZ",
            "dBZ",
            FieldData::Si16 {
                values: vec![10, -32768],
                missing: -32768,
            },
        );
        first.scale = 0.5;
        first.offset = -10.0;
        let second = Field::with_data(
            "DBZ",
            "dBZ",
            FieldData::Fl64 {
                values: vec![-5.0, -9999.0],
                missing: -9999.0,
            },
        );
        let mut rays = vec![Ray::default(), Ray::default()];
        rays[0].set_range_geom(0.0, 0.25);
        rays[1].set_range_geom(0.0, 0.25);
        rays[0].add_field(first);
        rays[1].add_field(second);

        let vol = volume(rays);
        let ctx = WriteContext::new(&vol, &config).unwrap();
        // -5.0 packs to (-5 - -10) / 0.5 = 10
        assert_eq!(dbz(&ctx), Values::Short(vec![10, -32768, 10, -32768]));
    }
}
