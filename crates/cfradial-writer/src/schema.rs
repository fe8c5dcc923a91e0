//! Schema builder: dimensions, global attributes and variable declarations.
//!
//! The whole schema is assembled in memory before any file is opened, so
//! malformed user attributes fail without touching disk. Declaration order:
//! dimensions, globals, metadata groups, then one variable per field.

use chrono::Utc;
use radx_model::{
    is_missing, DataType, InstrumentType, RadxTime, UserAttrType, UserAttribute,
};
use tracing::debug;

use crate::context::{FieldPlan, WriteContext};
use crate::encoder::{AttrValue, NcType, VarSpec};
use crate::error::{Result, WriterError};
use crate::names::{
    groups, CONVENTIONS, DEFAULT_ORIGINAL_FORMAT, DEFAULT_VERSION, FIELD_COORDINATES,
    GRID_MAPPING,
};
use crate::sink::DatasetSink;
use crate::variables::{all_meta_vars, MetaVar};

/// Everything to declare, plus the metadata values written afterwards.
#[derive(Debug, Clone)]
pub struct Schema {
    pub dimensions: Vec<(&'static str, usize)>,
    pub global_attributes: Vec<(String, AttrValue)>,
    pub meta_vars: Vec<MetaVar>,
    pub field_vars: Vec<VarSpec>,
}

impl Schema {
    pub fn build(ctx: &WriteContext, writer_name: &str) -> Result<Self> {
        Ok(Self {
            dimensions: ctx.plan.dimensions(),
            global_attributes: global_attributes(ctx, writer_name)?,
            meta_vars: all_meta_vars(ctx),
            field_vars: ctx.fields.iter().map(|f| field_var(ctx, f)).collect(),
        })
    }

    /// Declare the full schema on a sink. No data is written.
    pub fn declare(&self, sink: &mut dyn DatasetSink) -> Result<()> {
        for (name, len) in &self.dimensions {
            sink.add_dimension(name, *len)?;
        }
        for (name, value) in &self.global_attributes {
            sink.add_global_attribute(name, value.clone())?;
        }
        for var in &self.meta_vars {
            sink.declare_variable(&var.spec)?;
        }
        for spec in &self.field_vars {
            sink.declare_variable(spec)?;
        }
        debug!(
            n_dims = self.dimensions.len(),
            n_globals = self.global_attributes.len(),
            n_vars = self.meta_vars.len() + self.field_vars.len(),
            "Declared schema"
        );
        Ok(())
    }
}

/// The space separated sub-convention list, one token per group present.
pub fn sub_conventions(ctx: &WriteContext) -> String {
    let vol = ctx.vol;
    let mut tokens = vec![groups::INSTRUMENT_PARAMETERS];
    match vol.instrument_type {
        InstrumentType::Radar => {
            tokens.push(groups::RADAR_PARAMETERS);
            if !vol.calibrations.is_empty() {
                tokens.push(groups::RADAR_CALIBRATION);
            }
        }
        InstrumentType::Lidar => tokens.push(groups::LIDAR_PARAMETERS),
    }
    if !vol.platform_type.is_fixed() {
        tokens.push(groups::PLATFORM_VELOCITY);
    }
    if ctx.presence.corrections_active {
        tokens.push(groups::GEOMETRY_CORRECTION);
    }
    format!("CF-Radial {}", tokens.join(" "))
}

fn or_default<'s>(val: &'s str, default: &'s str) -> &'s str {
    if val.is_empty() {
        default
    } else {
        val
    }
}

fn global_attributes(ctx: &WriteContext, writer_name: &str) -> Result<Vec<(String, AttrValue)>> {
    let vol = ctx.vol;
    let mut attrs: Vec<(String, AttrValue)> = Vec::new();
    let mut add = |name: &str, value: AttrValue| attrs.push((name.to_string(), value));

    add("Conventions", CONVENTIONS.into());
    add("Sub_conventions", sub_conventions(ctx).into());
    add("version", or_default(&vol.version, DEFAULT_VERSION).into());
    add("title", vol.title.as_str().into());
    add("institution", vol.institution.as_str().into());
    add("references", vol.references.as_str().into());
    add("source", vol.source.as_str().into());
    add(
        "history",
        format!("Written by {}. {}", writer_name, vol.history).into(),
    );
    add("comment", vol.comment.as_str().into());
    if !vol.author.is_empty() {
        add("author", vol.author.as_str().into());
    }

    let original_format = or_default(&vol.original_format, DEFAULT_ORIGINAL_FORMAT);
    if original_format.contains("AR2") {
        add("format", original_format.into());
        add("original_format", "NEXRAD".into());
    } else {
        add("original_format", original_format.into());
    }
    add("driver", vol.driver.as_str().into());
    let created = if vol.created.is_empty() {
        RadxTime::from_datetime(&Utc::now()).w3c()
    } else {
        vol.created.clone()
    };
    add("created", created.into());

    add("start_datetime", vol.start_time.w3c().into());
    add("time_coverage_start", vol.start_time.w3c().into());
    add("start_time", vol.start_time.dashed_millis().into());
    add("end_datetime", vol.end_time.w3c().into());
    add("time_coverage_end", vol.end_time.w3c().into());
    add("end_time", vol.end_time.dashed_millis().into());

    add("instrument_name", vol.instrument_name.as_str().into());
    add("site_name", vol.site_name.as_str().into());
    add("scan_name", vol.scan_name.as_str().into());
    add("scan_id", vol.scan_id.into());

    add("platform_is_mobile", AttrValue::flag(!vol.platform_type.is_fixed()));
    add("n_gates_vary", AttrValue::flag(ctx.layout.n_gates_vary));
    add("ray_times_increase", AttrValue::flag(vol.check_ray_times_increase()));

    for user in &vol.user_attributes {
        add(&user.name, user_attribute_value(user)?);
    }
    Ok(attrs)
}

fn parse_list<T: std::str::FromStr>(attr: &UserAttribute) -> Result<Vec<T>> {
    let items: Vec<&str> = attr
        .value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|tok| !tok.is_empty())
        .collect();
    if items.is_empty() {
        return Err(WriterError::invalid_attribute(
            &attr.name,
            format!("empty list: '{}'", attr.value),
        ));
    }
    items
        .into_iter()
        .map(|tok| {
            tok.parse::<T>().map_err(|_| {
                WriterError::invalid_attribute(
                    &attr.name,
                    format!("cannot parse '{}' in '{}'", tok, attr.value),
                )
            })
        })
        .collect()
}

/// Convert a user attribute string to its declared type.
pub fn user_attribute_value(attr: &UserAttribute) -> Result<AttrValue> {
    let parse_err = || {
        WriterError::invalid_attribute(
            &attr.name,
            format!("cannot parse '{}' as {:?}", attr.value, attr.attr_type),
        )
    };
    Ok(match attr.attr_type {
        UserAttrType::String => AttrValue::Str(attr.value.clone()),
        UserAttrType::Int => AttrValue::Int(attr.value.trim().parse().map_err(|_| parse_err())?),
        UserAttrType::Double => {
            AttrValue::Double(attr.value.trim().parse().map_err(|_| parse_err())?)
        }
        UserAttrType::IntArray => AttrValue::Ints(parse_list(attr)?),
        UserAttrType::DoubleArray => AttrValue::Doubles(parse_list(attr)?),
    })
}

fn nc_type_for(data_type: DataType) -> NcType {
    match data_type {
        DataType::Fl64 => NcType::Double,
        DataType::Fl32 => NcType::Float,
        DataType::Si32 => NcType::Int,
        DataType::Si16 => NcType::Short,
        DataType::Si08 => NcType::Byte,
    }
}

/// Declaration of one field variable from its first definition.
fn field_var(ctx: &WriteContext, field: &FieldPlan) -> VarSpec {
    let template = field.template;
    let data_type = template.data_type();

    let mut spec = VarSpec::new(&field.var_name, nc_type_for(data_type), ctx.field_dims())
        .attr_if_set("long_name", &template.long_name)
        .attr_if_set("standard_name", &template.standard_name)
        .units(&template.units)
        .attr_if_set("legend_xml", &template.legend_xml)
        .attr_if_set("thresholding_xml", &template.thresholding_xml);

    if !is_missing(template.sampling_ratio) {
        spec = spec.attr("sampling_ratio", template.sampling_ratio as f32);
    }
    if template.folds {
        spec = spec
            .attr("field_folds", "true")
            .attr("fold_limit_lower", template.fold_limit_lower as f32)
            .attr("fold_limit_upper", template.fold_limit_upper as f32);
    }
    if template.is_discrete {
        spec = spec.attr("is_discrete", "true");
    }

    spec = spec.fill_value(template.data.missing_f64());
    if data_type.is_integer() {
        spec = spec
            .attr("scale_factor", template.scale as f32)
            .attr("add_offset", template.offset as f32);
    }

    spec.attr("grid_mapping", GRID_MAPPING)
        .attr("coordinates", FIELD_COORDINATES)
        .compress(ctx.config.deflate_level())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WriterConfig;
    use radx_model::{
        Calibration, CorrectionFactors, Field, FieldData, PlatformType, Ray, Sweep, SweepMode,
        Volume,
    };

    fn volume() -> Volume {
        let mut ray = Ray::default();
        ray.set_range_geom(0.0, 0.25);
        ray.add_field(Field::new_fl32("DBZ", "dBZ", vec![1.0; 4]));
        let mut vel = Field::with_data(
            "VEL",
            "m/s",
            FieldData::Si16 {
                values: vec![1, 2, 3, 4],
                missing: -32768,
            },
        );
        vel.scale = 0.01;
        vel.folds = true;
        vel.fold_limit_lower = -25.0;
        vel.fold_limit_upper = 25.0;
        ray.add_field(vel);
        Volume {
            rays: vec![ray.clone(), ray],
            sweeps: vec![Sweep::new(0, SweepMode::AzimuthSurveillance, 0, 1)],
            ..Default::default()
        }
    }

    fn user(attr_type: UserAttrType, value: &str) -> UserAttribute {
        UserAttribute {
            name: "extra".to_string(),
            attr_type,
            value: value.to_string(),
        }
    }

    #[test]
    fn test_sub_conventions_tokens() {
        let config = WriterConfig::default();
        let mut vol = volume();
        {
            let ctx = WriteContext::new(&vol, &config).unwrap();
            assert_eq!(
                sub_conventions(&ctx),
                "CF-Radial instrument_parameters radar_parameters"
            );
        }

        vol.calibrations.push(Calibration::default());
        vol.platform_type = PlatformType::Aircraft;
        vol.correction_factors = Some(CorrectionFactors::default());
        let ctx = WriteContext::new(&vol, &config).unwrap();
        assert_eq!(
            sub_conventions(&ctx),
            "CF-Radial instrument_parameters radar_parameters radar_calibration \
             platform_velocity geometry_correction"
        );
    }

    #[test]
    fn test_ar2_original_format() {
        let config = WriterConfig::default();
        let mut vol = volume();
        vol.original_format = "NEXRAD-AR2".to_string();
        let ctx = WriteContext::new(&vol, &config).unwrap();
        let schema = Schema::build(&ctx, "test").unwrap();
        let get = |name: &str| {
            schema
                .global_attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
        };
        assert_eq!(get("format"), Some(AttrValue::from("NEXRAD-AR2")));
        assert_eq!(get("original_format"), Some(AttrValue::from("NEXRAD")));
        assert_eq!(get("history"), Some(AttrValue::from("Written by test. ")));
        assert!(get("author").is_none());
    }

    #[test]
    fn test_user_attribute_typing() {
        assert_eq!(
            user_attribute_value(&user(UserAttrType::Int, " 42 ")).unwrap(),
            AttrValue::Int(42)
        );
        assert_eq!(
            user_attribute_value(&user(UserAttrType::DoubleArray, "1.5, 2 3")).unwrap(),
            AttrValue::Doubles(vec![1.5, 2.0, 3.0])
        );
        assert_eq!(
            user_attribute_value(&user(UserAttrType::String, "as is ")).unwrap(),
            AttrValue::Str("as is ".to_string())
        );
        match user_attribute_value(&user(UserAttrType::IntArray, "1,x,3")) {
            Err(WriterError::InvalidAttribute { name, message }) => {
                assert_eq!(name, "extra");
                assert!(message.contains("1,x,3"));
            }
            other => panic!("expected InvalidAttribute, got {:?}", other),
        }
        assert!(user_attribute_value(&user(UserAttrType::DoubleArray, " , ")).is_err());
    }

    #[test]
    fn test_field_var_attributes() {
        let config = WriterConfig::default();
        let vol = volume();
        let ctx = WriteContext::new(&vol, &config).unwrap();
        let schema = Schema::build(&ctx, "test").unwrap();

        let dbz = &schema.field_vars[0];
        assert_eq!(dbz.nc_type, NcType::Float);
        assert_eq!(dbz.dims, vec!["time", "range"]);
        assert_eq!(dbz.attribute("_FillValue"), Some(&AttrValue::Float(-9999.0)));
        assert!(dbz.attribute("scale_factor").is_none());
        assert!(dbz.attribute("long_name").is_none());
        assert_eq!(dbz.deflate_level, Some(4));

        let vel = &schema.field_vars[1];
        assert_eq!(vel.nc_type, NcType::Short);
        assert_eq!(vel.attribute("_FillValue"), Some(&AttrValue::Short(-32768)));
        assert_eq!(vel.attribute("scale_factor"), Some(&AttrValue::Float(0.01)));
        assert_eq!(vel.attribute("field_folds").and_then(|a| a.as_str()), Some("true"));
        assert_eq!(vel.attribute("fold_limit_upper"), Some(&AttrValue::Float(25.0)));
        assert_eq!(
            vel.attribute("coordinates").and_then(|a| a.as_str()),
            Some("time range")
        );
    }
}
