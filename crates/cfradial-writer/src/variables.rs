//! Metadata variables: declaration and values, group by group.
//!
//! Each group function returns the variables it contributes in declaration
//! order. Every per-ray or per-sweep variable carries exactly one value per
//! row; missing metadata is written as the missing sentinel.

use radx_model::{
    is_missing, Calibration, CorrectionFactors, FollowMode, GeorefMember, InstrumentType,
    PerChannel, PerPol, PlatformType, PolarizationMode, PrimaryAxis, PrtMode, SweepMode,
    MISSING_META_DOUBLE, MISSING_META_INT,
};

use crate::context::WriteContext;
use crate::dimensions::{STRING_LENGTH_MEDIUM, STRING_LENGTH_SHORT};
use crate::encoder::{clip_text, AttrValue, NcType, Values, VarSpec};
use crate::names::{dims, groups, units, GRID_MAPPING, GRID_MAPPING_NAME};

/// A declared metadata variable with its full contents.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaVar {
    pub spec: VarSpec,
    pub values: Values,
}

impl MetaVar {
    fn new(spec: VarSpec, values: Values) -> Self {
        Self { spec, values }
    }
}

fn float_values(vals: impl IntoIterator<Item = f64>) -> Values {
    Values::Float(vals.into_iter().map(|v| v as f32).collect())
}

/// Multiply by `factor` unless the value is missing.
fn scaled(val: f64, factor: f64) -> f64 {
    if is_missing(val) {
        MISSING_META_DOUBLE
    } else {
        val * factor
    }
}

/// Multiply by `factor` only for positive values.
fn scaled_if_positive(val: f64, factor: f64) -> f64 {
    if val > 0.0 {
        val * factor
    } else {
        val
    }
}

fn float_var(name: &str, dims: &[&str], long_name: &str, unit: &str) -> VarSpec {
    VarSpec::new(name, NcType::Float, dims)
        .long_name(long_name)
        .units(unit)
        .fill_value(MISSING_META_DOUBLE)
}

fn text_rows(name: &str, rows: impl IntoIterator<Item = String>, width: usize) -> Values {
    Values::Text(rows.into_iter().map(|r| clip_text(name, &r, width)).collect())
}

fn flag_text(val: bool) -> String {
    if val { "true" } else { "false" }.to_string()
}

// ==================== scalars ====================

/// Volume number, type strings, status blob, instrument parameters and
/// coverage times.
pub fn scalar_vars(ctx: &WriteContext) -> Vec<MetaVar> {
    let vol = ctx.vol;
    let mut out = Vec::new();

    out.push(MetaVar::new(
        VarSpec::scalar("volume_number", NcType::Int)
            .long_name("data_volume_index_number")
            .units("")
            .fill_value(MISSING_META_INT as f64),
        Values::Int(vec![vol.volume_number]),
    ));

    out.push(MetaVar::new(
        VarSpec::new("platform_type", NcType::Char, &[dims::STRING_LENGTH_32])
            .long_name("platform_type")
            .attr("options", PlatformType::options()),
        text_rows(
            "platform_type",
            [vol.platform_type.as_str().to_string()],
            STRING_LENGTH_MEDIUM,
        ),
    ));

    out.push(MetaVar::new(
        VarSpec::new("primary_axis", NcType::Char, &[dims::STRING_LENGTH_32])
            .long_name("primary_axis_of_rotation")
            .attr("options", PrimaryAxis::options()),
        text_rows(
            "primary_axis",
            [vol.primary_axis.as_str().to_string()],
            STRING_LENGTH_MEDIUM,
        ),
    ));

    out.push(MetaVar::new(
        VarSpec::new("status_xml", NcType::Char, &[dims::STATUS_XML_LENGTH])
            .long_name("status_of_instrument"),
        text_rows("status_xml", [vol.status_xml.clone()], ctx.plan.status_xml_len),
    ));

    out.push(MetaVar::new(
        VarSpec::new("instrument_type", NcType::Char, &[dims::STRING_LENGTH_32])
            .long_name("type_of_instrument")
            .attr("options", InstrumentType::options())
            .meta_group(groups::INSTRUMENT_PARAMETERS),
        text_rows(
            "instrument_type",
            [vol.instrument_type.as_str().to_string()],
            STRING_LENGTH_MEDIUM,
        ),
    ));

    match vol.instrument_type {
        InstrumentType::Radar => out.extend(radar_parameter_vars(ctx)),
        InstrumentType::Lidar => out.extend(lidar_parameter_vars(ctx)),
    }

    for (name, long_name, time) in [
        ("time_coverage_start", "data_volume_start_time_utc", &vol.start_time),
        ("time_coverage_end", "data_volume_end_time_utc", &vol.end_time),
    ] {
        out.push(MetaVar::new(
            VarSpec::new(name, NcType::Char, &[dims::STRING_LENGTH_32])
                .long_name(long_name)
                .attr("comment", "ray times are relative to start time in secs"),
            text_rows(name, [time.w3c()], STRING_LENGTH_MEDIUM),
        ));
    }

    out
}

fn radar_parameter_vars(ctx: &WriteContext) -> Vec<MetaVar> {
    let radar = &ctx.vol.radar;
    let entries = [
        (
            "radar_antenna_gain_h",
            "nominal_radar_antenna_gain_h_channel",
            units::DB,
            radar.antenna_gain_db_h,
        ),
        (
            "radar_antenna_gain_v",
            "nominal_radar_antenna_gain_v_channel",
            units::DB,
            radar.antenna_gain_db_v,
        ),
        (
            "radar_beam_width_h",
            "half_power_radar_beam_width_h_channel",
            units::DEGREES,
            radar.beam_width_deg_h,
        ),
        (
            "radar_beam_width_v",
            "half_power_radar_beam_width_v_channel",
            units::DEGREES,
            radar.beam_width_deg_v,
        ),
        (
            "radar_rx_bandwidth",
            "radar_receiver_bandwidth",
            units::HZ,
            scaled_if_positive(radar.receiver_bandwidth_mhz, 1.0e6),
        ),
    ];

    entries
        .into_iter()
        .map(|(name, long_name, unit, val)| {
            MetaVar::new(
                float_var(name, &[], long_name, unit).meta_group(groups::RADAR_PARAMETERS),
                float_values([val]),
            )
        })
        .collect()
}

fn lidar_parameter_vars(ctx: &WriteContext) -> Vec<MetaVar> {
    let lidar = &ctx.vol.lidar;
    let entries = [
        ("lidar_constant", "lidar_calibration_constant", units::DB, lidar.constant),
        ("lidar_pulse_energy", "lidar_pulse_energy", "joules", lidar.pulse_energy_j),
        ("lidar_peak_power", "lidar_peak_power", "watts", lidar.peak_power_w),
        (
            "lidar_aperture_diameter",
            "lidar_aperture_diameter",
            "cm",
            lidar.aperture_diam_cm,
        ),
        (
            "lidar_aperture_efficiency",
            "lidar_aperture_efficiency",
            "percent",
            lidar.aperture_efficiency,
        ),
        (
            "lidar_field_of_view",
            "lidar_field_of_view",
            "mrad",
            lidar.field_of_view_mrad,
        ),
        (
            "lidar_beam_divergence",
            "lidar_beam_divergence",
            "mrad",
            lidar.beam_divergence_mrad,
        ),
    ];

    entries
        .into_iter()
        .map(|(name, long_name, unit, val)| {
            MetaVar::new(
                float_var(name, &[], long_name, unit).meta_group(groups::LIDAR_PARAMETERS),
                float_values([val]),
            )
        })
        .collect()
}

// ==================== frequency, corrections, projection ====================

pub fn frequency_vars(ctx: &WriteContext) -> Vec<MetaVar> {
    if ctx.plan.n_frequencies.is_none() {
        return Vec::new();
    }
    vec![MetaVar::new(
        float_var("frequency", &[dims::FREQUENCY], "transmission_frequency", units::HZ)
            .meta_group(groups::INSTRUMENT_PARAMETERS),
        float_values(ctx.vol.frequency_hz.iter().copied()),
    )]
}

type CorrectionGetter = fn(&CorrectionFactors) -> f64;

/// The sixteen geometry corrections, in file order.
#[rustfmt::skip]
const CORRECTIONS: [(&str, &str, &str, CorrectionGetter); 16] = [
    ("azimuth_correction", "azimuth_angle_correction", units::DEGREES, |c| c.azimuth),
    ("elevation_correction", "elevation_angle_correction", units::DEGREES, |c| c.elevation),
    ("range_correction", "range_to_center_of_measurement_volume_correction", units::METERS, |c| c.range),
    ("longitude_correction", "longitude_correction", units::DEGREES, |c| c.longitude),
    ("latitude_correction", "latitude_correction", units::DEGREES, |c| c.latitude),
    ("pressure_altitude_correction", "pressure_altitude_correction", units::METERS, |c| c.pressure_altitude),
    ("altitude_correction", "altitude_correction", units::METERS, |c| c.altitude),
    ("eastward_velocity_correction", "platform_eastward_velocity_correction", units::METERS_PER_SECOND, |c| c.eastward_velocity),
    ("northward_velocity_correction", "platform_northward_velocity_correction", units::METERS_PER_SECOND, |c| c.northward_velocity),
    ("vertical_velocity_correction", "platform_vertical_velocity_correction", units::METERS_PER_SECOND, |c| c.vertical_velocity),
    ("heading_correction", "platform_heading_angle_correction", units::DEGREES, |c| c.heading),
    ("roll_correction", "platform_roll_angle_correction", units::DEGREES, |c| c.roll),
    ("pitch_correction", "platform_pitch_angle_correction", units::DEGREES, |c| c.pitch),
    ("drift_correction", "platform_drift_angle_correction", units::DEGREES, |c| c.drift),
    ("rotation_correction", "ray_rotation_angle_relative_to_platform_correction", units::DEGREES, |c| c.rotation),
    ("tilt_correction", "ray_tilt_angle_relative_to_platform_correction", units::DEGREES, |c| c.tilt),
];

pub fn correction_vars(ctx: &WriteContext) -> Vec<MetaVar> {
    let Some(factors) = ctx.vol.correction_factors.as_ref() else {
        return Vec::new();
    };
    CORRECTIONS
        .iter()
        .map(|(name, long_name, unit, get)| {
            MetaVar::new(
                float_var(name, &[], long_name, unit).meta_group(groups::GEOMETRY_CORRECTION),
                float_values([get(factors)]),
            )
        })
        .collect()
}

/// Grid mapping marker, plus scalar location when there are no per-ray
/// georeferences.
pub fn projection_vars(ctx: &WriteContext) -> Vec<MetaVar> {
    let vol = ctx.vol;
    let mut out = Vec::new();

    let mut grid_mapping =
        VarSpec::scalar(GRID_MAPPING, NcType::Int).attr("grid_mapping_name", GRID_MAPPING_NAME);
    if vol.platform_type.is_fixed() {
        grid_mapping = grid_mapping
            .attr("longitude_of_projection_origin", vol.longitude_deg)
            .attr("latitude_of_projection_origin", vol.latitude_deg)
            .attr(
                "altitude_of_projection_origin",
                scaled(vol.altitude_km, 1000.0),
            )
            .attr("false_northing", 0.0f64)
            .attr("false_easting", 0.0f64);
    }
    out.push(MetaVar::new(grid_mapping, Values::Int(vec![0])));

    if ctx.presence.georefs_active {
        return out;
    }

    out.push(MetaVar::new(
        location_var("latitude", "latitude", units::DEGREES_NORTH, &[]),
        Values::Double(vec![vol.latitude_deg]),
    ));
    out.push(MetaVar::new(
        location_var("longitude", "longitude", units::DEGREES_EAST, &[]),
        Values::Double(vec![vol.longitude_deg]),
    ));
    out.push(MetaVar::new(
        location_var("altitude", "altitude", units::METERS, &[]).attr("positive", "up"),
        Values::Double(vec![scaled(vol.altitude_km, 1000.0)]),
    ));
    out.push(MetaVar::new(
        location_var("altitude_agl", "altitude_above_ground_level", units::METERS, &[]),
        Values::Double(vec![vol.sensor_ht_agl_m]),
    ));
    out
}

fn location_var(name: &str, long_name: &str, unit: &str, dims: &[&str]) -> VarSpec {
    let spec = VarSpec::new(name, NcType::Double, dims)
        .long_name(long_name)
        .units(unit)
        .fill_value(MISSING_META_DOUBLE);
    match name {
        "latitude" | "longitude" | "altitude" => spec.attr("standard_name", name),
        _ => spec,
    }
}

// ==================== sweeps ====================

pub fn sweep_vars(ctx: &WriteContext) -> Vec<MetaVar> {
    let sweeps = &ctx.vol.sweeps;
    let sweep_dim = [dims::SWEEP];
    let text_dims = [dims::SWEEP, dims::STRING_LENGTH_32];
    let mut out = Vec::new();

    out.push(MetaVar::new(
        VarSpec::new("sweep_number", NcType::Int, &sweep_dim)
            .long_name("sweep_index_number_0_based")
            .units("")
            .fill_value(MISSING_META_INT as f64),
        Values::Int(sweeps.iter().map(|s| s.sweep_number).collect()),
    ));

    out.push(MetaVar::new(
        VarSpec::new("sweep_mode", NcType::Char, &text_dims)
            .long_name("scan_mode_for_sweep")
            .attr("options", SweepMode::options()),
        text_rows(
            "sweep_mode",
            sweeps.iter().map(|s| s.sweep_mode.as_str().to_string()),
            STRING_LENGTH_MEDIUM,
        ),
    ));
    out.push(MetaVar::new(
        VarSpec::new("polarization_mode", NcType::Char, &text_dims)
            .long_name("polarization_mode_for_sweep")
            .attr("options", PolarizationMode::options())
            .meta_group(groups::RADAR_PARAMETERS),
        text_rows(
            "polarization_mode",
            sweeps.iter().map(|s| s.polarization_mode.as_str().to_string()),
            STRING_LENGTH_MEDIUM,
        ),
    ));
    out.push(MetaVar::new(
        VarSpec::new("prt_mode", NcType::Char, &text_dims)
            .long_name("transmit_pulse_mode")
            .attr("options", PrtMode::options())
            .meta_group(groups::RADAR_PARAMETERS),
        text_rows(
            "prt_mode",
            sweeps.iter().map(|s| s.prt_mode.as_str().to_string()),
            STRING_LENGTH_MEDIUM,
        ),
    ));
    out.push(MetaVar::new(
        VarSpec::new("follow_mode", NcType::Char, &text_dims)
            .long_name("follow_mode_for_scan_strategy")
            .attr("options", FollowMode::options())
            .meta_group(groups::INSTRUMENT_PARAMETERS),
        text_rows(
            "follow_mode",
            sweeps.iter().map(|s| s.follow_mode.as_str().to_string()),
            STRING_LENGTH_MEDIUM,
        ),
    ));

    out.push(MetaVar::new(
        float_var("fixed_angle", &sweep_dim, "ray_target_fixed_angle", units::DEGREES),
        float_values(sweeps.iter().map(|s| s.fixed_angle_deg)),
    ));
    out.push(MetaVar::new(
        float_var(
            "target_scan_rate",
            &sweep_dim,
            "target_scan_rate_for_sweep",
            units::DEGREES_PER_SECOND,
        ),
        float_values(sweeps.iter().map(|s| s.target_scan_rate_dps)),
    ));

    out.push(MetaVar::new(
        VarSpec::new("sweep_start_ray_index", NcType::Int, &sweep_dim)
            .long_name("index_of_first_ray_in_sweep")
            .units("")
            .fill_value(MISSING_META_INT as f64),
        Values::Int(sweeps.iter().map(|s| s.start_ray_index as i32).collect()),
    ));
    out.push(MetaVar::new(
        VarSpec::new("sweep_end_ray_index", NcType::Int, &sweep_dim)
            .long_name("index_of_last_ray_in_sweep")
            .units("")
            .fill_value(MISSING_META_INT as f64),
        Values::Int(sweeps.iter().map(|s| s.end_ray_index as i32).collect()),
    ));

    out.push(MetaVar::new(
        VarSpec::new(
            "rays_are_indexed",
            NcType::Char,
            &[dims::SWEEP, dims::STRING_LENGTH_8],
        )
        .long_name("flag_for_indexed_rays"),
        text_rows(
            "rays_are_indexed",
            sweeps.iter().map(|s| flag_text(s.rays_are_indexed)),
            STRING_LENGTH_SHORT,
        ),
    ));
    out.push(MetaVar::new(
        float_var(
            "ray_angle_res",
            &sweep_dim,
            "angular_resolution_between_rays",
            units::DEGREES,
        ),
        float_values(sweeps.iter().map(|s| s.angle_res_deg)),
    ));

    if sweeps.iter().any(|s| !is_missing(s.intermed_freq_hz)) {
        out.push(MetaVar::new(
            float_var(
                "intermed_freq_hz",
                &sweep_dim,
                "intermediate_freqency_hz",
                units::HZ,
            ),
            float_values(sweeps.iter().map(|s| s.intermed_freq_hz)),
        ));
    }

    out
}

// ==================== calibrations ====================

struct CalibColumn {
    name: String,
    long_name: String,
    unit: &'static str,
    values: Vec<f64>,
}

fn calib_column(
    calibs: &[Calibration],
    name: &str,
    long_name: &str,
    unit: &'static str,
    get: impl Fn(&Calibration) -> f64,
) -> CalibColumn {
    CalibColumn {
        name: format!("r_calib_{}", name),
        long_name: format!("calibration_{}", long_name),
        unit,
        values: calibs.iter().map(get).collect(),
    }
}

fn calib_pol_columns(
    calibs: &[Calibration],
    name: &str,
    long_name: &str,
    unit: &'static str,
    get: impl Fn(&Calibration) -> PerPol,
) -> [CalibColumn; 2] {
    [
        calib_column(
            calibs,
            &format!("{}_h", name),
            &format!("{}_h_channel", long_name),
            unit,
            |c| get(c).h,
        ),
        calib_column(
            calibs,
            &format!("{}_v", name),
            &format!("{}_v_channel", long_name),
            unit,
            |c| get(c).v,
        ),
    ]
}

fn calib_channel_columns(
    calibs: &[Calibration],
    name: &str,
    long_name: &str,
    unit: &'static str,
    get: impl Fn(&Calibration) -> PerChannel,
) -> [CalibColumn; 4] {
    let column = |suffix: &str, pick: fn(&PerChannel) -> f64| {
        calib_column(
            calibs,
            &format!("{}_{}", name, suffix),
            &format!("{}_{}_channel", long_name, suffix),
            unit,
            |c| pick(&get(c)),
        )
    };
    [
        column("hc", |p| p.hc),
        column("vc", |p| p.vc),
        column("hx", |p| p.hx),
        column("vx", |p| p.vx),
    ]
}

pub fn calib_vars(ctx: &WriteContext) -> Vec<MetaVar> {
    let calibs = &ctx.vol.calibrations;
    if ctx.plan.n_calibs.is_none() {
        return Vec::new();
    }

    let mut out = vec![MetaVar::new(
        VarSpec::new(
            "r_calib_time",
            NcType::Char,
            &[dims::R_CALIB, dims::STRING_LENGTH_32],
        )
        .long_name("calibration_time_utc")
        .meta_group(groups::RADAR_CALIBRATION),
        text_rows(
            "r_calib_time",
            calibs.iter().map(|c| c.time.w3c()),
            STRING_LENGTH_MEDIUM,
        ),
    )];

    let mut columns = vec![calib_column(
        calibs,
        "pulse_width",
        "pulse_width",
        units::SECONDS,
        |c| scaled(c.pulse_width_usec, 1.0e-6),
    )];
    columns.extend(calib_pol_columns(calibs, "xmit_power", "transmit_power", units::DBM, |c| c.xmit_power_dbm));
    columns.extend(calib_pol_columns(calibs, "two_way_waveguide_loss", "two_way_waveguide_loss", units::DB, |c| c.two_way_waveguide_loss_db));
    columns.extend(calib_pol_columns(calibs, "two_way_radome_loss", "two_way_radome_loss", units::DB, |c| c.two_way_radome_loss_db));
    columns.push(calib_column(calibs, "receiver_mismatch_loss", "receiver_mismatch_loss", units::DB, |c| c.receiver_mismatch_loss_db));
    columns.push(calib_column(calibs, "k_squared_water", "k_squared_water", units::UNITLESS, |c| c.k_squared_water));
    columns.extend(calib_pol_columns(calibs, "radar_constant", "radar_constant", "m/mW", |c| c.radar_constant));
    columns.extend(calib_pol_columns(calibs, "antenna_gain", "antenna_gain", units::DB, |c| c.antenna_gain_db));
    columns.extend(calib_channel_columns(calibs, "noise", "noise", units::DBM, |c| c.noise_dbm));
    columns.extend(calib_channel_columns(calibs, "i0_dbm", "noise_at_zero_snr", units::DBM, |c| c.i0_dbm));
    columns.extend(calib_channel_columns(calibs, "receiver_gain", "receiver_gain", units::DB, |c| c.receiver_gain_db));
    columns.extend(calib_channel_columns(calibs, "receiver_slope", "receiver_slope", units::UNITLESS, |c| c.receiver_slope_db));
    columns.extend(calib_channel_columns(calibs, "dynamic_range_db", "dynamic_range", units::DB, |c| c.dynamic_range_db));
    columns.extend(calib_channel_columns(calibs, "base_dbz_1km", "reflectivity_at_1km_at_zero_snr", units::DBZ, |c| c.base_dbz_1km));
    columns.extend(calib_channel_columns(calibs, "sun_power", "sun_power", units::DBM, |c| c.sun_power_dbm));
    columns.extend(calib_pol_columns(calibs, "noise_source_power", "noise_source_power", units::DBM, |c| c.noise_source_power_dbm));
    columns.extend(calib_pol_columns(calibs, "power_measure_loss", "power_measurement_loss", units::DB, |c| c.power_measure_loss_db));
    columns.extend(calib_pol_columns(calibs, "coupler_forward_loss", "coupler_forward_loss", units::DB, |c| c.coupler_forward_loss_db));
    columns.push(calib_column(calibs, "dbz_correction", "dbz_correction", units::DB, |c| c.dbz_correction));
    columns.push(calib_column(calibs, "zdr_correction", "zdr_correction", units::DB, |c| c.zdr_correction));
    columns.extend(calib_pol_columns(calibs, "ldr_correction", "ldr_correction", units::DB, |c| c.ldr_correction_db));
    columns.push(calib_column(calibs, "system_phidp", "system_phidp", units::DEGREES, |c| c.system_phidp_deg));
    columns.extend(calib_pol_columns(calibs, "test_power", "test_power", units::DBM, |c| c.test_power_dbm));

    out.extend(columns.into_iter().map(|col| {
        MetaVar::new(
            float_var(&col.name, &[dims::R_CALIB], &col.long_name, col.unit)
                .meta_group(groups::RADAR_CALIBRATION),
            float_values(col.values),
        )
    }));
    out
}

// ==================== coordinates ====================

fn gate_range_m(start_km: f64, spacing_km: f64, gate: usize) -> f64 {
    if is_missing(start_km) || is_missing(spacing_km) {
        MISSING_META_DOUBLE
    } else {
        (start_km + gate as f64 * spacing_km) * 1000.0
    }
}

/// `time` relative to the volume start, and `range` as a 1-D axis or, when
/// ray geometry differs, one row per ray.
pub fn coordinate_vars(ctx: &WriteContext) -> Vec<MetaVar> {
    let vol = ctx.vol;
    let n_range = ctx.plan.n_range;
    let mut out = Vec::new();

    out.push(MetaVar::new(
        VarSpec::new("time", NcType::Double, &[dims::TIME])
            .attr("standard_name", "time")
            .long_name("time in seconds since volume start")
            .attr("calendar", "gregorian")
            .units(&format!("seconds since {}", vol.start_time.w3c()))
            .attr("comment", "times are relative to the volume start_time"),
        Values::Double(
            vol.rays
                .iter()
                .map(|r| r.time.secs_since(&vol.start_time))
                .collect(),
        ),
    ));

    let range_dims: &[&str] = if ctx.layout.geom_varies {
        &[dims::TIME, dims::RANGE]
    } else {
        &[dims::RANGE]
    };
    let mut range = VarSpec::new("range", NcType::Float, range_dims)
        .long_name("range_to_center_of_measurement_volume")
        .attr("standard_name", "projection_range_coordinate")
        .units(units::METERS)
        .attr("axis", "radial_range_coordinate")
        .attr("spacing_is_constant", AttrValue::flag(!ctx.layout.geom_varies));

    let values = if ctx.layout.geom_varies {
        float_values(vol.rays.iter().flat_map(|r| {
            (0..n_range).map(move |j| gate_range_m(r.start_range_km, r.gate_spacing_km, j))
        }))
    } else {
        let (start_km, spacing_km) = vol
            .rays
            .first()
            .map(|r| (r.start_range_km, r.gate_spacing_km))
            .unwrap_or((0.0, MISSING_META_DOUBLE));
        range = range
            .attr(
                "meters_to_center_of_first_gate",
                scaled(start_km, 1000.0) as f32,
            )
            .attr("meters_between_gates", scaled(spacing_km, 1000.0) as f32);
        float_values((0..n_range).map(|j| gate_range_m(start_km, spacing_km, j)))
    };
    out.push(MetaVar::new(range, values));
    out
}

// ==================== rays ====================

pub fn ray_vars(ctx: &WriteContext) -> Vec<MetaVar> {
    let vol = ctx.vol;
    let rays = &vol.rays;
    let presence = &ctx.presence;
    let time_dim = [dims::TIME];
    let mut out = Vec::new();

    if ctx.layout.n_gates_vary {
        out.push(MetaVar::new(
            VarSpec::new("ray_n_gates", NcType::Int, &time_dim)
                .long_name("number_of_gates")
                .units(""),
            Values::Int(ctx.layout.ray_n_gates.iter().map(|n| *n as i32).collect()),
        ));
        out.push(MetaVar::new(
            VarSpec::new("ray_start_index", NcType::Int, &time_dim)
                .long_name("array_index_to_start_of_ray")
                .units(""),
            Values::Int(
                ctx.layout
                    .ray_start_index
                    .iter()
                    .map(|n| *n as i32)
                    .collect(),
            ),
        ));
    }

    out.push(MetaVar::new(
        float_var("ray_start_range", &time_dim, "start_range_for_ray", units::METERS),
        float_values(rays.iter().map(|r| scaled(r.start_range_km, 1000.0))),
    ));
    out.push(MetaVar::new(
        float_var("ray_gate_spacing", &time_dim, "gate_spacing_for_ray", units::METERS),
        float_values(rays.iter().map(|r| scaled(r.gate_spacing_km, 1000.0))),
    ));
    out.push(MetaVar::new(
        float_var("azimuth", &time_dim, "ray_azimuth_angle", units::DEGREES)
            .attr("standard_name", "ray_azimuth_angle"),
        float_values(rays.iter().map(|r| r.azimuth_deg)),
    ));
    out.push(MetaVar::new(
        float_var("elevation", &time_dim, "ray_elevation_angle", units::DEGREES)
            .attr("standard_name", "ray_elevation_angle")
            .attr("positive", "up"),
        float_values(rays.iter().map(|r| r.elevation_deg)),
    ));
    out.push(MetaVar::new(
        float_var("pulse_width", &time_dim, "transmitter_pulse_width", units::SECONDS)
            .meta_group(groups::INSTRUMENT_PARAMETERS),
        float_values(rays.iter().map(|r| scaled_if_positive(r.pulse_width_usec, 1.0e-6))),
    ));
    out.push(MetaVar::new(
        float_var("prt", &time_dim, "pulse_repetition_time", units::SECONDS)
            .meta_group(groups::INSTRUMENT_PARAMETERS),
        float_values(rays.iter().map(|r| r.prt_sec)),
    ));
    out.push(MetaVar::new(
        float_var(
            "prt_ratio",
            &time_dim,
            "pulse_repetition_frequency_ratio",
            units::UNITLESS,
        )
        .meta_group(groups::INSTRUMENT_PARAMETERS),
        float_values(rays.iter().map(|r| r.prt_ratio)),
    ));
    out.push(MetaVar::new(
        float_var(
            "nyquist_velocity",
            &time_dim,
            "unambiguous_doppler_velocity",
            units::METERS_PER_SECOND,
        )
        .meta_group(groups::INSTRUMENT_PARAMETERS),
        float_values(rays.iter().map(|r| r.nyquist_mps)),
    ));
    out.push(MetaVar::new(
        float_var("unambiguous_range", &time_dim, "unambiguous_range", units::METERS)
            .meta_group(groups::INSTRUMENT_PARAMETERS),
        float_values(rays.iter().map(|r| scaled_if_positive(r.unambig_range_km, 1000.0))),
    ));

    out.push(MetaVar::new(
        VarSpec::new("antenna_transition", NcType::Byte, &time_dim)
            .long_name("antenna_is_in_transition_between_sweeps")
            .units("")
            .attr("comment", "1 if antenna is in transition, 0 otherwise"),
        Values::Byte(rays.iter().map(|r| r.antenna_transition as i8).collect()),
    ));

    if presence.georefs_active {
        let applied_volume = vol.georefs_applied || presence.georefs_applied;
        out.push(MetaVar::new(
            VarSpec::new("georefs_applied", NcType::Byte, &time_dim)
                .long_name("georefs_have_been_applied_to_ray")
                .units("")
                .attr("comment", "1 if georefs have been applied, 0 otherwise"),
            Values::Byte(
                rays.iter()
                    .map(|r| (applied_volume || r.georefs_applied) as i8)
                    .collect(),
            ),
        ));
    }

    out.push(MetaVar::new(
        VarSpec::new("n_samples", NcType::Int, &time_dim)
            .long_name("number_of_samples_used_to_compute_moments")
            .units("")
            .fill_value(MISSING_META_INT as f64),
        Values::Int(rays.iter().map(|r| r.n_samples).collect()),
    ));

    if ctx.plan.n_calibs.is_some() {
        out.push(MetaVar::new(
            VarSpec::new("r_calib_index", NcType::Int, &time_dim)
                .long_name("calibration_data_array_index_per_ray")
                .units("")
                .meta_group(groups::RADAR_CALIBRATION)
                .attr("comment", "This is the index for the calibration which applies to this ray")
                .fill_value(MISSING_META_INT as f64),
            Values::Int(
                rays.iter()
                    .map(|r| r.calib_index.map(|i| i as i32).unwrap_or(-1))
                    .collect(),
            ),
        ));
    }

    out.push(MetaVar::new(
        float_var(
            "measured_transmit_power_h",
            &time_dim,
            "measured_radar_transmit_power_h_channel",
            units::DBM,
        )
        .meta_group(groups::RADAR_PARAMETERS),
        float_values(rays.iter().map(|r| r.measured_xmit_power_dbm_h)),
    ));
    out.push(MetaVar::new(
        float_var(
            "measured_transmit_power_v",
            &time_dim,
            "measured_radar_transmit_power_v_channel",
            units::DBM,
        )
        .meta_group(groups::RADAR_PARAMETERS),
        float_values(rays.iter().map(|r| r.measured_xmit_power_dbm_v)),
    ));
    out.push(MetaVar::new(
        float_var(
            "scan_rate",
            &time_dim,
            "antenna_angle_scan_rate",
            units::DEGREES_PER_SECOND,
        )
        .meta_group(groups::INSTRUMENT_PARAMETERS),
        float_values(rays.iter().map(|r| r.true_scan_rate_dps)),
    ));

    let noise = [
        ("hc", presence.noise_hc),
        ("vc", presence.noise_vc),
        ("hx", presence.noise_hx),
        ("vx", presence.noise_vx),
    ];
    for (channel, present) in noise {
        if !present {
            continue;
        }
        let name = format!("estimated_noise_dbm_{}", channel);
        out.push(MetaVar::new(
            float_var(
                &name,
                &time_dim,
                &format!("estimated_noise_dbm_{}_channel", channel),
                units::DBM,
            )
            .meta_group(groups::RADAR_PARAMETERS),
            float_values(rays.iter().map(|r| match channel {
                "hc" => r.estimated_noise_dbm_hc,
                "vc" => r.estimated_noise_dbm_vc,
                "hx" => r.estimated_noise_dbm_hx,
                _ => r.estimated_noise_dbm_vx,
            })),
        ));
    }

    out
}

// ==================== georeferences ====================

/// Variable name, long name and units of a conditional member, and whether
/// it belongs to the platform velocity group.
fn georef_member_var(member: GeorefMember) -> (&'static str, &'static str, &'static str, bool) {
    use GeorefMember::*;
    match member {
        Heading => ("heading", "platform_heading_angle", units::DEGREES, false),
        Track => ("track", "platform_track_over_the_ground", units::DEGREES, false),
        Roll => ("roll", "platform_roll_angle", units::DEGREES, false),
        Pitch => ("pitch", "platform_pitch_angle", units::DEGREES, false),
        Drift => ("drift", "platform_drift_angle", units::DEGREES, false),
        Rotation => ("rotation", "ray_rotation_angle_relative_to_platform", units::DEGREES, false),
        Tilt => ("tilt", "ray_tilt_angle_relative_to_platform", units::DEGREES, false),
        EwVelocity => ("eastward_velocity", "platform_eastward_velocity", units::METERS_PER_SECOND, true),
        NsVelocity => ("northward_velocity", "platform_northward_velocity", units::METERS_PER_SECOND, true),
        VertVelocity => ("vertical_velocity", "platform_vertical_velocity", units::METERS_PER_SECOND, true),
        EwWind => ("eastward_wind", "eastward_wind_speed", units::METERS_PER_SECOND, true),
        NsWind => ("northward_wind", "northward_wind_speed", units::METERS_PER_SECOND, true),
        VertWind => ("vertical_wind", "upward_air_velocity", units::METERS_PER_SECOND, true),
        HeadingRate => ("heading_change_rate", "platform_heading_angle_rate_of_change", units::DEGREES_PER_SECOND, true),
        PitchRate => ("pitch_change_rate", "platform_pitch_angle_rate_of_change", units::DEGREES_PER_SECOND, true),
        RollRate => ("roll_change_rate", "platform_roll_angle_rate_of_change", units::DEGREES_PER_SECOND, true),
        DriveAngle1 => ("drive_angle_1", "antenna_drive_angle_1", units::DEGREES, false),
        DriveAngle2 => ("drive_angle_2", "antenna_drive_angle_2", units::DEGREES, false),
    }
}

/// Per-ray platform position, plus one variable per member that any ray
/// carries. Rays without a georeference get the missing sentinel.
pub fn georef_vars(ctx: &WriteContext) -> Vec<MetaVar> {
    if !ctx.presence.georefs_active {
        return Vec::new();
    }
    let vol = ctx.vol;
    let rays = &vol.rays;
    let time_dim = [dims::TIME];
    let mut out = Vec::new();

    out.push(MetaVar::new(
        VarSpec::new("georef_time", NcType::Double, &time_dim)
            .long_name("georef time in seconds since volume start")
            .units(units::SECONDS)
            .fill_value(MISSING_META_DOUBLE),
        Values::Double(
            rays.iter()
                .map(|r| match &r.georeference {
                    Some(geo) => geo.time.secs_since(&vol.start_time),
                    None => MISSING_META_DOUBLE,
                })
                .collect(),
        ),
    ));

    let position = |get: fn(&radx_model::Georeference) -> f64, factor: f64| {
        Values::Double(
            rays.iter()
                .map(|r| match &r.georeference {
                    Some(geo) => scaled(get(geo), factor),
                    None => MISSING_META_DOUBLE,
                })
                .collect(),
        )
    };
    out.push(MetaVar::new(
        location_var("latitude", "latitude", units::DEGREES_NORTH, &time_dim),
        position(|g| g.latitude_deg, 1.0),
    ));
    out.push(MetaVar::new(
        location_var("longitude", "longitude", units::DEGREES_EAST, &time_dim),
        position(|g| g.longitude_deg, 1.0),
    ));
    out.push(MetaVar::new(
        location_var("altitude", "altitude", units::METERS, &time_dim).attr("positive", "up"),
        position(|g| g.altitude_km_msl, 1000.0),
    ));
    out.push(MetaVar::new(
        location_var(
            "altitude_agl",
            "altitude_above_ground_level",
            units::METERS,
            &time_dim,
        ),
        position(|g| g.altitude_km_agl, 1000.0),
    ));

    for member in GeorefMember::ALL {
        if !ctx.presence.has_member(member) {
            continue;
        }
        let (name, long_name, unit, is_velocity) = georef_member_var(member);
        let mut spec = float_var(name, &time_dim, long_name, unit);
        if is_velocity {
            spec = spec.meta_group(groups::PLATFORM_VELOCITY);
        }
        out.push(MetaVar::new(
            spec,
            float_values(rays.iter().map(|r| {
                r.georeference
                    .as_ref()
                    .map(|geo| geo.member(member))
                    .unwrap_or(MISSING_META_DOUBLE)
            })),
        ));
    }

    out
}

/// Every metadata group, in declaration and write order.
pub fn all_meta_vars(ctx: &WriteContext) -> Vec<MetaVar> {
    let mut out = scalar_vars(ctx);
    out.extend(frequency_vars(ctx));
    if ctx.presence.corrections_active {
        out.extend(correction_vars(ctx));
    }
    out.extend(projection_vars(ctx));
    out.extend(sweep_vars(ctx));
    out.extend(calib_vars(ctx));
    out.extend(coordinate_vars(ctx));
    out.extend(ray_vars(ctx));
    out.extend(georef_vars(ctx));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WriterConfig;
    use radx_model::{Field, Georeference, Ray, Sweep, Volume, MISSING_META_FLOAT};

    fn volume(n_rays: usize) -> Volume {
        let rays = (0..n_rays)
            .map(|ii| {
                let mut ray = Ray {
                    azimuth_deg: ii as f64,
                    elevation_deg: 0.5,
                    pulse_width_usec: 1.0,
                    unambig_range_km: 150.0,
                    ..Default::default()
                };
                ray.set_range_geom(0.5, 0.25);
                ray.add_field(Field::new_fl32("DBZ", "dBZ", vec![1.0; 4]));
                ray
            })
            .collect();
        Volume {
            rays,
            sweeps: vec![Sweep::new(0, SweepMode::AzimuthSurveillance, 0, n_rays - 1)],
            ..Default::default()
        }
    }

    fn find<'v>(vars: &'v [MetaVar], name: &str) -> &'v MetaVar {
        vars.iter()
            .find(|v| v.spec.name == name)
            .unwrap_or_else(|| panic!("no variable {}", name))
    }

    #[test]
    fn test_ray_unit_conversions() {
        let config = WriterConfig::default();
        let vol = volume(2);
        let ctx = WriteContext::new(&vol, &config).unwrap();
        let vars = ray_vars(&ctx);
        assert_eq!(
            find(&vars, "pulse_width").values,
            Values::Float(vec![1.0e-6, 1.0e-6])
        );
        assert_eq!(
            find(&vars, "unambiguous_range").values,
            Values::Float(vec![150000.0, 150000.0])
        );
        assert_eq!(
            find(&vars, "ray_start_range").values,
            Values::Float(vec![500.0, 500.0])
        );
        assert!(vars.iter().all(|v| v.spec.name != "georefs_applied"));
        assert!(vars.iter().all(|v| v.spec.name != "r_calib_index"));
    }

    #[test]
    fn test_range_axis_fixed_geometry() {
        let config = WriterConfig::default();
        let vol = volume(3);
        let ctx = WriteContext::new(&vol, &config).unwrap();
        let vars = coordinate_vars(&ctx);
        let range = find(&vars, "range");
        assert_eq!(range.spec.dims, vec!["range"]);
        assert_eq!(
            range.values,
            Values::Float(vec![500.0, 750.0, 1000.0, 1250.0])
        );
        assert_eq!(
            range.spec.attribute("meters_between_gates"),
            Some(&AttrValue::Float(250.0))
        );
    }

    #[test]
    fn test_georef_members_fill_missing_rays() {
        let config = WriterConfig::default();
        let mut vol = volume(3);
        vol.rays[1].georeference = Some(Georeference {
            heading_deg: 45.0,
            altitude_km_msl: 1.5,
            ..Default::default()
        });
        let ctx = WriteContext::new(&vol, &config).unwrap();
        let vars = georef_vars(&ctx);
        assert_eq!(
            find(&vars, "heading").values,
            Values::Float(vec![MISSING_META_FLOAT, 45.0, MISSING_META_FLOAT])
        );
        assert_eq!(
            find(&vars, "altitude").values,
            Values::Double(vec![MISSING_META_DOUBLE, 1500.0, MISSING_META_DOUBLE])
        );
        assert!(vars.iter().all(|v| v.spec.name != "roll"));

        // Position moves from scalars to per-ray variables
        let projection = projection_vars(&ctx);
        assert_eq!(projection.len(), 1);
    }

    #[test]
    fn test_correction_table_order() {
        let names: Vec<&str> = CORRECTIONS.iter().map(|c| c.0).collect();
        assert_eq!(names.first(), Some(&"azimuth_correction"));
        assert_eq!(names.last(), Some(&"tilt_correction"));
        assert_eq!(names.len(), 16);
    }
}
