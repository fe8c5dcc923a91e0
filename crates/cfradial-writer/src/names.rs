//! CF-Radial names shared by the schema builder and the marshaller.

pub const CONVENTIONS: &str = "CF-1.6";
pub const DEFAULT_VERSION: &str = "CF-Radial-1.4";
pub const DEFAULT_ORIGINAL_FORMAT: &str = "CFRADIAL";
pub const GRID_MAPPING: &str = "grid_mapping";
pub const GRID_MAPPING_NAME: &str = "radar_lidar_radial_scan";
pub const FIELD_COORDINATES: &str = "time range";

pub mod dims {
    pub const TIME: &str = "time";
    pub const RANGE: &str = "range";
    pub const N_POINTS: &str = "n_points";
    pub const SWEEP: &str = "sweep";
    pub const STRING_LENGTH_8: &str = "string_length_8";
    pub const STRING_LENGTH_32: &str = "string_length_32";
    pub const STATUS_XML_LENGTH: &str = "status_xml_length";
    pub const R_CALIB: &str = "r_calib";
    pub const FREQUENCY: &str = "frequency";
}

pub mod groups {
    pub const INSTRUMENT_PARAMETERS: &str = "instrument_parameters";
    pub const RADAR_PARAMETERS: &str = "radar_parameters";
    pub const LIDAR_PARAMETERS: &str = "lidar_parameters";
    pub const RADAR_CALIBRATION: &str = "radar_calibration";
    pub const PLATFORM_VELOCITY: &str = "platform_velocity";
    pub const GEOMETRY_CORRECTION: &str = "geometry_correction";
}

pub mod units {
    pub const DB: &str = "db";
    pub const DBM: &str = "dBm";
    pub const DBZ: &str = "dBZ";
    pub const DEGREES: &str = "degrees";
    pub const DEGREES_NORTH: &str = "degrees_north";
    pub const DEGREES_EAST: &str = "degrees_east";
    pub const DEGREES_PER_SECOND: &str = "degrees per second";
    pub const HZ: &str = "s-1";
    pub const METERS: &str = "meters";
    pub const METERS_PER_SECOND: &str = "meters per second";
    pub const SECONDS: &str = "seconds";
    pub const UNITLESS: &str = "unitless";
}

/// Make a field name safe as a variable name.
///
/// Names must start with a letter and hold only letters, digits and
/// underscores; `range` would shadow the coordinate variable.
pub fn sanitize_field_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 3);
    if !name.chars().next().map(|c| c.is_ascii_alphabetic()).unwrap_or(false) {
        out.push_str("nc_");
    }
    out.extend(name.chars().map(|c| {
        if c.is_ascii_alphanumeric() || c == '_' {
            c
        } else {
            '_'
        }
    }));
    if out == "range" {
        out.push('_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_field_name() {
        assert_eq!(sanitize_field_name("DBZ"), "DBZ");
        assert_eq!(sanitize_field_name("1hr_rate"), "nc_1hr_rate");
        assert_eq!(sanitize_field_name("refl/raw"), "refl_raw");
        assert_eq!(sanitize_field_name("range"), "range_");
        assert_eq!(sanitize_field_name("zdr corr-2"), "zdr_corr_2");
        assert_eq!(sanitize_field_name("_x"), "nc__x");
        assert_eq!(sanitize_field_name(""), "nc_");
    }
}
