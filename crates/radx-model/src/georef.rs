//! Per-ray platform position, attitude and motion.

use serde::{Deserialize, Serialize};

use crate::constants::{is_missing, missing_meta_double};
use crate::time::RadxTime;

/// Platform georeference snapshot attached to a ray.
///
/// Latitude, longitude and the two altitudes are always written when a
/// volume has georeferences. Every other member is optional and left at the
/// missing sentinel when the platform does not report it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Georeference {
    pub time: RadxTime,
    pub unit_num: i32,
    pub unit_id: i32,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km_msl: f64,
    pub altitude_km_agl: f64,
    pub ew_velocity_mps: f64,
    pub ns_velocity_mps: f64,
    pub vert_velocity_mps: f64,
    pub heading_deg: f64,
    pub track_deg: f64,
    pub roll_deg: f64,
    pub pitch_deg: f64,
    pub drift_deg: f64,
    pub rotation_deg: f64,
    pub tilt_deg: f64,
    pub ew_wind_mps: f64,
    pub ns_wind_mps: f64,
    pub vert_wind_mps: f64,
    pub heading_rate_dps: f64,
    pub pitch_rate_dps: f64,
    pub roll_rate_dps: f64,
    pub drive_angle_1_deg: f64,
    pub drive_angle_2_deg: f64,
}

impl Default for Georeference {
    fn default() -> Self {
        let m = missing_meta_double();
        Self {
            time: RadxTime::default(),
            unit_num: 0,
            unit_id: 0,
            latitude_deg: m,
            longitude_deg: m,
            altitude_km_msl: m,
            altitude_km_agl: m,
            ew_velocity_mps: m,
            ns_velocity_mps: m,
            vert_velocity_mps: m,
            heading_deg: m,
            track_deg: m,
            roll_deg: m,
            pitch_deg: m,
            drift_deg: m,
            rotation_deg: m,
            tilt_deg: m,
            ew_wind_mps: m,
            ns_wind_mps: m,
            vert_wind_mps: m,
            heading_rate_dps: m,
            pitch_rate_dps: m,
            roll_rate_dps: m,
            drive_angle_1_deg: m,
            drive_angle_2_deg: m,
        }
    }
}

/// The conditionally present georeference members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GeorefMember {
    Heading,
    Track,
    Roll,
    Pitch,
    Drift,
    Rotation,
    Tilt,
    EwVelocity,
    NsVelocity,
    VertVelocity,
    EwWind,
    NsWind,
    VertWind,
    HeadingRate,
    PitchRate,
    RollRate,
    DriveAngle1,
    DriveAngle2,
}

impl GeorefMember {
    pub const ALL: [GeorefMember; 18] = [
        GeorefMember::Heading,
        GeorefMember::Track,
        GeorefMember::Roll,
        GeorefMember::Pitch,
        GeorefMember::Drift,
        GeorefMember::Rotation,
        GeorefMember::Tilt,
        GeorefMember::EwVelocity,
        GeorefMember::NsVelocity,
        GeorefMember::VertVelocity,
        GeorefMember::EwWind,
        GeorefMember::NsWind,
        GeorefMember::VertWind,
        GeorefMember::HeadingRate,
        GeorefMember::PitchRate,
        GeorefMember::RollRate,
        GeorefMember::DriveAngle1,
        GeorefMember::DriveAngle2,
    ];
}

impl Georeference {
    /// Value of one conditional member.
    pub fn member(&self, member: GeorefMember) -> f64 {
        match member {
            GeorefMember::Heading => self.heading_deg,
            GeorefMember::Track => self.track_deg,
            GeorefMember::Roll => self.roll_deg,
            GeorefMember::Pitch => self.pitch_deg,
            GeorefMember::Drift => self.drift_deg,
            GeorefMember::Rotation => self.rotation_deg,
            GeorefMember::Tilt => self.tilt_deg,
            GeorefMember::EwVelocity => self.ew_velocity_mps,
            GeorefMember::NsVelocity => self.ns_velocity_mps,
            GeorefMember::VertVelocity => self.vert_velocity_mps,
            GeorefMember::EwWind => self.ew_wind_mps,
            GeorefMember::NsWind => self.ns_wind_mps,
            GeorefMember::VertWind => self.vert_wind_mps,
            GeorefMember::HeadingRate => self.heading_rate_dps,
            GeorefMember::PitchRate => self.pitch_rate_dps,
            GeorefMember::RollRate => self.roll_rate_dps,
            GeorefMember::DriveAngle1 => self.drive_angle_1_deg,
            GeorefMember::DriveAngle2 => self.drive_angle_2_deg,
        }
    }

    /// True when the member carries a real value.
    pub fn has_member(&self, member: GeorefMember) -> bool {
        !is_missing(self.member(member))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_all_missing() {
        let geo = Georeference::default();
        for member in GeorefMember::ALL {
            assert!(!geo.has_member(member), "{:?} should be missing", member);
        }
    }

    #[test]
    fn test_partial_document_keeps_missing_defaults() {
        let geo: Georeference =
            serde_json::from_str(r#"{"latitude_deg": 40.0, "heading_deg": 270.5}"#).unwrap();
        assert_eq!(geo.latitude_deg, 40.0);
        assert!(geo.has_member(GeorefMember::Heading));
        assert!(!geo.has_member(GeorefMember::Roll));
    }
}
