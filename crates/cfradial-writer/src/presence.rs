//! Volume-wide detection of optional metadata groups.

use std::collections::BTreeSet;

use radx_model::{is_missing, GeorefMember, Volume};

/// Rays whose angles differ from the georeference rotation/tilt by more
/// than this (degrees) are taken to have georefs applied.
pub const GEOREF_APPLIED_TOLERANCE_DEG: f64 = 0.001;

/// Which optional groups appear anywhere in a volume.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presence {
    pub georefs_active: bool,
    pub georefs_applied: bool,
    pub corrections_active: bool,
    /// Conditional georeference members with at least one real value.
    pub georef_members: BTreeSet<GeorefMember>,
    pub noise_hc: bool,
    pub noise_vc: bool,
    pub noise_hx: bool,
    pub noise_vx: bool,
}

impl Presence {
    /// Scan every ray once. Pure function of the volume.
    pub fn detect(vol: &Volume) -> Self {
        let mut presence = Presence {
            corrections_active: vol.correction_factors.is_some(),
            ..Default::default()
        };

        for ray in &vol.rays {
            presence.noise_hc |= !is_missing(ray.estimated_noise_dbm_hc);
            presence.noise_vc |= !is_missing(ray.estimated_noise_dbm_vc);
            presence.noise_hx |= !is_missing(ray.estimated_noise_dbm_hx);
            presence.noise_vx |= !is_missing(ray.estimated_noise_dbm_vx);

            let Some(geo) = &ray.georeference else {
                continue;
            };
            presence.georefs_active = true;

            for member in GeorefMember::ALL {
                if geo.has_member(member) {
                    presence.georef_members.insert(member);
                }
            }

            if !is_missing(ray.elevation_deg) && !is_missing(ray.azimuth_deg) {
                let elev_diff = (ray.elevation_deg - geo.rotation_deg).abs();
                let az_diff = (ray.azimuth_deg - geo.tilt_deg).abs();
                if elev_diff > GEOREF_APPLIED_TOLERANCE_DEG || az_diff > GEOREF_APPLIED_TOLERANCE_DEG
                {
                    presence.georefs_applied = true;
                }
            }
        }

        presence
    }

    pub fn has_member(&self, member: GeorefMember) -> bool {
        self.georef_members.contains(&member)
    }

    pub fn any_noise(&self) -> bool {
        self.noise_hc || self.noise_vc || self.noise_hx || self.noise_vx
    }
}
