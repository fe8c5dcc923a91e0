//! Enumerated metadata carried by volumes and sweeps.
//!
//! Every enum maps to the lower-case token stored in CF-Radial files and
//! lists its full token set so writers can publish an `options` attribute.

use serde::{Deserialize, Serialize};

macro_rules! token_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident => $token:literal ),+ $(,)?
        }
        default = $default:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $variant ),+
        }

        impl $name {
            /// All variants, in declaration order.
            pub const ALL: &'static [$name] = &[ $( $name::$variant ),+ ];

            /// Token written to file.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $token ),+
                }
            }

            /// Parse a file token, case-insensitive.
            pub fn from_token(s: &str) -> Option<Self> {
                let lower = s.trim().to_lowercase();
                Self::ALL.iter().copied().find(|v| v.as_str() == lower)
            }

            /// Comma separated list of every token.
            pub fn options() -> String {
                Self::ALL
                    .iter()
                    .map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

token_enum! {
    /// Instrument class; selects radar or lidar parameter blocks.
    pub enum InstrumentType {
        Radar => "radar",
        Lidar => "lidar",
    }
    default = Radar;
}

token_enum! {
    /// Platform the instrument is mounted on.
    pub enum PlatformType {
        NotSet => "not_set",
        Fixed => "fixed",
        Vehicle => "vehicle",
        Ship => "ship",
        Aircraft => "aircraft",
        AircraftFore => "aircraft_fore",
        AircraftAft => "aircraft_aft",
        AircraftTail => "aircraft_tail",
        AircraftBelly => "aircraft_belly",
        AircraftRoof => "aircraft_roof",
        AircraftNose => "aircraft_nose",
        SatelliteOrbit => "satellite_orbit",
        SatelliteGeostat => "satellite_geostat",
    }
    default = Fixed;
}

impl PlatformType {
    /// Fixed platforms carry a single scalar location.
    pub fn is_fixed(&self) -> bool {
        *self == PlatformType::Fixed
    }
}

token_enum! {
    /// Primary rotation axis of the antenna.
    pub enum PrimaryAxis {
        AxisZ => "axis_z",
        AxisY => "axis_y",
        AxisX => "axis_x",
        AxisZPrime => "axis_z_prime",
        AxisYPrime => "axis_y_prime",
        AxisXPrime => "axis_x_prime",
    }
    default = AxisZ;
}

token_enum! {
    /// Scan strategy of a sweep.
    pub enum SweepMode {
        NotSet => "not_set",
        Sector => "sector",
        Coplane => "coplane",
        Rhi => "rhi",
        VerticalPointing => "vertical_pointing",
        Idle => "idle",
        AzimuthSurveillance => "azimuth_surveillance",
        ElevationSurveillance => "elevation_surveillance",
        Sunscan => "sunscan",
        Pointing => "pointing",
        Calibration => "calibration",
        ManualPpi => "manual_ppi",
        ManualRhi => "manual_rhi",
        SunscanRhi => "sunscan_rhi",
        DopplerBeamSwinging => "doppler_beam_swinging",
        ComplexTrajectory => "complex_trajectory",
        ElectronicSteering => "electronic_steering",
    }
    default = AzimuthSurveillance;
}

impl SweepMode {
    /// Short code used in file names.
    pub fn short_str(&self) -> &'static str {
        match self {
            SweepMode::NotSet => "UNKNOWN",
            SweepMode::Sector => "SEC",
            SweepMode::Coplane => "COP",
            SweepMode::Rhi => "RHI",
            SweepMode::VerticalPointing => "VERT",
            SweepMode::Idle => "IDL",
            SweepMode::AzimuthSurveillance => "SUR",
            SweepMode::ElevationSurveillance => "EL_SUR",
            SweepMode::Sunscan => "SUN",
            SweepMode::Pointing => "POINT",
            SweepMode::Calibration => "CAL",
            SweepMode::ManualPpi => "MAN_PPI",
            SweepMode::ManualRhi => "MAN_RHI",
            SweepMode::SunscanRhi => "SUN_RHI",
            SweepMode::DopplerBeamSwinging => "DBS",
            SweepMode::ComplexTrajectory => "CTRAJ",
            SweepMode::ElectronicSteering => "ESTEER",
        }
    }

    /// Modes whose fixed angle is an azimuth rather than an elevation.
    pub fn is_rhi_like(&self) -> bool {
        matches!(
            self,
            SweepMode::Rhi
                | SweepMode::ManualRhi
                | SweepMode::SunscanRhi
                | SweepMode::ElevationSurveillance
        )
    }
}

token_enum! {
    /// Transmit polarization of a sweep.
    pub enum PolarizationMode {
        NotSet => "not_set",
        Horizontal => "horizontal",
        Vertical => "vertical",
        HvAlt => "hv_alt",
        HvSim => "hv_sim",
        Circular => "circular",
    }
    default = NotSet;
}

token_enum! {
    /// Pulse repetition scheme.
    pub enum PrtMode {
        NotSet => "not_set",
        Fixed => "fixed",
        Staggered => "staggered",
        Dual => "dual",
    }
    default = NotSet;
}

token_enum! {
    /// Antenna follow mode.
    pub enum FollowMode {
        NotSet => "not_set",
        None => "none",
        Sun => "sun",
        Vehicle => "vehicle",
        Aircraft => "aircraft",
        Target => "target",
        Manual => "manual",
    }
    default = NotSet;
}
