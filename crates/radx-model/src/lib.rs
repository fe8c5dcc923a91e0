//! In-memory radar and lidar volume model.
//!
//! A [`Volume`] owns its sweeps, rays, calibrations and correction factors.
//! Rays are stored flat; each [`Sweep`] records the inclusive ray index range
//! it covers. Writers borrow a volume read-only.

pub mod calib;
pub mod constants;
pub mod enums;
pub mod error;
pub mod field;
pub mod georef;
pub mod ray;
pub mod sweep;
pub mod time;
pub mod volume;

pub use calib::{Calibration, CorrectionFactors, PerChannel, PerPol};
pub use constants::{
    is_missing, MISSING_FL32, MISSING_FL64, MISSING_META_DOUBLE, MISSING_META_FLOAT,
    MISSING_META_INT, MISSING_SI08, MISSING_SI16, MISSING_SI32,
};
pub use enums::{
    FollowMode, InstrumentType, PlatformType, PolarizationMode, PrimaryAxis, PrtMode, SweepMode,
};
pub use error::{ModelError, ModelResult};
pub use field::{DataType, Field, FieldData};
pub use georef::{GeorefMember, Georeference};
pub use ray::Ray;
pub use sweep::Sweep;
pub use time::{RadxTime, TimeParseError};
pub use volume::{LidarParams, RadarParams, UserAttrType, UserAttribute, Volume};
