//! Geographic coordinates

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// Fallback latitude used when no live geolocation is available (Taipei)
pub const FALLBACK_LATITUDE: f64 = 25.0330;

/// Fallback longitude used when no live geolocation is available (Taipei)
pub const FALLBACK_LONGITUDE: f64 = 121.5654;

/// A WGS84 position in floating point degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Platform fallback center used when geolocation is unavailable
    pub fn fallback() -> Self {
        Self::new(FALLBACK_LATITUDE, FALLBACK_LONGITUDE)
    }

    /// Check that both components are finite and inside their ranges
    ///
    /// Latitude must be within [-90, 90], longitude within [-180, 180].
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(Error::InvalidInput(format!(
                "coordinate is not finite: {}",
                self
            )));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(Error::InvalidInput(format!(
                "latitude {} out of range",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(Error::InvalidInput(format!(
                "longitude {} out of range",
                self.longitude
            )));
        }
        Ok(())
    }
}

impl Default for Coordinate {
    fn default() -> Self {
        Self::fallback()
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_is_taipei() {
        let c = Coordinate::fallback();
        assert_eq!(c.latitude, 25.0330);
        assert_eq!(c.longitude, 121.5654);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_validate_accepts_range_edges() {
        assert!(Coordinate::new(90.0, 180.0).validate().is_ok());
        assert!(Coordinate::new(-90.0, -180.0).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(Coordinate::new(90.5, 0.0).validate().is_err());
        assert!(Coordinate::new(0.0, -180.1).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        assert!(Coordinate::new(f64::NAN, 0.0).validate().is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).validate().is_err());
    }

    #[test]
    fn test_display_rounds_to_four_places() {
        assert_eq!(Coordinate::new(25.03301, 121.56539).to_string(), "(25.0330, 121.5654)");
    }
}
