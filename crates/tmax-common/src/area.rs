//! Geographic request area.

use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};

/// A geographic bounding box in degrees, in archive order `[north, west, south, east]`.
///
/// Serializes as a four-element array so configuration files and archive
/// requests can use it directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[f64; 4]")]
pub struct Area {
    pub north: f64,
    pub west: f64,
    pub south: f64,
    pub east: f64,
}

impl Area {
    /// Create a validated area.
    pub fn new(north: f64, west: f64, south: f64, east: f64) -> CommonResult<Self> {
        let area = Self {
            north,
            west,
            south,
            east,
        };
        area.validate()?;
        Ok(area)
    }

    /// Italy, the area the downloader was first run against.
    pub fn italy() -> Self {
        Self {
            north: 47.0,
            west: 13.0,
            south: 39.0,
            east: 20.0,
        }
    }

    fn validate(&self) -> CommonResult<()> {
        let fail = |message: &str| {
            Err(CommonError::InvalidArea {
                north: self.north,
                west: self.west,
                south: self.south,
                east: self.east,
                message: message.to_string(),
            })
        };

        if [self.north, self.west, self.south, self.east]
            .iter()
            .any(|v| !v.is_finite())
        {
            return fail("coordinates must be finite");
        }
        if !(-90.0..=90.0).contains(&self.north) || !(-90.0..=90.0).contains(&self.south) {
            return fail("latitudes must be within [-90, 90]");
        }
        if self.north <= self.south {
            return fail("north must be greater than south");
        }
        // Both -180..180 and 0..360 longitude conventions are accepted.
        if !(-180.0..=360.0).contains(&self.west) || !(-180.0..=360.0).contains(&self.east) {
            return fail("longitudes must be within [-180, 360]");
        }
        if self.west >= self.east {
            return fail("west must be less than east");
        }
        Ok(())
    }

    /// Width in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }
}

impl TryFrom<[f64; 4]> for Area {
    type Error = CommonError;

    fn try_from(v: [f64; 4]) -> CommonResult<Self> {
        Area::new(v[0], v[1], v[2], v[3])
    }
}

impl From<Area> for [f64; 4] {
    fn from(area: Area) -> Self {
        [area.north, area.west, area.south, area.east]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_array_order() {
        let area: Area = serde_yaml::from_str("[47.0, 13.0, 39.0, 20.0]").unwrap();
        assert_eq!(area, Area::italy());
        assert_eq!(<[f64; 4]>::from(area), [47.0, 13.0, 39.0, 20.0]);
        assert_eq!(area.width(), 7.0);
        assert_eq!(area.height(), 8.0);
    }

    #[test]
    fn test_area_rejects_inverted_latitudes() {
        assert!(Area::new(39.0, 13.0, 47.0, 20.0).is_err());
        assert!(serde_yaml::from_str::<Area>("[39.0, 13.0, 47.0, 20.0]").is_err());
    }

    #[test]
    fn test_area_rejects_out_of_range() {
        assert!(Area::new(95.0, 13.0, 39.0, 20.0).is_err());
        assert!(Area::new(47.0, 20.0, 39.0, 13.0).is_err());
        assert!(Area::new(47.0, f64::NAN, 39.0, 20.0).is_err());
    }

    #[test]
    fn test_area_accepts_0_360_longitudes() {
        let area = Area::new(10.0, 300.0, 0.0, 350.0).unwrap();
        assert_eq!(area.width(), 50.0);
        assert!(Area::new(10.0, 300.0, 0.0, 361.0).is_err());
    }
}
