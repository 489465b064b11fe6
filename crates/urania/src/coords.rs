//! Geographic coordinates given as degrees/minutes/seconds plus a hemisphere
//! letter, normalized to signed decimal degrees.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinateError {
    #[error("{component} out of range: {value} (expected 0..={max})")]
    OutOfRange {
        component: &'static str,
        value: i64,
        max: i64,
    },
    #[error("Invalid hemisphere letter: {0:?} (expected one of N, S, E, W)")]
    InvalidHemisphere(char),
    #[error("Hemisphere {found} is not valid for {expected}")]
    WrongAxis { expected: Axis, found: Hemisphere },
    #[error("Malformed coordinate {0:?} (expected D:M:S followed by a hemisphere letter)")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    pub fn max_degrees(self) -> i64 {
        match self {
            Axis::Latitude => 89,
            Axis::Longitude => 179,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Latitude => f.write_str("latitude"),
            Axis::Longitude => f.write_str("longitude"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    pub fn from_letter(letter: char) -> Result<Self, CoordinateError> {
        match letter.to_ascii_uppercase() {
            'N' => Ok(Hemisphere::North),
            'S' => Ok(Hemisphere::South),
            'E' => Ok(Hemisphere::East),
            'W' => Ok(Hemisphere::West),
            _ => Err(CoordinateError::InvalidHemisphere(letter)),
        }
    }

    pub fn letter(self) -> char {
        match self {
            Hemisphere::North => 'N',
            Hemisphere::South => 'S',
            Hemisphere::East => 'E',
            Hemisphere::West => 'W',
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Hemisphere::North | Hemisphere::South => Axis::Latitude,
            Hemisphere::East | Hemisphere::West => Axis::Longitude,
        }
    }

    fn sign(self) -> f64 {
        match self {
            Hemisphere::South | Hemisphere::West => -1.0,
            Hemisphere::North | Hemisphere::East => 1.0,
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// One axis of a geographic position, e.g. 51°30'0"N.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    degrees: u32,
    minutes: u32,
    seconds: u32,
    hemisphere: Hemisphere,
}

impl GeoCoordinate {
    /// Validates every component against the hemisphere's axis.
    pub fn new(
        degrees: i64,
        minutes: i64,
        seconds: i64,
        hemisphere: Hemisphere,
    ) -> Result<Self, CoordinateError> {
        let degrees = check_range("degrees", degrees, hemisphere.axis().max_degrees())?;
        let minutes = check_range("minutes", minutes, 59)?;
        let seconds = check_range("seconds", seconds, 59)?;
        Ok(Self {
            degrees,
            minutes,
            seconds,
            hemisphere,
        })
    }

    pub fn latitude(degrees: i64, minutes: i64, seconds: i64, letter: char) -> Result<Self, CoordinateError> {
        Self::on_axis(Axis::Latitude, degrees, minutes, seconds, letter)
    }

    pub fn longitude(degrees: i64, minutes: i64, seconds: i64, letter: char) -> Result<Self, CoordinateError> {
        Self::on_axis(Axis::Longitude, degrees, minutes, seconds, letter)
    }

    fn on_axis(
        axis: Axis,
        degrees: i64,
        minutes: i64,
        seconds: i64,
        letter: char,
    ) -> Result<Self, CoordinateError> {
        let hemisphere = Hemisphere::from_letter(letter)?;
        if hemisphere.axis() != axis {
            return Err(CoordinateError::WrongAxis {
                expected: axis,
                found: hemisphere,
            });
        }
        Self::new(degrees, minutes, seconds, hemisphere)
    }

    pub fn hemisphere(&self) -> Hemisphere {
        self.hemisphere
    }

    /// Signed decimal degrees; west and south are negative.
    pub fn to_degrees(&self) -> f64 {
        let magnitude =
            self.degrees as f64 + self.minutes as f64 / 60.0 + self.seconds as f64 / 3600.0;
        magnitude * self.hemisphere.sign()
    }
}

fn check_range(component: &'static str, value: i64, max: i64) -> Result<u32, CoordinateError> {
    if (0..=max).contains(&value) {
        Ok(value as u32)
    } else {
        Err(CoordinateError::OutOfRange {
            component,
            value,
            max,
        })
    }
}

/// Accepts `D:M:S<H>`, `D:M<H>`, `D<H>` and whitespace-separated variants such
/// as `51 30 0 N`.
impl FromStr for GeoCoordinate {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let malformed = || CoordinateError::Malformed(s.to_string());
        let letter = trimmed.chars().last().ok_or_else(malformed)?;
        if !letter.is_ascii_alphabetic() {
            return Err(malformed());
        }
        let hemisphere = Hemisphere::from_letter(letter)?;
        let numbers = &trimmed[..trimmed.len() - letter.len_utf8()];

        let mut parts = [0i64; 3];
        let mut count = 0;
        for token in numbers
            .split(|c: char| c == ':' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            if count == parts.len() {
                return Err(malformed());
            }
            parts[count] = token.parse().map_err(|_| malformed())?;
            count += 1;
        }
        if count == 0 {
            return Err(malformed());
        }
        Self::new(parts[0], parts[1], parts[2], hemisphere)
    }
}

impl fmt::Display for GeoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}{}",
            self.degrees, self.minutes, self.seconds, self.hemisphere
        )
    }
}

/// Geographic location in signed decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lon: f64,
}

impl GeoLocation {
    pub fn from_coordinates(
        latitude: &GeoCoordinate,
        longitude: &GeoCoordinate,
    ) -> Result<Self, CoordinateError> {
        if latitude.hemisphere.axis() != Axis::Latitude {
            return Err(CoordinateError::WrongAxis {
                expected: Axis::Latitude,
                found: latitude.hemisphere,
            });
        }
        if longitude.hemisphere.axis() != Axis::Longitude {
            return Err(CoordinateError::WrongAxis {
                expected: Axis::Longitude,
                found: longitude.hemisphere,
            });
        }
        Ok(Self {
            lat: latitude.to_degrees(),
            lon: longitude.to_degrees(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_north_latitude() {
        let lat = GeoCoordinate::latitude(51, 30, 0, 'N').unwrap();
        assert_eq!(lat.to_degrees(), 51.5);
    }

    #[test]
    fn test_west_longitude_is_negative() {
        let lon = GeoCoordinate::longitude(0, 5, 30, 'W').unwrap();
        assert!((lon.to_degrees() + 0.091_666_666).abs() < 1e-8);
    }

    #[test]
    fn test_out_of_range_components() {
        assert!(matches!(
            GeoCoordinate::latitude(90, 0, 0, 'N'),
            Err(CoordinateError::OutOfRange { component: "degrees", .. })
        ));
        assert!(matches!(
            GeoCoordinate::longitude(10, 60, 0, 'E'),
            Err(CoordinateError::OutOfRange { component: "minutes", .. })
        ));
        assert!(matches!(
            GeoCoordinate::longitude(10, 0, -1, 'E'),
            Err(CoordinateError::OutOfRange { component: "seconds", .. })
        ));
    }

    #[test]
    fn test_wrong_axis_and_letter() {
        assert!(matches!(
            GeoCoordinate::latitude(10, 0, 0, 'E'),
            Err(CoordinateError::WrongAxis { .. })
        ));
        assert_eq!(
            GeoCoordinate::latitude(10, 0, 0, 'X'),
            Err(CoordinateError::InvalidHemisphere('X'))
        );
    }

    #[test]
    fn test_parse_variants() {
        let lon: GeoCoordinate = "0:5:30W".parse().unwrap();
        assert_eq!(lon, GeoCoordinate::longitude(0, 5, 30, 'W').unwrap());
        let lat: GeoCoordinate = "51 30 N".parse().unwrap();
        assert_eq!(lat.to_degrees(), 51.5);
        let lat: GeoCoordinate = "40n".parse().unwrap();
        assert_eq!(lat.to_degrees(), 40.0);
        assert!("51:30:0".parse::<GeoCoordinate>().is_err());
        assert!("1:2:3:4N".parse::<GeoCoordinate>().is_err());
        assert!("N".parse::<GeoCoordinate>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        let lon = GeoCoordinate::longitude(0, 5, 30, 'W').unwrap();
        assert_eq!(lon.to_string(), "0:5:30W");
        assert_eq!(lon.to_string().parse::<GeoCoordinate>().unwrap(), lon);
    }

    #[test]
    fn test_location_from_coordinates() {
        let lat = GeoCoordinate::latitude(51, 30, 0, 'N').unwrap();
        let lon = GeoCoordinate::longitude(0, 5, 30, 'W').unwrap();
        let loc = GeoLocation::from_coordinates(&lat, &lon).unwrap();
        assert_eq!(loc.lat, 51.5);
        assert!(loc.lon < 0.0);
        assert!(GeoLocation::from_coordinates(&lon, &lat).is_err());
    }
}
