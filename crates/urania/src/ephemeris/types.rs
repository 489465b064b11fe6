use crate::dms::{format_degrees, FormatFlags};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HouseSystemError {
    #[error("Invalid house system code {0:?}: expected a single ASCII letter")]
    InvalidCode(char),
    #[error("Unknown house system: {system}. Valid systems: {valid:?}")]
    UnknownName { system: String, valid: Vec<String> },
}

/// House system mapping, name to engine code.
const HOUSE_SYSTEMS: &[(&str, char)] = &[
    ("placidus", 'P'),
    ("koch", 'K'),
    ("whole_sign", 'W'),
    ("equal", 'E'),
    ("regiomontanus", 'R'),
    ("campanus", 'C'),
    ("porphyry", 'O'),
    ("alcabitus", 'B'),
    ("topocentric", 'T'),
    ("morinus", 'M'),
];

/// One-letter house system code, passed to the engine unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "char", into = "char")]
pub struct HouseSystem(u8);

impl HouseSystem {
    pub const PLACIDUS: Self = Self(b'P');
    pub const KOCH: Self = Self(b'K');
    pub const WHOLE_SIGN: Self = Self(b'W');
    pub const EQUAL: Self = Self(b'E');
    pub const REGIOMONTANUS: Self = Self(b'R');
    pub const CAMPANUS: Self = Self(b'C');
    pub const PORPHYRY: Self = Self(b'O');
    pub const ALCABITUS: Self = Self(b'B');
    pub const TOPOCENTRIC: Self = Self(b'T');
    pub const MORINUS: Self = Self(b'M');

    pub fn from_code(code: char) -> Result<Self, HouseSystemError> {
        if code.is_ascii_alphabetic() {
            Ok(Self(code as u8))
        } else {
            Err(HouseSystemError::InvalidCode(code))
        }
    }

    /// Accepts a known name (`"placidus"`) or a bare code letter (`"P"`).
    pub fn from_name(name: &str) -> Result<Self, HouseSystemError> {
        let trimmed = name.trim();
        let mut chars = trimmed.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Self::from_code(c);
        }
        let key = trimmed.to_lowercase();
        HOUSE_SYSTEMS
            .iter()
            .find(|(n, _)| *n == key)
            .map(|(_, code)| Self(*code as u8))
            .ok_or_else(|| HouseSystemError::UnknownName {
                system: name.to_string(),
                valid: HOUSE_SYSTEMS.iter().map(|(n, _)| n.to_string()).collect(),
            })
    }

    pub fn code(self) -> char {
        self.0 as char
    }

    pub fn name(self) -> Option<&'static str> {
        HOUSE_SYSTEMS
            .iter()
            .find(|(_, code)| *code as u8 == self.0)
            .map(|(n, _)| *n)
    }
}

impl Default for HouseSystem {
    fn default() -> Self {
        Self::PLACIDUS
    }
}

impl TryFrom<char> for HouseSystem {
    type Error = HouseSystemError;

    fn try_from(code: char) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl From<HouseSystem> for char {
    fn from(system: HouseSystem) -> char {
        system.code()
    }
}

impl FromStr for HouseSystem {
    type Err = HouseSystemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl fmt::Display for HouseSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Node/apsis calculation method bits. Combinations are passed through to
/// the engine as-is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeMethod(i32);

impl NodeMethod {
    pub const MEAN: Self = Self(1);
    pub const OSCULATING: Self = Self(2);
    /// Osculating elements relative to the solar system barycenter (outer planets).
    pub const OSCULATING_BARYCENTRIC: Self = Self(4);
    /// Second focal point instead of aphelion.
    pub const FOCAL_POINT: Self = Self(256);

    pub const fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> i32 {
        self.0
    }
}

impl BitOr for NodeMethod {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Position of one body as delivered to consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyPosition {
    pub index: i32,
    pub name: String,
    pub long: f64,
    pub lat: f64,
    pub distance: f64,
    pub speed: f64,
    pub long_s: String,
    #[serde(rename = "iflagret")]
    pub status: i32,
    /// Engine message when the calculation failed.
    pub error: Option<String>,
}

impl BodyPosition {
    pub fn computed(index: i32, name: String, values: &[f64; 6], status: i32) -> Self {
        Self {
            index,
            name,
            long: values[0],
            lat: values[1],
            distance: values[2],
            speed: values[3],
            long_s: format_degrees(values[0], FormatFlags::ZODIAC),
            status,
            error: None,
        }
    }

    pub fn failed(index: i32, name: String, status: i32, message: String) -> Self {
        Self {
            index,
            name,
            long: 0.0,
            lat: 0.0,
            distance: 0.0,
            speed: 0.0,
            long_s: String::new(),
            status,
            error: Some(message),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A named ecliptic angle: a house cusp, the Ascendant or the Midheaven.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AngleRecord {
    pub name: String,
    pub long: f64,
    pub long_s: String,
}

impl AngleRecord {
    pub fn new(name: impl Into<String>, long: f64) -> Self {
        Self {
            name: name.into(),
            long,
            long_s: format_degrees(long, FormatFlags::ZODIAC),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HouseCuspSet {
    pub ascendant: AngleRecord,
    pub midheaven: AngleRecord,
    /// Houses 1 through 12.
    pub cusps: Vec<AngleRecord>,
}

/// One of the four points returned per body by the node/apsis calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApsisPoint {
    pub long: f64,
    pub lat: f64,
    pub distance: f64,
    pub speed_long: f64,
    pub speed_lat: f64,
    pub speed_dist: f64,
    pub long_s: String,
}

impl From<&[f64; 6]> for ApsisPoint {
    fn from(v: &[f64; 6]) -> Self {
        Self {
            long: v[0],
            lat: v[1],
            distance: v[2],
            speed_long: v[3],
            speed_lat: v[4],
            speed_dist: v[5],
            long_s: format_degrees(v[0], FormatFlags::ZODIAC),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeApsisSet {
    pub ascending_node: ApsisPoint,
    pub descending_node: ApsisPoint,
    pub perihelion: ApsisPoint,
    pub aphelion: ApsisPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeApsisRecord {
    pub index: i32,
    pub name: String,
    pub points: Option<NodeApsisSet>,
    pub error: Option<String>,
}

impl NodeApsisRecord {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
