//! The numeric seam to the external ephemeris engine.

use crate::ephemeris::types::{HouseSystem, NodeMethod};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A failed engine call: the engine's status code and message text.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message} (status {status})")]
pub struct EngineError {
    pub status: i32,
    pub message: String,
}

impl EngineError {
    pub fn new(status: i32, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Raw position result: longitude, latitude, distance and their speeds.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyCalc {
    /// Flags the engine actually used.
    pub status: i32,
    pub values: [f64; 6],
    /// Warning text the engine attached to a successful call (e.g. a fallback
    /// to a less precise ephemeris); empty when there is none.
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HouseCalc {
    pub cusps: [f64; 12],
    pub ascendant: f64,
    pub midheaven: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeApsCalc {
    pub ascending: [f64; 6],
    pub descending: [f64; 6],
    pub perihelion: [f64; 6],
    pub aphelion: [f64; 6],
}

/// Everything the binding needs from an ephemeris implementation.
///
/// Implementations may keep process-wide state (the native Swiss Ephemeris
/// does); methods take `&self` and must serialize that state internally.
pub trait EphemerisEngine {
    /// Position and speed of `body` at `jd_ut`. A negative status is an `Err`.
    fn calc_ut(&self, jd_ut: f64, body: i32, flags: i32) -> Result<BodyCalc, EngineError>;

    /// House cusps plus Ascendant and Midheaven for a signed location.
    fn houses(
        &self,
        jd_ut: f64,
        flags: i32,
        lat: f64,
        lon: f64,
        system: HouseSystem,
    ) -> Result<HouseCalc, EngineError>;

    /// Nodes and apsides of `body` at ephemeris time `jd_et`.
    fn nod_aps(
        &self,
        jd_et: f64,
        body: i32,
        flags: i32,
        method: NodeMethod,
    ) -> Result<NodeApsCalc, EngineError>;

    /// Delta T in days at `jd_ut`.
    fn delta_t(&self, jd_ut: f64, flags: i32) -> f64;

    /// Display name; may be empty or `"?"` for unnamed minor planets.
    fn body_name(&self, body: i32) -> String;

    /// Directory searched for ephemeris data files. Process-wide.
    fn set_data_path(&self, path: &Path);

    fn data_path(&self) -> Option<PathBuf>;
}
