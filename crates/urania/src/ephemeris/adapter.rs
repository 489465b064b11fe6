use crate::coords::GeoLocation;
use crate::ephemeris::bodies::{self, CALC_FLAGS, FLAG_SWIEPH};
use crate::ephemeris::engine::{EngineError, EphemerisEngine};
use crate::ephemeris::types::{
    AngleRecord, ApsisPoint, BodyPosition, HouseCuspSet, HouseSystem, NodeApsisRecord,
    NodeApsisSet, NodeMethod,
};
use std::env;
use std::path::{Path, PathBuf};

const FALLBACK_MESSAGE: &str = "Swiss Ephemeris data files unavailable; engine fell back to a less precise ephemeris";

/// Adapter construction options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EphemerisConfig {
    /// Ephemeris data directory. Applied once, when the adapter is built.
    pub data_path: Option<PathBuf>,
}

impl EphemerisConfig {
    pub fn with_data_path(path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: Some(path.into()),
        }
    }

    /// `SWISS_EPHEMERIS_PATH` if set, otherwise no explicit path.
    pub fn from_env() -> Self {
        Self {
            data_path: env::var("SWISS_EPHEMERIS_PATH").ok().map(PathBuf::from),
        }
    }
}

/// Wraps an engine and turns its raw results into records. Failures become
/// error-flagged records, never `Err`s.
pub struct EphemerisAdapter<E> {
    engine: E,
}

impl<E: EphemerisEngine> EphemerisAdapter<E> {
    pub fn new(engine: E, config: EphemerisConfig) -> Self {
        if let Some(path) = &config.data_path {
            log::debug!("Setting ephemeris path to {}", path.display());
            engine.set_data_path(path);
        }
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Reset the process-wide data path. Callers sharing a process must agree
    /// on one path.
    pub fn set_data_path(&self, path: &Path) {
        log::info!("Ephemeris path changed to {}", path.display());
        self.engine.set_data_path(path);
    }

    pub fn data_path(&self) -> Option<PathBuf> {
        self.engine.data_path()
    }

    /// Position of one of the fixed bodies; `index` is the body id.
    pub fn body_position(&self, jd_ut: f64, body: i32) -> BodyPosition {
        let name = self.engine.body_name(body);
        self.position(jd_ut, body, body, name)
    }

    /// Position of a numbered minor planet; `index` is the catalogue number.
    pub fn asteroid_position(&self, jd_ut: f64, number: u32) -> BodyPosition {
        let body = bodies::asteroid_body(number);
        let mut name = self.engine.body_name(body);
        if name.is_empty() || name == "?" {
            name = format!("Asteroid_{}", number);
        }
        self.position(jd_ut, body, number as i32, name)
    }

    fn position(&self, jd_ut: f64, body: i32, index: i32, name: String) -> BodyPosition {
        match self.engine.calc_ut(jd_ut, body, CALC_FLAGS) {
            Ok(calc) if calc.status & FLAG_SWIEPH != 0 => {
                BodyPosition::computed(index, name, &calc.values, calc.status)
            }
            Ok(calc) => {
                let message = if calc.message.is_empty() {
                    FALLBACK_MESSAGE.to_string()
                } else {
                    calc.message
                };
                log::warn!("Body {} ({}): {}", index, name, message);
                BodyPosition::failed(index, name, calc.status, message)
            }
            Err(EngineError { status, message }) => {
                log::warn!("Body {} ({}) failed: {}", index, name, message);
                BodyPosition::failed(index, name, status, message)
            }
        }
    }

    /// House cusps and the Ascendant/Midheaven pair.
    pub fn houses(
        &self,
        jd_ut: f64,
        location: &GeoLocation,
        system: HouseSystem,
    ) -> Result<HouseCuspSet, EngineError> {
        let calc = self
            .engine
            .houses(jd_ut, CALC_FLAGS, location.lat, location.lon, system)
            .map_err(|e| {
                log::warn!("House calculation ({}) failed: {}", system, e);
                e
            })?;

        let cusps = calc
            .cusps
            .iter()
            .enumerate()
            .map(|(i, &long)| AngleRecord::new((i + 1).to_string(), long))
            .collect();

        Ok(HouseCuspSet {
            ascendant: AngleRecord::new("Asc", calc.ascendant),
            midheaven: AngleRecord::new("MC", calc.midheaven),
            cusps,
        })
    }

    /// Convert universal time to ephemeris time using the engine's delta T.
    pub fn ephemeris_time(&self, jd_ut: f64) -> f64 {
        jd_ut + self.engine.delta_t(jd_ut, CALC_FLAGS)
    }

    pub fn nodes_apsides(&self, jd_et: f64, body: i32, method: NodeMethod) -> NodeApsisRecord {
        let name = self.engine.body_name(body);
        match self.engine.nod_aps(jd_et, body, CALC_FLAGS, method) {
            Ok(calc) => NodeApsisRecord {
                index: body,
                name,
                points: Some(NodeApsisSet {
                    ascending_node: ApsisPoint::from(&calc.ascending),
                    descending_node: ApsisPoint::from(&calc.descending),
                    perihelion: ApsisPoint::from(&calc.perihelion),
                    aphelion: ApsisPoint::from(&calc.aphelion),
                }),
                error: None,
            },
            Err(e) => {
                log::warn!("Nodes/apsides for body {} ({}) failed: {}", body, name, e.message);
                NodeApsisRecord {
                    index: body,
                    name,
                    points: None,
                    error: Some(e.message),
                }
            }
        }
    }
}
