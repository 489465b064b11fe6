//! A scripted in-memory engine for driving the assembler without data files.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use urania::ephemeris::bodies::{self, CALC_FLAGS};
use urania::ephemeris::{BodyCalc, EngineError, HouseCalc, NodeApsCalc};
use urania::{
    CalendarMoment, ChartAssembler, EphemerisAdapter, EphemerisConfig, EphemerisEngine,
    HouseSystem, Limits, NodeMethod,
};

pub const DELTA_T: f64 = 0.0008;

#[derive(Default)]
pub struct ScriptedEngine {
    /// Bodies whose calculation returns a negative status.
    pub failing: HashSet<i32>,
    /// Bodies computed without the Swiss data files (status lacks the SWIEPH bit).
    pub fallback: HashSet<i32>,
    pub nodes_failing: HashSet<i32>,
    pub names: HashMap<i32, String>,
    pub house_failure: Option<String>,
    pub last_house_call: Mutex<Option<(f64, f64, char)>>,
    pub path: Mutex<Option<PathBuf>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, body: i32) -> Self {
        self.failing.insert(body);
        self
    }

    pub fn fallback(mut self, body: i32) -> Self {
        self.fallback.insert(body);
        self
    }

    pub fn nodes_failing(mut self, body: i32) -> Self {
        self.nodes_failing.insert(body);
        self
    }

    pub fn named(mut self, body: i32, name: &str) -> Self {
        self.names.insert(body, name.to_string());
        self
    }

    pub fn house_failure(mut self, message: &str) -> Self {
        self.house_failure = Some(message.to_string());
        self
    }

    fn vector(body: i32, scale: f64) -> [f64; 6] {
        let long = (f64::from(body % 1000) * 7.25 * scale).rem_euclid(360.0);
        [long, 1.25, 1.000123456, 0.985, -0.01, 0.000012345]
    }
}

impl EphemerisEngine for ScriptedEngine {
    fn calc_ut(&self, _jd_ut: f64, body: i32, _flags: i32) -> Result<BodyCalc, EngineError> {
        if self.failing.contains(&body) {
            return Err(EngineError::new(
                -1,
                format!("SwissEph file 'se{:05}.se1' not found in PATH 'eph'", body),
            ));
        }
        let status = if self.fallback.contains(&body) {
            4 | bodies::FLAG_SPEED
        } else {
            CALC_FLAGS
        };
        Ok(BodyCalc {
            status,
            values: Self::vector(body, 1.0),
            message: String::new(),
        })
    }

    fn houses(
        &self,
        _jd_ut: f64,
        _flags: i32,
        lat: f64,
        lon: f64,
        system: HouseSystem,
    ) -> Result<HouseCalc, EngineError> {
        *self.last_house_call.lock().unwrap() = Some((lat, lon, system.code()));
        if let Some(message) = &self.house_failure {
            return Err(EngineError::new(-1, message.clone()));
        }
        let mut cusps = [0.0; 12];
        for (i, cusp) in cusps.iter_mut().enumerate() {
            *cusp = (101.5 + i as f64 * 30.0).rem_euclid(360.0);
        }
        Ok(HouseCalc {
            cusps,
            ascendant: 101.5,
            midheaven: 5.25,
        })
    }

    fn nod_aps(
        &self,
        _jd_et: f64,
        body: i32,
        _flags: i32,
        _method: NodeMethod,
    ) -> Result<NodeApsCalc, EngineError> {
        if self.nodes_failing.contains(&body) {
            return Err(EngineError::new(-1, "nodes not available"));
        }
        Ok(NodeApsCalc {
            ascending: Self::vector(body, 1.0),
            descending: Self::vector(body, 2.0),
            perihelion: Self::vector(body, 3.0),
            aphelion: Self::vector(body, 4.0),
        })
    }

    fn delta_t(&self, _jd_ut: f64, _flags: i32) -> f64 {
        DELTA_T
    }

    fn body_name(&self, body: i32) -> String {
        if let Some(name) = self.names.get(&body) {
            return name.clone();
        }
        bodies::standard_name(body).unwrap_or("?").to_string()
    }

    fn set_data_path(&self, path: &Path) {
        *self.path.lock().unwrap() = Some(path.to_path_buf());
    }

    fn data_path(&self) -> Option<PathBuf> {
        self.path.lock().unwrap().clone()
    }
}

pub fn assembler(engine: ScriptedEngine) -> ChartAssembler<ScriptedEngine> {
    assembler_with_limits(engine, Limits::default())
}

pub fn assembler_with_limits(engine: ScriptedEngine, limits: Limits) -> ChartAssembler<ScriptedEngine> {
    ChartAssembler::new(
        EphemerisAdapter::new(engine, EphemerisConfig::with_data_path("eph")),
        limits,
    )
}

pub fn christmas() -> CalendarMoment {
    CalendarMoment::new(2023, 12, 25, 12, 0, 0).unwrap()
}

pub fn parse(doc: &str) -> serde_json::Value {
    serde_json::from_str(doc).unwrap_or_else(|e| panic!("invalid JSON ({}): {}", e, doc))
}
