//! JSON binding layer around the Swiss Ephemeris.
//!
//! The heavy lifting (planet positions, house cusps, nodes and apsides) is
//! delegated to an [`EphemerisEngine`]. This crate normalizes inputs, turns
//! engine results into records, renders angles and writes one JSON document
//! per request.

pub mod chart;
pub mod coords;
pub mod dms;
pub mod ephemeris;
pub mod ffi;
pub mod json;
pub mod time;

pub use chart::{
    julian_day_document, AsteroidSelection, BatchSummary, Capacities, ChartAssembler, ChartRequest,
    HouseRequest, Limits,
};
pub use coords::{CoordinateError, GeoCoordinate, GeoLocation, Hemisphere};
pub use dms::{format_degrees, FormatFlags};
pub use ephemeris::{
    EngineError, EphemerisAdapter, EphemerisConfig, EphemerisEngine, HouseSystem, NodeMethod,
};
pub use json::{error_document, OwnedJson};
pub use time::{CalendarError, CalendarMoment};

#[cfg(feature = "swisseph")]
pub use ephemeris::SwissEphemeris;
