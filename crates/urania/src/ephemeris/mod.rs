pub mod adapter;
pub mod bodies;
pub mod engine;
pub mod types;

#[cfg(feature = "swisseph")]
mod swiss;
#[cfg(feature = "swisseph")]
mod sys;

pub use adapter::{EphemerisAdapter, EphemerisConfig};
pub use engine::{BodyCalc, EngineError, EphemerisEngine, HouseCalc, NodeApsCalc};
pub use types::{
    AngleRecord, ApsisPoint, BodyPosition, HouseCuspSet, HouseSystem, HouseSystemError,
    NodeApsisRecord, NodeApsisSet, NodeMethod,
};

#[cfg(feature = "swisseph")]
pub use swiss::SwissEphemeris;
