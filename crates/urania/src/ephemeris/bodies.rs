//! Body identifiers and calculation flags, numbered as the Swiss Ephemeris
//! numbers them.

pub const SUN: i32 = 0;
pub const MOON: i32 = 1;
pub const MERCURY: i32 = 2;
pub const VENUS: i32 = 3;
pub const MARS: i32 = 4;
pub const JUPITER: i32 = 5;
pub const SATURN: i32 = 6;
pub const URANUS: i32 = 7;
pub const NEPTUNE: i32 = 8;
pub const PLUTO: i32 = 9;
pub const MEAN_NODE: i32 = 10;
pub const TRUE_NODE: i32 = 11;
pub const MEAN_APOGEE: i32 = 12;
pub const OSCU_APOGEE: i32 = 13;
pub const EARTH: i32 = 14;
pub const CHIRON: i32 = 15;

/// Bodies 0..PLANET_COUNT make up the "all planets" set.
pub const PLANET_COUNT: i32 = 23;

/// Numbered minor planets live at `ASTEROID_OFFSET + catalogue number`.
pub const ASTEROID_OFFSET: i32 = 10000;
pub const MAX_ASTEROID_NUMBER: u32 = 1000;

pub const FLAG_SWIEPH: i32 = 2;
pub const FLAG_SPEED: i32 = 256;
pub const FLAG_EQUATORIAL: i32 = 2048;

/// Flags used for every position request.
pub const CALC_FLAGS: i32 = FLAG_SWIEPH | FLAG_SPEED;

// (lookup key, engine name)
const PLANET_IDS: &[(&str, &str)] = &[
    ("sun", "Sun"),
    ("moon", "Moon"),
    ("mercury", "Mercury"),
    ("venus", "Venus"),
    ("mars", "Mars"),
    ("jupiter", "Jupiter"),
    ("saturn", "Saturn"),
    ("uranus", "Uranus"),
    ("neptune", "Neptune"),
    ("pluto", "Pluto"),
    ("mean_node", "mean Node"),
    ("true_node", "true Node"),
    ("mean_apogee", "mean Apogee"),
    ("oscu_apogee", "osc. Apogee"),
    ("earth", "Earth"),
    ("chiron", "Chiron"),
    ("pholus", "Pholus"),
    ("ceres", "Ceres"),
    ("pallas", "Pallas"),
    ("juno", "Juno"),
    ("vesta", "Vesta"),
    ("intp_apogee", "intp. Apogee"),
    ("intp_perigee", "intp. Perigee"),
];

/// Resolve a body by key (`"sun"`, `"true_node"`) or by number.
pub fn body_id(name: &str) -> Option<i32> {
    let key = name.trim().to_lowercase();
    if let Ok(id) = key.parse::<i32>() {
        return Some(id);
    }
    PLANET_IDS
        .iter()
        .position(|(k, _)| *k == key)
        .map(|i| i as i32)
}

/// Name the engine reports for one of the fixed bodies.
pub fn standard_name(body: i32) -> Option<&'static str> {
    usize::try_from(body)
        .ok()
        .and_then(|i| PLANET_IDS.get(i))
        .map(|(_, name)| *name)
}

/// Bodies of the "all planets" set, in ascending order. Earth is never part
/// of a geocentric listing.
pub fn chart_bodies() -> impl Iterator<Item = i32> {
    (SUN..PLANET_COUNT).filter(|&b| b != EARTH)
}

/// Bodies for which nodes and apsides are listed: Sun through Pluto.
pub fn node_bodies() -> impl Iterator<Item = i32> {
    (SUN..=PLUTO).filter(|&b| b != EARTH)
}

pub fn asteroid_body(number: u32) -> i32 {
    ASTEROID_OFFSET + number as i32
}
