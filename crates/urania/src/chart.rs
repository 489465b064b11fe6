//! Request to JSON document assembly.
//!
//! Every document is written front to back into one [`JsonBuffer`]:
//! header, then the requested sections in a fixed order (planets, houses,
//! nodes, asteroids). Per-item failures become error-flagged records; array
//! sections stop with a warning object once the buffer nears its capacity.

use crate::coords::GeoLocation;
use crate::ephemeris::bodies;
use crate::ephemeris::types::{BodyPosition, HouseSystem, NodeApsisRecord, NodeMethod};
use crate::ephemeris::{EphemerisAdapter, EphemerisEngine};
use crate::json::{JsonBuffer, OwnedJson, Record, Value};
use crate::time::{CalendarMoment, HIGH_ACCURACY_YEARS};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Most entries an asteroid list may contribute.
pub const MAX_LIST_ENTRIES: usize = 1000;

lazy_static::lazy_static! {
    // Leading integer of a list token, read the way C's atoi reads it.
    static ref LEADING_INT: Regex = Regex::new(r"^\s*([+-]?\d+)").expect("Invalid regex");
}

/// Byte ceilings per document kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capacities {
    pub chart: usize,
    pub planets: usize,
    pub houses: usize,
    pub nodes: usize,
    pub asteroids: usize,
    pub single: usize,
}

impl Default for Capacities {
    fn default() -> Self {
        Self {
            chart: 100_000,
            planets: 50_000,
            houses: 10_000,
            nodes: 50_000,
            asteroids: 100_000,
            single: 1_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    pub capacities: Capacities,
    /// Head room kept free at the end of a buffer; batches stop inside it.
    pub truncation_margin: usize,
    pub max_asteroid_number: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            capacities: Capacities::default(),
            truncation_margin: 1_000,
            max_asteroid_number: bodies::MAX_ASTEROID_NUMBER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HouseRequest {
    pub location: GeoLocation,
    pub system: HouseSystem,
}

/// Which minor planets to compute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsteroidSelection {
    /// Inclusive catalogue range, clamped to `1..=max` and swapped when reversed.
    Range { start: i32, end: i32 },
    /// Comma-separated catalogue numbers.
    List(String),
}

impl AsteroidSelection {
    /// Clamp a range into `1..=max`, putting the smaller end first.
    pub fn normalized_range(start: i32, end: i32, max: u32) -> (u32, u32) {
        let max = max.max(1);
        let clamp = |n: i32| (n.max(1) as u32).min(max);
        let (a, b) = (clamp(start), clamp(end));
        if a > b {
            (b, a)
        } else {
            (a, b)
        }
    }

    /// Parse a list the way the C bindings always have: split on commas,
    /// skip empty tokens, read each token's leading integer (0 when there is
    /// none) and keep numbers in `1..=max`, at most [`MAX_LIST_ENTRIES`].
    pub fn parse_list(list: &str, max: u32) -> Vec<u32> {
        list.split(',')
            .filter(|token| !token.is_empty())
            .filter_map(|token| {
                LEADING_INT
                    .captures(token)
                    .and_then(|caps| caps[1].parse::<i64>().ok())
            })
            .filter(|&n| n >= 1 && n <= i64::from(max))
            .map(|n| n as u32)
            .take(MAX_LIST_ENTRIES)
            .collect()
    }

    pub fn numbers(&self, max: u32) -> Vec<u32> {
        match self {
            AsteroidSelection::Range { start, end } => {
                let (start, end) = Self::normalized_range(*start, *end, max);
                (start..=end).collect()
            }
            AsteroidSelection::List(list) => Self::parse_list(list, max),
        }
    }
}

/// One document's worth of work. Sections left unset are omitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRequest {
    pub moment: CalendarMoment,
    pub planets: bool,
    pub houses: Option<HouseRequest>,
    pub nodes: Option<NodeMethod>,
    pub asteroids: Option<AsteroidSelection>,
    pub capacity: usize,
}

impl ChartRequest {
    pub fn new(moment: CalendarMoment, capacity: usize) -> Self {
        Self {
            moment,
            planets: false,
            houses: None,
            nodes: None,
            asteroids: None,
            capacity,
        }
    }

    pub fn with_planets(mut self) -> Self {
        self.planets = true;
        self
    }

    pub fn with_houses(mut self, location: GeoLocation, system: HouseSystem) -> Self {
        self.houses = Some(HouseRequest { location, system });
        self
    }

    pub fn with_nodes(mut self, method: NodeMethod) -> Self {
        self.nodes = Some(method);
        self
    }

    pub fn with_asteroids(mut self, selection: AsteroidSelection) -> Self {
        self.asteroids = Some(selection);
        self
    }

    /// Whether the header echoes `jd_ut`: any UT section, or nothing at all.
    fn needs_ut(&self) -> bool {
        let any_ut = self.planets || self.houses.is_some() || self.asteroids.is_some();
        any_ut || self.nodes.is_none()
    }
}

/// Tallies of one asteroid batch. Counts cover emitted items only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub calculated: usize,
    pub errors: usize,
    pub total_requested: usize,
}

/// Items a batch section can emit.
trait BatchItem {
    fn is_error(&self) -> bool;
    fn record(&self) -> Record<'_>;
}

impl BatchItem for BodyPosition {
    fn is_error(&self) -> bool {
        BodyPosition::is_error(self)
    }

    fn record(&self) -> Record<'_> {
        Record::Body {
            position: self,
            jd_ut: None,
        }
    }
}

impl BatchItem for NodeApsisRecord {
    fn is_error(&self) -> bool {
        NodeApsisRecord::is_error(self)
    }

    fn record(&self) -> Record<'_> {
        Record::Nodes {
            record: self,
            epoch: None,
        }
    }
}

struct BatchOutcome {
    summary: BatchSummary,
    truncated: bool,
}

/// Write `[ ... ]` for `ids`, computing each item lazily.
///
/// Before each element, a buffer past its margin ends the array with a
/// warning object naming the first id left out. An exhausted buffer
/// therefore yields an array holding only the warning.
fn write_batch<T, R, F>(
    buf: &mut JsonBuffer,
    kind: &str,
    ids: &[T],
    total_requested: usize,
    mut compute: F,
) -> BatchOutcome
where
    T: Copy + fmt::Display,
    R: BatchItem,
    F: FnMut(T) -> R,
{
    let mut summary = BatchSummary {
        total_requested,
        ..BatchSummary::default()
    };
    let mut truncated = false;

    buf.begin_array();
    for (i, &id) in ids.iter().enumerate() {
        if buf.near_limit() {
            let warning = format!("Buffer limit reached, truncating results at {} {}", kind, id);
            log::warn!("{} ({} of {} bytes used)", warning, buf.len(), buf.capacity());
            buf.element(&Record::Warning(&warning), true);
            truncated = true;
            break;
        }

        let item = compute(id);
        if item.is_error() {
            summary.errors += 1;
        } else {
            summary.calculated += 1;
        }
        buf.element(&item.record(), i + 1 == ids.len());
    }
    buf.end_array();

    BatchOutcome { summary, truncated }
}

/// `{ "year": .., ..., "julian_day": .. }` for a calendar moment.
pub fn julian_day_document(moment: &CalendarMoment) -> OwnedJson {
    let mut buf = JsonBuffer::new(Capacities::default().single, 0);
    buf.begin_object();
    write_calendar_fields(&mut buf, moment);
    buf.field("julian_day", Value::Time(moment.julian_day()));
    buf.end_object();
    buf.finish()
}

fn write_calendar_fields(buf: &mut JsonBuffer, moment: &CalendarMoment) {
    buf.field("year", Value::Int(moment.year().into()));
    buf.field("month", Value::Int(moment.month().into()));
    buf.field("day", Value::Int(moment.day().into()));
    buf.field("hour", Value::Int(moment.hour().into()));
    buf.field("minute", Value::Int(moment.minute().into()));
    buf.field("second", Value::Int(moment.second().into()));
}

/// Builds JSON documents from ephemeris results.
pub struct ChartAssembler<E> {
    adapter: EphemerisAdapter<E>,
    limits: Limits,
}

impl<E: EphemerisEngine> ChartAssembler<E> {
    pub fn new(adapter: EphemerisAdapter<E>, limits: Limits) -> Self {
        Self { adapter, limits }
    }

    pub fn adapter(&self) -> &EphemerisAdapter<E> {
        &self.adapter
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Assemble any combination of sections into one document.
    pub fn compose(&self, request: &ChartRequest) -> OwnedJson {
        let moment = &request.moment;
        let jd_ut = moment.julian_day();
        let jd_et = request.nodes.map(|_| self.adapter.ephemeris_time(jd_ut));

        let mut buf = JsonBuffer::new(request.capacity, self.limits.truncation_margin);
        buf.begin_object();

        buf.key("initDate");
        buf.begin_object();
        write_calendar_fields(&mut buf, moment);
        if request.needs_ut() {
            buf.field("jd_ut", Value::Time(jd_ut));
        }
        if let Some(jd_et) = jd_et {
            buf.field("jd_et", Value::Time(jd_et));
        }
        buf.end_object();

        // Once a batch truncates, later sections are skipped.
        let mut truncated = false;

        if request.planets {
            log::debug!("Computing planets at JD {:.6}", jd_ut);
            let ids: Vec<i32> = bodies::chart_bodies().collect();
            buf.key("planets");
            let outcome = write_batch(&mut buf, "planet", &ids, ids.len(), |body| {
                self.adapter.body_position(jd_ut, body)
            });
            truncated = outcome.truncated;
        }

        if let Some(houses) = request.houses.as_ref().filter(|_| !truncated) {
            self.write_houses(&mut buf, jd_ut, houses);
        }

        if let (Some(method), Some(jd_et)) = (request.nodes, jd_et) {
            if !truncated {
                log::debug!("Computing nodes (method {}) at JD(ET) {:.6}", method.bits(), jd_et);
                let ids: Vec<i32> = bodies::node_bodies().collect();
                buf.field("method", Value::Int(method.bits().into()));
                buf.key("nodes");
                let outcome = write_batch(&mut buf, "planet", &ids, ids.len(), |body| {
                    self.adapter.nodes_apsides(jd_et, body, method)
                });
                truncated = outcome.truncated;
            }
        }

        if let Some(selection) = request.asteroids.as_ref().filter(|_| !truncated) {
            self.write_asteroids(&mut buf, jd_ut, selection);
        }

        buf.end_object();
        buf.finish()
    }

    fn write_houses(&self, buf: &mut JsonBuffer, jd_ut: f64, request: &HouseRequest) {
        log::debug!(
            "Computing houses ({}) at {:.6}, {:.6}",
            request.system,
            request.location.lat,
            request.location.lon
        );
        match self.adapter.houses(jd_ut, &request.location, request.system) {
            Ok(set) => {
                buf.key("ascmc");
                buf.begin_array();
                buf.element(&Record::Angle(&set.ascendant), false);
                buf.element(&Record::Angle(&set.midheaven), true);
                buf.end_array();

                buf.key("houses");
                buf.begin_array();
                for (i, cusp) in set.cusps.iter().enumerate() {
                    buf.element(&Record::Angle(cusp), i + 1 == set.cusps.len());
                }
                buf.end_array();
            }
            Err(e) => {
                buf.key("ascmc");
                buf.begin_array();
                buf.end_array();
                buf.key("houses");
                buf.begin_array();
                buf.end_array();
                buf.key("houses_error");
                buf.begin_object();
                buf.field("error", Value::Bool(true));
                buf.field("error_msg", Value::Text(&e.message));
                buf.end_object();
            }
        }
    }

    fn write_asteroids(&self, buf: &mut JsonBuffer, jd_ut: f64, selection: &AsteroidSelection) {
        let max = self.limits.max_asteroid_number;
        match selection {
            AsteroidSelection::Range { start, end } => {
                let (start, end) = AsteroidSelection::normalized_range(*start, *end, max);
                buf.key("asteroid_range");
                buf.begin_object();
                buf.field("start", Value::Int(start.into()));
                buf.field("end", Value::Int(end.into()));
                buf.end_object();
            }
            AsteroidSelection::List(list) => {
                buf.field("requested_list", Value::Text(list));
            }
        }

        let numbers = selection.numbers(max);
        log::debug!("Computing {} asteroids at JD {:.6}", numbers.len(), jd_ut);
        buf.key("asteroids");
        let outcome = write_batch(buf, "asteroid", &numbers, numbers.len(), |number| {
            self.adapter.asteroid_position(jd_ut, number)
        });

        buf.key("summary");
        buf.record(&Record::Summary(&outcome.summary));
    }

    /// Planets, Ascendant/Midheaven and house cusps.
    pub fn chart(&self, moment: &CalendarMoment, location: &GeoLocation, system: HouseSystem) -> OwnedJson {
        let request = ChartRequest::new(*moment, self.limits.capacities.chart)
            .with_planets()
            .with_houses(*location, system);
        self.compose(&request)
    }

    pub fn planets(&self, moment: &CalendarMoment) -> OwnedJson {
        let request = ChartRequest::new(*moment, self.limits.capacities.planets).with_planets();
        self.compose(&request)
    }

    pub fn houses(&self, moment: &CalendarMoment, location: &GeoLocation, system: HouseSystem) -> OwnedJson {
        let request =
            ChartRequest::new(*moment, self.limits.capacities.houses).with_houses(*location, system);
        self.compose(&request)
    }

    /// A single body as a bare record, with `jd_ut` echoed.
    pub fn body(&self, body: i32, moment: &CalendarMoment) -> OwnedJson {
        let jd_ut = moment.julian_day();
        let position = self.adapter.body_position(jd_ut, body);
        let mut buf = JsonBuffer::new(self.limits.capacities.single, 0);
        buf.record(&Record::Body {
            position: &position,
            jd_ut: Some(jd_ut),
        });
        buf.finish()
    }

    /// Nodes and apsides of Sun through Pluto.
    pub fn nodes(&self, moment: &CalendarMoment, method: NodeMethod, capacity: Option<usize>) -> OwnedJson {
        let capacity = capacity.unwrap_or(self.limits.capacities.nodes);
        self.compose(&ChartRequest::new(*moment, capacity).with_nodes(method))
    }

    /// Nodes and apsides of one body at an ephemeris-time Julian day.
    pub fn body_nodes(&self, body: i32, jd_et: f64, method: NodeMethod, capacity: Option<usize>) -> OwnedJson {
        let record = self.adapter.nodes_apsides(jd_et, body, method);
        let mut buf = JsonBuffer::new(capacity.unwrap_or(self.limits.capacities.nodes), 0);
        buf.record(&Record::Nodes {
            record: &record,
            epoch: Some((jd_et, method)),
        });
        buf.finish()
    }

    pub fn asteroid_range(
        &self,
        moment: &CalendarMoment,
        start: i32,
        end: i32,
        capacity: Option<usize>,
    ) -> OwnedJson {
        let capacity = capacity.unwrap_or(self.limits.capacities.asteroids);
        let request = ChartRequest::new(*moment, capacity)
            .with_asteroids(AsteroidSelection::Range { start, end });
        self.compose(&request)
    }

    pub fn asteroid_list(&self, moment: &CalendarMoment, list: &str, capacity: Option<usize>) -> OwnedJson {
        let capacity = capacity.unwrap_or(self.limits.capacities.asteroids);
        let request = ChartRequest::new(*moment, capacity)
            .with_asteroids(AsteroidSelection::List(list.to_string()));
        self.compose(&request)
    }

    /// Point the engine at a new data directory and acknowledge it.
    pub fn set_data_path(&self, path: &Path) -> OwnedJson {
        self.adapter.set_data_path(path);
        let shown = path.to_string_lossy();
        let mut buf = JsonBuffer::new(self.limits.capacities.single, 0);
        buf.begin_object();
        buf.field("status", Value::Int(0));
        buf.field("ephemeris_path", Value::Text(&shown));
        buf.end_object();
        buf.finish()
    }

    pub fn ephemeris_info(&self) -> OwnedJson {
        let path = self
            .adapter
            .data_path()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let start = format!("{:04}-01-01", HIGH_ACCURACY_YEARS.start());
        let end = format!("{:04}-01-01", HIGH_ACCURACY_YEARS.end());

        let mut buf = JsonBuffer::new(self.limits.capacities.single, 0);
        buf.begin_object();
        buf.field("ephemeris_path", Value::Text(&path));
        buf.key("date_range");
        buf.begin_object();
        buf.field("start", Value::Text(&start));
        buf.field("end", Value::Text(&end));
        buf.end_object();
        buf.end_object();
        buf.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::bodies::CALC_FLAGS;
    use crate::ephemeris::{BodyCalc, EngineError, EphemerisConfig, HouseCalc, NodeApsCalc};
    use std::cell::RefCell;
    use std::path::PathBuf;

    #[derive(Default)]
    struct StubEngine {
        path: RefCell<Option<PathBuf>>,
    }

    impl EphemerisEngine for StubEngine {
        fn calc_ut(&self, _jd_ut: f64, body: i32, _flags: i32) -> Result<BodyCalc, EngineError> {
            Ok(BodyCalc {
                status: CALC_FLAGS,
                values: [f64::from(body % 360), 0.5, 1.0, 0.9, 0.0, 0.0],
                message: String::new(),
            })
        }

        fn houses(
            &self,
            _jd_ut: f64,
            _flags: i32,
            _lat: f64,
            _lon: f64,
            _system: HouseSystem,
        ) -> Result<HouseCalc, EngineError> {
            let mut cusps = [0.0; 12];
            for (i, c) in cusps.iter_mut().enumerate() {
                *c = i as f64 * 30.0;
            }
            Ok(HouseCalc {
                cusps,
                ascendant: 0.0,
                midheaven: 270.0,
            })
        }

        fn nod_aps(
            &self,
            _jd_et: f64,
            _body: i32,
            _flags: i32,
            _method: NodeMethod,
        ) -> Result<NodeApsCalc, EngineError> {
            Err(EngineError::new(-1, "not in stub"))
        }

        fn delta_t(&self, _jd_ut: f64, _flags: i32) -> f64 {
            0.5
        }

        fn body_name(&self, body: i32) -> String {
            bodies::standard_name(body).unwrap_or("?").to_string()
        }

        fn set_data_path(&self, path: &Path) {
            *self.path.borrow_mut() = Some(path.to_path_buf());
        }

        fn data_path(&self) -> Option<PathBuf> {
            self.path.borrow().clone()
        }
    }

    fn assembler() -> ChartAssembler<StubEngine> {
        ChartAssembler::new(
            EphemerisAdapter::new(StubEngine::default(), EphemerisConfig::default()),
            Limits::default(),
        )
    }

    fn moment() -> CalendarMoment {
        CalendarMoment::new(2023, 12, 25, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_range_normalization() {
        assert_eq!(AsteroidSelection::normalized_range(0, 5, 1000), (1, 5));
        assert_eq!(AsteroidSelection::normalized_range(20, 3, 1000), (3, 20));
        assert_eq!(AsteroidSelection::normalized_range(900, 5000, 1000), (900, 1000));
        assert_eq!(AsteroidSelection::normalized_range(-4, -9, 1000), (1, 1));
    }

    #[test]
    fn test_list_parsing_follows_atoi() {
        let parsed = AsteroidSelection::parse_list("1,, 2,abc,433x,-5,1001,+7,0", 1000);
        assert_eq!(parsed, vec![1, 2, 433, 7]);
    }

    #[test]
    fn test_list_capped() {
        let list = (1..=1200).map(|n| (n % 1000 + 1).to_string()).collect::<Vec<_>>().join(",");
        assert_eq!(AsteroidSelection::parse_list(&list, 1000).len(), MAX_LIST_ENTRIES);
    }

    #[test]
    fn test_header_jd_fields() {
        let asm = assembler();
        let empty = asm.compose(&ChartRequest::new(moment(), 10_000));
        assert!(empty.contains("\"jd_ut\": 2460304.000000"));
        assert!(!empty.contains("jd_et"));

        let nodes_only = asm.compose(&ChartRequest::new(moment(), 10_000).with_nodes(NodeMethod::MEAN));
        assert!(!nodes_only.contains("jd_ut"));
        assert!(nodes_only.contains("\"jd_et\": 2460304.500000"));
        assert!(nodes_only.contains("\"method\": 1, \"nodes\": [ "));
    }

    #[test]
    fn test_houses_document() {
        let asm = assembler();
        let location = GeoLocation { lat: 51.5, lon: -0.1 };
        let doc = asm.houses(&moment(), &location, HouseSystem::PLACIDUS);
        assert!(doc.contains(
            r#""ascmc": [ { "name": "Asc", "long": 0.000000, "long_s": " 0 ar  0' 0.0000" }, { "name": "MC""#
        ));
        assert!(doc.contains(r#"{ "name": "12", "long": 330.000000"#));
        assert!(doc.ends_with(" } ] }"));
    }

    #[test]
    fn test_ephemeris_info_and_path() {
        let asm = assembler();
        let ack = asm.set_data_path(Path::new("/data/eph"));
        assert_eq!(ack.as_str(), r#"{ "status": 0, "ephemeris_path": "/data/eph" }"#);
        assert_eq!(
            asm.ephemeris_info().as_str(),
            r#"{ "ephemeris_path": "/data/eph", "date_range": { "start": "0600-01-01", "end": "2400-01-01" } }"#
        );
    }

    #[test]
    fn test_julian_day_document() {
        assert_eq!(
            julian_day_document(&moment()).as_str(),
            r#"{ "year": 2023, "month": 12, "day": 25, "hour": 12, "minute": 0, "second": 0, "julian_day": 2460304.000000 }"#
        );
    }
}
