use anyhow::Context;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use urania::chart::{julian_day_document, ChartAssembler};
use urania::ephemeris::bodies;
use urania::{
    format_degrees, CalendarMoment, EphemerisEngine, FormatFlags, GeoCoordinate, GeoLocation,
    HouseSystem, NodeMethod, OwnedJson,
};
use urania_config::UraniaSettings;

#[derive(Parser, Debug)]
#[command(author, version, about = "Swiss Ephemeris charts as JSON")]
struct Cli {
    /// Re-indent JSON output (field order is kept).
    #[arg(long, global = true)]
    pretty: bool,

    /// Ephemeris data directory (overrides urania.toml and SWISS_EPHEMERIS_PATH).
    #[arg(long, global = true)]
    ephe_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct When {
    /// UT date, YYYY-MM-DD.
    #[arg(long, required_unless_present = "now")]
    date: Option<String>,

    /// UT time, HH:MM:SS.
    #[arg(long, default_value = "00:00:00")]
    time: String,

    /// Use the current time instead of --date/--time.
    #[arg(long, conflicts_with = "date")]
    now: bool,
}

#[derive(Args, Debug, Clone)]
struct Place {
    /// Longitude as D:M:S plus E or W, e.g. 0:5:30W.
    #[arg(long, allow_hyphen_values = true)]
    lon: String,

    /// Latitude as D:M:S plus N or S, e.g. 51:30:0N.
    #[arg(long, allow_hyphen_values = true)]
    lat: String,

    /// House system name or letter (default from urania.toml).
    #[arg(long)]
    house: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Planets, Ascendant/Midheaven and house cusps.
    Chart {
        #[command(flatten)]
        when: When,
        #[command(flatten)]
        place: Place,
    },
    Planets {
        #[command(flatten)]
        when: When,
    },
    Houses {
        #[command(flatten)]
        when: When,
        #[command(flatten)]
        place: Place,
    },
    /// One body by name (`mars`, `true_node`) or engine number.
    Body {
        body: String,
        #[command(flatten)]
        when: When,
    },
    /// Nodes and apsides of Sun through Pluto.
    Nodes {
        #[command(flatten)]
        when: When,
        /// Method bits: 1 mean, 2 osculating, 4 barycentric, 256 focal point.
        #[arg(long, default_value_t = 1)]
        method: i32,
        #[arg(long)]
        capacity: Option<usize>,
    },
    /// Nodes and apsides of one body.
    BodyNodes {
        body: String,
        #[command(flatten)]
        when: When,
        /// Ephemeris-time Julian day; computed from --date/--time when absent.
        #[arg(long)]
        jd_et: Option<f64>,
        #[arg(long, default_value_t = 1)]
        method: i32,
    },
    /// Numbered minor planets by range or list.
    Asteroids {
        #[command(flatten)]
        when: When,
        #[arg(long, requires = "end", conflicts_with = "list")]
        start: Option<i32>,
        #[arg(long, requires = "start")]
        end: Option<i32>,
        /// Comma-separated catalogue numbers, e.g. 1,2,3,433.
        #[arg(long, required_unless_present = "start")]
        list: Option<String>,
        #[arg(long)]
        capacity: Option<usize>,
    },
    /// Julian Day (UT) of a calendar moment.
    Julday {
        #[command(flatten)]
        when: When,
    },
    /// Format an angle in degrees, minutes and seconds.
    Dms {
        #[arg(allow_hyphen_values = true)]
        degrees: f64,
        #[arg(long)]
        zodiac: bool,
        #[arg(long)]
        round_sec: bool,
        #[arg(long)]
        round_min: bool,
        #[arg(long)]
        equatorial: bool,
    },
    /// Ephemeris path and supported date range.
    Info,
}

impl When {
    fn moment(&self) -> anyhow::Result<CalendarMoment> {
        if self.now {
            return Ok(CalendarMoment::now());
        }
        let date = self.date.as_deref().context("--date is required without --now")?;
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .with_context(|| format!("Invalid --date {:?}, expected YYYY-MM-DD", date))?;
        let time = NaiveTime::parse_from_str(&self.time, "%H:%M:%S")
            .with_context(|| format!("Invalid --time {:?}, expected HH:MM:SS", self.time))?;
        let dt = Utc.from_utc_datetime(&date.and_time(time));
        Ok(CalendarMoment::from_datetime(&dt))
    }
}

impl Place {
    fn location(&self) -> anyhow::Result<GeoLocation> {
        let lon: GeoCoordinate = self
            .lon
            .parse()
            .with_context(|| format!("Invalid --lon {:?}", self.lon))?;
        let lat: GeoCoordinate = self
            .lat
            .parse()
            .with_context(|| format!("Invalid --lat {:?}", self.lat))?;
        Ok(GeoLocation::from_coordinates(&lat, &lon)?)
    }

    fn system(&self, settings: &UraniaSettings) -> anyhow::Result<HouseSystem> {
        match &self.house {
            Some(name) => Ok(HouseSystem::from_name(name)?),
            None => Ok(settings.house_system),
        }
    }
}

#[cfg_attr(not(feature = "swisseph"), allow(dead_code))]
fn resolve_body(body: &str) -> anyhow::Result<i32> {
    match bodies::body_id(body) {
        Some(id) => Ok(id),
        None => anyhow::bail!("Unknown body {:?}", body),
    }
}

/// Engine-backed subcommands, generic over the engine.
#[cfg_attr(not(feature = "swisseph"), allow(dead_code))]
fn run_with<E: EphemerisEngine>(
    asm: &ChartAssembler<E>,
    command: &Command,
    settings: &UraniaSettings,
) -> anyhow::Result<OwnedJson> {
    let doc = match command {
        Command::Chart { when, place } => {
            asm.chart(&when.moment()?, &place.location()?, place.system(settings)?)
        }
        Command::Planets { when } => asm.planets(&when.moment()?),
        Command::Houses { when, place } => {
            asm.houses(&when.moment()?, &place.location()?, place.system(settings)?)
        }
        Command::Body { body, when } => asm.body(resolve_body(body)?, &when.moment()?),
        Command::Nodes {
            when,
            method,
            capacity,
        } => asm.nodes(&when.moment()?, NodeMethod::from_bits(*method), *capacity),
        Command::BodyNodes {
            body,
            when,
            jd_et,
            method,
        } => {
            let jd_et = match jd_et {
                Some(jd) => *jd,
                None => asm.adapter().ephemeris_time(when.moment()?.julian_day()),
            };
            asm.body_nodes(resolve_body(body)?, jd_et, NodeMethod::from_bits(*method), None)
        }
        Command::Asteroids {
            when,
            start,
            end,
            list,
            capacity,
        } => match (start, end, list) {
            (Some(start), Some(end), _) => asm.asteroid_range(&when.moment()?, *start, *end, *capacity),
            (_, _, Some(list)) => asm.asteroid_list(&when.moment()?, list, *capacity),
            _ => anyhow::bail!("Give either --start/--end or --list"),
        },
        Command::Info => asm.ephemeris_info(),
        Command::Julday { .. } | Command::Dms { .. } => {
            anyhow::bail!("{:?} does not use the ephemeris engine", command)
        }
    };
    Ok(doc)
}

#[cfg(feature = "swisseph")]
fn run_engine(command: &Command, settings: &UraniaSettings) -> anyhow::Result<OwnedJson> {
    use urania::{EphemerisAdapter, SwissEphemeris};

    let adapter = EphemerisAdapter::new(SwissEphemeris::new(), settings.ephemeris_config());
    let asm = ChartAssembler::new(adapter, settings.limits);
    run_with(&asm, command, settings)
}

#[cfg(not(feature = "swisseph"))]
fn run_engine(_command: &Command, _settings: &UraniaSettings) -> anyhow::Result<OwnedJson> {
    anyhow::bail!("This build has no ephemeris engine; rebuild with `--features swisseph`")
}

fn print_json(doc: &str, pretty: bool) -> anyhow::Result<()> {
    if pretty {
        let value: serde_json::Value =
            serde_json::from_str(doc).context("Engine produced invalid JSON")?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", doc);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut settings = urania_config::load_settings()?;
    if let Some(path) = &cli.ephe_path {
        settings.ephemeris_path = path.clone();
    }
    log::debug!("Settings: {:?}", settings);

    match &cli.command {
        Command::Dms {
            degrees,
            zodiac,
            round_sec,
            round_min,
            equatorial,
        } => {
            let mut flags = FormatFlags::NONE;
            for (set, flag) in [
                (*zodiac, FormatFlags::ZODIAC),
                (*round_sec, FormatFlags::ROUND_SEC),
                (*round_min, FormatFlags::ROUND_MIN),
                (*equatorial, FormatFlags::EQUATORIAL),
            ] {
                if set {
                    flags = flags | flag;
                }
            }
            println!("{}", format_degrees(*degrees, flags));
        }
        Command::Julday { when } => {
            print_json(&julian_day_document(&when.moment()?), cli.pretty)?;
        }
        command => {
            let doc = run_engine(command, &settings)?;
            print_json(&doc, cli.pretty)?;
        }
    }
    Ok(())
}
