use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use urania::chart::{Capacities, Limits};
use urania::{EphemerisConfig, HouseSystem};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "URANIA_CONFIG";
/// Environment variable overriding `[ephemeris] path`.
pub const EPHEMERIS_PATH_ENV: &str = "SWISS_EPHEMERIS_PATH";

const CONFIG_PATHS: [&str; 2] = ["configs/urania.toml", "../../configs/urania.toml"];

#[derive(Debug, Clone, PartialEq)]
pub struct UraniaSettings {
    pub ephemeris_path: PathBuf,
    pub house_system: HouseSystem,
    pub limits: Limits,
}

impl Default for UraniaSettings {
    fn default() -> Self {
        Self {
            ephemeris_path: PathBuf::from(default_ephemeris_path()),
            house_system: HouseSystem::default(),
            limits: Limits::default(),
        }
    }
}

impl UraniaSettings {
    pub fn ephemeris_config(&self) -> EphemerisConfig {
        EphemerisConfig::with_data_path(self.ephemeris_path.clone())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RootConfigToml {
    #[serde(default)]
    ephemeris: EphemerisToml,
    #[serde(default)]
    defaults: DefaultsToml,
    #[serde(default)]
    limits: LimitsToml,
    #[serde(default)]
    capacities: CapacitiesToml,
}

#[derive(Debug, Clone, Deserialize)]
struct EphemerisToml {
    #[serde(default = "default_ephemeris_path")]
    path: String,
}

impl Default for EphemerisToml {
    fn default() -> Self {
        Self {
            path: default_ephemeris_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct DefaultsToml {
    #[serde(default = "default_house_system")]
    house_system: String,
}

impl Default for DefaultsToml {
    fn default() -> Self {
        Self {
            house_system: default_house_system(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct LimitsToml {
    #[serde(default = "default_truncation_margin")]
    truncation_margin: usize,
    #[serde(default = "default_max_asteroid_number")]
    max_asteroid_number: u32,
}

impl Default for LimitsToml {
    fn default() -> Self {
        Self {
            truncation_margin: default_truncation_margin(),
            max_asteroid_number: default_max_asteroid_number(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CapacitiesToml {
    #[serde(default)]
    chart: Option<usize>,
    #[serde(default)]
    planets: Option<usize>,
    #[serde(default)]
    houses: Option<usize>,
    #[serde(default)]
    nodes: Option<usize>,
    #[serde(default)]
    asteroids: Option<usize>,
    #[serde(default)]
    single: Option<usize>,
}

fn default_ephemeris_path() -> String {
    "eph".to_string()
}

fn default_house_system() -> String {
    "placidus".to_string()
}

fn default_truncation_margin() -> usize {
    Limits::default().truncation_margin
}

fn default_max_asteroid_number() -> u32 {
    Limits::default().max_asteroid_number
}

/// Config text from `$URANIA_CONFIG`, else the first of the usual relative
/// paths. `None` when no file exists.
pub fn read_config_toml_text() -> anyhow::Result<Option<String>> {
    if let Ok(path) = env::var(CONFIG_ENV) {
        let text = fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Failed to read {} ({}): {e}", CONFIG_ENV, path))?;
        return Ok(Some(text));
    }
    for p in &CONFIG_PATHS {
        if let Ok(c) = fs::read_to_string(p) {
            log::debug!("Loaded config from {}", p);
            return Ok(Some(c));
        }
    }
    Ok(None)
}

pub fn parse_settings(text: &str) -> anyhow::Result<UraniaSettings> {
    let root: RootConfigToml =
        toml::from_str(text).map_err(|e| anyhow::anyhow!("Failed to parse urania.toml: {e}"))?;

    let house_system = HouseSystem::from_name(&root.defaults.house_system)
        .map_err(|e| anyhow::anyhow!("defaults.house_system: {e}"))?;

    if root.limits.max_asteroid_number == 0 {
        anyhow::bail!("limits.max_asteroid_number must be at least 1");
    }

    let defaults = Capacities::default();
    let c = &root.capacities;
    let capacities = Capacities {
        chart: c.chart.unwrap_or(defaults.chart),
        planets: c.planets.unwrap_or(defaults.planets),
        houses: c.houses.unwrap_or(defaults.houses),
        nodes: c.nodes.unwrap_or(defaults.nodes),
        asteroids: c.asteroids.unwrap_or(defaults.asteroids),
        single: c.single.unwrap_or(defaults.single),
    };
    for (name, value) in [
        ("chart", capacities.chart),
        ("planets", capacities.planets),
        ("houses", capacities.houses),
        ("nodes", capacities.nodes),
        ("asteroids", capacities.asteroids),
        ("single", capacities.single),
    ] {
        if value == 0 {
            anyhow::bail!("capacities.{} must be greater than zero", name);
        }
    }

    if root.ephemeris.path.trim().is_empty() {
        anyhow::bail!("ephemeris.path must not be empty");
    }

    Ok(UraniaSettings {
        ephemeris_path: PathBuf::from(root.ephemeris.path),
        house_system,
        limits: Limits {
            capacities,
            truncation_margin: root.limits.truncation_margin,
            max_asteroid_number: root.limits.max_asteroid_number,
        },
    })
}

pub fn load_settings_from(path: &Path) -> anyhow::Result<UraniaSettings> {
    let text = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
    parse_settings(&text)
}

/// Replace the ephemeris path when the override is set and non-empty.
pub fn apply_path_override(mut settings: UraniaSettings, path: Option<String>) -> UraniaSettings {
    if let Some(path) = path.filter(|p| !p.is_empty()) {
        settings.ephemeris_path = PathBuf::from(path);
    }
    settings
}

/// Settings from the config file (defaults when there is none), with the
/// environment's ephemeris path applied on top.
pub fn load_settings() -> anyhow::Result<UraniaSettings> {
    let settings = match read_config_toml_text()? {
        Some(text) => parse_settings(&text)?,
        None => {
            log::debug!("No urania.toml found in {:?}; using defaults", CONFIG_PATHS);
            UraniaSettings::default()
        }
    };
    Ok(apply_path_override(settings, env::var(EPHEMERIS_PATH_ENV).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(parse_settings("").unwrap(), UraniaSettings::default());
    }

    #[test]
    fn test_full_config() {
        let text = r#"
            [ephemeris]
            path = "/usr/share/ephe"

            [defaults]
            house_system = "koch"

            [limits]
            truncation_margin = 500
            max_asteroid_number = 200

            [capacities]
            asteroids = 250000
        "#;
        let settings = parse_settings(text).unwrap();
        assert_eq!(settings.ephemeris_path, PathBuf::from("/usr/share/ephe"));
        assert_eq!(settings.house_system, HouseSystem::KOCH);
        assert_eq!(settings.limits.truncation_margin, 500);
        assert_eq!(settings.limits.max_asteroid_number, 200);
        assert_eq!(settings.limits.capacities.asteroids, 250_000);
        assert_eq!(settings.limits.capacities.chart, 100_000);
    }

    #[test]
    fn test_house_system_letter_accepted() {
        let settings = parse_settings("[defaults]\nhouse_system = \"W\"\n").unwrap();
        assert_eq!(settings.house_system, HouseSystem::WHOLE_SIGN);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(parse_settings("[defaults]\nhouse_system = \"vedic\"\n").is_err());
        assert!(parse_settings("[capacities]\nsingle = 0\n").is_err());
        assert!(parse_settings("[limits]\nmax_asteroid_number = 0\n").is_err());
        assert!(parse_settings("[ephemeris]\npath = \"\"\n").is_err());
        assert!(parse_settings("[unknown]\nkey = 1\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ephemeris]\npath = \"data/eph\"").unwrap();
        let settings = load_settings_from(file.path()).unwrap();
        assert_eq!(settings.ephemeris_path, PathBuf::from("data/eph"));
        assert_eq!(settings.ephemeris_config().data_path, Some(PathBuf::from("data/eph")));
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_settings_from(&dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_path_override() {
        let base = UraniaSettings::default();
        assert_eq!(
            apply_path_override(base.clone(), Some("/opt/eph".into())).ephemeris_path,
            PathBuf::from("/opt/eph")
        );
        assert_eq!(apply_path_override(base.clone(), Some(String::new())), base);
        assert_eq!(apply_path_override(base.clone(), None), base);
    }
}
