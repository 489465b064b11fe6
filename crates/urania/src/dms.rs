//! Degree / sexagesimal formatting.
//!
//! Renders a decimal angle either as plain degrees (`185°45'32.1234`) or in
//! zodiac notation (` 5 li 45'32.1234`), where the sign is one of the twelve
//! two-letter abbreviations and the degrees count within that sign.

use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// Two-letter sign abbreviations, Aries first.
pub const ZODIAC_SIGNS: [&str; 12] = [
    "ar", "ta", "ge", "cn", "le", "vi", "li", "sc", "sa", "cp", "aq", "pi",
];

pub const DEGREE_SYMBOL: &str = "°";
pub const HOUR_SYMBOL: &str = "h";

/// Display options for [`format_degrees`]. Bit values match the exported C ABI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormatFlags(u32);

impl FormatFlags {
    pub const NONE: Self = Self(0);
    /// Round to the nearest second and drop the fractional part.
    pub const ROUND_SEC: Self = Self(1);
    /// Round to the nearest minute and drop seconds.
    pub const ROUND_MIN: Self = Self(2);
    /// Zodiac sign notation.
    pub const ZODIAC: Self = Self(4);
    /// Same bit as the engine's equatorial flag; switches the unit to `h`.
    pub const EQUATORIAL: Self = Self(2048);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for FormatFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Precision {
    Minute,
    Second,
    Fraction,
}

impl Precision {
    fn from_flags(flags: FormatFlags) -> Self {
        if flags.contains(FormatFlags::ROUND_MIN) {
            Precision::Minute
        } else if flags.contains(FormatFlags::ROUND_SEC) {
            Precision::Second
        } else {
            Precision::Fraction
        }
    }

    fn rounding_offset(self) -> f64 {
        match self {
            Precision::Minute => 0.5 / 60.0,
            Precision::Second => 0.5 / 3600.0,
            Precision::Fraction => 0.0,
        }
    }
}

/// Normalize into [0, 360).
pub fn normalize_degrees(degrees: f64) -> f64 {
    let r = degrees.rem_euclid(360.0);
    if r >= 360.0 {
        r - 360.0
    } else {
        r
    }
}

/// Sign index (0-11) for an ecliptic longitude.
pub fn sign_index(longitude: f64) -> usize {
    ((normalize_degrees(longitude) / 30.0) as usize).min(11)
}

/// Format a decimal angle for display.
pub fn format_degrees(degrees: f64, flags: FormatFlags) -> String {
    let negative = degrees < 0.0;
    let precision = Precision::from_flags(flags);

    // Rounding can push 359.99... up to 360, which must wrap back to sign 0.
    let value = normalize_degrees(normalize_degrees(degrees.abs()) + precision.rounding_offset());

    let zodiac = flags.contains(FormatFlags::ZODIAC);
    let in_unit = if zodiac { value % 30.0 } else { value };
    let parts = Sexagesimal::split(in_unit);

    let mut out = String::with_capacity(24);
    if zodiac {
        let sign = ZODIAC_SIGNS[sign_index(value)];
        out.push_str(&format!("{:2} {} {:2}", parts.degrees, sign, parts.minutes));
        match precision {
            Precision::Minute => {}
            Precision::Second => {
                out.push_str(&format!("'{:2}", parts.seconds));
            }
            Precision::Fraction => {
                out.push_str(&format!("'{:2}.{:04}", parts.seconds, parts.fraction));
            }
        }
    } else {
        let symbol = if flags.contains(FormatFlags::EQUATORIAL) {
            HOUR_SYMBOL
        } else {
            DEGREE_SYMBOL
        };
        out.push_str(&format!("{:3}{}{:2}", parts.degrees, symbol, parts.minutes));
        match precision {
            Precision::Minute => out.push('\''),
            Precision::Second => {
                out.push_str(&format!("'{:2}", parts.seconds));
            }
            Precision::Fraction => {
                out.push_str(&format!("'{:2}.{:04}", parts.seconds, parts.fraction));
            }
        }
    }

    if negative {
        apply_minus(&mut out);
    }
    out
}

struct Sexagesimal {
    degrees: i64,
    minutes: i64,
    seconds: i64,
    /// Ten-thousandths of a second.
    fraction: i64,
}

impl Sexagesimal {
    fn split(value: f64) -> Self {
        let degrees = value.trunc() as i64;
        let minutes_f = (value - degrees as f64) * 60.0;
        let minutes = (minutes_f as i64).clamp(0, 59);
        let seconds_f = (minutes_f - minutes as f64) * 60.0;
        let seconds = (seconds_f as i64).clamp(0, 59);
        let fraction = (((seconds_f - seconds as f64) * 10000.0) as i64).clamp(0, 9999);
        Self {
            degrees,
            minutes,
            seconds,
            fraction,
        }
    }
}

/// Put a `-` directly in front of the first digit, reusing a padding space
/// when there is one.
fn apply_minus(out: &mut String) {
    let Some(first_digit) = out.find(|c: char| c.is_ascii_digit()) else {
        return;
    };
    if first_digit > 0 && out.as_bytes()[first_digit - 1] == b' ' {
        out.replace_range(first_digit - 1..first_digit, "-");
    } else {
        out.insert(first_digit, '-');
    }
}
