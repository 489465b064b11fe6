//! Calendar moments and the Julian Day time base.

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Years in which the ephemeris files give full accuracy.
pub const HIGH_ACCURACY_YEARS: std::ops::RangeInclusive<i32> = 600..=2400;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("Invalid date: {year:04}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: i32, day: i32 },
    #[error("Invalid time of day: {hour:02}:{minute:02}:{second:02}")]
    InvalidTime { hour: i32, minute: i32, second: i32 },
}

/// A Gregorian date and UT time of day, to the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarMoment {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
}

impl CalendarMoment {
    pub fn new(
        year: i32,
        month: i32,
        day: i32,
        hour: i32,
        minute: i32,
        second: i32,
    ) -> Result<Self, CalendarError> {
        let date_ok = u32::try_from(month)
            .ok()
            .zip(u32::try_from(day).ok())
            .and_then(|(m, d)| NaiveDate::from_ymd_opt(year, m, d))
            .is_some();
        if !date_ok {
            return Err(CalendarError::InvalidDate { year, month, day });
        }
        if !(0..24).contains(&hour) || !(0..60).contains(&minute) || !(0..60).contains(&second) {
            return Err(CalendarError::InvalidTime {
                hour,
                minute,
                second,
            });
        }
        if !HIGH_ACCURACY_YEARS.contains(&year) {
            log::warn!(
                "Year {} is outside {}..={}; positions will have reduced accuracy",
                year,
                HIGH_ACCURACY_YEARS.start(),
                HIGH_ACCURACY_YEARS.end()
            );
        }
        Ok(Self {
            year,
            month: month as u32,
            day: day as u32,
            hour: hour as u32,
            minute: minute as u32,
            second: second as u32,
        })
    }

    /// Truncates to whole seconds.
    pub fn from_datetime(dt: &DateTime<Utc>) -> Self {
        Self {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
        }
    }

    pub fn now() -> Self {
        Self::from_datetime(&Utc::now())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn second(&self) -> u32 {
        self.second
    }

    pub fn decimal_hour(&self) -> f64 {
        self.hour as f64 + self.minute as f64 / 60.0 + self.second as f64 / 3600.0
    }

    /// Julian Day (UT), Gregorian calendar (Meeus, ch. 7).
    pub fn julian_day(&self) -> f64 {
        let (y, m) = if self.month <= 2 {
            (self.year as f64 - 1.0, self.month as f64 + 12.0)
        } else {
            (self.year as f64, self.month as f64)
        };
        let a = (y / 100.0).floor();
        let b = 2.0 - a + (a / 4.0).floor();
        let d = self.day as f64 + self.decimal_hour() / 24.0;

        (365.25 * (y + 4716.0)).floor() + (30.6001 * (m + 1.0)).floor() + d + b - 1524.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_julian_day_christmas_2023() {
        let moment = CalendarMoment::new(2023, 12, 25, 12, 0, 0).unwrap();
        assert_eq!(moment.julian_day(), 2460304.0);
    }

    #[test]
    fn test_julian_day_j2000() {
        let moment = CalendarMoment::new(2000, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(moment.julian_day(), 2451545.0);
    }

    #[test]
    fn test_julian_day_fractional() {
        let moment = CalendarMoment::new(2000, 1, 1, 18, 0, 0).unwrap();
        assert!((moment.julian_day() - 2451545.25).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            CalendarMoment::new(2023, 2, 30, 0, 0, 0),
            Err(CalendarError::InvalidDate { .. })
        ));
        assert!(matches!(
            CalendarMoment::new(2023, 13, 1, 0, 0, 0),
            Err(CalendarError::InvalidDate { .. })
        ));
        assert!(matches!(
            CalendarMoment::new(2023, 1, 1, 24, 0, 0),
            Err(CalendarError::InvalidTime { .. })
        ));
        assert!(matches!(
            CalendarMoment::new(2023, 1, 1, 0, 0, -1),
            Err(CalendarError::InvalidTime { .. })
        ));
    }

    #[test]
    fn test_from_datetime() {
        let dt = Utc.with_ymd_and_hms(2023, 12, 25, 12, 30, 15).unwrap();
        let moment = CalendarMoment::from_datetime(&dt);
        assert_eq!(moment, CalendarMoment::new(2023, 12, 25, 12, 30, 15).unwrap());
        assert_eq!(moment.decimal_hour(), 12.5 + 15.0 / 3600.0);
    }
}
