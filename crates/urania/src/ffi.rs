//! C ABI over the assembler.
//!
//! Every string returned here is a NUL-terminated JSON (or display) string
//! owned by the caller, who must hand it back to [`urania_free`]. Invalid
//! input never panics across the boundary; it yields an error document.

use crate::chart::julian_day_document;
use crate::dms::{format_degrees, FormatFlags};
use crate::json::{error_document, OwnedJson};
use crate::time::CalendarMoment;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_double, c_int};
use std::ptr;

fn into_raw(text: String) -> *mut c_char {
    match CString::new(text) {
        Ok(c) => c.into_raw(),
        Err(_) => CString::new(error_document("Output contained a NUL byte").into_string())
            .map(CString::into_raw)
            .unwrap_or(ptr::null_mut()),
    }
}

fn json_to_raw(json: OwnedJson) -> *mut c_char {
    into_raw(json.into_string())
}

fn ffi_boundary(f: impl FnOnce() -> OwnedJson) -> *mut c_char {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(json) => json_to_raw(json),
        Err(_) => json_to_raw(error_document("Internal error")),
    }
}

/// Borrow a caller string as UTF-8.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string valid for `'a`.
#[cfg_attr(not(feature = "swisseph"), allow(dead_code))]
unsafe fn borrow_str<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, OwnedJson> {
    if ptr.is_null() {
        return Err(error_document(&format!("Null pointer passed for {}", what)));
    }
    // SAFETY: checked for null; the caller guarantees NUL termination.
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| error_document(&format!("{} is not valid UTF-8", what)))
}

fn moment(
    year: c_int,
    month: c_int,
    day: c_int,
    hour: c_int,
    minute: c_int,
    second: c_int,
) -> Result<CalendarMoment, OwnedJson> {
    CalendarMoment::new(year, month, day, hour, minute, second)
        .map_err(|e| error_document(&e.to_string()))
}

/// Release a string returned by any `urania_*` function. Null is ignored.
///
/// # Safety
/// `ptr` must be null or a pointer returned by this library that has not
/// been freed yet.
#[no_mangle]
pub unsafe extern "C" fn urania_free(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    // SAFETY: ownership is transferred back from a pointer created by CString::into_raw.
    unsafe { drop(CString::from_raw(ptr)) };
}

/// Display string for an angle; `flags` combines the `FormatFlags` bits.
#[no_mangle]
pub extern "C" fn urania_degrees_to_dms(degrees: c_double, flags: c_int) -> *mut c_char {
    let text = std::panic::catch_unwind(|| format_degrees(degrees, FormatFlags::from_bits(flags as u32)))
        .unwrap_or_default();
    into_raw(text)
}

#[no_mangle]
pub extern "C" fn urania_get_julian_day(
    year: c_int,
    month: c_int,
    day: c_int,
    hour: c_int,
    minute: c_int,
    second: c_int,
) -> *mut c_char {
    ffi_boundary(|| match moment(year, month, day, hour, minute, second) {
        Ok(m) => julian_day_document(&m),
        Err(doc) => doc,
    })
}

#[cfg(feature = "swisseph")]
pub use self::engine_calls::*;

#[cfg(feature = "swisseph")]
mod engine_calls {
    use super::*;
    use crate::chart::{ChartAssembler, Limits};
    use crate::coords::{GeoCoordinate, GeoLocation};
    use crate::ephemeris::{EphemerisAdapter, EphemerisConfig, HouseSystem, NodeMethod, SwissEphemeris};
    use std::path::Path;

    /// Data directory used when `SWISS_EPHEMERIS_PATH` is unset.
    const DEFAULT_DATA_PATH: &str = "eph";

    lazy_static::lazy_static! {
        static ref ASSEMBLER: ChartAssembler<SwissEphemeris> = {
            let mut config = EphemerisConfig::from_env();
            if config.data_path.is_none() {
                config = EphemerisConfig::with_data_path(DEFAULT_DATA_PATH);
            }
            ChartAssembler::new(EphemerisAdapter::new(SwissEphemeris::new(), config), Limits::default())
        };
    }

    fn letter(c: c_char) -> char {
        c as u8 as char
    }

    #[allow(clippy::too_many_arguments)]
    fn location(
        lon_deg: c_int,
        lon_min: c_int,
        lon_sec: c_int,
        lon_hem: c_char,
        lat_deg: c_int,
        lat_min: c_int,
        lat_sec: c_int,
        lat_hem: c_char,
    ) -> Result<GeoLocation, OwnedJson> {
        let lon = GeoCoordinate::longitude(lon_deg.into(), lon_min.into(), lon_sec.into(), letter(lon_hem));
        let lat = GeoCoordinate::latitude(lat_deg.into(), lat_min.into(), lat_sec.into(), letter(lat_hem));
        lon.and_then(|lon| lat.and_then(|lat| GeoLocation::from_coordinates(&lat, &lon)))
            .map_err(|e| error_document(&e.to_string()))
    }

    fn house_system(code: c_char) -> Result<HouseSystem, OwnedJson> {
        HouseSystem::from_code(letter(code)).map_err(|e| error_document(&e.to_string()))
    }

    /// Capacity override; zero or negative selects the default.
    fn capacity(buflen: c_int) -> Option<usize> {
        usize::try_from(buflen).ok().filter(|&n| n > 0)
    }

    /// Full chart: planets, Ascendant/Midheaven and house cusps.
    #[no_mangle]
    #[allow(clippy::too_many_arguments)]
    pub extern "C" fn urania_get(
        year: c_int,
        month: c_int,
        day: c_int,
        hour: c_int,
        minute: c_int,
        second: c_int,
        lon_deg: c_int,
        lon_min: c_int,
        lon_sec: c_int,
        lon_hem: c_char,
        lat_deg: c_int,
        lat_min: c_int,
        lat_sec: c_int,
        lat_hem: c_char,
        house: c_char,
    ) -> *mut c_char {
        ffi_boundary(|| {
            let inputs = moment(year, month, day, hour, minute, second).and_then(|m| {
                let loc = location(lon_deg, lon_min, lon_sec, lon_hem, lat_deg, lat_min, lat_sec, lat_hem)?;
                Ok((m, loc, house_system(house)?))
            });
            match inputs {
                Ok((m, loc, system)) => ASSEMBLER.chart(&m, &loc, system),
                Err(doc) => doc,
            }
        })
    }

    #[no_mangle]
    pub extern "C" fn urania_get_planets(
        year: c_int,
        month: c_int,
        day: c_int,
        hour: c_int,
        minute: c_int,
        second: c_int,
    ) -> *mut c_char {
        ffi_boundary(|| match moment(year, month, day, hour, minute, second) {
            Ok(m) => ASSEMBLER.planets(&m),
            Err(doc) => doc,
        })
    }

    #[no_mangle]
    #[allow(clippy::too_many_arguments)]
    pub extern "C" fn urania_get_houses(
        year: c_int,
        month: c_int,
        day: c_int,
        hour: c_int,
        minute: c_int,
        second: c_int,
        lon_deg: c_int,
        lon_min: c_int,
        lon_sec: c_int,
        lon_hem: c_char,
        lat_deg: c_int,
        lat_min: c_int,
        lat_sec: c_int,
        lat_hem: c_char,
        house: c_char,
    ) -> *mut c_char {
        ffi_boundary(|| {
            let inputs = moment(year, month, day, hour, minute, second).and_then(|m| {
                let loc = location(lon_deg, lon_min, lon_sec, lon_hem, lat_deg, lat_min, lat_sec, lat_hem)?;
                Ok((m, loc, house_system(house)?))
            });
            match inputs {
                Ok((m, loc, system)) => ASSEMBLER.houses(&m, &loc, system),
                Err(doc) => doc,
            }
        })
    }

    #[no_mangle]
    pub extern "C" fn urania_get_planet(
        body: c_int,
        year: c_int,
        month: c_int,
        day: c_int,
        hour: c_int,
        minute: c_int,
        second: c_int,
    ) -> *mut c_char {
        ffi_boundary(|| match moment(year, month, day, hour, minute, second) {
            Ok(m) => ASSEMBLER.body(body, &m),
            Err(doc) => doc,
        })
    }

    #[no_mangle]
    #[allow(clippy::too_many_arguments)]
    pub extern "C" fn urania_get_planetary_nodes(
        year: c_int,
        month: c_int,
        day: c_int,
        hour: c_int,
        minute: c_int,
        second: c_int,
        method: c_int,
        buflen: c_int,
    ) -> *mut c_char {
        ffi_boundary(|| match moment(year, month, day, hour, minute, second) {
            Ok(m) => ASSEMBLER.nodes(&m, NodeMethod::from_bits(method), capacity(buflen)),
            Err(doc) => doc,
        })
    }

    #[no_mangle]
    pub extern "C" fn urania_get_single_planet_nodes(
        body: c_int,
        jd_et: c_double,
        method: c_int,
        buflen: c_int,
    ) -> *mut c_char {
        ffi_boundary(|| {
            ASSEMBLER.body_nodes(body, jd_et, NodeMethod::from_bits(method), capacity(buflen))
        })
    }

    #[no_mangle]
    #[allow(clippy::too_many_arguments)]
    pub extern "C" fn urania_get_asteroids(
        year: c_int,
        month: c_int,
        day: c_int,
        hour: c_int,
        minute: c_int,
        second: c_int,
        start: c_int,
        end: c_int,
        buflen: c_int,
    ) -> *mut c_char {
        ffi_boundary(|| match moment(year, month, day, hour, minute, second) {
            Ok(m) => ASSEMBLER.asteroid_range(&m, start, end, capacity(buflen)),
            Err(doc) => doc,
        })
    }

    /// # Safety
    /// `list` must be null or a NUL-terminated string.
    #[no_mangle]
    #[allow(clippy::too_many_arguments)]
    pub unsafe extern "C" fn urania_get_specific_asteroids(
        year: c_int,
        month: c_int,
        day: c_int,
        hour: c_int,
        minute: c_int,
        second: c_int,
        list: *const c_char,
        buflen: c_int,
    ) -> *mut c_char {
        ffi_boundary(|| {
            // SAFETY: forwarded from this function's contract.
            let inputs = moment(year, month, day, hour, minute, second)
                .and_then(|m| Ok((m, unsafe { borrow_str(list, "asteroid list") }?)));
            match inputs {
                Ok((m, list)) => ASSEMBLER.asteroid_list(&m, list, capacity(buflen)),
                Err(doc) => doc,
            }
        })
    }

    /// # Safety
    /// `path` must be null or a NUL-terminated string.
    #[no_mangle]
    pub unsafe extern "C" fn urania_set_ephemeris_path(path: *const c_char) -> *mut c_char {
        ffi_boundary(|| {
            // SAFETY: forwarded from this function's contract.
            match unsafe { borrow_str(path, "ephemeris path") } {
                Ok(path) => ASSEMBLER.set_data_path(Path::new(path)),
                Err(doc) => doc,
            }
        })
    }

    #[no_mangle]
    pub extern "C" fn urania_get_ephemeris_info() -> *mut c_char {
        ffi_boundary(|| ASSEMBLER.ephemeris_info())
    }
}
