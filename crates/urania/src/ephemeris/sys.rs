//! Raw declarations for the parts of libswe the engine calls.

use std::os::raw::{c_char, c_double, c_int};

// The native library itself is compiled and linked by the `swisseph` crate.
use swisseph as _;

/// Size of the engine's error/name buffers.
pub const AS_MAXCH: usize = 256;

extern "C" {
    pub fn swe_set_ephe_path(path: *const c_char);

    pub fn swe_calc_ut(
        tjd_ut: c_double,
        ipl: c_int,
        iflag: c_int,
        xx: *mut c_double,
        serr: *mut c_char,
    ) -> c_int;

    pub fn swe_houses_ex(
        tjd_ut: c_double,
        iflag: c_int,
        geolat: c_double,
        geolon: c_double,
        hsys: c_int,
        cusps: *mut c_double,
        ascmc: *mut c_double,
    ) -> c_int;

    pub fn swe_nod_aps(
        tjd_et: c_double,
        ipl: c_int,
        iflag: c_int,
        method: c_int,
        xnasc: *mut c_double,
        xndsc: *mut c_double,
        xperi: *mut c_double,
        xaphe: *mut c_double,
        serr: *mut c_char,
    ) -> c_int;

    pub fn swe_deltat_ex(tjd: c_double, iflag: c_int, serr: *mut c_char) -> c_double;

    pub fn swe_get_planet_name(ipl: c_int, spname: *mut c_char) -> *mut c_char;
}
