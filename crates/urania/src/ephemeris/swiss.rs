//! [`EphemerisEngine`] backed by the native Swiss Ephemeris library.

use crate::ephemeris::engine::{BodyCalc, EngineError, EphemerisEngine, HouseCalc, NodeApsCalc};
use crate::ephemeris::sys;
use crate::ephemeris::types::{HouseSystem, NodeMethod};
use std::ffi::CString;
use std::os::raw::c_char;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

lazy_static::lazy_static! {
    // libswe keeps its data path and file handles in globals: every call goes
    // through this lock.
    static ref SWE: Mutex<SweState> = Mutex::new(SweState { data_path: None });
}

struct SweState {
    data_path: Option<PathBuf>,
}

fn lock() -> MutexGuard<'static, SweState> {
    SWE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to the process-wide native engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwissEphemeris;

impl SwissEphemeris {
    pub fn new() -> Self {
        Self
    }
}

/// Text up to the first NUL of an engine buffer.
fn buffer_text(buf: &[c_char]) -> String {
    let bytes: Vec<u8> = buf
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

impl EphemerisEngine for SwissEphemeris {
    fn calc_ut(&self, jd_ut: f64, body: i32, flags: i32) -> Result<BodyCalc, EngineError> {
        let mut values = [0.0f64; 6];
        let mut serr = [0 as c_char; sys::AS_MAXCH];
        let _guard = lock();
        // SAFETY: `values` holds 6 doubles and `serr` AS_MAXCH bytes, the sizes libswe writes.
        let status = unsafe {
            sys::swe_calc_ut(jd_ut, body, flags, values.as_mut_ptr(), serr.as_mut_ptr())
        };
        let message = buffer_text(&serr);
        if status < 0 {
            return Err(EngineError::new(status, message));
        }
        Ok(BodyCalc {
            status,
            values,
            message,
        })
    }

    fn houses(
        &self,
        jd_ut: f64,
        flags: i32,
        lat: f64,
        lon: f64,
        system: HouseSystem,
    ) -> Result<HouseCalc, EngineError> {
        // 37 slots so the Gauquelin sector system ('G') also fits.
        let mut cusps = [0.0f64; 37];
        let mut ascmc = [0.0f64; 10];
        let _guard = lock();
        // SAFETY: buffers are at least as large as libswe requires for any system.
        let status = unsafe {
            sys::swe_houses_ex(
                jd_ut,
                flags,
                lat,
                lon,
                system.code() as i32,
                cusps.as_mut_ptr(),
                ascmc.as_mut_ptr(),
            )
        };
        if status < 0 {
            return Err(EngineError::new(
                status,
                format!("House calculation failed for system '{}' at latitude {:.6}", system, lat),
            ));
        }
        let mut houses = [0.0f64; 12];
        houses.copy_from_slice(&cusps[1..=12]);
        Ok(HouseCalc {
            cusps: houses,
            ascendant: ascmc[0],
            midheaven: ascmc[1],
        })
    }

    fn nod_aps(
        &self,
        jd_et: f64,
        body: i32,
        flags: i32,
        method: NodeMethod,
    ) -> Result<NodeApsCalc, EngineError> {
        let mut asc = [0.0f64; 6];
        let mut dsc = [0.0f64; 6];
        let mut peri = [0.0f64; 6];
        let mut aphe = [0.0f64; 6];
        let mut serr = [0 as c_char; sys::AS_MAXCH];
        let _guard = lock();
        // SAFETY: four 6-double output vectors and an AS_MAXCH error buffer.
        let status = unsafe {
            sys::swe_nod_aps(
                jd_et,
                body,
                flags,
                method.bits(),
                asc.as_mut_ptr(),
                dsc.as_mut_ptr(),
                peri.as_mut_ptr(),
                aphe.as_mut_ptr(),
                serr.as_mut_ptr(),
            )
        };
        if status < 0 {
            return Err(EngineError::new(status, buffer_text(&serr)));
        }
        Ok(NodeApsCalc {
            ascending: asc,
            descending: dsc,
            perihelion: peri,
            aphelion: aphe,
        })
    }

    fn delta_t(&self, jd_ut: f64, flags: i32) -> f64 {
        let mut serr = [0 as c_char; sys::AS_MAXCH];
        let _guard = lock();
        // SAFETY: AS_MAXCH error buffer.
        let dt = unsafe { sys::swe_deltat_ex(jd_ut, flags, serr.as_mut_ptr()) };
        let warning = buffer_text(&serr);
        if !warning.is_empty() {
            log::debug!("delta T at {:.6}: {}", jd_ut, warning);
        }
        dt
    }

    fn body_name(&self, body: i32) -> String {
        let mut name = [0 as c_char; sys::AS_MAXCH];
        let _guard = lock();
        // SAFETY: AS_MAXCH name buffer.
        unsafe { sys::swe_get_planet_name(body, name.as_mut_ptr()) };
        buffer_text(&name)
    }

    fn set_data_path(&self, path: &Path) {
        let text = path.to_string_lossy();
        let c_path = match CString::new(text.as_bytes()) {
            Ok(p) => p,
            Err(_) => {
                log::error!("Ephemeris path contains a NUL byte: {:?}", text);
                return;
            }
        };
        let mut state = lock();
        // SAFETY: libswe copies the string before returning.
        unsafe { sys::swe_set_ephe_path(c_path.as_ptr()) };
        state.data_path = Some(path.to_path_buf());
    }

    fn data_path(&self) -> Option<PathBuf> {
        lock().data_path.clone()
    }
}
