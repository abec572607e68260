//! Raw libopus declarations used by the owned wrappers.
//!
//! Only the single-stream encoder and decoder API is bound.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_uchar};

/// Opaque `OpusEncoder`.
pub enum OpusEncoder {}

/// Opaque `OpusDecoder`.
pub enum OpusDecoder {}

pub const OPUS_OK: c_int = 0;

/// `OPUS_APPLICATION_*` values for `opus_encoder_create`.
pub mod application {
    use std::os::raw::c_int;

    pub const VOIP: c_int = 2048;
    pub const AUDIO: c_int = 2049;
    pub const RESTRICTED_LOWDELAY: c_int = 2051;
}

/// `OPUS_SET_SIGNAL` arguments.
pub mod signal {
    use std::os::raw::c_int;

    pub const AUTO: c_int = -1000;
    pub const VOICE: c_int = 3001;
    pub const MUSIC: c_int = 3002;
}

/// CTL request codes from `opus_defines.h`.
pub mod ctl {
    use std::os::raw::c_int;

    pub const SET_BITRATE: c_int = 4002;
    pub const SET_VBR: c_int = 4006;
    pub const SET_COMPLEXITY: c_int = 4010;
    pub const SET_SIGNAL: c_int = 4024;
    pub const GET_LOOKAHEAD: c_int = 4027;
    pub const SET_GAIN: c_int = 4034;
    pub const SET_LSB_DEPTH: c_int = 4036;
}

unsafe extern "C" {
    pub fn opus_strerror(error: c_int) -> *const c_char;

    pub fn opus_encoder_create(
        fs: i32,
        channels: c_int,
        application: c_int,
        error: *mut c_int,
    ) -> *mut OpusEncoder;
    pub fn opus_encoder_destroy(st: *mut OpusEncoder);
    pub fn opus_encode(
        st: *mut OpusEncoder,
        pcm: *const i16,
        frame_size: c_int,
        data: *mut c_uchar,
        max_data_bytes: i32,
    ) -> i32;
    pub fn opus_encoder_ctl(st: *mut OpusEncoder, request: c_int, ...) -> c_int;

    pub fn opus_decoder_create(fs: i32, channels: c_int, error: *mut c_int) -> *mut OpusDecoder;
    pub fn opus_decoder_destroy(st: *mut OpusDecoder);
    pub fn opus_decode(
        st: *mut OpusDecoder,
        data: *const c_uchar,
        len: i32,
        pcm: *mut i16,
        frame_size: c_int,
        decode_fec: c_int,
    ) -> c_int;
    pub fn opus_decoder_ctl(st: *mut OpusDecoder, request: c_int, ...) -> c_int;
}

/// Human-readable text for a libopus status code.
pub fn error_string(code: c_int) -> String {
    // Safety: opus_strerror returns a static NUL-terminated string or null.
    let ptr = unsafe { opus_strerror(code) };
    if ptr.is_null() {
        return format!("opus error {}", code);
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// Maps a negative libopus return into its message.
pub fn check(ret: c_int) -> Result<c_int, String> {
    if ret < OPUS_OK {
        Err(error_string(ret))
    } else {
        Ok(ret)
    }
}
