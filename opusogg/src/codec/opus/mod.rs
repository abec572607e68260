//! Opus audio codec.
//!
//! Thin owned wrappers around libopus (RFC 6716) via FFI. Each wrapper owns
//! its native handle exclusively and releases it on drop.
//!
//! # Example
//!
//! ```ignore
//! use opusogg::codec::opus::{Application, Decoder, Encoder, MAX_FRAME_SIZE};
//!
//! let mut encoder = Encoder::new(24000, 1, Application::Audio)?;
//! encoder.set_bitrate(48000)?;
//!
//! let pcm = vec![0i16; 480]; // 20ms at 24kHz
//! let packet = encoder.encode(&pcm, 480)?;
//!
//! let mut decoder = Decoder::new(24000, 1)?;
//! let decoded = decoder.decode(&packet, MAX_FRAME_SIZE)?;
//! ```

mod ffi;
mod encoder;
mod decoder;

pub use encoder::*;
pub use decoder::*;

/// Largest frame a packet can decode to, per channel (120ms at 48kHz).
pub const MAX_FRAME_SIZE: usize = 5760;

/// Upper bound on the size of one encoded packet.
pub const MAX_PACKET_SIZE: usize = 4000;

/// Sample rates libopus can encode and decode at.
pub const SUPPORTED_RATES: [u32; 5] = [8000, 12000, 16000, 24000, 48000];

/// Returns true if libopus can run at `sample_rate`.
pub fn is_supported_rate(sample_rate: u32) -> bool {
    SUPPORTED_RATES.contains(&sample_rate)
}
