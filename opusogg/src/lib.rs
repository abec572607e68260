//! Incremental Opus-in-Ogg encoding and decoding.
//!
//! This crate turns arbitrary-sized chunks of 16-bit PCM into an Ogg Opus
//! stream and back, carrying all state between calls:
//!
//! - `oggopus`: the chunked muxer ([`OggOpusEncoder`]), demuxer
//!   ([`OggOpusDecoder`]) and the [`OggOpusCodec`] driver
//! - `codec`: the Opus codec (libopus) and Ogg framing primitives
//! - `config`: [`StreamConfig`]
//! - `pcm`: sample/byte conversion
//!
//! # Example
//!
//! ```ignore
//! use opusogg::{OggOpusDecoder, OggOpusEncoder, StreamConfig};
//!
//! // 24kHz mono, 20ms frames
//! let mut encoder = OggOpusEncoder::new(StreamConfig::default())?;
//! let mut ogg = encoder.feed(&pcm_part1, false)?;
//! ogg.extend(encoder.feed(&pcm_part2, true)?);
//!
//! let mut decoder = OggOpusDecoder::new();
//! let pcm = decoder.decode(&ogg, true)?;
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod oggopus;
pub mod pcm;

pub use config::StreamConfig;
pub use error::{ContainerError, Error, Result};
pub use oggopus::{OggOpusCodec, OggOpusDecoder, OggOpusEncoder};
