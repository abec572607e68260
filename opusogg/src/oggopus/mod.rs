//! Incremental Ogg Opus muxing and demuxing.
//!
//! - [`OggOpusEncoder`]: PCM chunks in, Ogg pages out
//! - [`OggOpusDecoder`]: Ogg bytes in, PCM out
//! - [`OggOpusCodec`]: one of each behind a start/encode/decode/end API
//!
//! Both directions keep all state between calls, so input may be split at
//! any byte.

mod accumulator;
mod adapter;
mod codec;
mod decoder;
mod encoder;
mod header;
mod page_builder;

use std::time::Duration;

use crate::config::GRANULE_RATE;

pub use accumulator::FrameAccumulator;
pub use adapter::{DecoderAdapter, EncoderAdapter};
pub use codec::{CodecSummary, OggOpusCodec};
pub use decoder::{DecoderPhase, OggOpusDecoder};
pub use encoder::{EncoderPhase, OggOpusEncoder};
pub use header::{
    CommentHeader, ID_HEADER_SIZE, IdHeader, OPUS_HEAD_MAGIC, OPUS_TAGS_MAGIC, validate_tags,
};
pub use page_builder::PageBuilder;

/// Converts a 48kHz granule count into a duration.
pub fn granule_duration(granule: i64) -> Duration {
    Duration::from_micros(granule.max(0) as u64 * 1_000_000 / GRANULE_RATE as u64)
}
