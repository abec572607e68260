//! Start/encode/decode/end driver over one encoder and one decoder.

use std::time::Duration;

use tracing::info;

use super::decoder::OggOpusDecoder;
use super::encoder::OggOpusEncoder;
use crate::config::StreamConfig;
use crate::error::Result;

/// Totals reported when a codec session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodecSummary {
    pub encoded_packets: u64,
    pub encoded_duration: Duration,
    pub decoded_samples: u64,
    pub decoded_duration: Duration,
}

/// One encode stream and one decode stream carried across calls.
///
/// The two directions are independent: [`encode`](Self::encode) produces an
/// Ogg Opus stream from PCM, [`decode`](Self::decode) consumes any Ogg Opus
/// stream. Not meant to be shared between threads without a lock.
#[derive(Debug)]
pub struct OggOpusCodec {
    encoder: OggOpusEncoder,
    decoder: OggOpusDecoder,
}

impl OggOpusCodec {
    /// Starts a session. The config applies to the encode direction; the
    /// decode direction takes its parameters from the stream's ID header.
    pub fn start(config: StreamConfig) -> Result<Self> {
        Ok(Self {
            encoder: OggOpusEncoder::new(config)?,
            decoder: OggOpusDecoder::new(),
        })
    }

    /// Encodes a chunk of PCM; `last` closes the encode stream.
    pub fn encode(&mut self, pcm: &[u8], last: bool) -> Result<Vec<u8>> {
        self.encoder.feed(pcm, last)
    }

    /// Decodes a chunk of container bytes; `last` closes the decode stream.
    pub fn decode(&mut self, ogg: &[u8], last: bool) -> Result<Vec<u8>> {
        self.decoder.decode(ogg, last)
    }

    /// Returns the encoding half of the session.
    pub fn encoder(&self) -> &OggOpusEncoder {
        &self.encoder
    }

    /// Returns the decoding half of the session.
    pub fn decoder(&self) -> &OggOpusDecoder {
        &self.decoder
    }

    /// Ends the session and releases both codec handles.
    pub fn end(self) -> CodecSummary {
        let summary = CodecSummary {
            encoded_packets: self.encoder.audio_packets(),
            encoded_duration: self.encoder.duration(),
            decoded_samples: self.decoder.decoded_samples(),
            decoded_duration: self.decoder.duration(),
        };
        info!(
            "Codec session ended: encoded {:.3}s, decoded {:.3}s",
            summary.encoded_duration.as_secs_f64(),
            summary.decoded_duration.as_secs_f64()
        );
        summary
    }
}
