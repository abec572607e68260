//! Incremental PCM to Ogg Opus encoder.

use std::time::Duration;

use tracing::{debug, info};

use super::accumulator::FrameAccumulator;
use super::adapter::EncoderAdapter;
use super::header::{CommentHeader, IdHeader};
use super::page_builder::PageBuilder;
use super::granule_duration;
use crate::codec::ogg::Packet;
use crate::config::StreamConfig;
use crate::error::{Error, Result};

/// Encoder lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderPhase {
    /// Nothing written yet.
    NotStarted,
    /// ID and comment header pages written, no audio yet.
    HeadersEmitted,
    /// Audio packets are being written.
    Streaming,
    /// The final call completed; the stream is closed.
    Ended,
    /// A call failed fatally; the stream must be dropped.
    Failed,
}

/// Turns PCM chunks of any size into Ogg Opus pages.
///
/// Each [`feed`](Self::feed) returns the container bytes completed by that
/// call. Concatenating the outputs gives the same stream no matter how the
/// input was split, as long as only the last call is final.
///
/// The most recent audio packet is held back until the next frame arrives
/// or the stream ends, so the end-of-stream flag can always be put on the
/// last real packet.
#[derive(Debug)]
pub struct OggOpusEncoder {
    config: StreamConfig,
    adapter: EncoderAdapter,
    accumulator: FrameAccumulator,
    pages: PageBuilder,
    phase: EncoderPhase,
    packet_sequence: i64,
    granule_position: i64,
    granule_increment: i64,
    held: Option<Vec<u8>>,
    audio_packets: u64,
}

impl OggOpusEncoder {
    /// Validates `config` and sets up the codec and a fresh logical stream.
    pub fn new(config: StreamConfig) -> Result<Self> {
        config.validate()?;

        let adapter = EncoderAdapter::new(&config)?;
        let serial = config.resolve_serial();
        debug!(
            "Encoder ready: {}Hz, {} channel(s), {} samples/frame ({:?}), serial {:#010x}",
            config.sample_rate,
            config.channels,
            config.frame_size,
            config.frame_duration(),
            serial
        );
        debug!(
            "Codec lookahead {} samples, header pre-skip {} samples at 48kHz",
            adapter.lookahead(),
            config.pre_skip
        );

        Ok(Self {
            accumulator: FrameAccumulator::new(config.frame_bytes()),
            pages: PageBuilder::new(serial),
            granule_increment: config.granule_increment(),
            adapter,
            config,
            phase: EncoderPhase::NotStarted,
            packet_sequence: 0,
            granule_position: 0,
            held: None,
            audio_packets: 0,
        })
    }

    /// Returns the configuration the stream was started with.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Returns the current lifecycle phase.
    pub fn phase(&self) -> EncoderPhase {
        self.phase
    }

    /// Serial number of the logical stream.
    pub fn serial(&self) -> u32 {
        self.pages.serial()
    }

    /// Packet number the next packet will get. Headers take 0 and 1.
    pub fn packet_sequence(&self) -> i64 {
        self.packet_sequence
    }

    /// Granule position, at 48kHz, the next audio packet will get.
    pub fn granule_position(&self) -> i64 {
        self.granule_position
    }

    /// Audio packets written to pages so far.
    pub fn audio_packets(&self) -> u64 {
        self.audio_packets
    }

    /// Audio duration written so far.
    pub fn duration(&self) -> Duration {
        granule_duration(self.granule_position)
    }

    /// Consumes a chunk of interleaved 16-bit little-endian PCM.
    ///
    /// Returns the container bytes completed by this call, which may be
    /// empty. With `is_final` set, the remainder is zero-padded into a last
    /// frame and the stream is closed with an end-of-stream page.
    ///
    /// After a fatal error every further call fails with [`Error::Aborted`].
    pub fn feed(&mut self, pcm: &[u8], is_final: bool) -> Result<Vec<u8>> {
        match self.phase {
            EncoderPhase::Ended => return Err(Error::StreamEnded),
            EncoderPhase::Failed => return Err(Error::Aborted),
            _ => {}
        }

        let result = self.feed_inner(pcm, is_final);
        if result.is_err() {
            self.phase = EncoderPhase::Failed;
        }
        result
    }

    fn feed_inner(&mut self, pcm: &[u8], is_final: bool) -> Result<Vec<u8>> {
        let mut out = Vec::new();

        if self.phase == EncoderPhase::NotStarted {
            self.write_headers(&mut out)?;
        }

        for frame in self.accumulator.push(pcm, is_final) {
            let packet = self.adapter.encode_frame(&frame)?;
            if let Some(previous) = self.held.replace(packet) {
                self.write_audio(previous, false, &mut out)?;
            }
        }

        if is_final {
            match self.held.take() {
                Some(last) => {
                    self.write_audio(last, true, &mut out)?;
                    out.extend(self.pages.flush());
                }
                None => out.extend(self.pages.finish()),
            }
            self.phase = EncoderPhase::Ended;
            info!(
                "Encoding completed: {} packets, {} pages, audio duration {:.3}s",
                self.audio_packets,
                self.pages.pages_written(),
                self.duration().as_secs_f64()
            );
        }

        Ok(out)
    }

    fn write_headers(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let id = IdHeader {
            channels: self.config.channels,
            pre_skip: self.config.pre_skip,
            input_sample_rate: self.config.sample_rate,
            output_gain: self.config.output_gain,
            mapping_family: 0,
        };
        let packet = Packet::new(id.to_bytes(), 0, self.packet_sequence).with_bos(true);
        out.extend(self.pages.packet_in(&packet)?);
        out.extend(self.pages.flush());
        self.packet_sequence += 1;

        let tags = CommentHeader::new(self.config.vendor.clone(), self.config.comments.clone());
        let packet = Packet::new(tags.to_bytes(), 0, self.packet_sequence);
        out.extend(self.pages.packet_in(&packet)?);
        out.extend(self.pages.flush());
        self.packet_sequence += 1;

        self.phase = EncoderPhase::HeadersEmitted;
        debug!("Wrote OpusHead and OpusTags for stream {:#010x}", self.serial());
        Ok(())
    }

    /// Submits one audio packet; counters advance only once it is accepted.
    fn write_audio(&mut self, data: Vec<u8>, eos: bool, out: &mut Vec<u8>) -> Result<()> {
        let packet = Packet::new(data, self.granule_position, self.packet_sequence).with_eos(eos);
        out.extend(self.pages.packet_in(&packet)?);

        self.granule_position += self.granule_increment;
        self.packet_sequence += 1;
        self.audio_packets += 1;
        self.phase = EncoderPhase::Streaming;
        Ok(())
    }
}
