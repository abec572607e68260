//! Incremental Ogg Opus to PCM decoder.

use std::time::Duration;

use tracing::{debug, info, trace, warn};

use super::adapter::DecoderAdapter;
use super::header::{IdHeader, validate_tags};
use crate::codec::ogg::{Packet, PacketOut, Page, PageOut, StreamState, SyncState};
use crate::codec::opus::MAX_FRAME_SIZE;
use crate::error::{ContainerError, Error, Result};
use crate::pcm::samples_to_bytes;

/// Decoder lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderPhase {
    /// Waiting for the OpusHead packet.
    AwaitingIdHeader,
    /// OpusHead parsed; waiting for OpusTags.
    AwaitingCommentHeader,
    /// Decoding audio packets.
    Streaming,
    /// The final call completed.
    Ended,
    /// A call failed fatally; the stream must be dropped.
    Failed,
}

/// Turns Ogg Opus bytes, split anywhere, into interleaved 16-bit PCM.
///
/// Output is returned per call and grows with however many packets the
/// supplied bytes complete. Pre-skip samples are consumed while priming
/// the codec and are neither returned nor counted.
#[derive(Debug)]
pub struct OggOpusDecoder {
    sync: SyncState,
    stream: Option<StreamState>,
    phase: DecoderPhase,
    header: Option<IdHeader>,
    adapter: Option<DecoderAdapter>,
    pages: u64,
    skipped_bytes: usize,
    skipped_packets: u64,
    decoded_samples: u64,
    truncated: Option<usize>,
}

impl Default for OggOpusDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl OggOpusDecoder {
    /// Creates a decoder waiting for the first page of a stream.
    pub fn new() -> Self {
        Self {
            sync: SyncState::new(),
            stream: None,
            phase: DecoderPhase::AwaitingIdHeader,
            header: None,
            adapter: None,
            pages: 0,
            skipped_bytes: 0,
            skipped_packets: 0,
            decoded_samples: 0,
            truncated: None,
        }
    }

    /// Returns the current lifecycle phase.
    pub fn phase(&self) -> DecoderPhase {
        self.phase
    }

    /// The parsed ID header, once seen.
    pub fn header(&self) -> Option<&IdHeader> {
        self.header.as_ref()
    }

    /// Serial number of the stream being decoded.
    pub fn serial(&self) -> Option<u32> {
        self.stream.as_ref().map(|s| s.serial())
    }

    /// Rate of the returned PCM, once known.
    pub fn sample_rate(&self) -> Option<u32> {
        self.adapter.as_ref().map(|a| a.sample_rate())
    }

    /// Channel count of the returned PCM, once known.
    pub fn channels(&self) -> Option<u8> {
        self.adapter.as_ref().map(|a| a.channels())
    }

    /// Samples per channel returned so far.
    pub fn decoded_samples(&self) -> u64 {
        self.decoded_samples
    }

    /// Audio packets dropped because they failed to decode.
    pub fn skipped_packets(&self) -> u64 {
        self.skipped_packets
    }

    /// Bytes discarded while searching for pages.
    pub fn skipped_bytes(&self) -> usize {
        self.skipped_bytes
    }

    /// Duration of the PCM returned so far.
    pub fn duration(&self) -> Duration {
        match self.sample_rate() {
            Some(rate) => Duration::from_micros(self.decoded_samples * 1_000_000 / rate as u64),
            None => Duration::ZERO,
        }
    }

    /// Set when the final call left bytes that did not form a page.
    pub fn truncation(&self) -> Option<Error> {
        self.truncated.map(|pending| Error::TruncatedInput { pending })
    }

    /// Consumes the next chunk of container bytes.
    ///
    /// Returns the PCM decoded from every packet the buffered bytes complete.
    /// Audio packets that fail to decode are skipped. With `is_final` set,
    /// the stream is closed; a missing header is an error, trailing bytes
    /// short of a page are reported through [`truncation`](Self::truncation).
    pub fn decode(&mut self, bytes: &[u8], is_final: bool) -> Result<Vec<u8>> {
        match self.phase {
            DecoderPhase::Ended => return Err(Error::StreamEnded),
            DecoderPhase::Failed => return Err(Error::Aborted),
            _ => {}
        }

        let result = self.decode_inner(bytes, is_final);
        if let Err(e) = &result {
            if e.is_fatal() {
                self.phase = DecoderPhase::Failed;
            }
        }
        result
    }

    fn decode_inner(&mut self, bytes: &[u8], is_final: bool) -> Result<Vec<u8>> {
        self.sync.write(bytes);

        let mut out = Vec::new();
        loop {
            match self.sync.page_out() {
                PageOut::Page(page) => self.page_in(&page, &mut out)?,
                PageOut::Skipped(n) => {
                    trace!("Skipped {} bytes looking for a page", n);
                    self.skipped_bytes += n;
                }
                PageOut::NeedMore => break,
            }
        }

        if is_final {
            self.finish()?;
        }
        Ok(out)
    }

    fn page_in(&mut self, page: &Page, out: &mut Vec<u8>) -> Result<()> {
        self.pages += 1;
        let stream = self.stream.get_or_insert_with(|| StreamState::new(page.serial()));
        if page.serial() != stream.serial() {
            warn!(
                "Ignoring page {} of foreign stream {:#010x}",
                page.sequence,
                page.serial()
            );
            return Ok(());
        }
        stream.page_in(page)?;

        loop {
            let Some(stream) = self.stream.as_mut() else {
                break;
            };
            match stream.packet_out() {
                PacketOut::Packet(packet) => self.packet_in(packet, out)?,
                PacketOut::Hole => warn!("Lost pages before packet, continuing"),
                PacketOut::NeedMore => break,
            }
        }
        Ok(())
    }

    fn packet_in(&mut self, packet: Packet, out: &mut Vec<u8>) -> Result<()> {
        match self.phase {
            DecoderPhase::AwaitingIdHeader => {
                let header = IdHeader::parse(&packet.data)?;
                let adapter =
                    DecoderAdapter::new(header.input_sample_rate, header.channels, header.output_gain)?;
                debug!(
                    "OpusHead: {} channel(s), {}Hz input, pre-skip {}, decoding at {}Hz",
                    header.channels,
                    header.input_sample_rate,
                    header.pre_skip,
                    adapter.sample_rate()
                );
                self.header = Some(header);
                self.adapter = Some(adapter);
                self.phase = DecoderPhase::AwaitingCommentHeader;
            }
            DecoderPhase::AwaitingCommentHeader => {
                validate_tags(&packet.data)?;
                let pre_skip = self.header.map(|h| h.pre_skip).unwrap_or(0);
                if let Some(adapter) = self.adapter.as_mut() {
                    match adapter.skip(pre_skip) {
                        Ok(n) => debug!("Primed decoder with {} samples", n),
                        Err(e) => warn!("Decoder priming failed: {}", e),
                    }
                }
                self.phase = DecoderPhase::Streaming;
            }
            DecoderPhase::Streaming => self.decode_audio(&packet, out),
            DecoderPhase::Ended | DecoderPhase::Failed => {}
        }
        Ok(())
    }

    fn decode_audio(&mut self, packet: &Packet, out: &mut Vec<u8>) {
        let Some(adapter) = self.adapter.as_mut() else {
            return;
        };
        if packet.is_empty() {
            warn!("Skipping empty audio packet {}", packet.packet_no);
            self.skipped_packets += 1;
            return;
        }

        match adapter.decode_packet(&packet.data, MAX_FRAME_SIZE) {
            Ok(samples) => {
                self.decoded_samples += (samples.len() / adapter.channels() as usize) as u64;
                out.extend(samples_to_bytes(&samples));
            }
            Err(e) => {
                warn!("Skipping packet {}: {}", packet.packet_no, e);
                self.skipped_packets += 1;
            }
        }
    }

    fn finish(&mut self) -> Result<()> {
        match self.phase {
            DecoderPhase::AwaitingIdHeader if self.pages == 0 && !self.sync.at_capture() => {
                return Err(ContainerError::NotOgg.into());
            }
            DecoderPhase::AwaitingIdHeader => {
                if self.pages == 0 {
                    warn!("Input ended inside the first page ({} bytes)", self.sync.pending());
                }
                return Err(ContainerError::MissingHeader("OpusHead").into());
            }
            DecoderPhase::AwaitingCommentHeader => {
                return Err(ContainerError::MissingHeader("OpusTags").into());
            }
            _ => {}
        }

        let pending = self.sync.pending();
        if pending > 0 {
            warn!("Input ended with {} bytes short of a page", pending);
            self.truncated = Some(pending);
        }
        if !self.stream.as_ref().is_some_and(|s| s.is_eos()) {
            debug!("Input ended without an end-of-stream page");
        }

        self.phase = DecoderPhase::Ended;
        info!(
            "Decoding completed: {} samples, audio duration {:.3}s, {} packets skipped",
            self.decoded_samples,
            self.duration().as_secs_f64(),
            self.skipped_packets
        );
        Ok(())
    }
}
