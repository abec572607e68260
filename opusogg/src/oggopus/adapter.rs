//! Call-through from byte-oriented frames to the Opus primitives.

use crate::codec::opus::{
    Decoder, DecoderError, Encoder, EncoderError, MAX_FRAME_SIZE, is_supported_rate,
};
use crate::config::{GRANULE_RATE, StreamConfig};
use crate::pcm::bytes_to_samples;

/// Input sample depth reported to the encoder.
const LSB_DEPTH: i32 = 16;

/// Encodes fixed-size PCM byte frames with the configured operating point.
#[derive(Debug)]
pub struct EncoderAdapter {
    encoder: Encoder,
    frame_size: usize,
    lookahead: i32,
}

impl EncoderAdapter {
    /// Creates and configures the encoder for `config`.
    pub fn new(config: &StreamConfig) -> Result<Self, EncoderError> {
        let mut encoder = Encoder::new(
            config.sample_rate as i32,
            config.channels as i32,
            config.application,
        )?;
        encoder.set_vbr(config.vbr)?;
        encoder.set_bitrate(config.bitrate)?;
        encoder.set_complexity(config.complexity)?;
        encoder.set_signal(config.signal)?;
        encoder.set_lsb_depth(LSB_DEPTH)?;
        let lookahead = encoder.lookahead()?;

        Ok(Self {
            encoder,
            frame_size: config.frame_size,
            lookahead,
        })
    }

    /// Returns the codec delay in samples at the input rate.
    pub fn lookahead(&self) -> i32 {
        self.lookahead
    }

    /// Encodes one frame of interleaved little-endian PCM into one packet.
    pub fn encode_frame(&mut self, frame: &[u8]) -> Result<Vec<u8>, EncoderError> {
        let pcm = bytes_to_samples(frame);
        self.encoder.encode(&pcm, self.frame_size as i32)
    }
}

/// Decodes Opus packets into interleaved PCM samples.
#[derive(Debug)]
pub struct DecoderAdapter {
    decoder: Decoder,
    sample_rate: u32,
    channels: u8,
}

impl DecoderAdapter {
    /// Creates a decoder for a stream recorded at `sample_rate`.
    ///
    /// Rates libopus cannot decode at fall back to 48kHz. A non-zero
    /// `output_gain` (Q7.8 dB) is applied by the codec.
    pub fn new(sample_rate: u32, channels: u8, output_gain: i16) -> Result<Self, DecoderError> {
        let rate = if is_supported_rate(sample_rate) {
            sample_rate
        } else {
            tracing::debug!("Input rate {}Hz not decodable, using 48kHz", sample_rate);
            GRANULE_RATE
        };

        let mut decoder = Decoder::new(rate as i32, channels as i32)?;
        if output_gain != 0 {
            decoder.set_gain(output_gain)?;
        }

        Ok(Self {
            decoder,
            sample_rate: rate,
            channels,
        })
    }

    /// Rate the decoder produces PCM at.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the number of interleaved output channels.
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Decodes one packet, allowing at most `max_samples` per channel.
    pub fn decode_packet(&mut self, packet: &[u8], max_samples: usize) -> Result<Vec<i16>, DecoderError> {
        self.decoder.decode(packet, max_samples)
    }

    /// Runs `pre_skip` samples (at 48kHz) of concealment through the decoder
    /// and discards the output. Returns the samples per channel consumed.
    ///
    /// Concealment only runs in 2.5ms steps, so the count is rounded up.
    pub fn skip(&mut self, pre_skip: u16) -> Result<usize, DecoderError> {
        if pre_skip == 0 {
            return Ok(0);
        }

        let step = (self.sample_rate / 400) as usize;
        let wanted = (pre_skip as usize * self.sample_rate as usize).div_ceil(GRANULE_RATE as usize);
        let mut remaining = wanted.div_ceil(step) * step;
        let mut skipped = 0;
        while remaining > 0 {
            let chunk = remaining.min(MAX_FRAME_SIZE / step * step);
            let out = self.decoder.decode_plc(chunk)?;
            let n = out.len() / self.channels as usize;
            if n == 0 {
                break;
            }
            skipped += n;
            remaining = remaining.saturating_sub(n);
        }
        Ok(skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcm::samples_to_bytes;

    #[test]
    fn test_encoder_lookahead_reported() {
        let adapter = EncoderAdapter::new(&StreamConfig::default()).unwrap();
        assert!(adapter.lookahead() > 0);
    }

    #[test]
    fn test_encode_frame() {
        let config = StreamConfig::default();
        let mut adapter = EncoderAdapter::new(&config).unwrap();
        let frame = vec![0u8; config.frame_bytes()];
        let packet = adapter.encode_frame(&frame).unwrap();
        assert!(!packet.is_empty());
    }

    #[test]
    fn test_encode_frame_wrong_size() {
        let config = StreamConfig::default();
        let mut adapter = EncoderAdapter::new(&config).unwrap();
        assert!(adapter.encode_frame(&[0u8; 10]).is_err());
    }

    #[test]
    fn test_adapter_roundtrip_stereo() {
        let config = StreamConfig::new(48000, 2);
        let mut enc = EncoderAdapter::new(&config).unwrap();
        let mut dec = DecoderAdapter::new(48000, 2, 0).unwrap();

        let samples: Vec<i16> = (0..960 * 2).map(|i| ((i % 64) * 200) as i16).collect();
        let packet = enc.encode_frame(&samples_to_bytes(&samples)).unwrap();
        let out = dec.decode_packet(&packet, MAX_FRAME_SIZE).unwrap();
        assert_eq!(out.len(), 960 * 2);
    }

    #[test]
    fn test_decoder_rate_fallback() {
        let dec = DecoderAdapter::new(44100, 1, 0).unwrap();
        assert_eq!(dec.sample_rate(), 48000);

        let dec = DecoderAdapter::new(16000, 1, 0).unwrap();
        assert_eq!(dec.sample_rate(), 16000);
    }

    #[test]
    fn test_decoder_with_gain() {
        assert!(DecoderAdapter::new(24000, 1, -512).is_ok());
    }

    #[test]
    fn test_skip() {
        let mut dec = DecoderAdapter::new(48000, 1, 0).unwrap();
        assert_eq!(dec.skip(0).unwrap(), 0);
        assert_eq!(dec.skip(960).unwrap(), 960);
        // 312 rounds up to the next 2.5ms step.
        assert_eq!(dec.skip(312).unwrap(), 360);

        let mut dec = DecoderAdapter::new(24000, 2, 0).unwrap();
        assert_eq!(dec.skip(960).unwrap(), 480);
    }
}
