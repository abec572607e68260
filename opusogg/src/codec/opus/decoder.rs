//! Opus decoder.

use std::ptr::{self, NonNull};

use super::ffi;

/// Opus decoder error.
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("opus: decoder create failed: {0}")]
    CreateFailed(String),
    /// The packet was rejected; the decoder itself stays usable.
    #[error("opus: decode failed: {0}")]
    DecodeFailed(String),
    #[error("opus: set option failed: {0}")]
    SetOptionFailed(String),
}

/// Single-stream Opus decoder owning its libopus state.
pub struct Decoder {
    handle: NonNull<ffi::OpusDecoder>,
    sample_rate: i32,
    channels: i32,
}

// Safety: libopus state has no thread affinity; &mut self serializes use.
unsafe impl Send for Decoder {}

impl Drop for Decoder {
    fn drop(&mut self) {
        unsafe { ffi::opus_decoder_destroy(self.handle.as_ptr()) };
    }
}

impl std::fmt::Debug for Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoder")
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}

impl Decoder {
    /// Creates a decoder producing `channels` channels at `sample_rate`.
    pub fn new(sample_rate: i32, channels: i32) -> Result<Self, DecoderError> {
        let mut error = ffi::OPUS_OK;
        let ptr = unsafe { ffi::opus_decoder_create(sample_rate, channels, &mut error) };

        match NonNull::new(ptr) {
            Some(handle) if error == ffi::OPUS_OK => Ok(Self {
                handle,
                sample_rate,
                channels,
            }),
            _ => Err(DecoderError::CreateFailed(ffi::error_string(error))),
        }
    }

    /// Returns the sample rate.
    pub fn sample_rate(&self) -> i32 {
        self.sample_rate
    }

    /// Returns the number of channels.
    pub fn channels(&self) -> i32 {
        self.channels
    }

    /// Decodes one packet into interleaved samples.
    ///
    /// `max_samples` bounds the samples per channel the packet may expand to.
    pub fn decode(&mut self, packet: &[u8], max_samples: usize) -> Result<Vec<i16>, DecoderError> {
        if packet.is_empty() {
            return Err(DecoderError::DecodeFailed("empty packet".into()));
        }
        self.run(packet.as_ptr(), packet.len() as i32, max_samples)
    }

    /// Conceals `samples` samples per channel as if a packet were lost.
    ///
    /// Also primes the decoder state at stream start.
    pub fn decode_plc(&mut self, samples: usize) -> Result<Vec<i16>, DecoderError> {
        self.run(ptr::null(), 0, samples)
    }

    /// Output gain in Q7.8 dB, as carried by the ID header.
    pub fn set_gain(&mut self, gain: i16) -> Result<(), DecoderError> {
        let ret = unsafe {
            ffi::opus_decoder_ctl(self.handle.as_ptr(), ffi::ctl::SET_GAIN, gain as i32)
        };
        ffi::check(ret).map_err(DecoderError::SetOptionFailed)?;
        Ok(())
    }

    fn run(&mut self, data: *const u8, len: i32, max_samples: usize) -> Result<Vec<i16>, DecoderError> {
        let channels = self.channels as usize;
        let mut pcm = vec![0i16; max_samples * channels];

        let ret = unsafe {
            ffi::opus_decode(
                self.handle.as_ptr(),
                data,
                len,
                pcm.as_mut_ptr(),
                max_samples as i32,
                0,
            )
        };
        let samples = ffi::check(ret).map_err(DecoderError::DecodeFailed)?;
        pcm.truncate(samples as usize * channels);
        Ok(pcm)
    }
}
