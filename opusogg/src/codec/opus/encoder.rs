//! Opus encoder.

use std::ptr::NonNull;

use super::MAX_PACKET_SIZE;
use super::ffi;

/// Opus application type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Application {
    /// Best quality for voice signals.
    VoIP,
    /// Best quality for non-voice signals.
    Audio,
    /// Minimum possible coding delay.
    RestrictedLowdelay,
}

impl Application {
    fn raw(self) -> i32 {
        match self {
            Self::VoIP => ffi::application::VOIP,
            Self::Audio => ffi::application::AUDIO,
            Self::RestrictedLowdelay => ffi::application::RESTRICTED_LOWDELAY,
        }
    }
}

/// Signal type hint for the encoder's mode decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Signal {
    Auto,
    Voice,
    #[default]
    Music,
}

impl Signal {
    fn raw(self) -> i32 {
        match self {
            Self::Auto => ffi::signal::AUTO,
            Self::Voice => ffi::signal::VOICE,
            Self::Music => ffi::signal::MUSIC,
        }
    }
}

/// Opus encoder error.
#[derive(Debug, thiserror::Error)]
pub enum EncoderError {
    #[error("opus: encoder create failed: {0}")]
    CreateFailed(String),
    /// Input does not hold exactly one frame.
    #[error("opus: expected {expected} samples, got {got}")]
    FrameLength { expected: usize, got: usize },
    #[error("opus: encode failed: {0}")]
    EncodeFailed(String),
    #[error("opus: set option failed: {0}")]
    SetOptionFailed(String),
}

/// Single-stream Opus encoder owning its libopus state.
pub struct Encoder {
    handle: NonNull<ffi::OpusEncoder>,
    sample_rate: i32,
    channels: i32,
}

// Safety: libopus state has no thread affinity; &mut self serializes use.
unsafe impl Send for Encoder {}

impl Drop for Encoder {
    fn drop(&mut self) {
        unsafe { ffi::opus_encoder_destroy(self.handle.as_ptr()) };
    }
}

impl std::fmt::Debug for Encoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encoder")
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}

impl Encoder {
    /// Creates an encoder at `sample_rate` (8000, 12000, 16000, 24000 or
    /// 48000) with 1 or 2 channels.
    pub fn new(sample_rate: i32, channels: i32, application: Application) -> Result<Self, EncoderError> {
        let mut error = ffi::OPUS_OK;
        let ptr = unsafe {
            ffi::opus_encoder_create(sample_rate, channels, application.raw(), &mut error)
        };

        match NonNull::new(ptr) {
            Some(handle) if error == ffi::OPUS_OK => Ok(Self {
                handle,
                sample_rate,
                channels,
            }),
            _ => Err(EncoderError::CreateFailed(ffi::error_string(error))),
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

    /// Encodes one frame of interleaved PCM into a packet.
    ///
    /// `pcm` must hold exactly `frame_size * channels` samples.
    pub fn encode(&mut self, pcm: &[i16], frame_size: i32) -> Result<Vec<u8>, EncoderError> {
        let expected = (frame_size * self.channels) as usize;
        if pcm.len() != expected {
            return Err(EncoderError::FrameLength {
                expected,
                got: pcm.len(),
            });
        }

        let mut packet = vec![0u8; MAX_PACKET_SIZE];
        let ret = unsafe {
            ffi::opus_encode(
                self.handle.as_ptr(),
                pcm.as_ptr(),
                frame_size,
                packet.as_mut_ptr(),
                packet.len() as i32,
            )
        };
        let len = ffi::check(ret).map_err(EncoderError::EncodeFailed)?;
        packet.truncate(len as usize);
        Ok(packet)
    }

    /// Target bitrate in bits per second.
    pub fn set_bitrate(&mut self, bitrate: i32) -> Result<(), EncoderError> {
        self.set(ffi::ctl::SET_BITRATE, bitrate)
    }

    /// Complexity 0 (fastest) to 10 (best).
    pub fn set_complexity(&mut self, complexity: i32) -> Result<(), EncoderError> {
        self.set(ffi::ctl::SET_COMPLEXITY, complexity)
    }

    /// Variable (true) or constant (false) bitrate.
    pub fn set_vbr(&mut self, vbr: bool) -> Result<(), EncoderError> {
        self.set(ffi::ctl::SET_VBR, vbr as i32)
    }

    /// Hints whether the input is speech or music.
    pub fn set_signal(&mut self, signal: Signal) -> Result<(), EncoderError> {
        self.set(ffi::ctl::SET_SIGNAL, signal.raw())
    }

    /// Significant bits of the input (8-24).
    pub fn set_lsb_depth(&mut self, depth: i32) -> Result<(), EncoderError> {
        self.set(ffi::ctl::SET_LSB_DEPTH, depth)
    }

    /// Encoder delay in samples at the encoder rate.
    pub fn lookahead(&mut self) -> Result<i32, EncoderError> {
        let mut value = 0i32;
        let ret = unsafe {
            ffi::opus_encoder_ctl(self.handle.as_ptr(), ffi::ctl::GET_LOOKAHEAD, &mut value as *mut i32)
        };
        ffi::check(ret).map_err(EncoderError::SetOptionFailed)?;
        Ok(value)
    }

    fn set(&mut self, request: i32, value: i32) -> Result<(), EncoderError> {
        let ret = unsafe { ffi::opus_encoder_ctl(self.handle.as_ptr(), request, value) };
        ffi::check(ret).map_err(EncoderError::SetOptionFailed)?;
        Ok(())
    }
}
