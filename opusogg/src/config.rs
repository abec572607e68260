//! Stream configuration.

use std::time::Duration;

use crate::codec::opus::{Application, Signal, is_supported_rate};
use crate::error::{Error, Result};

/// Granule positions in Ogg Opus always count samples at 48kHz.
pub const GRANULE_RATE: u32 = 48000;

/// Vendor string written into the comment header by default.
pub const DEFAULT_VENDOR: &str = "pcm2opusogg encoder";

/// Frame durations Opus accepts, in units of 2.5ms.
const FRAME_UNITS: [usize; 6] = [1, 2, 4, 8, 16, 24];

/// Encoder-side configuration for one Ogg Opus stream.
///
/// PCM is 16-bit signed little-endian, interleaved when stereo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Input sample rate in Hz; also the codec rate.
    pub sample_rate: u32,
    /// Number of channels (1 or 2).
    pub channels: u8,
    /// Samples per channel in one Opus frame.
    pub frame_size: usize,
    /// Target bitrate in bits per second.
    pub bitrate: i32,
    /// Encoder complexity (0-10).
    pub complexity: i32,
    /// Variable bitrate; false selects constant bitrate.
    pub vbr: bool,
    /// Signal type hint.
    pub signal: Signal,
    /// Intended application.
    pub application: Application,
    /// Pre-skip written into the ID header, in 48kHz samples.
    pub pre_skip: u16,
    /// Output gain written into the ID header, in Q7.8 dB.
    pub output_gain: i16,
    /// Vendor string for the comment header.
    pub vendor: String,
    /// User comments (`KEY=value`) for the comment header.
    pub comments: Vec<String>,
    /// Fixed stream serial number; random when `None`.
    pub serial: Option<u32>,
}

impl StreamConfig {
    /// Creates a config with 20ms frames and the fixed operating point:
    /// CBR at 48kbps, complexity 8, music signal.
    pub fn new(sample_rate: u32, channels: u8) -> Self {
        Self {
            sample_rate,
            channels,
            frame_size: (sample_rate / 50) as usize,
            bitrate: 48000,
            complexity: 8,
            vbr: false,
            signal: Signal::Music,
            application: Application::Audio,
            pre_skip: 0,
            output_gain: 0,
            vendor: DEFAULT_VENDOR.to_string(),
            comments: Vec::new(),
            serial: None,
        }
    }

    /// Set the frame size in samples per channel.
    pub fn with_frame_size(mut self, frame_size: usize) -> Self {
        self.frame_size = frame_size;
        self
    }

    /// Set the target bitrate.
    pub fn with_bitrate(mut self, bitrate: i32) -> Self {
        self.bitrate = bitrate;
        self
    }

    /// Set encoder complexity.
    pub fn with_complexity(mut self, complexity: i32) -> Self {
        self.complexity = complexity;
        self
    }

    /// Enable or disable variable bitrate.
    pub fn with_vbr(mut self, vbr: bool) -> Self {
        self.vbr = vbr;
        self
    }

    /// Set the signal hint.
    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.signal = signal;
        self
    }

    /// Set the application type.
    pub fn with_application(mut self, application: Application) -> Self {
        self.application = application;
        self
    }

    /// Set the pre-skip advertised in the ID header.
    pub fn with_pre_skip(mut self, pre_skip: u16) -> Self {
        self.pre_skip = pre_skip;
        self
    }

    /// Set the output gain advertised in the ID header.
    pub fn with_output_gain(mut self, output_gain: i16) -> Self {
        self.output_gain = output_gain;
        self
    }

    /// Set the vendor string.
    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = vendor.into();
        self
    }

    /// Add a user comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comments.push(comment.into());
        self
    }

    /// Pin the stream serial number.
    pub fn with_serial(mut self, serial: u32) -> Self {
        self.serial = Some(serial);
        self
    }

    /// Checks that libopus can run with this configuration.
    pub fn validate(&self) -> Result<()> {
        if !is_supported_rate(self.sample_rate) {
            return Err(Error::Config(format!(
                "sample rate {} not supported, use 8000, 12000, 16000, 24000 or 48000",
                self.sample_rate
            )));
        }
        if !(1..=2).contains(&self.channels) {
            return Err(Error::Config(format!(
                "{} channels not supported, use 1 or 2",
                self.channels
            )));
        }

        let unit = (self.sample_rate / 400) as usize;
        if self.frame_size % unit != 0 || !FRAME_UNITS.contains(&(self.frame_size / unit)) {
            return Err(Error::Config(format!(
                "frame size {} is not 2.5, 5, 10, 20, 40 or 60ms at {}Hz",
                self.frame_size, self.sample_rate
            )));
        }
        if !(500..=512_000).contains(&self.bitrate) {
            return Err(Error::Config(format!("bitrate {} out of range", self.bitrate)));
        }
        if !(0..=10).contains(&self.complexity) {
            return Err(Error::Config(format!("complexity {} out of range", self.complexity)));
        }
        Ok(())
    }

    /// Granule advance per frame, in 48kHz samples.
    pub fn granule_increment(&self) -> i64 {
        self.frame_size as i64 * GRANULE_RATE as i64 / self.sample_rate as i64
    }

    /// Bytes of interleaved 16-bit PCM in one frame.
    pub fn frame_bytes(&self) -> usize {
        self.frame_size * self.channels as usize * 2
    }

    /// Duration of one frame.
    pub fn frame_duration(&self) -> Duration {
        Duration::from_micros(self.frame_size as u64 * 1_000_000 / self.sample_rate as u64)
    }

    /// Returns the serial number to use, drawing a random one if none is pinned.
    pub fn resolve_serial(&self) -> u32 {
        self.serial.unwrap_or_else(random_serial)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::new(24000, 1)
    }
}

fn random_serial() -> u32 {
    let mut buf = [0u8; 4];
    if getrandom::fill(&mut buf).is_err() {
        // Any serial is valid; fall back to the clock.
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        return nanos;
    }
    u32::from_le_bytes(buf)
}
