//! PCM frame accumulation across calls.

/// Buffers PCM bytes until they fill whole codec frames.
///
/// The carry is always shorter than one frame.
#[derive(Debug)]
pub struct FrameAccumulator {
    frame_bytes: usize,
    carry: Vec<u8>,
}

impl FrameAccumulator {
    /// Creates an accumulator for frames of `frame_bytes` bytes.
    pub fn new(frame_bytes: usize) -> Self {
        Self {
            frame_bytes,
            carry: Vec::with_capacity(frame_bytes),
        }
    }

    /// Size of one frame in bytes.
    pub fn frame_bytes(&self) -> usize {
        self.frame_bytes
    }

    /// Bytes held over from previous pushes.
    pub fn carried(&self) -> usize {
        self.carry.len()
    }

    /// Appends `bytes` and returns every complete frame, in order.
    ///
    /// When `is_final` is set, a non-empty remainder is zero-padded into
    /// one last frame and the carry is cleared.
    pub fn push(&mut self, bytes: &[u8], is_final: bool) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        let mut input = bytes;

        if !self.carry.is_empty() {
            let need = self.frame_bytes - self.carry.len();
            let take = need.min(input.len());
            self.carry.extend_from_slice(&input[..take]);
            input = &input[take..];
            if self.carry.len() == self.frame_bytes {
                frames.push(std::mem::replace(
                    &mut self.carry,
                    Vec::with_capacity(self.frame_bytes),
                ));
            }
        }

        let mut chunks = input.chunks_exact(self.frame_bytes);
        for chunk in &mut chunks {
            frames.push(chunk.to_vec());
        }
        self.carry.extend_from_slice(chunks.remainder());

        if is_final && !self.carry.is_empty() {
            let mut last = std::mem::take(&mut self.carry);
            last.resize(self.frame_bytes, 0);
            frames.push(last);
        }
        frames
    }
}
