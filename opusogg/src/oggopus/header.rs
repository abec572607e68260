//! OpusHead and OpusTags header packets.

use crate::error::ContainerError;

/// Magic at the start of the ID header.
pub const OPUS_HEAD_MAGIC: &[u8; 8] = b"OpusHead";

/// Magic at the start of the comment header.
pub const OPUS_TAGS_MAGIC: &[u8; 8] = b"OpusTags";

/// Size of a family 0 ID header.
pub const ID_HEADER_SIZE: usize = 19;

/// The only ID header version this crate reads or writes.
pub const OPUS_HEAD_VERSION: u8 = 1;

/// Parsed or to-be-written OpusHead fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdHeader {
    pub channels: u8,
    /// Samples to discard at stream start, at 48kHz.
    pub pre_skip: u16,
    /// Original input rate. Informational; decoding may run at another rate.
    pub input_sample_rate: u32,
    /// Q7.8 dB.
    pub output_gain: i16,
    pub mapping_family: u8,
}

impl IdHeader {
    /// Serializes the header into its 19-byte packet.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; ID_HEADER_SIZE];
        buf[..8].copy_from_slice(OPUS_HEAD_MAGIC);
        buf[8] = OPUS_HEAD_VERSION;
        buf[9] = self.channels;
        buf[10..12].copy_from_slice(&self.pre_skip.to_le_bytes());
        buf[12..16].copy_from_slice(&self.input_sample_rate.to_le_bytes());
        buf[16..18].copy_from_slice(&self.output_gain.to_le_bytes());
        buf[18] = self.mapping_family;
        buf
    }

    /// Parses an ID header packet.
    ///
    /// Only channel mapping family 0 (mono or stereo) is accepted.
    pub fn parse(data: &[u8]) -> Result<Self, ContainerError> {
        if data.len() < 8 || &data[..8] != OPUS_HEAD_MAGIC {
            return Err(ContainerError::NotOpus { expected: "OpusHead" });
        }
        if data.len() < ID_HEADER_SIZE {
            return Err(ContainerError::Malformed {
                header: "OpusHead",
                reason: format!("{} bytes, need {}", data.len(), ID_HEADER_SIZE),
            });
        }
        if data[8] != OPUS_HEAD_VERSION {
            return Err(ContainerError::UnsupportedVersion(data[8]));
        }

        let header = Self {
            channels: data[9],
            pre_skip: u16::from_le_bytes([data[10], data[11]]),
            input_sample_rate: u32::from_le_bytes([data[12], data[13], data[14], data[15]]),
            output_gain: i16::from_le_bytes([data[16], data[17]]),
            mapping_family: data[18],
        };

        if header.channels == 0 {
            return Err(ContainerError::Malformed {
                header: "OpusHead",
                reason: "zero channels".to_string(),
            });
        }
        if header.mapping_family != 0 || header.channels > 2 {
            return Err(ContainerError::UnsupportedMapping {
                family: header.mapping_family,
                channels: header.channels,
            });
        }
        if data.len() != ID_HEADER_SIZE {
            tracing::debug!("Ignoring {} trailing bytes after OpusHead", data.len() - ID_HEADER_SIZE);
        }
        Ok(header)
    }
}

/// OpusTags contents written by the encoder.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommentHeader {
    pub vendor: String,
    pub comments: Vec<String>,
}

impl CommentHeader {
    pub fn new(vendor: impl Into<String>, comments: Vec<String>) -> Self {
        Self {
            vendor: vendor.into(),
            comments,
        }
    }

    /// Serializes the header into its packet.
    pub fn to_bytes(&self) -> Vec<u8> {
        let size = 8
            + 4
            + self.vendor.len()
            + 4
            + self.comments.iter().map(|c| 4 + c.len()).sum::<usize>();
        let mut buf = Vec::with_capacity(size);
        buf.extend_from_slice(OPUS_TAGS_MAGIC);
        buf.extend_from_slice(&(self.vendor.len() as u32).to_le_bytes());
        buf.extend_from_slice(self.vendor.as_bytes());
        buf.extend_from_slice(&(self.comments.len() as u32).to_le_bytes());
        for comment in &self.comments {
            buf.extend_from_slice(&(comment.len() as u32).to_le_bytes());
            buf.extend_from_slice(comment.as_bytes());
        }
        buf
    }
}

/// Checks that a packet is a comment header. The contents are not parsed.
pub fn validate_tags(data: &[u8]) -> Result<(), ContainerError> {
    if data.len() < 8 || &data[..8] != OPUS_TAGS_MAGIC {
        return Err(ContainerError::NotOpus { expected: "OpusTags" });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> IdHeader {
        IdHeader {
            channels: 2,
            pre_skip: 312,
            input_sample_rate: 44100,
            output_gain: -256,
            mapping_family: 0,
        }
    }

    #[test]
    fn test_id_header_layout() {
        let bytes = IdHeader {
            channels: 1,
            pre_skip: 0,
            input_sample_rate: 24000,
            output_gain: 0,
            mapping_family: 0,
        }
        .to_bytes();

        assert_eq!(bytes.len(), 19);
        assert_eq!(&bytes[..8], b"OpusHead");
        assert_eq!(bytes[8], 1);
        assert_eq!(bytes[9], 1);
        assert_eq!(&bytes[10..12], &[0, 0]);
        assert_eq!(&bytes[12..16], &24000u32.to_le_bytes());
        assert_eq!(&bytes[16..18], &[0, 0]);
        assert_eq!(bytes[18], 0);
    }

    #[test]
    fn test_id_header_parse() {
        let header = sample_header();
        assert_eq!(IdHeader::parse(&header.to_bytes()).unwrap(), header);
    }

    #[test]
    fn test_id_header_wrong_magic() {
        let mut bytes = sample_header().to_bytes();
        bytes[0] = b'X';
        assert_eq!(
            IdHeader::parse(&bytes),
            Err(ContainerError::NotOpus { expected: "OpusHead" })
        );
        assert!(IdHeader::parse(b"Opus").is_err());
    }

    #[test]
    fn test_id_header_truncated() {
        let bytes = sample_header().to_bytes();
        assert!(matches!(
            IdHeader::parse(&bytes[..15]),
            Err(ContainerError::Malformed { header: "OpusHead", .. })
        ));
    }

    #[test]
    fn test_id_header_version() {
        let mut bytes = sample_header().to_bytes();
        bytes[8] = 0x10;
        assert_eq!(IdHeader::parse(&bytes), Err(ContainerError::UnsupportedVersion(0x10)));
        bytes[8] = 0;
        assert_eq!(IdHeader::parse(&bytes), Err(ContainerError::UnsupportedVersion(0)));
        bytes[8] = 2;
        assert_eq!(IdHeader::parse(&bytes), Err(ContainerError::UnsupportedVersion(2)));
    }

    #[test]
    fn test_id_header_mapping() {
        let mut bytes = sample_header().to_bytes();
        bytes[18] = 1;
        assert_eq!(
            IdHeader::parse(&bytes),
            Err(ContainerError::UnsupportedMapping { family: 1, channels: 2 })
        );

        let mut bytes = sample_header().to_bytes();
        bytes[9] = 6;
        assert!(matches!(
            IdHeader::parse(&bytes),
            Err(ContainerError::UnsupportedMapping { channels: 6, .. })
        ));

        let mut bytes = sample_header().to_bytes();
        bytes[9] = 0;
        assert!(matches!(IdHeader::parse(&bytes), Err(ContainerError::Malformed { .. })));
    }

    #[test]
    fn test_comment_header_layout() {
        let bytes = CommentHeader::new("pcm2opusogg encoder", Vec::new()).to_bytes();
        assert_eq!(&bytes[..8], b"OpusTags");
        assert_eq!(&bytes[8..12], &19u32.to_le_bytes());
        assert_eq!(&bytes[12..31], b"pcm2opusogg encoder");
        assert_eq!(&bytes[31..35], &0u32.to_le_bytes());
        assert_eq!(bytes.len(), 35);
    }

    #[test]
    fn test_comment_header_with_comments() {
        let bytes = CommentHeader::new("v", vec!["A=1".into(), "TITLE=xy".into()]).to_bytes();
        assert_eq!(&bytes[8..12], &1u32.to_le_bytes());
        assert_eq!(bytes[12], b'v');
        assert_eq!(&bytes[13..17], &2u32.to_le_bytes());
        assert_eq!(&bytes[17..21], &3u32.to_le_bytes());
        assert_eq!(&bytes[21..24], b"A=1");
        assert_eq!(&bytes[24..28], &8u32.to_le_bytes());
        assert_eq!(&bytes[28..], b"TITLE=xy");
        assert!(validate_tags(&bytes).is_ok());
    }

    #[test]
    fn test_validate_tags() {
        assert!(validate_tags(b"OpusTags").is_ok());
        assert_eq!(
            validate_tags(b"OpusHead\x01"),
            Err(ContainerError::NotOpus { expected: "OpusTags" })
        );
        assert!(validate_tags(b"Opus").is_err());
    }
}
