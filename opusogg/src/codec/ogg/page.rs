//! Ogg page structures.

/// Capture pattern that starts every page.
pub const CAPTURE_PATTERN: &[u8; 4] = b"OggS";

/// Size of the fixed part of a page header.
pub const HEADER_SIZE: usize = 27;

/// Largest number of lacing values on one page.
pub const MAX_SEGMENTS: usize = 255;

/// Header type flags.
pub mod flags {
    /// Continuation of previous packet.
    pub const CONTINUATION: u8 = 0x01;
    /// Beginning of stream.
    pub const BOS: u8 = 0x02;
    /// End of stream.
    pub const EOS: u8 = 0x04;
}

/// CRC lookup table for Ogg (polynomial 0x04c11db7, no reflection).
static CRC_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut r = (i as u32) << 24;
        let mut j = 0;
        while j < 8 {
            if r & 0x80000000 != 0 {
                r = (r << 1) ^ 0x04c11db7;
            } else {
                r <<= 1;
            }
            j += 1;
        }
        table[i] = r;
        i += 1;
    }
    table
};

/// Continues an Ogg CRC over `data`.
fn crc_update(mut crc: u32, data: &[u8]) -> u32 {
    for &byte in data {
        crc = (crc << 8) ^ CRC_TABLE[((crc >> 24) as u8 ^ byte) as usize];
    }
    crc
}

/// Calculates CRC for Ogg page.
pub fn crc32(data: &[u8]) -> u32 {
    crc_update(0, data)
}

/// One physical Ogg page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Version (always 0)
    pub version: u8,
    /// Header type flags
    pub header_type: u8,
    /// Absolute granule position, -1 if no packet ends on this page
    pub granule_position: i64,
    /// Stream serial number
    pub serial: u32,
    /// Page sequence number
    pub sequence: u32,
    /// CRC checksum
    pub checksum: u32,
    /// Segment table (lacing values)
    pub segment_table: Vec<u8>,
    /// Page body data
    pub body: Vec<u8>,
}

impl Page {
    /// Builds a page and computes its checksum.
    pub fn build(
        header_type: u8,
        granule_position: i64,
        serial: u32,
        sequence: u32,
        segment_table: Vec<u8>,
        body: Vec<u8>,
    ) -> Self {
        let mut page = Self {
            version: 0,
            header_type,
            granule_position,
            serial,
            sequence,
            checksum: 0,
            segment_table,
            body,
        };
        page.checksum = page.compute_checksum();
        page
    }

    /// Returns the stream serial number.
    pub fn serial(&self) -> u32 {
        self.serial
    }

    /// Returns true if this is a beginning-of-stream page.
    pub fn is_bos(&self) -> bool {
        (self.header_type & flags::BOS) != 0
    }

    /// Returns true if this is an end-of-stream page.
    pub fn is_eos(&self) -> bool {
        (self.header_type & flags::EOS) != 0
    }

    /// Returns true if this is a continuation page.
    pub fn is_continuation(&self) -> bool {
        (self.header_type & flags::CONTINUATION) != 0
    }

    /// Number of packets that end on this page.
    pub fn packets(&self) -> usize {
        self.segment_table.iter().filter(|&&v| v < 255).count()
    }

    /// Length of the serialized header including the segment table.
    pub fn header_len(&self) -> usize {
        HEADER_SIZE + self.segment_table.len()
    }

    /// Total serialized length.
    pub fn len(&self) -> usize {
        self.header_len() + self.body.len()
    }

    /// Returns true if the page carries no body bytes.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Serializes the page with the stored checksum.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.reserve(self.len());
        self.write_header(out, self.checksum);
        out.extend_from_slice(&self.body);
    }

    /// Serializes the page into a new buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        self.write_to(&mut out);
        out
    }

    /// Recomputes the checksum from the header fields and body.
    pub fn compute_checksum(&self) -> u32 {
        let mut header = Vec::with_capacity(self.header_len());
        self.write_header(&mut header, 0);
        crc_update(crc_update(0, &header), &self.body)
    }

    fn write_header(&self, out: &mut Vec<u8>, checksum: u32) {
        out.extend_from_slice(CAPTURE_PATTERN);
        out.push(self.version);
        out.push(self.header_type);
        out.extend_from_slice(&self.granule_position.to_le_bytes());
        out.extend_from_slice(&self.serial.to_le_bytes());
        out.extend_from_slice(&self.sequence.to_le_bytes());
        out.extend_from_slice(&checksum.to_le_bytes());
        out.push(self.segment_table.len() as u8);
        out.extend_from_slice(&self.segment_table);
    }
}

/// Splits a packet length into lacing values.
///
/// A packet whose length is a multiple of 255 ends with a zero lacing value.
pub fn lacing_values(len: usize) -> Vec<u8> {
    let mut values = vec![255u8; len / 255];
    values.push((len % 255) as u8);
    values
}
