//! Ogg packets.

/// A logical packet carried in an Ogg stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Packet {
    /// Packet payload.
    pub data: Vec<u8>,
    /// First packet of the logical stream.
    pub bos: bool,
    /// Last packet of the logical stream.
    pub eos: bool,
    /// Granule position, -1 when unknown.
    pub granule_position: i64,
    /// Packet sequence number within the stream.
    pub packet_no: i64,
}

impl Packet {
    /// Creates a packet with the given payload, granule position and number.
    pub fn new(data: Vec<u8>, granule_position: i64, packet_no: i64) -> Self {
        Self {
            data,
            bos: false,
            eos: false,
            granule_position,
            packet_no,
        }
    }

    /// Marks the packet as the first of the stream.
    pub fn with_bos(mut self, bos: bool) -> Self {
        self.bos = bos;
        self
    }

    /// Marks the packet as the last of the stream.
    pub fn with_eos(mut self, eos: bool) -> Self {
        self.eos = eos;
        self
    }

    /// Returns the payload length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
