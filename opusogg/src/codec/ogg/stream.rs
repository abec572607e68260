//! Ogg logical stream state.
//!
//! A [`StreamState`] packs packets into pages on the write side and
//! reassembles packets from pages on the read side, for one serial number.

use std::collections::VecDeque;

use super::packet::Packet;
use super::page::{Page, flags, lacing_values, MAX_SEGMENTS};

/// Body size after which a page is emitted without being forced.
pub const PAGE_FILL_BYTES: usize = 4096;

/// Ogg stream error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OggError {
    /// A packet was submitted after the end-of-stream packet.
    #[error("ogg: stream already ended")]
    StreamEnded,
    /// A page belongs to another logical stream.
    #[error("ogg: page serial {got:#010x} does not match stream {expected:#010x}")]
    SerialMismatch { expected: u32, got: u32 },
    /// Unknown stream structure version.
    #[error("ogg: unsupported page version {0}")]
    UnsupportedVersion(u8),
    /// Segment table and body disagree.
    #[error("ogg: malformed page: {0}")]
    Malformed(String),
}

/// Result of [`StreamState::packet_out`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketOut {
    /// A complete packet.
    Packet(Packet),
    /// No complete packet is buffered; submit more pages.
    NeedMore,
    /// Pages were lost before the next packet.
    Hole,
}

#[derive(Debug, Clone, Copy)]
struct Lacing {
    value: u8,
    granule: i64,
    packet_start: bool,
}

#[derive(Debug, Clone, Copy)]
struct RxLacing {
    value: u8,
    granule: i64,
    bos: bool,
    eos: bool,
}

/// Ogg stream state for reading/writing.
#[derive(Debug)]
pub struct StreamState {
    serial: u32,

    // Write side.
    body: Vec<u8>,
    lacing: VecDeque<Lacing>,
    page_no: u32,
    granule_position: i64,
    ended: bool,
    eos_written: bool,

    // Read side.
    rx_body: Vec<u8>,
    rx_lacing: VecDeque<RxLacing>,
    rx_expected_page: Option<u32>,
    rx_hole: Option<usize>,
    rx_eos: bool,
    rx_packet_no: i64,
}

impl StreamState {
    /// Creates a new stream state.
    pub fn new(serial: u32) -> Self {
        Self {
            serial,
            body: Vec::new(),
            lacing: VecDeque::new(),
            page_no: 0,
            granule_position: 0,
            ended: false,
            eos_written: false,
            rx_body: Vec::new(),
            rx_lacing: VecDeque::new(),
            rx_expected_page: None,
            rx_hole: None,
            rx_eos: false,
            rx_packet_no: 0,
        }
    }

    /// Returns the serial number.
    pub fn serial(&self) -> u32 {
        self.serial
    }

    /// Returns the sequence number of the next page to be written.
    pub fn sequence(&self) -> u32 {
        self.page_no
    }

    /// Returns true once a page carrying the EOS flag was read.
    pub fn is_eos(&self) -> bool {
        self.rx_eos
    }

    /// Submits a packet for paging.
    pub fn packet_in(&mut self, packet: &Packet) -> Result<(), OggError> {
        if self.ended {
            return Err(OggError::StreamEnded);
        }

        for (i, value) in lacing_values(packet.data.len()).into_iter().enumerate() {
            self.lacing.push_back(Lacing {
                value,
                granule: packet.granule_position,
                packet_start: i == 0,
            });
        }
        self.body.extend_from_slice(&packet.data);

        if packet.eos {
            self.ended = true;
        }
        Ok(())
    }

    /// Marks the end of the stream without an EOS packet.
    ///
    /// The next [`flush`](Self::flush) puts the EOS flag on the last page,
    /// writing an empty page if nothing is pending.
    pub fn end(&mut self) {
        self.ended = true;
    }

    /// Returns a page if enough data is buffered to fill one.
    ///
    /// The first page of a stream is always emitted on its own, as is
    /// every page after the stream has ended.
    pub fn page_out(&mut self) -> Option<Page> {
        if self.lacing.is_empty() {
            return None;
        }

        let ready = self.ended
            || self.page_no == 0
            || self.lacing.len() >= MAX_SEGMENTS
            || self.body.len() >= PAGE_FILL_BYTES;
        if !ready {
            return None;
        }
        Some(self.emit_page())
    }

    /// Forces out a page with whatever is buffered.
    ///
    /// Call repeatedly until it returns `None` to drain the stream.
    pub fn flush(&mut self) -> Option<Page> {
        if self.lacing.is_empty() {
            if self.ended && !self.eos_written {
                return Some(self.emit_empty_eos_page());
            }
            return None;
        }
        Some(self.emit_page())
    }

    fn emit_page(&mut self) -> Page {
        let bos_page = self.page_no == 0;

        let mut count = 0;
        let mut bytes = 0;
        for lacing in self.lacing.iter() {
            if count == MAX_SEGMENTS || bytes >= PAGE_FILL_BYTES {
                break;
            }
            // The BOS page holds only the first packet.
            if bos_page && count > 0 && lacing.packet_start {
                break;
            }
            count += 1;
            bytes += lacing.value as usize;
        }

        let taken: Vec<Lacing> = self.lacing.drain(..count).collect();
        let body: Vec<u8> = self.body.drain(..bytes).collect();

        let mut header_type = 0u8;
        if taken.first().is_some_and(|l| !l.packet_start) {
            header_type |= flags::CONTINUATION;
        }
        if bos_page {
            header_type |= flags::BOS;
        }
        if self.ended && self.lacing.is_empty() {
            header_type |= flags::EOS;
            self.eos_written = true;
        }

        let granule = match taken.iter().rev().find(|l| l.value < 255) {
            Some(l) => {
                self.granule_position = l.granule;
                l.granule
            }
            None => -1,
        };

        let segment_table = taken.iter().map(|l| l.value).collect();
        let page = Page::build(header_type, granule, self.serial, self.page_no, segment_table, body);
        self.page_no += 1;
        page
    }

    fn emit_empty_eos_page(&mut self) -> Page {
        let mut header_type = flags::EOS;
        if self.page_no == 0 {
            header_type |= flags::BOS;
        }
        let page = Page::build(
            header_type,
            self.granule_position,
            self.serial,
            self.page_no,
            Vec::new(),
            Vec::new(),
        );
        self.page_no += 1;
        self.eos_written = true;
        page
    }

    /// Submits a page read from the physical stream.
    pub fn page_in(&mut self, page: &Page) -> Result<(), OggError> {
        if page.version != 0 {
            return Err(OggError::UnsupportedVersion(page.version));
        }
        if page.serial != self.serial {
            return Err(OggError::SerialMismatch {
                expected: self.serial,
                got: page.serial,
            });
        }
        let declared: usize = page.segment_table.iter().map(|&v| v as usize).sum();
        if declared != page.body.len() {
            return Err(OggError::Malformed(format!(
                "segment table declares {} bytes, body has {}",
                declared,
                page.body.len()
            )));
        }

        if let Some(expected) = self.rx_expected_page {
            if page.sequence != expected {
                self.drop_partial_packet();
                self.rx_hole = Some(self.complete_packets());
            }
        }
        self.rx_expected_page = Some(page.sequence.wrapping_add(1));

        let has_partial = self.rx_lacing.back().is_some_and(|l| l.value == 255);
        let mut segments = &page.segment_table[..];
        let mut body = &page.body[..];

        if page.is_continuation() && !has_partial {
            // Nothing to continue: skip the tail of a packet we never saw the start of.
            let mut skip = 0;
            let mut skip_bytes = 0;
            for &value in segments {
                skip += 1;
                skip_bytes += value as usize;
                if value < 255 {
                    break;
                }
            }
            segments = &segments[skip..];
            body = &body[skip_bytes..];
        } else if !page.is_continuation() && has_partial {
            self.drop_partial_packet();
        }

        let first_end = segments.iter().position(|&v| v < 255);
        let last_end = segments.iter().rposition(|&v| v < 255);
        for (i, &value) in segments.iter().enumerate() {
            let is_last = Some(i) == last_end;
            self.rx_lacing.push_back(RxLacing {
                value,
                granule: if is_last { page.granule_position } else { -1 },
                bos: page.is_bos() && Some(i) == first_end,
                eos: page.is_eos() && is_last,
            });
        }
        self.rx_body.extend_from_slice(body);

        if page.is_eos() {
            self.rx_eos = true;
        }
        Ok(())
    }

    /// Extracts the next complete packet.
    pub fn packet_out(&mut self) -> PacketOut {
        if self.rx_hole == Some(0) {
            self.rx_hole = None;
            return PacketOut::Hole;
        }

        let Some(end) = self.rx_lacing.iter().position(|l| l.value < 255) else {
            return PacketOut::NeedMore;
        };

        let entries: Vec<RxLacing> = self.rx_lacing.drain(..=end).collect();
        let size: usize = entries.iter().map(|l| l.value as usize).sum();
        let data: Vec<u8> = self.rx_body.drain(..size).collect();
        let last = entries[entries.len() - 1];

        if let Some(n) = self.rx_hole.as_mut() {
            *n -= 1;
        }

        let packet = Packet {
            data,
            bos: last.bos,
            eos: last.eos,
            granule_position: last.granule,
            packet_no: self.rx_packet_no,
        };
        self.rx_packet_no += 1;
        PacketOut::Packet(packet)
    }

    fn complete_packets(&self) -> usize {
        self.rx_lacing.iter().filter(|l| l.value < 255).count()
    }

    fn drop_partial_packet(&mut self) {
        while self.rx_lacing.back().is_some_and(|l| l.value == 255) {
            self.rx_lacing.pop_back();
            let len = self.rx_body.len();
            self.rx_body.truncate(len.saturating_sub(255));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(len: usize, fill: u8, granule: i64, no: i64) -> Packet {
        Packet::new(vec![fill; len], granule, no)
    }

    fn drain_packets(rx: &mut StreamState) -> Vec<Packet> {
        let mut out = Vec::new();
        while let PacketOut::Packet(p) = rx.packet_out() {
            out.push(p);
        }
        out
    }

    #[test]
    fn test_stream_state_new() {
        let state = StreamState::new(12345);
        assert_eq!(state.serial(), 12345);
        assert_eq!(state.sequence(), 0);
        assert!(!state.is_eos());
    }

    #[test]
    fn test_first_page_holds_only_first_packet() {
        let mut state = StreamState::new(1);
        state.packet_in(&packet(19, 1, 0, 0).with_bos(true)).unwrap();
        state.packet_in(&packet(30, 2, 0, 1)).unwrap();

        let page = state.page_out().unwrap();
        assert!(page.is_bos());
        assert_eq!(page.segment_table, vec![19]);
        assert_eq!(page.sequence, 0);
        assert_eq!(page.granule_position, 0);

        // The second packet waits for more data.
        assert!(state.page_out().is_none());
        let page = state.flush().unwrap();
        assert!(!page.is_bos());
        assert_eq!(page.sequence, 1);
        assert!(state.flush().is_none());
    }

    #[test]
    fn test_page_out_waits_for_fill() {
        let mut state = StreamState::new(1);
        state.packet_in(&packet(10, 0, 0, 0)).unwrap();
        state.flush().unwrap();

        for i in 0..40 {
            state.packet_in(&packet(100, 0, i * 960, i + 1)).unwrap();
        }
        assert!(state.page_out().is_none());

        state.packet_in(&packet(100, 0, 40 * 960, 41)).unwrap();
        let page = state.page_out().unwrap();
        assert!(page.body.len() >= PAGE_FILL_BYTES);
        assert_eq!(page.granule_position, 40 * 960);
        assert!(state.page_out().is_none());
    }

    #[test]
    fn test_segment_limit_forces_page() {
        let mut state = StreamState::new(1);
        state.packet_in(&packet(1, 0, 0, 0)).unwrap();
        state.flush().unwrap();

        for i in 0..255 {
            state.packet_in(&packet(2, 0, i, i)).unwrap();
        }
        let page = state.page_out().unwrap();
        assert_eq!(page.segment_table.len(), MAX_SEGMENTS);
    }

    #[test]
    fn test_large_packet_spans_pages() {
        let mut state = StreamState::new(7);
        state.packet_in(&packet(1, 0, 0, 0)).unwrap();
        state.flush().unwrap();

        state.packet_in(&packet(70_000, 3, 5000, 1).with_eos(true)).unwrap();
        let mut pages = Vec::new();
        while let Some(page) = state.flush() {
            pages.push(page);
        }
        assert!(pages.len() > 1);
        assert!(!pages[0].is_continuation());
        assert_eq!(pages[0].granule_position, -1);
        assert!(pages[1].is_continuation());
        let last = pages.last().unwrap();
        assert!(last.is_eos());
        assert_eq!(last.granule_position, 5000);
        assert_eq!(pages.iter().filter(|p| p.is_eos()).count(), 1);
    }

    #[test]
    fn test_packet_after_eos_rejected() {
        let mut state = StreamState::new(1);
        state.packet_in(&packet(5, 0, 0, 0).with_eos(true)).unwrap();
        assert_eq!(state.packet_in(&packet(5, 0, 0, 1)), Err(OggError::StreamEnded));
    }

    #[test]
    fn test_end_without_pending_writes_empty_eos_page() {
        let mut state = StreamState::new(1);
        state.packet_in(&packet(5, 0, 0, 0)).unwrap();
        state.flush().unwrap();
        state.packet_in(&packet(5, 0, 960, 1)).unwrap();
        state.flush().unwrap();

        state.end();
        let page = state.flush().unwrap();
        assert!(page.is_eos());
        assert!(page.segment_table.is_empty());
        assert_eq!(page.granule_position, 960);
        assert_eq!(page.sequence, 2);
        assert!(state.flush().is_none());
    }

    #[test]
    fn test_roundtrip_packets() {
        let mut tx = StreamState::new(99);
        let mut rx = StreamState::new(99);
        let sizes = [19usize, 27, 120, 255, 510, 1000, 0, 3];

        for (i, &size) in sizes.iter().enumerate() {
            let p = packet(size, i as u8, i as i64 * 480, i as i64)
                .with_bos(i == 0)
                .with_eos(i == sizes.len() - 1);
            tx.packet_in(&p).unwrap();
            while let Some(page) = tx.page_out() {
                rx.page_in(&page).unwrap();
            }
        }
        while let Some(page) = tx.flush() {
            rx.page_in(&page).unwrap();
        }

        let packets = drain_packets(&mut rx);
        assert_eq!(packets.len(), sizes.len());
        for (i, p) in packets.iter().enumerate() {
            assert_eq!(p.data, vec![i as u8; sizes[i]]);
            assert_eq!(p.packet_no, i as i64);
        }
        assert!(packets[0].bos);
        assert!(packets.last().unwrap().eos);
        assert!(rx.is_eos());
    }

    #[test]
    fn test_page_in_serial_mismatch() {
        let mut tx = StreamState::new(1);
        tx.packet_in(&packet(5, 0, 0, 0)).unwrap();
        let page = tx.flush().unwrap();

        let mut rx = StreamState::new(2);
        assert!(matches!(
            rx.page_in(&page),
            Err(OggError::SerialMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn test_page_in_malformed() {
        let mut page = Page::build(0, 0, 1, 0, vec![10], vec![0; 10]);
        page.body.truncate(4);
        let mut rx = StreamState::new(1);
        assert!(matches!(rx.page_in(&page), Err(OggError::Malformed(_))));
    }

    #[test]
    fn test_lost_page_reports_hole() {
        let mut tx = StreamState::new(3);
        let mut pages = Vec::new();
        for i in 0..4 {
            tx.packet_in(&packet(10, i as u8, i * 480, i)).unwrap();
            pages.push(tx.flush().unwrap());
        }

        let mut rx = StreamState::new(3);
        rx.page_in(&pages[0]).unwrap();
        rx.page_in(&pages[1]).unwrap();
        // pages[2] lost
        rx.page_in(&pages[3]).unwrap();

        let PacketOut::Packet(p) = rx.packet_out() else { panic!("expected packet") };
        assert_eq!(p.data[0], 0);
        let PacketOut::Packet(p) = rx.packet_out() else { panic!("expected packet") };
        assert_eq!(p.data[0], 1);
        assert_eq!(rx.packet_out(), PacketOut::Hole);
        let PacketOut::Packet(p) = rx.packet_out() else { panic!("expected packet") };
        assert_eq!(p.data[0], 3);
        assert_eq!(rx.packet_out(), PacketOut::NeedMore);
    }

    #[test]
    fn test_continued_page_without_start_is_skipped() {
        let mut tx = StreamState::new(4);
        tx.packet_in(&packet(1, 0, 0, 0)).unwrap();
        tx.flush().unwrap();
        tx.packet_in(&packet(600, 7, 480, 1)).unwrap();
        tx.packet_in(&packet(20, 8, 960, 2)).unwrap();

        // Split the 600-byte packet across pages by flushing a crafted prefix.
        let full = tx.flush().unwrap();
        let first = Page::build(0, -1, 4, 1, vec![255, 255], full.body[..510].to_vec());
        let second = Page::build(
            flags::CONTINUATION,
            960,
            4,
            2,
            vec![90, 20],
            full.body[510..].to_vec(),
        );

        let mut rx = StreamState::new(4);
        // Join mid-packet: only the continuation page arrives.
        rx.page_in(&second).unwrap();
        let packets = drain_packets(&mut rx);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].data, vec![8; 20]);
        assert_eq!(packets[0].granule_position, 960);

        let mut rx = StreamState::new(4);
        rx.page_in(&first).unwrap();
        rx.page_in(&second).unwrap();
        let packets = drain_packets(&mut rx);
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].data, vec![7; 600]);
        assert_eq!(packets[0].granule_position, -1);
    }
}
