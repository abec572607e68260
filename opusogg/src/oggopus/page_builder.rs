//! Packs packets of one logical stream into serialized Ogg pages.

use tracing::trace;

use crate::codec::ogg::{OggError, Packet, Page, StreamState};

/// Serializes packets into Ogg pages for a single logical stream.
#[derive(Debug)]
pub struct PageBuilder {
    stream: StreamState,
}

impl PageBuilder {
    /// Creates a builder for the stream with `serial`.
    pub fn new(serial: u32) -> Self {
        Self {
            stream: StreamState::new(serial),
        }
    }

    /// Returns the serial number of the stream.
    pub fn serial(&self) -> u32 {
        self.stream.serial()
    }

    /// Number of pages written so far.
    pub fn pages_written(&self) -> u32 {
        self.stream.sequence()
    }

    /// Submits a packet and returns the bytes of any pages it completed.
    ///
    /// The packet is buffered if it does not yet fill a page.
    pub fn packet_in(&mut self, packet: &Packet) -> Result<Vec<u8>, OggError> {
        self.stream.packet_in(packet)?;
        let mut out = Vec::new();
        while let Some(page) = self.stream.page_out() {
            Self::write_page(&page, &mut out);
        }
        Ok(out)
    }

    /// Forces every buffered packet out as pages.
    pub fn flush(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(page) = self.stream.flush() {
            Self::write_page(&page, &mut out);
        }
        out
    }

    /// Ends the stream and flushes.
    ///
    /// The last page carries the EOS flag; if nothing was buffered an empty
    /// EOS page is written.
    pub fn finish(&mut self) -> Vec<u8> {
        self.stream.end();
        self.flush()
    }

    fn write_page(page: &Page, out: &mut Vec<u8>) {
        trace!(
            "Page {} out: granule={}, {} bytes, eos={}",
            page.sequence,
            page.granule_position,
            page.len(),
            page.is_eos()
        );
        page.write_to(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ogg::{PageOut, SyncState};

    fn read_pages(bytes: &[u8]) -> Vec<Page> {
        let mut sync = SyncState::new();
        sync.write(bytes);
        let mut pages = Vec::new();
        while let PageOut::Page(page) = sync.page_out() {
            pages.push(page);
        }
        pages
    }

    #[test]
    fn test_header_packet_gets_own_page() {
        let mut builder = PageBuilder::new(42);
        let out = builder
            .packet_in(&Packet::new(vec![1; 19], 0, 0).with_bos(true))
            .unwrap();
        let pages = read_pages(&out);
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_bos());
        assert_eq!(pages[0].serial(), 42);
        assert_eq!(builder.pages_written(), 1);
    }

    #[test]
    fn test_buffers_until_flush() {
        let mut builder = PageBuilder::new(1);
        builder.packet_in(&Packet::new(vec![1; 19], 0, 0)).unwrap();

        let out = builder.packet_in(&Packet::new(vec![2; 100], 0, 1)).unwrap();
        assert!(out.is_empty());
        let out = builder.packet_in(&Packet::new(vec![3; 100], 960, 2)).unwrap();
        assert!(out.is_empty());

        let pages = read_pages(&builder.flush());
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].packets(), 2);
        assert_eq!(pages[0].granule_position, 960);
        assert!(builder.flush().is_empty());
    }

    #[test]
    fn test_finish_sets_eos() {
        let mut builder = PageBuilder::new(1);
        builder.packet_in(&Packet::new(vec![1; 19], 0, 0)).unwrap();
        builder.packet_in(&Packet::new(vec![2; 50], 0, 1)).unwrap();

        let pages = read_pages(&builder.finish());
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_eos());
        assert_eq!(pages[0].body.len(), 50);
    }

    #[test]
    fn test_finish_with_nothing_pending() {
        let mut builder = PageBuilder::new(1);
        builder.packet_in(&Packet::new(vec![1; 19], 0, 0)).unwrap();

        let pages = read_pages(&builder.finish());
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_eos());
        assert!(pages[0].body.is_empty());
        assert_eq!(pages[0].sequence, 1);
    }

    #[test]
    fn test_packet_after_finish() {
        let mut builder = PageBuilder::new(1);
        builder.finish();
        assert_eq!(
            builder.packet_in(&Packet::new(vec![0; 4], 0, 0)),
            Err(OggError::StreamEnded)
        );
    }
}
