//! Ogg sync state for reading pages out of a byte stream.
//!
//! Bytes may be supplied in arbitrary pieces; pages are returned once they
//! are complete and their checksum verifies. Anything that is not a valid
//! page is skipped up to the next candidate capture pattern.

use super::page::{CAPTURE_PATTERN, HEADER_SIZE, Page};

/// Result of [`SyncState::page_out`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOut {
    /// A complete, checksum-verified page.
    Page(Page),
    /// No complete page is buffered yet.
    NeedMore,
    /// This many bytes were discarded while searching for a page.
    Skipped(usize),
}

/// Ogg sync state.
#[derive(Debug, Default)]
pub struct SyncState {
    data: Vec<u8>,
    fill: usize,
    returned: usize,
}

impl SyncState {
    /// Creates a new, empty sync state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a writable region of `size` bytes at the end of the buffer.
    ///
    /// Follow up with [`wrote`](Self::wrote) to commit what was written.
    pub fn buffer(&mut self, size: usize) -> &mut [u8] {
        if self.returned > 0 {
            self.data.copy_within(self.returned..self.fill, 0);
            self.fill -= self.returned;
            self.returned = 0;
        }
        if self.data.len() < self.fill + size {
            self.data.resize(self.fill + size, 0);
        }
        &mut self.data[self.fill..self.fill + size]
    }

    /// Commits `bytes` bytes written into the region from [`buffer`](Self::buffer).
    pub fn wrote(&mut self, bytes: usize) {
        self.fill = (self.fill + bytes).min(self.data.len());
    }

    /// Appends bytes to the sync buffer.
    pub fn write(&mut self, bytes: &[u8]) {
        self.buffer(bytes.len()).copy_from_slice(bytes);
        self.wrote(bytes.len());
    }

    /// Number of buffered bytes not yet returned as pages.
    pub fn pending(&self) -> usize {
        self.fill - self.returned
    }

    /// Returns true if the pending bytes begin with a full capture pattern,
    /// i.e. they look like the start of an incomplete page.
    pub fn at_capture(&self) -> bool {
        self.data[self.returned..self.fill].starts_with(CAPTURE_PATTERN)
    }

    /// Returns the next complete page, if any.
    pub fn page_out(&mut self) -> PageOut {
        let buf = &self.data[self.returned..self.fill];

        let magic_len = buf.len().min(CAPTURE_PATTERN.len());
        if buf[..magic_len] != CAPTURE_PATTERN[..magic_len] {
            return self.skip_to_next_capture();
        }
        if buf.len() < HEADER_SIZE {
            return PageOut::NeedMore;
        }

        let segments = buf[26] as usize;
        let header_len = HEADER_SIZE + segments;
        if buf.len() < header_len {
            return PageOut::NeedMore;
        }
        let segment_table = &buf[HEADER_SIZE..header_len];
        let body_len: usize = segment_table.iter().map(|&s| s as usize).sum();
        if buf.len() < header_len + body_len {
            return PageOut::NeedMore;
        }

        let page = Page {
            version: buf[4],
            header_type: buf[5],
            granule_position: i64::from_le_bytes(read_array(&buf[6..14])),
            serial: u32::from_le_bytes(read_array(&buf[14..18])),
            sequence: u32::from_le_bytes(read_array(&buf[18..22])),
            checksum: u32::from_le_bytes(read_array(&buf[22..26])),
            segment_table: segment_table.to_vec(),
            body: buf[header_len..header_len + body_len].to_vec(),
        };

        if page.compute_checksum() != page.checksum {
            return self.skip_to_next_capture();
        }

        self.returned += header_len + body_len;
        PageOut::Page(page)
    }

    /// Drops bytes up to the next possible start of a page.
    fn skip_to_next_capture(&mut self) -> PageOut {
        let buf = &self.data[self.returned..self.fill];
        let skip = buf
            .iter()
            .skip(1)
            .position(|&b| b == CAPTURE_PATTERN[0])
            .map(|p| p + 1)
            .unwrap_or(buf.len());
        self.returned += skip;
        PageOut::Skipped(skip)
    }
}

fn read_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}
