//! Shared helpers for the integration tests.

#![allow(dead_code)]

use opusogg::codec::ogg::{Packet, PacketOut, Page, PageOut, StreamState, SyncState};
use opusogg::{OggOpusEncoder, StreamConfig};

/// Installs a test subscriber once; set RUST_LOG to see stream logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Encodes `pcm` in a single final call.
pub fn encode(config: StreamConfig, pcm: &[u8]) -> Vec<u8> {
    let mut enc = OggOpusEncoder::new(config).expect("encoder");
    enc.feed(pcm, true).expect("feed")
}

/// 16-bit LE sine wave, interleaved over `channels`.
pub fn sine(sample_rate: u32, channels: u8, samples: usize, freq: f64) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples * channels as usize * 2);
    for i in 0..samples {
        let t = i as f64 / sample_rate as f64;
        let v = ((2.0 * std::f64::consts::PI * freq * t).sin() * 8000.0) as i16;
        for _ in 0..channels {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }
    out
}

pub fn read_pages(bytes: &[u8]) -> Vec<Page> {
    let mut sync = SyncState::new();
    sync.write(bytes);
    let mut pages = Vec::new();
    loop {
        match sync.page_out() {
            PageOut::Page(page) => pages.push(page),
            PageOut::Skipped(n) => panic!("skipped {} bytes in encoder output", n),
            PageOut::NeedMore => break,
        }
    }
    assert_eq!(sync.pending(), 0, "trailing bytes in encoder output");
    pages
}

pub fn read_packets(pages: &[Page]) -> Vec<Packet> {
    let mut stream = StreamState::new(pages[0].serial());
    let mut packets = Vec::new();
    for page in pages {
        stream.page_in(page).expect("page_in");
        loop {
            match stream.packet_out() {
                PacketOut::Packet(p) => packets.push(p),
                PacketOut::Hole => panic!("hole in encoder output"),
                PacketOut::NeedMore => break,
            }
        }
    }
    packets
}

/// Re-pages `packets` into a fresh stream with the given serial.
pub fn write_packets(serial: u32, packets: &[Packet]) -> Vec<u8> {
    let mut stream = StreamState::new(serial);
    let mut out = Vec::new();
    for (i, packet) in packets.iter().enumerate() {
        stream.packet_in(packet).expect("packet_in");
        if i < 2 {
            while let Some(page) = stream.flush() {
                page.write_to(&mut out);
            }
        } else {
            while let Some(page) = stream.page_out() {
                page.write_to(&mut out);
            }
        }
    }
    while let Some(page) = stream.flush() {
        page.write_to(&mut out);
    }
    out
}

pub fn to_samples(pcm: &[u8]) -> Vec<i16> {
    opusogg::pcm::bytes_to_samples(pcm)
}
