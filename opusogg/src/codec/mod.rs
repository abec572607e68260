//! Codec and container primitives.
//!
//! - `opus`: Opus audio codec (RFC 6716) via libopus
//! - `ogg`: Ogg container format (RFC 3533)

pub mod opus;
pub mod ogg;
