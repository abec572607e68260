//! Ogg container format.
//!
//! This module implements the Ogg bitstream format as defined in RFC 3533:
//! packets are paged by a [`StreamState`] and recovered from a byte stream
//! by a [`SyncState`].

mod packet;
mod page;
mod stream;
mod sync;

pub use packet::*;
pub use page::*;
pub use stream::*;
pub use sync::*;
