//! Bounded frame codec
//!
//! Replaces the `(buf, pos)` cursor pattern with a fail-fast bounded
//! [`Writer`] / [`Reader`] pair: writes past the buffer's capacity return
//! [`crate::error::CodecError::Overflow`] without mutating the cursor, reads
//! past the available bytes return
//! [`crate::error::CodecError::Truncated`]. All multi-byte fields are
//! big-endian on the wire.

mod eth;
mod lldp_tlv;
mod reader;
mod writer;

pub use eth::{write_eth_header, VlanTag};
pub use lldp_tlv::{mandatory_tlvs, optional_tlvs, write_end_tlv, TlvEvent, TlvWalker};
pub use reader::Reader;
pub use writer::Writer;
