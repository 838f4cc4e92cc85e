//! Link Layer Discovery Protocol: periodic identity broadcast, peer decode,
//! and the port-change diagnostic/alarm paths.
//!
//! # Organisation
//!
//! - [`config`]: this device's outgoing LLDP identity (`LldpConfig`).
//! - [`peer`]: the remote peer record and alias derivation.
//! - [`diag`]: the diagnostic item shapes raised by the alarm paths.
//! - [`engine`]: [`engine::LldpEngine`], the public entry points.

pub mod config;
pub mod diag;
pub mod engine;
pub mod peer;

pub use config::{LldpConfig, MacPhyConfig, LldpStr, MAX_LLDP_STRING};
pub use diag::{ChannelErrorType, DiagItem, DiagTransition, ExtendedErrorType, Usi};
pub use engine::LldpEngine;
pub use peer::{derive_alias, AliasStr, PeerRecord, MAX_ALIAS_LEN};
