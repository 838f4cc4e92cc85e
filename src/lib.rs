//! PROFINET IO device-side cyclic data and neighbor discovery core
//!
//! A `no_std`, `no_alloc` Rust implementation of two parts of a PROFINET IO
//! device's field-side stack:
//!
//! - The **Provider Protocol Machine** ([`ppm`]): per-connection cyclic
//!   Ethernet frame transmission, phase-locked to the PROFINET 31.25 us
//!   global tick.
//! - **LLDP** ([`lldp`]): periodic neighbor-identity broadcast, peer decode,
//!   and the port-change diagnostic/alarm paths driven by a lost or
//!   mismatched peer.
//!
//! # Architecture
//!
//! 1. **Data model** ([`ppm::record`], [`lldp::peer`]): the `Ar`/`Iocr`
//!    buffers and the peer record, as plain structs over fixed-size arrays.
//! 2. **Codec** ([`codec`]): pure functions serialising/deserialising
//!    Ethernet/VLAN headers and LLDP TLVs into caller-supplied byte slices.
//! 3. **Engines** ([`ppm::engine`], [`lldp::engine`]): the public entry
//!    points, each collaborator (Ethernet channel, timer, mutex, clock,
//!    diagnostics) taken as a generic parameter per call rather than stored
//!    as a `dyn` trait object, so nothing in this crate needs an allocator.
//!
//! ## Standard Compliance
//!
//! - **IEC 61158-6-10 / IEC 61784-2**: PROFINET IO cyclic data exchange and
//!   frame layout.
//! - **IEEE 802.1AB**: LLDP TLV encoding and peer aging.
//! - **IEEE 802.3 / 802.1Q**: Ethernet II framing, VLAN tagging.
//!
//! # Features
//!
//! - `defmt`: Enable `defmt::Format` on the public error and data types.
//! - `critical-section`: Enable the default critical-section-backed
//!   [`platform::MutexSource`] implementation ([`sync::CriticalSectionMutexSource`]).
//!
//! # Example
//!
//! ```ignore
//! use profinet_ppm_lldp::ppm::{PpmEngine, IocrConfig, IocrKind};
//! use profinet_ppm_lldp::ppm::Ar;
//! use profinet_ppm_lldp::platform::SchedulerKind;
//!
//! let mut ar: Ar<4, 1522> = Ar::new();
//! let params = IocrConfig::new()
//!     .with_frame_id(0x8001)
//!     .with_c_sdu_length(40)
//!     .with_clock(32, 1)
//!     .with_macs([0x02, 0, 0, 0, 0, 1], [0x02, 0, 0, 0, 0, 2])
//!     .build();
//! ar.iocr_mut(0).unwrap().configure(IocrKind::Input, params);
//!
//! let mut engine = PpmEngine::new();
//! // engine.activate(&mut ar, 0, &mut mutex, &mut timer, SchedulerKind::Preemptive, 1000)?;
//! ```

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels live here; thresholds and config are in clippy.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::module_name_repetitions,
    clippy::wildcard_imports
)]

// =============================================================================
// Modules
// =============================================================================

pub mod codec;
pub mod constants;
pub mod error;
pub mod lldp;
pub mod platform;
pub mod ppm;
pub mod util;

#[cfg(feature = "critical-section")]
#[cfg_attr(docsrs, doc(cfg(feature = "critical-section")))]
pub mod sync;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{ClassifiedError, CodecError, Error, ErrorClass, ErrorCode, Result, RuntimeError, StateError};
pub use lldp::LldpEngine;
pub use ppm::{Ar, PpmEngine};

#[cfg(feature = "critical-section")]
pub use sync::CriticalSectionMutexSource;
