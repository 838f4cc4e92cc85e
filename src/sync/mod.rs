//! Synchronization primitives
//!
//! - **Primitives** (`primitives`): [`CriticalSectionCell`], critical-section
//!   protected interior mutability.
//!
//! - **`critical_section`**: [`CriticalSectionMutexSource`], the default
//!   [`crate::platform::MutexSource`] implementation backing `ppm_buf_lock`
//!   on critical-section-capable platforms.
//!
//! Gated behind the `critical-section` feature. Callers supplying their own
//! `MutexSource` do not need this module.

mod primitives;

pub use primitives::CriticalSectionCell;

pub mod critical_section;

pub use critical_section::CriticalSectionMutexSource;
