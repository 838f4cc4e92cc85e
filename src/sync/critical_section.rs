//! The default [`MutexSource`] backing `ppm_buf_lock`: a fixed table of
//! critical-section-protected lock flags, sized at compile time.
//!
//! Grounded on [`super::primitives::CriticalSectionCell`] — the same
//! critical-section-protected interior mutability this crate already uses
//! for ISR-safe access, generalised here into a small slot table instead of
//! a single typed cell, since [`MutexSource`] hands out opaque handles
//! rather than owning the protected value itself.

use crate::platform::{MutexHandle, MutexSource};
use crate::sync::primitives::CriticalSectionCell;

/// A [`MutexSource`] with `N` static slots, each guarded by its own
/// critical-section cell.
///
/// `create` hands out the first free slot; `lock`/`unlock` spin on the
/// slot's flag inside a critical section (uncontended in practice, since
/// every caller of this crate's entry points already runs with the relevant
/// mutex held for the whole call).
pub struct CriticalSectionMutexSource<const N: usize> {
    slots: [CriticalSectionCell<SlotState>; N],
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Free,
    Unlocked,
    Locked,
}

impl<const N: usize> CriticalSectionMutexSource<N> {
    /// Builds a source with every slot free.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [const { CriticalSectionCell::new(SlotState::Free) }; N],
        }
    }
}

impl<const N: usize> Default for CriticalSectionMutexSource<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> MutexSource for CriticalSectionMutexSource<N> {
    fn create(&mut self) -> Option<MutexHandle> {
        for (index, slot) in self.slots.iter().enumerate() {
            let claimed = slot.with(|state| {
                if *state == SlotState::Free {
                    *state = SlotState::Unlocked;
                    true
                } else {
                    false
                }
            });
            if claimed {
                return Some(MutexHandle(index as u32));
            }
        }
        None
    }

    fn destroy(&mut self, handle: MutexHandle) {
        if let Some(slot) = self.slots.get(handle.0 as usize) {
            slot.with(|state| *state = SlotState::Free);
        }
    }

    fn lock(&mut self, handle: MutexHandle) {
        if let Some(slot) = self.slots.get(handle.0 as usize) {
            loop {
                let acquired = slot.with(|state| {
                    if *state == SlotState::Unlocked {
                        *state = SlotState::Locked;
                        true
                    } else {
                        false
                    }
                });
                if acquired {
                    break;
                }
                core::hint::spin_loop();
            }
        }
    }

    fn unlock(&mut self, handle: MutexHandle) {
        if let Some(slot) = self.slots.get(handle.0 as usize) {
            slot.with(|state| {
                if *state == SlotState::Locked {
                    *state = SlotState::Unlocked;
                }
            });
        }
    }
}
