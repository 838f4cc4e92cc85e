//! Pure cycle-counter and compensated-delay arithmetic.
//!
//! Kept free of any collaborator or engine state so the worked examples in
//! the end-to-end scenarios can be checked directly against these
//! functions.

use crate::constants::{CYCLE_TICK_DENOMINATOR, CYCLE_TICK_NUMERATOR};
use crate::platform::SchedulerKind;

/// Computes the 16-bit (wire-truncated) cycle counter for a send at
/// `current_time_us`, snapped to the `send_clock_factor * reduction_ratio`
/// grid of global 31.25 µs ticks.
///
/// Returned untruncated so callers can reason about monotonicity across
/// wraps; truncate with `as u16` only when writing to the wire.
#[must_use]
pub fn compute_cycle(current_time_us: u64, send_clock_factor: u16, reduction_ratio: u16) -> u32 {
    let raw = (current_time_us * CYCLE_TICK_NUMERATOR / CYCLE_TICK_DENOMINATOR) as u32;
    let ratio = u32::from(send_clock_factor) * u32::from(reduction_ratio);
    if ratio == 0 {
        return raw;
    }
    if raw < ratio {
        ratio
    } else {
        raw - (raw % ratio)
    }
}

/// Computes the compensated delay for re-arming the cyclic timer.
///
/// `wanted_delay_us` is the IOCR's target control interval;
/// `stack_cycle_time_us` is the scheduler's own tick period (> 0). Delays at
/// or below 1.5 stack ticks collapse to exactly one tick, to avoid arming a
/// cooperative scheduler right at a slot boundary it might miss.
#[must_use]
pub fn compensated_delay(
    wanted_delay_us: u32,
    stack_cycle_time_us: u32,
    scheduler: SchedulerKind,
) -> u32 {
    debug_assert!(stack_cycle_time_us > 0);

    let ticks = if u64::from(wanted_delay_us) * 2 <= u64::from(stack_cycle_time_us) * 3 {
        1
    } else {
        (wanted_delay_us + stack_cycle_time_us / 2) / stack_cycle_time_us
    };

    match scheduler {
        SchedulerKind::Preemptive => ticks * stack_cycle_time_us,
        SchedulerKind::Cooperative => ticks * stack_cycle_time_us - stack_cycle_time_us / 2,
    }
}
