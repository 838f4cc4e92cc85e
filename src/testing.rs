//! Mock collaborator implementations for testing the PPM and LLDP engines
//! on the host without platform access.
//!
//! Only available when running `cargo test`.

#![cfg(test)]
#![allow(missing_docs)]

extern crate std;

use core::cell::RefCell;
use std::vec::Vec;

use crate::error::ClassifiedError;
use crate::platform::{
    AlarmSink, ClockSource, ConnectionSink, Diagnostics, EthernetSender, InterfaceCounters,
    IpSource, MutexHandle, MutexSource, SubslotDirectory, SubslotInfo, TimerHandle, TimerSource,
};

// =============================================================================
// Mock clock
// =============================================================================

/// Clock that returns a settable, caller-controlled timestamp.
#[derive(Debug, Default)]
pub struct MockClock {
    now_us: RefCell<u64>,
}

impl MockClock {
    pub fn new(now_us: u64) -> Self {
        Self {
            now_us: RefCell::new(now_us),
        }
    }

    pub fn set(&self, now_us: u64) {
        *self.now_us.borrow_mut() = now_us;
    }

    pub fn advance(&self, delta_us: u64) {
        *self.now_us.borrow_mut() += delta_us;
    }
}

impl ClockSource for MockClock {
    fn current_time_us(&self) -> u64 {
        *self.now_us.borrow()
    }
}

// =============================================================================
// Mock Ethernet sender
// =============================================================================

/// Ethernet sender that records every frame it was handed and can be
/// configured to reject sends.
#[derive(Debug, Default)]
pub struct MockEthernet {
    frames: RefCell<Vec<Vec<u8>>>,
    fail_next: RefCell<bool>,
}

impl MockEthernet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_send(&self) {
        *self.fail_next.borrow_mut() = true;
    }

    pub fn sent_count(&self) -> usize {
        self.frames.borrow().len()
    }

    pub fn last_frame(&self) -> Option<Vec<u8>> {
        self.frames.borrow().last().cloned()
    }
}

impl EthernetSender for MockEthernet {
    fn send(&mut self, frame: &[u8]) -> usize {
        if *self.fail_next.borrow() {
            *self.fail_next.borrow_mut() = false;
            return 0;
        }
        self.frames.borrow_mut().push(frame.to_vec());
        frame.len()
    }
}

// =============================================================================
// Mock timer source
// =============================================================================

/// Timer source handing out sequential handles, tracking start/stop calls
/// and letting tests fail the next `create` to exercise re-arm failure
/// paths.
#[derive(Debug, Default)]
pub struct MockTimerSource {
    next_handle: RefCell<u32>,
    started: RefCell<Vec<TimerHandle>>,
    stopped: RefCell<Vec<TimerHandle>>,
    destroyed: RefCell<Vec<TimerHandle>>,
    fail_create: RefCell<bool>,
    fail_start: RefCell<bool>,
}

impl MockTimerSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_create(&self) {
        *self.fail_create.borrow_mut() = true;
    }

    pub fn fail_next_start(&self) {
        *self.fail_start.borrow_mut() = true;
    }

    pub fn start_count(&self) -> usize {
        self.started.borrow().len()
    }

    pub fn is_destroyed(&self, handle: TimerHandle) -> bool {
        self.destroyed.borrow().contains(&handle)
    }
}

impl TimerSource for MockTimerSource {
    fn create(&mut self, _period_us: u32, _oneshot: bool) -> Option<TimerHandle> {
        if *self.fail_create.borrow() {
            *self.fail_create.borrow_mut() = false;
            return None;
        }
        let mut next = self.next_handle.borrow_mut();
        let handle = TimerHandle(*next);
        *next += 1;
        Some(handle)
    }

    fn start(&mut self, handle: TimerHandle) -> bool {
        if *self.fail_start.borrow() {
            *self.fail_start.borrow_mut() = false;
            return false;
        }
        self.started.borrow_mut().push(handle);
        true
    }

    fn stop(&mut self, handle: TimerHandle) -> bool {
        self.stopped.borrow_mut().push(handle);
        true
    }

    fn destroy(&mut self, handle: TimerHandle) {
        self.destroyed.borrow_mut().push(handle);
    }
}

// =============================================================================
// Mock mutex source
// =============================================================================

/// Mutex source that records lock/unlock order instead of actually
/// synchronising anything (tests run single-threaded).
#[derive(Debug, Default)]
pub struct MockMutexSource {
    next_handle: RefCell<u32>,
    events: RefCell<Vec<&'static str>>,
}

impl MockMutexSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.events.borrow().clone()
    }
}

impl MutexSource for MockMutexSource {
    fn create(&mut self) -> Option<MutexHandle> {
        let mut next = self.next_handle.borrow_mut();
        let handle = MutexHandle(*next);
        *next += 1;
        self.events.borrow_mut().push("create");
        Some(handle)
    }

    fn destroy(&mut self, _handle: MutexHandle) {
        self.events.borrow_mut().push("destroy");
    }

    fn lock(&mut self, _handle: MutexHandle) {
        self.events.borrow_mut().push("lock");
    }

    fn unlock(&mut self, _handle: MutexHandle) {
        self.events.borrow_mut().push("unlock");
    }
}

// =============================================================================
// Mock connection sink
// =============================================================================

/// Connection sink recording every `ppm_error_ind` call.
#[derive(Debug, Default)]
pub struct MockConnectionSink {
    errors: RefCell<Vec<(u16, ClassifiedError)>>,
}

impl MockConnectionSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> Vec<(u16, ClassifiedError)> {
        self.errors.borrow().clone()
    }
}

impl ConnectionSink for MockConnectionSink {
    fn ppm_error_ind(&mut self, ar_index: u16, error: ClassifiedError) {
        self.errors.borrow_mut().push((ar_index, error));
    }
}

// =============================================================================
// Mock diagnostics / alarm sink / IP source / subslot directory
// =============================================================================

/// Diagnostics collaborator recording every `update` call.
#[derive(Debug, Default)]
pub struct MockDiagnostics {
    updates: RefCell<Vec<(u32, u16, u16, u16, bool)>>,
}

impl MockDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<(u32, u16, u16, u16, bool)> {
        self.updates.borrow().clone()
    }
}

impl Diagnostics for MockDiagnostics {
    fn update(&mut self, api: u32, slot: u16, subslot: u16, usi: u16, appears: bool) {
        self.updates.borrow_mut().push((api, slot, subslot, usi, appears));
    }
}

/// Alarm sink recording every port-change notification.
#[derive(Debug, Default)]
pub struct MockAlarmSink {
    notifications: RefCell<Vec<(u16, u16)>>,
}

impl MockAlarmSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<(u16, u16)> {
        self.notifications.borrow().clone()
    }
}

impl AlarmSink for MockAlarmSink {
    fn send_port_change_notification(&mut self, slot: u16, subslot: u16) {
        self.notifications.borrow_mut().push((slot, subslot));
    }
}

/// IP source returning a fixed address.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockIpSource(pub u32);

impl IpSource for MockIpSource {
    fn ipaddr(&self) -> u32 {
        self.0
    }
}

/// Subslot directory backed by an in-memory table the test populates.
#[derive(Debug, Default)]
pub struct MockSubslotDirectory {
    entries: Vec<SubslotInfo>,
}

impl MockSubslotDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, info: SubslotInfo) -> Self {
        self.entries.push(info);
        self
    }
}

impl SubslotDirectory for MockSubslotDirectory {
    fn get_subslot_full(&self, api: u32, slot: u16, subslot: u16) -> Option<SubslotInfo> {
        self.entries
            .iter()
            .copied()
            .find(|e| e.api == api && e.slot == slot && e.subslot == subslot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_clock_advances() {
        let clock = MockClock::new(100);
        clock.advance(50);
        assert_eq!(clock.current_time_us(), 150);
    }

    #[test]
    fn mock_ethernet_records_frames_and_can_fail() {
        let mut eth = MockEthernet::new();
        assert_eq!(eth.send(&[1, 2, 3]), 3);
        assert_eq!(eth.sent_count(), 1);

        eth.fail_next_send();
        assert_eq!(eth.send(&[4, 5]), 0);
        assert_eq!(eth.sent_count(), 1);
    }

    #[test]
    fn mock_timer_source_sequential_handles() {
        let mut timer = MockTimerSource::new();
        let a = timer.create(1000, true).unwrap();
        let b = timer.create(1000, true).unwrap();
        assert_ne!(a, b);
        assert!(timer.start(a));
        assert_eq!(timer.start_count(), 1);
    }

    #[test]
    fn mock_mutex_source_tracks_event_order() {
        let mut mutex = MockMutexSource::new();
        let handle = mutex.create().unwrap();
        mutex.lock(handle);
        mutex.unlock(handle);
        assert_eq!(mutex.events(), std::vec!["create", "lock", "unlock"]);
    }

    #[test]
    fn mock_subslot_directory_looks_up_by_address() {
        let dir = MockSubslotDirectory::new().with_entry(SubslotInfo {
            api: 0,
            slot: 0,
            subslot: 0x8001,
            module_ident: 1,
            submodule_ident: 2,
        });
        assert!(dir.get_subslot_full(0, 0, 0x8001).is_some());
        assert!(dir.get_subslot_full(0, 1, 0x8001).is_none());
    }
}
