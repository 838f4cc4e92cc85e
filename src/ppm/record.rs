//! Per-AR and per-IOCR data model.

use crate::constants::{data_status_bits, PPM_HEADER_SIZE, PPM_TRAILER_SIZE};
use crate::error::ClassifiedError;
use crate::platform::TimerHandle;
use crate::ppm::config::{IocrKind, IocrParams};

/// Maximum number of IODATA objects tracked per IOCR.
pub const MAX_IODATA_OBJECTS: usize = 16;

/// Maximum number of pending API diff entries tracked per AR.
pub const MAX_API_DIFFS: usize = 8;

/// PPM instance state (§4.2's state machine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PpmState {
    /// Not yet activated, or closed.
    #[default]
    WaitStart,
    /// Cyclic transmission armed.
    Run,
}

/// A descriptor mapping `(api_id, slot, subslot)` to offsets/lengths inside
/// an IOCR's `buffer_data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IoDataObject {
    /// API identifier.
    pub api_id: u32,
    /// Slot number.
    pub slot: u16,
    /// Subslot number.
    pub subslot: u16,
    /// Offset of the data region within `buffer_data`.
    pub data_offset: usize,
    /// Length of the data region.
    pub data_length: usize,
    /// Offset of the IOPS byte within `buffer_data`.
    pub iops_offset: usize,
    /// Length of the IOPS field (0 or 1).
    pub iops_length: usize,
    /// Offset of the IOCS byte within `buffer_data`.
    pub iocs_offset: usize,
    /// Length of the IOCS field (0 or 1).
    pub iocs_length: usize,
    /// Whether this slot is populated.
    pub in_use: bool,
    /// Set when the application has written fresh data since the last send.
    pub data_avail: bool,
}

impl IoDataObject {
    /// Returns `true` if `api_id`/`slot`/`subslot` address this object.
    #[must_use]
    pub fn matches(&self, api_id: u32, slot: u16, subslot: u16) -> bool {
        self.in_use && self.api_id == api_id && self.slot == slot && self.subslot == subslot
    }
}

/// Per-IOCR PPM runtime state and buffers.
///
/// `N` is the fixed capacity (in bytes) reserved for both `send_buffer` and
/// `buffer_data`; callers size it to the largest `c_sdu_length` they will
/// configure plus the header/trailer overhead.
pub struct PpmRecord<const N: usize> {
    pub(crate) state: PpmState,
    pub(crate) send_buffer: [u8; N],
    pub(crate) buffer_pos: usize,
    pub(crate) cycle_counter_offset: usize,
    pub(crate) data_status_offset: usize,
    pub(crate) transfer_status_offset: usize,
    pub(crate) buffer_length: usize,
    pub(crate) buffer_data: [u8; N],
    pub(crate) data_status: u8,
    pub(crate) transfer_status: u8,
    pub(crate) cycle: u32,
    pub(crate) control_interval_us: u32,
    pub(crate) compensated_control_interval_us: u32,
    pub(crate) first_transmit: bool,
    pub(crate) ci_running: bool,
    pub(crate) ci_timer: Option<TimerHandle>,
    pub(crate) trx_cnt: u32,
    pub(crate) errcnt: u32,
    pub(crate) errline: u32,
}

impl<const N: usize> PpmRecord<N> {
    /// Builds an inactive PPM record with all fields zeroed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: PpmState::WaitStart,
            send_buffer: [0u8; N],
            buffer_pos: PPM_HEADER_SIZE,
            cycle_counter_offset: 0,
            data_status_offset: 0,
            transfer_status_offset: 0,
            buffer_length: 0,
            buffer_data: [0u8; N],
            data_status: 0,
            transfer_status: 0,
            cycle: 0,
            control_interval_us: 0,
            compensated_control_interval_us: 0,
            first_transmit: false,
            ci_running: false,
            ci_timer: None,
            trx_cnt: 0,
            errcnt: 0,
            errline: 0,
        }
    }

    /// Lays out the trailing-field offsets for a given cyclic payload
    /// length, matching §3's `buffer_pos + c_sdu_length` formula.
    pub(crate) fn layout(&mut self, c_sdu_length: u16) {
        let c_sdu_length = c_sdu_length as usize;
        self.buffer_pos = PPM_HEADER_SIZE;
        self.cycle_counter_offset = PPM_HEADER_SIZE + c_sdu_length;
        self.data_status_offset = self.cycle_counter_offset + 2;
        self.transfer_status_offset = self.data_status_offset + 1;
        self.buffer_length = self.transfer_status_offset + 1;
        debug_assert_eq!(self.buffer_length, PPM_HEADER_SIZE + c_sdu_length + PPM_TRAILER_SIZE);
    }

    /// Current `data_status` byte.
    #[must_use]
    pub fn data_status(&self) -> u8 {
        self.data_status
    }

    /// `true` while cyclic transmission is armed (`state == Run`).
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.state, PpmState::Run)
    }

    fn set_bit(&mut self, bit: u8, set: bool) {
        if set {
            self.data_status |= bit;
        } else {
            self.data_status &= !bit;
        }
    }

    /// Sets STATE (`true` = primary).
    pub fn set_data_status_state(&mut self, primary: bool) {
        self.set_bit(data_status_bits::STATE, primary);
    }

    /// Sets REDUNDANCY.
    pub fn set_data_status_redundancy(&mut self, redundant: bool) {
        self.set_bit(data_status_bits::REDUNDANCY, redundant);
    }

    /// Sets PROVIDER_STATE (`true` = run).
    pub fn set_data_status_provider(&mut self, run: bool) {
        self.set_bit(data_status_bits::PROVIDER_STATE, run);
    }

    /// Sets PROBLEM_INDICATOR. Per §4.2, `flag=true` clears the bit
    /// (problem present); `flag=false` sets it (normal).
    pub fn set_problem_indicator(&mut self, flag: bool) {
        self.set_bit(data_status_bits::PROBLEM_INDICATOR, !flag);
    }
}

impl<const N: usize> Default for PpmRecord<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// One IOCR: its kind, shared parameters, and (for provider kinds) PPM
/// runtime state.
pub struct Iocr<const N: usize> {
    pub(crate) kind: IocrKind,
    pub(crate) params: IocrParams,
    pub(crate) ppm: PpmRecord<N>,
    pub(crate) io_objects: [IoDataObject; MAX_IODATA_OBJECTS],
    pub(crate) io_object_count: usize,
}

impl<const N: usize> Iocr<N> {
    /// Builds an unused IOCR slot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            kind: IocrKind::Unused,
            params: IocrParams {
                frame_id: 0,
                c_sdu_length: 0,
                send_clock_factor: 1,
                reduction_ratio: 1,
                vlan: crate::codec::VlanTag { vid: 0, pcp: 0 },
                initiator_mac: [0; 6],
                responder_mac: [0; 6],
            },
            ppm: PpmRecord::new(),
            io_objects: [IoDataObject {
                api_id: 0,
                slot: 0,
                subslot: 0,
                data_offset: 0,
                data_length: 0,
                iops_offset: 0,
                iops_length: 0,
                iocs_offset: 0,
                iocs_length: 0,
                in_use: false,
                data_avail: false,
            }; MAX_IODATA_OBJECTS],
            io_object_count: 0,
        }
    }

    /// Configures this slot as the given kind with the given parameters.
    /// Leaves PPM state at `WaitStart`.
    pub fn configure(&mut self, kind: IocrKind, params: IocrParams) {
        self.kind = kind;
        self.params = params;
        self.ppm = PpmRecord::new();
        self.io_object_count = 0;
    }

    /// Registers an IODATA object at the next free slot.
    ///
    /// Returns `false` if the object table is full.
    #[must_use]
    pub fn add_io_object(&mut self, object: IoDataObject) -> bool {
        if self.io_object_count >= MAX_IODATA_OBJECTS {
            return false;
        }
        self.io_objects[self.io_object_count] = object;
        self.io_object_count += 1;
        true
    }

    /// Finds the IODATA object addressed by `(api_id, slot, subslot)`.
    #[must_use]
    pub fn find_io_object(&self, api_id: u32, slot: u16, subslot: u16) -> Option<&IoDataObject> {
        self.io_objects[..self.io_object_count]
            .iter()
            .find(|o| o.matches(api_id, slot, subslot))
    }

    /// Mutable variant of [`Self::find_io_object`].
    pub fn find_io_object_mut(
        &mut self,
        api_id: u32,
        slot: u16,
        subslot: u16,
    ) -> Option<&mut IoDataObject> {
        self.io_objects[..self.io_object_count]
            .iter_mut()
            .find(|o| o.matches(api_id, slot, subslot))
    }
}

impl<const N: usize> Default for Iocr<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// One diff entry recorded against an AR's `api_diffs` (§4.3's no-peer-detected path).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DiffEntry {
    /// Slot number.
    pub slot: u16,
    /// Subslot number.
    pub subslot: u16,
    /// Expected module identifier.
    pub module_ident: u32,
    /// Expected submodule identifier.
    pub submodule_ident: u32,
    /// `true` if the expected submodule was not found (fault condition).
    pub fault: bool,
}

/// Append-only diff log.
///
/// Per the open question on `nbr_api_diffs`/`nbr_module_diffs`, entries are
/// always written at `count` and the counter incremented afterwards — never
/// used as an index before being advanced, which would silently overwrite
/// the last populated slot.
pub struct ApiDiffs<const N: usize> {
    entries: [DiffEntry; N],
    count: usize,
}

impl<const N: usize> ApiDiffs<N> {
    /// Builds an empty diff log.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: [DiffEntry {
                slot: 0,
                subslot: 0,
                module_ident: 0,
                submodule_ident: 0,
                fault: false,
            }; N],
            count: 0,
        }
    }

    /// Appends `entry`. Returns `false` if the log is full.
    #[must_use]
    pub fn push(&mut self, entry: DiffEntry) -> bool {
        if self.count >= N {
            return false;
        }
        self.entries[self.count] = entry;
        self.count += 1;
        true
    }

    /// Number of entries recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    /// `true` if no entries are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Recorded entries, in append order.
    #[must_use]
    pub fn entries(&self) -> &[DiffEntry] {
        &self.entries[..self.count]
    }

    /// Discards all recorded entries.
    pub fn clear(&mut self) {
        self.count = 0;
    }
}

impl<const N: usize> Default for ApiDiffs<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// One Application Relation: an ordered, fixed-capacity set of IOCRs plus
/// the error-classification fields PPM writes on protocol violations.
pub struct Ar<const MAX_IOCR: usize, const N: usize> {
    pub(crate) iocrs: [Iocr<N>; MAX_IOCR],
    /// `true` while this AR is an active, in-use connection.
    pub in_use: bool,
    /// Classified error last written by this core, if any.
    pub err: Option<ClassifiedError>,
    /// Append-only diagnostic diff log (§4.3).
    pub api_diffs: ApiDiffs<MAX_API_DIFFS>,
}

impl<const MAX_IOCR: usize, const N: usize> Ar<MAX_IOCR, N> {
    /// Builds an AR with every IOCR slot unused.
    #[must_use]
    pub fn new() -> Self {
        Self {
            iocrs: core::array::from_fn(|_| Iocr::new()),
            in_use: false,
            err: None,
            api_diffs: ApiDiffs::new(),
        }
    }

    /// Returns the IOCR at `crep`, if the index is in range.
    #[must_use]
    pub fn iocr(&self, crep: usize) -> Option<&Iocr<N>> {
        self.iocrs.get(crep)
    }

    /// Mutable variant of [`Self::iocr`].
    pub fn iocr_mut(&mut self, crep: usize) -> Option<&mut Iocr<N>> {
        self.iocrs.get_mut(crep)
    }

    /// Records a classified error on this AR (§7's `PPM/INVALID_STATE` /
    /// `PPM/INVALID`).
    pub fn classify_error(&mut self, error: ClassifiedError) {
        self.err = Some(error);
    }
}

impl<const MAX_IOCR: usize, const N: usize> Default for Ar<MAX_IOCR, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_scenario_1() {
        let mut rec: PpmRecord<64> = PpmRecord::new();
        rec.layout(40);
        assert_eq!(rec.buffer_pos, 20);
        assert_eq!(rec.cycle_counter_offset, 60);
        assert_eq!(rec.data_status_offset, 62);
        assert_eq!(rec.transfer_status_offset, 63);
        assert_eq!(rec.buffer_length, 64);
    }

    #[test]
    fn problem_indicator_bit_sense() {
        let mut rec: PpmRecord<8> = PpmRecord::new();
        rec.set_problem_indicator(true);
        assert_eq!(rec.data_status & data_status_bits::PROBLEM_INDICATOR, 0);
        rec.set_problem_indicator(false);
        assert_eq!(
            rec.data_status & data_status_bits::PROBLEM_INDICATOR,
            data_status_bits::PROBLEM_INDICATOR
        );
    }

    #[test]
    fn api_diffs_append_only() {
        let mut diffs: ApiDiffs<2> = ApiDiffs::new();
        let entry = DiffEntry {
            slot: 0,
            subslot: 0x8001,
            module_ident: 1,
            submodule_ident: 2,
            fault: true,
        };
        assert!(diffs.push(entry));
        assert_eq!(diffs.len(), 1);
        assert!(diffs.push(entry));
        assert!(!diffs.push(entry));
        assert_eq!(diffs.len(), 2);
    }

    #[test]
    fn ar_default_iocrs_are_unused() {
        let ar: Ar<4, 64> = Ar::new();
        for i in 0..4 {
            assert_eq!(ar.iocr(i).unwrap().kind, IocrKind::Unused);
        }
        assert!(ar.iocr(4).is_none());
    }
}
