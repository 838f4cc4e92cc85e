//! The Provider Protocol Machine entry points.
//!
//! Every method that needs a collaborator takes it as a generic parameter
//! per call (mirroring the teacher's `PhyDriver::init<M: MdioBus>(&mut self,
//! mdio: &mut M)`) instead of storing a trait object on `PpmEngine`. The
//! engine itself only owns the process-wide instance counter and the
//! `ppm_buf_lock` handle; per-connection state lives on the caller's `Ar`.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::codec::{write_eth_header, Writer};
use crate::constants::{data_status_bits, PPM_TRAILER_SIZE};
use crate::error::{ClassifiedError, Error, Result, StateError};
use crate::platform::{ClockSource, ConnectionSink, EthernetSender, InterfaceCounters, MutexHandle, MutexSource, SchedulerKind, TimerSource};
use crate::ppm::cycle::{compensated_delay, compute_cycle};
use crate::ppm::record::{Ar, PpmState};

/// Process-wide PPM state: the live-instance counter and the
/// `ppm_buf_lock` handle created on the 0→1 transition and destroyed on the
/// 1→0 transition.
pub struct PpmEngine {
    instance_count: AtomicU32,
    lock: Option<MutexHandle>,
}

impl PpmEngine {
    /// Builds an engine with `instance_count = 0` and no lock.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            instance_count: AtomicU32::new(0),
            lock: None,
        }
    }

    /// `init()`: resets `instance_count` to 0. Has no other effect.
    pub fn init(&mut self) {
        self.instance_count.store(0, Ordering::SeqCst);
        self.lock = None;
    }

    /// Number of currently active PPM instances.
    #[must_use]
    pub fn instance_count(&self) -> u32 {
        self.instance_count.load(Ordering::SeqCst)
    }

    /// `true` while `ppm_buf_lock` exists (`instance_count > 0`).
    #[must_use]
    pub fn has_lock(&self) -> bool {
        self.lock.is_some()
    }

    fn with_locked<R>(&self, mutex: &mut impl MutexSource, f: impl FnOnce() -> R) -> R {
        if let Some(handle) = self.lock {
            mutex.lock(handle);
            let result = f();
            mutex.unlock(handle);
            result
        } else {
            f()
        }
    }

    /// Initialises and starts the PPM instance at IOCR index `crep` of `ar`.
    ///
    /// # Errors
    /// Returns [`StateError::WrongIocrType`] if the IOCR is not `Input` or
    /// `McProvider`, or [`StateError::InvalidState`] if it is not in
    /// `WaitStart` (both also classify onto `ar`). Returns
    /// [`crate::error::RuntimeError::TimerRearmFailed`] if the timer
    /// collaborator cannot install the cyclic timer.
    pub fn activate<const MAX_IOCR: usize, const N: usize>(
        &mut self,
        ar: &mut Ar<MAX_IOCR, N>,
        crep: usize,
        mutex: &mut impl MutexSource,
        timer: &mut impl TimerSource,
        scheduler: SchedulerKind,
        stack_cycle_time_us: u32,
    ) -> Result<()> {
        let Some(iocr) = ar.iocr_mut(crep) else {
            return Err(Error::State(StateError::WrongIocrType));
        };
        if !iocr.kind.is_provider() {
            return Err(Error::State(StateError::WrongIocrType));
        }
        if iocr.ppm.state != PpmState::WaitStart {
            ar.classify_error(ClassifiedError::INVALID_STATE);
            return Err(Error::State(StateError::InvalidState));
        }

        let iocr = ar.iocr_mut(crep).expect("checked above");
        iocr.ppm.layout(iocr.params.c_sdu_length);

        {
            let mut w = Writer::new(&mut iocr.ppm.send_buffer[..iocr.ppm.buffer_length]);
            write_eth_header(
                &mut w,
                iocr.params.initiator_mac,
                iocr.params.responder_mac,
                Some(iocr.params.vlan),
                crate::constants::ETHERTYPE_PROFINET,
            )?;
            w.put_u16(iocr.params.frame_id)?;
        }

        iocr.ppm.data_status = data_status_bits::INITIAL;
        iocr.ppm.transfer_status = 0;
        iocr.ppm.control_interval_us = iocr.params.control_interval_us();
        iocr.ppm.compensated_control_interval_us = compensated_delay(
            iocr.ppm.control_interval_us,
            stack_cycle_time_us,
            scheduler,
        );
        iocr.ppm.first_transmit = false;
        iocr.ppm.trx_cnt = 0;

        let period = iocr.ppm.compensated_control_interval_us;
        match timer.create(period, true).filter(|h| timer.start(*h)) {
            Some(handle) => iocr.ppm.ci_timer = Some(handle),
            None => {
                iocr.ppm.ci_timer = None;
                ar.classify_error(ClassifiedError::INVALID);
                return Err(Error::Runtime(crate::error::RuntimeError::TimerRearmFailed));
            }
        }

        let iocr = ar.iocr_mut(crep).expect("checked above");
        iocr.ppm.ci_running = true;
        iocr.ppm.state = PpmState::Run;

        if self.instance_count.fetch_add(1, Ordering::SeqCst) == 0 {
            self.lock = mutex.create();
        }

        Ok(())
    }

    /// Stops cyclic transmission for the IOCR at `crep` and returns it to
    /// `WaitStart`.
    ///
    /// # Errors
    /// Returns [`StateError::WrongIocrType`] if the slot is out of range or
    /// not a provider IOCR.
    pub fn close<const MAX_IOCR: usize, const N: usize>(
        &mut self,
        ar: &mut Ar<MAX_IOCR, N>,
        crep: usize,
        mutex: &mut impl MutexSource,
        timer: &mut impl TimerSource,
    ) -> Result<()> {
        let Some(iocr) = ar.iocr_mut(crep) else {
            return Err(Error::State(StateError::WrongIocrType));
        };
        if !iocr.kind.is_provider() {
            return Err(Error::State(StateError::WrongIocrType));
        }

        iocr.ppm.ci_running = false;
        if let Some(handle) = iocr.ppm.ci_timer.take() {
            timer.stop(handle);
            timer.destroy(handle);
        }
        iocr.ppm.state = PpmState::WaitStart;
        iocr.ppm.data_status = 0;

        if self.instance_count.fetch_sub(1, Ordering::SeqCst) == 1 {
            if let Some(handle) = self.lock.take() {
                mutex.destroy(handle);
            }
        }

        Ok(())
    }

    /// Copies `data`/`iops` into the IODATA object addressed by
    /// `(api_id, slot, subslot)`.
    ///
    /// # Errors
    /// Returns [`StateError::InvalidState`] (classified on `ar`) if the
    /// IOCR is not `Run`. Returns [`crate::error::CodecError::Overflow`]
    /// (not classified — caller's responsibility) on a length mismatch or
    /// unknown address.
    pub fn set_data_and_iops<const MAX_IOCR: usize, const N: usize>(
        &self,
        ar: &mut Ar<MAX_IOCR, N>,
        crep: usize,
        api_id: u32,
        slot: u16,
        subslot: u16,
        data: &[u8],
        iops: &[u8],
        mutex: &mut impl MutexSource,
    ) -> Result<()> {
        let Some(iocr) = ar.iocr_mut(crep) else {
            return Err(Error::State(StateError::WrongIocrType));
        };
        if iocr.ppm.state != PpmState::Run {
            ar.classify_error(ClassifiedError::INVALID_STATE);
            return Err(Error::State(StateError::InvalidState));
        }

        let Some(object) = iocr.find_io_object(api_id, slot, subslot) else {
            return Err(Error::Codec(crate::error::CodecError::Truncated));
        };
        if object.data_length != data.len() || object.iops_length != iops.len() {
            return Err(Error::Codec(crate::error::CodecError::Overflow));
        }
        let (data_offset, iops_offset) = (object.data_offset, object.iops_offset);

        self.with_locked(mutex, || {
            iocr.ppm.buffer_data[data_offset..data_offset + data.len()].copy_from_slice(data);
            if !iops.is_empty() {
                iocr.ppm.buffer_data[iops_offset] = iops[0];
            }
        });

        let object = iocr
            .find_io_object_mut(api_id, slot, subslot)
            .expect("looked up above");
        object.data_avail = true;
        Ok(())
    }

    /// Copies `iocs` into the IODATA object addressed by
    /// `(api_id, slot, subslot)`. An empty `iocs` succeeds silently (§4.2).
    ///
    /// # Errors
    /// Returns [`StateError::InvalidState`] if the IOCR is not `Run`.
    pub fn set_iocs<const MAX_IOCR: usize, const N: usize>(
        &self,
        ar: &mut Ar<MAX_IOCR, N>,
        crep: usize,
        api_id: u32,
        slot: u16,
        subslot: u16,
        iocs: &[u8],
        mutex: &mut impl MutexSource,
    ) -> Result<()> {
        let Some(iocr) = ar.iocr_mut(crep) else {
            return Err(Error::State(StateError::WrongIocrType));
        };
        if iocr.ppm.state != PpmState::Run {
            ar.classify_error(ClassifiedError::INVALID_STATE);
            return Err(Error::State(StateError::InvalidState));
        }
        let Some(object) = iocr.find_io_object(api_id, slot, subslot) else {
            return Err(Error::Codec(crate::error::CodecError::Truncated));
        };
        if object.iocs_length == 0 {
            return Ok(());
        }
        if object.iocs_length != iocs.len() {
            return Err(Error::Codec(crate::error::CodecError::Overflow));
        }
        let iocs_offset = object.iocs_offset;

        self.with_locked(mutex, || {
            iocr.ppm.buffer_data[iocs_offset] = iocs[0];
        });
        Ok(())
    }

    /// Reads the data and IOPS fields for `(api_id, slot, subslot)` into
    /// caller-supplied buffers.
    ///
    /// # Errors
    /// Returns [`crate::error::CodecError::Overflow`] if the supplied
    /// buffers are smaller than the stored fields, or the address is
    /// unknown.
    pub fn get_data_and_iops<const MAX_IOCR: usize, const N: usize>(
        &self,
        ar: &Ar<MAX_IOCR, N>,
        crep: usize,
        api_id: u32,
        slot: u16,
        subslot: u16,
        data_out: &mut [u8],
        iops_out: &mut [u8],
        mutex: &mut impl MutexSource,
    ) -> Result<()> {
        let Some(iocr) = ar.iocr(crep) else {
            return Err(Error::State(StateError::WrongIocrType));
        };
        let Some(object) = iocr.find_io_object(api_id, slot, subslot) else {
            return Err(Error::Codec(crate::error::CodecError::Truncated));
        };
        if data_out.len() < object.data_length || iops_out.len() < object.iops_length {
            return Err(Error::Codec(crate::error::CodecError::Overflow));
        }
        let (data_offset, data_length, iops_offset, iops_length) =
            (object.data_offset, object.data_length, object.iops_offset, object.iops_length);

        self.with_locked(mutex, || {
            data_out[..data_length]
                .copy_from_slice(&iocr.ppm.buffer_data[data_offset..data_offset + data_length]);
            if iops_length > 0 {
                iops_out[0] = iocr.ppm.buffer_data[iops_offset];
            }
        });
        Ok(())
    }

    /// Reads the IOCS field for `(api_id, slot, subslot)`.
    ///
    /// # Errors
    /// Returns [`crate::error::CodecError::Overflow`] if `iocs_out` is
    /// smaller than the stored field, or the address is unknown.
    pub fn get_iocs<const MAX_IOCR: usize, const N: usize>(
        &self,
        ar: &Ar<MAX_IOCR, N>,
        crep: usize,
        api_id: u32,
        slot: u16,
        subslot: u16,
        iocs_out: &mut [u8],
        mutex: &mut impl MutexSource,
    ) -> Result<()> {
        let Some(iocr) = ar.iocr(crep) else {
            return Err(Error::State(StateError::WrongIocrType));
        };
        let Some(object) = iocr.find_io_object(api_id, slot, subslot) else {
            return Err(Error::Codec(crate::error::CodecError::Truncated));
        };
        if iocs_out.len() < object.iocs_length {
            return Err(Error::Codec(crate::error::CodecError::Overflow));
        }
        let iocs_offset = object.iocs_offset;
        let iocs_length = object.iocs_length;

        self.with_locked(mutex, || {
            if iocs_length > 0 {
                iocs_out[0] = iocr.ppm.buffer_data[iocs_offset];
            }
        });
        Ok(())
    }

    /// Sets the STATE bit (`true` = primary) on every provider IOCR of `ar`.
    pub fn set_data_status_state<const MAX_IOCR: usize, const N: usize>(
        ar: &mut Ar<MAX_IOCR, N>,
        primary: bool,
    ) {
        for iocr in &mut ar.iocrs {
            if iocr.kind.is_provider() {
                iocr.ppm.set_data_status_state(primary);
            }
        }
    }

    /// Sets the REDUNDANCY bit on every provider IOCR of `ar`.
    pub fn set_data_status_redundancy<const MAX_IOCR: usize, const N: usize>(
        ar: &mut Ar<MAX_IOCR, N>,
        redundant: bool,
    ) {
        for iocr in &mut ar.iocrs {
            if iocr.kind.is_provider() {
                iocr.ppm.set_data_status_redundancy(redundant);
            }
        }
    }

    /// Sets the PROVIDER_STATE bit (`true` = run) on every provider IOCR of
    /// `ar`.
    pub fn set_data_status_provider<const MAX_IOCR: usize, const N: usize>(
        ar: &mut Ar<MAX_IOCR, N>,
        run: bool,
    ) {
        for iocr in &mut ar.iocrs {
            if iocr.kind.is_provider() {
                iocr.ppm.set_data_status_provider(run);
            }
        }
    }

    /// Sets the PROBLEM_INDICATOR bit on every provider IOCR of `ar`.
    /// `flag=true` clears the bit (problem present).
    pub fn set_problem_indicator<const MAX_IOCR: usize, const N: usize>(
        ar: &mut Ar<MAX_IOCR, N>,
        flag: bool,
    ) {
        for iocr in &mut ar.iocrs {
            if iocr.kind.is_provider() {
                iocr.ppm.set_problem_indicator(flag);
            }
        }
    }

    /// Reads `data_status` for the IOCR at `crep`.
    #[must_use]
    pub fn get_data_status<const MAX_IOCR: usize, const N: usize>(
        ar: &Ar<MAX_IOCR, N>,
        crep: usize,
    ) -> Option<u8> {
        ar.iocr(crep).map(|iocr| iocr.ppm.data_status())
    }

    /// The cyclic send step, invoked from the IOCR's armed timer.
    ///
    /// Copies the staged payload into the frame under the lock, patches in
    /// the cycle counter/data status/transfer status, hands the frame to
    /// the Ethernet sender, updates counters, and re-arms (or halts) the
    /// timer per §4.2's failure semantics.
    ///
    /// # Errors
    /// Returns [`crate::error::RuntimeError::SendFailed`] if the Ethernet
    /// sender rejects the frame on the cooperative scheduling path (the
    /// preemptive path retains the buffer and re-arms regardless, only
    /// incrementing `ifOutErrors`).
    #[allow(clippy::too_many_arguments)]
    pub fn on_timer_fire<const MAX_IOCR: usize, const N: usize>(
        &self,
        ar: &mut Ar<MAX_IOCR, N>,
        crep: usize,
        ar_index: u16,
        clock: &impl ClockSource,
        mutex: &mut impl MutexSource,
        eth: &mut impl EthernetSender,
        timer: &mut impl TimerSource,
        conn: &mut impl ConnectionSink,
        counters: &mut InterfaceCounters,
        scheduler: SchedulerKind,
    ) -> Result<()> {
        enum Outcome {
            Idle,
            Sent,
            FailRetry,
            FailHalt,
        }

        let outcome = {
            let Some(iocr) = ar.iocr_mut(crep) else {
                return Err(Error::State(StateError::WrongIocrType));
            };
            if !iocr.ppm.ci_running {
                Outcome::Idle
            } else {
                let data_offset = iocr.ppm.buffer_pos;
                let c_sdu_length = iocr.params.c_sdu_length as usize;
                self.with_locked(mutex, || {
                    let end = data_offset + c_sdu_length;
                    iocr.ppm.send_buffer[data_offset..end]
                        .copy_from_slice(&iocr.ppm.buffer_data[..c_sdu_length]);
                });

                let cycle = compute_cycle(
                    clock.current_time_us(),
                    iocr.params.send_clock_factor,
                    iocr.params.reduction_ratio,
                );
                iocr.ppm.cycle = cycle;
                let cycle_offset = iocr.ppm.cycle_counter_offset;
                let data_status_offset = iocr.ppm.data_status_offset;
                let transfer_status_offset = iocr.ppm.transfer_status_offset;
                let data_status = iocr.ppm.data_status;
                let transfer_status = iocr.ppm.transfer_status;
                debug_assert_eq!(transfer_status_offset + 1, iocr.ppm.buffer_length);
                debug_assert_eq!(cycle_offset + PPM_TRAILER_SIZE, iocr.ppm.buffer_length);

                let cycle_bytes = (cycle as u16).to_be_bytes();
                iocr.ppm.send_buffer[cycle_offset..cycle_offset + 2].copy_from_slice(&cycle_bytes);
                iocr.ppm.send_buffer[data_status_offset] = data_status;
                iocr.ppm.send_buffer[transfer_status_offset] = transfer_status;

                let frame = &iocr.ppm.send_buffer[..iocr.ppm.buffer_length];
                let sent = eth.send(frame);

                if sent < frame.len() {
                    counters.record_error();
                    match scheduler {
                        SchedulerKind::Preemptive => {
                            self.rearm(iocr, timer);
                            Outcome::FailRetry
                        }
                        SchedulerKind::Cooperative => {
                            iocr.ppm.ci_timer = None;
                            Outcome::FailHalt
                        }
                    }
                } else {
                    counters.record_sent(sent as u32);
                    iocr.ppm.trx_cnt = iocr.ppm.trx_cnt.wrapping_add(1);
                    iocr.ppm.first_transmit = true;
                    self.rearm(iocr, timer);
                    Outcome::Sent
                }
            }
        };

        match outcome {
            Outcome::Idle | Outcome::Sent | Outcome::FailRetry => Ok(()),
            Outcome::FailHalt => {
                ar.classify_error(ClassifiedError::INVALID);
                conn.ppm_error_ind(ar_index, ClassifiedError::INVALID);
                Err(Error::Runtime(crate::error::RuntimeError::SendFailed))
            }
        }
    }

    fn rearm<const N: usize>(&self, iocr: &mut crate::ppm::record::Iocr<N>, timer: &mut impl TimerSource) {
        if let Some(handle) = iocr.ppm.ci_timer {
            timer.start(handle);
        }
    }
}

impl Default for PpmEngine {
    fn default() -> Self {
        Self::new()
    }
}
