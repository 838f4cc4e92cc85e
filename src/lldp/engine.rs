//! The LLDP engine: periodic broadcast, peer decode, and the port-change
//! diagnostic/alarm paths.

use crate::codec::{mandatory_tlvs, optional_tlvs, write_end_tlv, write_eth_header, TlvEvent, TlvWalker, Writer};
use crate::constants::{
    id_subtype, DAP_SLOT, ETHERTYPE_LLDP, INTERFACE_1_PORT_1_SUBSLOT, LLDP_MULTICAST_MAC,
    MAX_FRAME_SIZE,
};
use crate::error::Result;
use crate::lldp::config::LldpConfig;
use crate::lldp::diag::{ChannelErrorType, DiagItem, DiagTransition, ExtendedErrorType, Usi};
use crate::lldp::peer::{derive_alias, PeerRecord};
use crate::platform::{
    AlarmSink, Diagnostics, EthernetSender, InterfaceCounters, IpSource, SubslotDirectory,
    TimerHandle, TimerSource,
};
use crate::ppm::record::{Ar, DiffEntry};

/// Singleton LLDP state: the one peer record this device's single physical
/// port tracks, plus the handle of its periodic broadcast timer.
pub struct LldpEngine {
    peer: PeerRecord,
    broadcast_timer: Option<TimerHandle>,
}

impl LldpEngine {
    /// Builds an engine with no peer seen and no broadcast timer armed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            peer: PeerRecord::new(),
            broadcast_timer: None,
        }
    }

    /// The current peer record.
    #[must_use]
    pub fn peer(&self) -> &PeerRecord {
        &self.peer
    }

    /// Builds and transmits one LLDP frame per `config`.
    ///
    /// Does nothing and returns `Ok(())` if `config.suppress_send` is set.
    ///
    /// # Errors
    /// Returns [`crate::error::CodecError::Overflow`] if the frame does not
    /// fit [`MAX_FRAME_SIZE`], or [`crate::error::RuntimeError::SendFailed`]
    /// if the Ethernet sender rejects the frame.
    pub fn lldp_send(
        &self,
        config: &LldpConfig,
        ip: &impl IpSource,
        eth: &mut impl EthernetSender,
        counters: &mut InterfaceCounters,
    ) -> Result<()> {
        if config.suppress_send {
            return Ok(());
        }

        let mut buf = [0u8; MAX_FRAME_SIZE];
        let len = {
            let mut w = Writer::new(&mut buf);
            write_eth_header(&mut w, LLDP_MULTICAST_MAC, config.device_mac, None, ETHERTYPE_LLDP)?;
            mandatory_tlvs(
                &mut w,
                config.chassis_id.as_str(),
                config.device_mac,
                config.port_id.as_str(),
                config.ttl_s,
            )?;
            optional_tlvs(
                &mut w,
                config.rtclass2,
                config.rtclass3,
                config.device_mac,
                config.mac_phy.cap_aneg,
                config.mac_phy.cap_phy,
                config.mac_phy.mau_type,
                ip.ipaddr(),
            )?;
            write_end_tlv(&mut w)?;
            w.position()
        };

        let frame = &buf[..len];
        let sent = eth.send(frame);
        if sent < frame.len() {
            counters.record_error();
            return Err(crate::error::Error::Runtime(
                crate::error::RuntimeError::SendFailed,
            ));
        }
        counters.record_sent(sent as u32);
        Ok(())
    }

    /// Arms the periodic broadcast timer at `period_us`.
    pub fn start_broadcast(&mut self, timer: &mut impl TimerSource, period_us: u32) -> bool {
        let Some(handle) = timer.create(period_us, false) else {
            return false;
        };
        if !timer.start(handle) {
            timer.destroy(handle);
            return false;
        }
        self.broadcast_timer = Some(handle);
        true
    }

    /// Broadcast timer callback: sends one LLDP frame unless suppressed, in
    /// which case it stops the timer instead.
    ///
    /// # Errors
    /// Propagates [`Self::lldp_send`]'s errors.
    pub fn on_broadcast_tick(
        &self,
        config: &LldpConfig,
        ip: &impl IpSource,
        eth: &mut impl EthernetSender,
        timer: &mut impl TimerSource,
        counters: &mut InterfaceCounters,
    ) -> Result<()> {
        if config.suppress_send {
            if let Some(handle) = self.broadcast_timer {
                timer.stop(handle);
            }
            return Ok(());
        }
        self.lldp_send(config, ip, eth, counters)
    }

    /// Decodes an LLDP frame's TLVs starting at `start_offset`, updating the
    /// peer record and (re)arming the peer-timeout timer on the TTL TLV.
    ///
    /// Returns `true` if the computed alias changed from the previously
    /// stored temporary alias — the caller must then invoke
    /// [`Self::remote_mismatch`].
    ///
    /// # Errors
    /// Returns [`crate::error::CodecError::Truncated`] if the frame is
    /// malformed.
    pub fn lldp_recv(
        &mut self,
        frame: &[u8],
        start_offset: usize,
        timer: &mut impl TimerSource,
    ) -> Result<bool> {
        let mut chassis_bytes: [u8; crate::lldp::config::MAX_LLDP_STRING] =
            [0; crate::lldp::config::MAX_LLDP_STRING];
        let mut chassis_len = 0usize;
        let mut alias_changed = false;

        for event in TlvWalker::new(frame, start_offset) {
            match event? {
                TlvEvent::ChassisId { bytes, .. } => {
                    let n = bytes.len().min(chassis_bytes.len());
                    chassis_bytes[..n].copy_from_slice(&bytes[..n]);
                    chassis_len = n;
                    self.peer.peer_chassis_id = crate::lldp::config::LldpStr::from_bytes(bytes)
                        .unwrap_or_else(|_| crate::lldp::config::LldpStr::new());
                }
                TlvEvent::PortId { subtype, bytes } => {
                    let _ = subtype == id_subtype::LOCALLY_ASSIGNED;
                    self.peer.peer_port_id = crate::lldp::config::LldpStr::from_bytes(bytes)
                        .unwrap_or_else(|_| crate::lldp::config::LldpStr::new());

                    let port_id_str = self.peer.peer_port_id.as_str();
                    let chassis_str = core::str::from_utf8(&chassis_bytes[..chassis_len]).unwrap_or("");
                    if let Ok(alias) = derive_alias(port_id_str, chassis_str) {
                        if alias != self.peer.temporary_alias {
                            self.peer.temporary_alias = alias;
                            alias_changed = true;
                        }
                    }
                }
                TlvEvent::Ttl(ttl_s) => {
                    self.peer.ttl_s = ttl_s;
                    let period_us = u32::from(ttl_s) * 1_000_000;
                    match self.peer.peer_timer {
                        Some(handle) => {
                            timer.stop(handle);
                            timer.destroy(handle);
                            self.peer.peer_timer =
                                timer.create(period_us, true).filter(|h| timer.start(*h));
                        }
                        None => {
                            self.peer.peer_timer =
                                timer.create(period_us, true).filter(|h| timer.start(*h));
                        }
                    }
                }
                TlvEvent::PortStatus { rtclass2, rtclass3 } => {
                    self.peer.peer_port_status = (rtclass2, rtclass3);
                }
                TlvEvent::ChassisMac(mac) => {
                    self.peer.peer_mac_addr = mac;
                }
                TlvEvent::MacPhyConfig { cap_aneg, cap_phy, mau_type } => {
                    self.peer.peer_mac_phy.cap_aneg = cap_aneg;
                    self.peer.peer_mac_phy.cap_phy = cap_phy;
                    self.peer.peer_mac_phy.mau_type = mau_type;
                }
                TlvEvent::ManagementAddress { .. } | TlvEvent::Unknown { .. } => {}
                TlvEvent::End => break,
            }
        }

        Ok(alias_changed)
    }

    /// The remote-mismatch alarm path: raises or clears
    /// `REMOTE_MISMATCH/PORTID_MISMATCH` against every in-use AR, comparing
    /// the current temporary and permanent aliases.
    ///
    /// If no AR is in use, the temporary alias is simply promoted to
    /// permanent (a persisted match with nothing to notify).
    pub fn remote_mismatch<const MAX_IOCR: usize, const N: usize>(
        &mut self,
        ars: &mut [Ar<MAX_IOCR, N>],
        diag: &mut impl Diagnostics,
        alarm: &mut impl AlarmSink,
    ) {
        let appears = self.peer.temporary_alias != self.peer.permanent_alias;
        if ars.iter().any(|ar| ar.in_use) {
            emit_port_change_alarm(ExtendedErrorType::PortIdMismatch, appears, 0, ars, diag, alarm);
            if !appears {
                self.peer.permanent_alias = self.peer.temporary_alias;
            }
        } else {
            self.peer.permanent_alias = self.peer.temporary_alias;
        }
    }

    /// The no-peer-detected alarm path, invoked when the peer-timeout timer
    /// expires: records a diff entry per in-use AR against the expected
    /// submodule, then raises `NO_PEER_DETECTED`.
    pub fn no_peer_detected<const MAX_IOCR: usize, const N: usize>(
        &mut self,
        ars: &mut [Ar<MAX_IOCR, N>],
        api_id: u32,
        subslots: &impl SubslotDirectory,
        diag: &mut impl Diagnostics,
        alarm: &mut impl AlarmSink,
    ) {
        if let Some(info) = subslots.get_subslot_full(api_id, DAP_SLOT, INTERFACE_1_PORT_1_SUBSLOT) {
            for ar in ars.iter_mut().filter(|a| a.in_use) {
                ar.api_diffs.push(DiffEntry {
                    slot: info.slot,
                    subslot: info.subslot,
                    module_ident: info.module_ident,
                    submodule_ident: info.submodule_ident,
                    fault: true,
                });
            }
        }
        self.peer.peer_timer = None;
        emit_port_change_alarm(ExtendedErrorType::NoPeerDetected, true, api_id, ars, diag, alarm);
    }
}

impl Default for LldpEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared body of the two alarm paths: builds the diagnostic item, iterates
/// in-use ARs, updates (or adds) their diagnostic entry, then sends the
/// port-change notification.
fn emit_port_change_alarm<const MAX_IOCR: usize, const N: usize>(
    extended_error_type: ExtendedErrorType,
    appears: bool,
    api_id: u32,
    ars: &[Ar<MAX_IOCR, N>],
    diag: &mut impl Diagnostics,
    alarm: &mut impl AlarmSink,
) {
    let item = DiagItem {
        slot: DAP_SLOT,
        subslot: INTERFACE_1_PORT_1_SUBSLOT,
        usi: Usi::ExtendedChannelDiagnosis,
        channel_error_type: ChannelErrorType::RemoteMismatch,
        extended_error_type,
        transition: if appears { DiagTransition::Appears } else { DiagTransition::Disappears },
    };
    let in_use_count = ars.iter().filter(|a| a.in_use).count();
    for _ in 0..in_use_count {
        diag.update(api_id, item.slot, item.subslot, item.usi_code(), item.appears());
        alarm.send_port_change_notification(item.slot, item.subslot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lldp::config::LldpStr;
    use crate::platform::SubslotInfo;

    struct CountingEth {
        sent: u32,
    }
    impl EthernetSender for CountingEth {
        fn send(&mut self, frame: &[u8]) -> usize {
            self.sent += 1;
            frame.len()
        }
    }

    struct FixedIp(u32);
    impl IpSource for FixedIp {
        fn ipaddr(&self) -> u32 {
            self.0
        }
    }

    struct NoopTimer;
    impl TimerSource for NoopTimer {
        fn create(&mut self, _period_us: u32, _oneshot: bool) -> Option<TimerHandle> {
            Some(TimerHandle(1))
        }
        fn start(&mut self, _handle: TimerHandle) -> bool {
            true
        }
        fn stop(&mut self, _handle: TimerHandle) -> bool {
            true
        }
        fn destroy(&mut self, _handle: TimerHandle) {}
    }

    #[test]
    fn lldp_send_writes_mandatory_and_optional_tlvs() {
        let cfg = LldpConfig::new([0x02, 0, 0, 0, 0, 1])
            .with_port_id(LldpStr::from_str("port-001").unwrap())
            .with_ttl_s(20);
        let engine = LldpEngine::new();
        let mut eth = CountingEth { sent: 0 };
        let mut counters = InterfaceCounters::default();
        let ip = FixedIp(0xC0A8_0132);

        engine.lldp_send(&cfg, &ip, &mut eth, &mut counters).unwrap();
        assert_eq!(eth.sent, 1);
        assert!(counters.if_out_octets > 0);
    }

    #[test]
    fn lldp_send_suppressed_does_not_call_sender() {
        let cfg = LldpConfig::new([0x02; 6]).with_suppress_send(true);
        let engine = LldpEngine::new();
        let mut eth = CountingEth { sent: 0 };
        let mut counters = InterfaceCounters::default();
        let ip = FixedIp(0);

        engine.lldp_send(&cfg, &ip, &mut eth, &mut counters).unwrap();
        assert_eq!(eth.sent, 0);
    }

    #[test]
    fn recv_detects_alias_change_and_arms_peer_timer() {
        let mut engine = LldpEngine::new();
        let mut timer = NoopTimer;

        let mut buf = [0u8; 64];
        let mut w = Writer::new(&mut buf);
        mandatory_tlvs(&mut w, "dut", [0xAA; 6], "port-003", 20).unwrap();
        write_end_tlv(&mut w).unwrap();
        let len = w.position();

        let changed = engine.lldp_recv(&buf[..len], 0, &mut timer).unwrap();
        assert!(changed);
        assert_eq!(engine.peer().temporary_alias.as_str(), "port-003.dut");
        assert!(engine.peer().peer_timer.is_some());
    }

    struct AlwaysDiag;
    impl Diagnostics for AlwaysDiag {
        fn update(&mut self, _api: u32, _slot: u16, _subslot: u16, _usi: u16, _appears: bool) {}
    }
    struct NoopAlarm;
    impl AlarmSink for NoopAlarm {
        fn send_port_change_notification(&mut self, _slot: u16, _subslot: u16) {}
    }
    struct EmptySubslots;
    impl SubslotDirectory for EmptySubslots {
        fn get_subslot_full(&self, _api: u32, _slot: u16, _subslot: u16) -> Option<SubslotInfo> {
            None
        }
    }

    #[test]
    fn remote_mismatch_with_no_ars_persists_temporary_alias() {
        let mut engine = LldpEngine::new();
        engine.peer.temporary_alias = derive_alias("port-003", "dut").unwrap();
        let mut ars: [Ar<2, 64>; 0] = [];
        let mut diag = AlwaysDiag;
        let mut alarm = NoopAlarm;

        engine.remote_mismatch(&mut ars, &mut diag, &mut alarm);
        assert_eq!(engine.peer().permanent_alias, engine.peer().temporary_alias);
    }

    #[test]
    fn no_peer_detected_skips_diff_when_subslot_unknown() {
        let mut engine = LldpEngine::new();
        let mut ars: [Ar<2, 64>; 1] = [Ar::new()];
        ars[0].in_use = true;
        let mut diag = AlwaysDiag;
        let mut alarm = NoopAlarm;
        let subslots = EmptySubslots;

        engine.no_peer_detected(&mut ars, 0, &subslots, &mut diag, &mut alarm);
        assert!(ars[0].api_diffs.is_empty());
    }
}
