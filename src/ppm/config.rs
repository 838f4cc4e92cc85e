//! Builder for the parameters describing one IOCR.

use crate::codec::VlanTag;

/// The role an IOCR plays within an AR.
///
/// PPM acts only on `Input` and `McProvider`; the other two kinds exist so an
/// `Ar` can represent a full connection, but PPM's entry points reject them
/// with [`crate::error::StateError::WrongIocrType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IocrKind {
    /// Slot not populated.
    #[default]
    Unused,
    /// Provider-side cyclic sender, unicast.
    Input,
    /// Consumer-side cyclic receiver, unicast (outside PPM's scope).
    Output,
    /// Provider-side cyclic sender, multicast.
    McProvider,
    /// Consumer-side cyclic receiver, multicast (outside PPM's scope).
    McConsumer,
}

impl IocrKind {
    /// `true` for the two kinds PPM operates on.
    #[must_use]
    pub const fn is_provider(self) -> bool {
        matches!(self, IocrKind::Input | IocrKind::McProvider)
    }
}

/// Parameters shared by every IOCR kind, independent of its PPM runtime
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IocrParams {
    /// PROFINET frame ID.
    pub frame_id: u16,
    /// Cyclic payload length in bytes.
    pub c_sdu_length: u16,
    /// Send clock factor, 1..=128.
    pub send_clock_factor: u16,
    /// Reduction ratio, 1..=16384.
    pub reduction_ratio: u16,
    /// 802.1Q tag. PPM frames always carry one (`buffer_pos` reserves the
    /// 4 tag bytes unconditionally); an untagged IOCR still writes a
    /// zero VID/PCP tag.
    pub vlan: VlanTag,
    /// Destination MAC (the AR's initiator).
    pub initiator_mac: [u8; 6],
    /// Source MAC (the AR's responder, this device).
    pub responder_mac: [u8; 6],
}

impl IocrParams {
    /// Target cyclic period in microseconds: `scf * rr * 1000 / 32`.
    #[must_use]
    pub const fn control_interval_us(&self) -> u32 {
        (self.send_clock_factor as u32 * self.reduction_ratio as u32 * 1000) / 32
    }
}

impl Default for IocrParams {
    fn default() -> Self {
        Self {
            frame_id: 0,
            c_sdu_length: 0,
            send_clock_factor: 1,
            reduction_ratio: 1,
            vlan: VlanTag::default(),
            initiator_mac: [0; 6],
            responder_mac: [0; 6],
        }
    }
}

/// Builder for [`IocrParams`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IocrConfig {
    params: IocrParams,
}

impl IocrConfig {
    /// Starts a new builder with zeroed defaults (`scf=1`, `rr=1`).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the PROFINET frame ID.
    #[must_use]
    pub const fn with_frame_id(mut self, frame_id: u16) -> Self {
        self.params.frame_id = frame_id;
        self
    }

    /// Sets the cyclic payload length.
    #[must_use]
    pub const fn with_c_sdu_length(mut self, c_sdu_length: u16) -> Self {
        self.params.c_sdu_length = c_sdu_length;
        self
    }

    /// Sets send clock factor and reduction ratio together, since both feed
    /// the cycle-counter grid.
    #[must_use]
    pub const fn with_clock(mut self, send_clock_factor: u16, reduction_ratio: u16) -> Self {
        self.params.send_clock_factor = send_clock_factor;
        self.params.reduction_ratio = reduction_ratio;
        self
    }

    /// Sets the 802.1Q tag.
    #[must_use]
    pub const fn with_vlan(mut self, vlan: VlanTag) -> Self {
        self.params.vlan = vlan;
        self
    }

    /// Sets destination (initiator) and source (responder) MAC addresses.
    #[must_use]
    pub const fn with_macs(mut self, initiator_mac: [u8; 6], responder_mac: [u8; 6]) -> Self {
        self.params.initiator_mac = initiator_mac;
        self.params.responder_mac = responder_mac;
        self
    }

    /// Consumes the builder and returns the finished parameters.
    #[must_use]
    pub const fn build(self) -> IocrParams {
        self.params
    }
}
