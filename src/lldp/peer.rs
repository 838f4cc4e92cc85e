//! The peer record this core maintains for its one physical port.

use crate::error::CodecError;
use crate::lldp::config::{LldpStr, MacPhyConfig};
use crate::platform::TimerHandle;
use crate::util::BoundedStr;

/// Maximum length of a derived alias (`port_id + '.' + chassis_id`).
pub const MAX_ALIAS_LEN: usize = 129;

/// A derived peer alias string.
pub type AliasStr = BoundedStr<MAX_ALIAS_LEN>;

/// Computes the alias for a peer's Port ID / Chassis ID.
///
/// If `port_id` contains a `.`, the alias is `port_id` unchanged; otherwise
/// it is `port_id + "." + chassis_id`.
///
/// # Errors
/// Returns [`CodecError::Overflow`] if the derived alias does not fit in
/// [`MAX_ALIAS_LEN`] bytes.
pub fn derive_alias(port_id: &str, chassis_id: &str) -> Result<AliasStr, CodecError> {
    if port_id.contains('.') {
        return AliasStr::from_str(port_id);
    }
    if port_id.len() + 1 + chassis_id.len() > MAX_ALIAS_LEN {
        return Err(CodecError::Overflow);
    }
    let mut buf = [0u8; MAX_ALIAS_LEN];
    let mut pos = 0;
    buf[pos..pos + port_id.len()].copy_from_slice(port_id.as_bytes());
    pos += port_id.len();
    buf[pos] = b'.';
    pos += 1;
    buf[pos..pos + chassis_id.len()].copy_from_slice(chassis_id.as_bytes());
    pos += chassis_id.len();
    AliasStr::from_bytes(&buf[..pos])
}

/// Peer state tracked from received LLDP frames. This core models a single
/// physical port, so there is exactly one `PeerRecord`.
#[derive(Clone, Copy)]
pub struct PeerRecord {
    /// Peer's Chassis ID, as decoded (not interpreted by subtype).
    pub peer_chassis_id: LldpStr,
    /// Peer's Port ID, as decoded.
    pub peer_port_id: LldpStr,
    /// Four 32-bit propagation delay values (unused by this core's alarm
    /// logic, carried for completeness per the peer record's original
    /// field set).
    pub peer_delay: [u32; 4],
    /// Peer's advertised RTClass2/RTClass3 port status.
    pub peer_port_status: (u16, u16),
    /// Peer's advertised MAC address.
    pub peer_mac_addr: [u8; 6],
    /// Peer's advertised MAC/PHY configuration.
    pub peer_mac_phy: MacPhyConfig,
    /// Last TTL decoded, in seconds.
    pub ttl_s: u16,
    /// Handle of the one-shot peer-timeout timer, if armed.
    pub peer_timer: Option<TimerHandle>,
    /// Alias computed from the most recently decoded Port ID/Chassis ID.
    pub temporary_alias: AliasStr,
    /// Alias last confirmed to the controller via the diagnostic path.
    pub permanent_alias: AliasStr,
}

impl PeerRecord {
    /// Builds an empty peer record (no peer seen yet).
    #[must_use]
    pub fn new() -> Self {
        Self {
            peer_chassis_id: LldpStr::new(),
            peer_port_id: LldpStr::new(),
            peer_delay: [0; 4],
            peer_port_status: (0, 0),
            peer_mac_addr: [0; 6],
            peer_mac_phy: MacPhyConfig::default(),
            ttl_s: 0,
            peer_timer: None,
            temporary_alias: AliasStr::new(),
            permanent_alias: AliasStr::new(),
        }
    }
}

impl Default for PeerRecord {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_with_dot_is_unchanged() {
        let alias = derive_alias("port-003.dut", "peer").unwrap();
        assert_eq!(alias.as_str(), "port-003.dut");
    }

    #[test]
    fn alias_without_dot_concatenates() {
        let alias = derive_alias("port-003", "dut").unwrap();
        assert_eq!(alias.as_str(), "port-003.dut");
    }

    #[test]
    fn new_peer_record_has_no_timer() {
        let peer = PeerRecord::new();
        assert!(peer.peer_timer.is_none());
        assert!(peer.temporary_alias.is_empty());
    }
}
