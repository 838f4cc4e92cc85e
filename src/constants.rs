//! Centralized constants
//!
//! This module provides a single source of truth for the magic numbers and
//! protocol constants used throughout the PPM and LLDP engines.
//!
//! # Organization
//!
//! - **Frame/buffer sizes**: Ethernet frame dimensions and field offsets
//! - **Clock**: the global 31.25 us tick and the cycle-counter formula
//! - **LLDP wire constants**: EtherType, multicast address, TLV types, OUIs
//! - **PROFINET identifiers**: the DAP slot/subslot used by diagnosis items

// =============================================================================
// Frame and Buffer Sizes
// =============================================================================

/// Maximum Ethernet frame size including VLAN tag (`PF_FRAME_BUFFER_SIZE`).
pub const MAX_FRAME_SIZE: usize = 1522;

/// Destination + source MAC address length.
pub const ETH_ADDR_PAIR_SIZE: usize = 12;

/// 802.1Q VLAN tag size (TPID + TCI).
pub const VLAN_TAG_SIZE: usize = 4;

/// EtherType field size.
pub const ETHERTYPE_SIZE: usize = 2;

/// PROFINET frame ID field size.
pub const FRAME_ID_SIZE: usize = 2;

/// Bytes before the payload in a PPM frame: dst MAC(6) + src MAC(6) + VLAN(4) + EtherType(2) + frame id(2).
pub const PPM_HEADER_SIZE: usize =
    ETH_ADDR_PAIR_SIZE + VLAN_TAG_SIZE + ETHERTYPE_SIZE + FRAME_ID_SIZE;

/// Bytes after the payload in a PPM frame: cycle counter(2) + data status(1) + transfer status(1).
pub const PPM_TRAILER_SIZE: usize = 2 + 1 + 1;

/// Maximum cyclic payload (`c_sdu_length`) that still fits `MAX_FRAME_SIZE`.
pub const MAX_C_SDU_LENGTH: usize = MAX_FRAME_SIZE - PPM_HEADER_SIZE - PPM_TRAILER_SIZE;

/// 802.1Q TPID.
pub const ETHERTYPE_VLAN: u16 = 0x8100;

/// PROFINET real-time EtherType.
pub const ETHERTYPE_PROFINET: u16 = 0x8892;

/// LLDP EtherType.
pub const ETHERTYPE_LLDP: u16 = 0x88CC;

/// LLDP destination multicast MAC address.
pub const LLDP_MULTICAST_MAC: [u8; 6] = [0x01, 0x80, 0xC2, 0x00, 0x00, 0x0E];

// =============================================================================
// Data status bit fields (§3)
// =============================================================================

/// `data_status` bit field definitions.
pub mod data_status_bits {
    /// STATE (primary/backup), bit 0.
    pub const STATE: u8 = 1 << 0;
    /// REDUNDANCY, bit 1.
    pub const REDUNDANCY: u8 = 1 << 1;
    /// DATA_VALID, bit 2.
    pub const DATA_VALID: u8 = 1 << 2;
    /// PROVIDER_STATE (run/stop), bit 4.
    pub const PROVIDER_STATE: u8 = 1 << 4;
    /// PROBLEM_INDICATOR, bit 5 (0 = problem, 1 = normal).
    pub const PROBLEM_INDICATOR: u8 = 1 << 5;

    /// Initial `data_status` value installed by `activate`.
    ///
    /// STATE, DATA_VALID, PROVIDER_STATE and PROBLEM_INDICATOR are all set;
    /// this matches the worked example in the testable-properties scenarios,
    /// which is authoritative over the prose summary (see `DESIGN.md`).
    pub const INITIAL: u8 = STATE | DATA_VALID | PROVIDER_STATE | PROBLEM_INDICATOR;
}

// =============================================================================
// Cycle counter / scheduling
// =============================================================================

/// Numerator of the microseconds-to-31.25us-ticks conversion (`t * 4 / 125`).
pub const CYCLE_TICK_NUMERATOR: u64 = 4;

/// Denominator of the microseconds-to-31.25us-ticks conversion.
pub const CYCLE_TICK_DENOMINATOR: u64 = 125;

/// Default LLDP broadcast period, in microseconds (5 seconds).
pub const DEFAULT_LLDP_BROADCAST_RATE_US: u32 = 5_000_000;

// =============================================================================
// LLDP TLV wire format
// =============================================================================

/// LLDP TLV types.
pub mod tlv_type {
    /// End of LLDPDU.
    pub const END: u16 = 0;
    /// Chassis ID.
    pub const CHASSIS_ID: u16 = 1;
    /// Port ID.
    pub const PORT_ID: u16 = 2;
    /// Time To Live.
    pub const TTL: u16 = 3;
    /// Management Address.
    pub const MANAGEMENT_ADDRESS: u16 = 8;
    /// Organisationally Specific.
    pub const ORG_SPECIFIC: u16 = 127;
}

/// Chassis ID / Port ID subtypes.
pub mod id_subtype {
    /// Chassis ID carries the device MAC address.
    pub const CHASSIS_MAC_ADDRESS: u8 = 4;
    /// Chassis/Port ID is a locally assigned name.
    pub const LOCALLY_ASSIGNED: u8 = 7;
}

/// Organisationally Unique Identifiers used by the optional TLVs.
pub mod oui {
    /// PROFIBUS/PROFINET OUI.
    pub const PROFINET: [u8; 3] = [0x00, 0x0E, 0xCF];
    /// IEEE 802.3 OUI.
    pub const IEEE_8023: [u8; 3] = [0x00, 0x12, 0x0F];
}

/// PROFINET organisation-specific TLV subtypes (OUI [`oui::PROFINET`]).
pub mod profinet_subtype {
    /// Port status (RTClass2, RTClass3).
    pub const PORT_STATUS: u8 = 2;
    /// Chassis MAC address.
    pub const CHASSIS_MAC: u8 = 5;
}

/// IEEE 802.3 organisation-specific TLV subtypes (OUI [`oui::IEEE_8023`]).
pub mod ieee_subtype {
    /// MAC/PHY configuration status.
    pub const MAC_PHY_CONFIG: u8 = 1;
}

/// Management address TLV constants (IPv4 address family).
pub mod management_tlv {
    /// Address string length field (family byte + 4 address bytes).
    pub const ADDRESS_STRING_LENGTH: u8 = 5;
    /// Address subtype: IPv4.
    pub const ADDRESS_SUBTYPE_IPV4: u8 = 1;
    /// Interface numbering subtype: interface index.
    pub const INTERFACE_SUBTYPE_INDEX: u8 = 1;
}

// =============================================================================
// PROFINET diagnosis addressing
// =============================================================================

/// Device Access Point slot identifier.
pub const DAP_SLOT: u16 = 0;

/// Subslot identifier for Interface 1, Port 1 (the single physical port this
/// core's peer database tracks).
pub const INTERFACE_1_PORT_1_SUBSLOT: u16 = 0x8001;
