use super::{Reader, Writer};
use crate::constants::{id_subtype, ieee_subtype, management_tlv, oui, profinet_subtype, tlv_type};
use crate::error::CodecError;

fn write_tlv_header(w: &mut Writer<'_>, kind: u16, length: u16) -> Result<(), CodecError> {
    let header = (kind << 9) | (length & 0x01FF);
    w.put_u16(header)
}

fn write_org_specific(
    w: &mut Writer<'_>,
    org_oui: [u8; 3],
    subtype: u8,
    payload: &[u8],
) -> Result<(), CodecError> {
    let length = payload.len() as u16 + 1 + 3;
    write_tlv_header(w, tlv_type::ORG_SPECIFIC, length)?;
    w.put_bytes(&org_oui)?;
    w.put_u8(subtype)?;
    w.put_bytes(payload)
}

/// Writes the three mandatory LLDP TLVs: Chassis ID, Port ID, TTL.
///
/// `chassis_id`/`port_id` empty strings fall back to the device MAC address
/// (subtype [`id_subtype::CHASSIS_MAC_ADDRESS`]); a non-empty `chassis_id`
/// uses subtype [`id_subtype::LOCALLY_ASSIGNED`]. Port ID is always locally
/// assigned.
///
/// # Errors
/// Returns [`CodecError::Overflow`] if the frame buffer is exhausted.
pub fn mandatory_tlvs(
    w: &mut Writer<'_>,
    chassis_id: &str,
    device_mac: [u8; 6],
    port_id: &str,
    ttl_s: u16,
) -> Result<(), CodecError> {
    if chassis_id.is_empty() {
        write_tlv_header(w, tlv_type::CHASSIS_ID, 7)?;
        w.put_u8(id_subtype::CHASSIS_MAC_ADDRESS)?;
        w.put_bytes(&device_mac)?;
    } else {
        write_tlv_header(w, tlv_type::CHASSIS_ID, 1 + chassis_id.len() as u16)?;
        w.put_u8(id_subtype::LOCALLY_ASSIGNED)?;
        w.put_bytes(chassis_id.as_bytes())?;
    }

    write_tlv_header(w, tlv_type::PORT_ID, 1 + port_id.len() as u16)?;
    w.put_u8(id_subtype::LOCALLY_ASSIGNED)?;
    w.put_bytes(port_id.as_bytes())?;

    write_tlv_header(w, tlv_type::TTL, 2)?;
    w.put_u16(ttl_s)
}

/// Writes the optional PROFINET/IEEE TLVs: port status, chassis MAC, MAC/PHY
/// configuration, and the management address (current IP).
///
/// # Errors
/// Returns [`CodecError::Overflow`] if the frame buffer is exhausted.
#[allow(clippy::too_many_arguments)]
pub fn optional_tlvs(
    w: &mut Writer<'_>,
    rtclass2: u16,
    rtclass3: u16,
    device_mac: [u8; 6],
    cap_aneg: u8,
    cap_phy: u16,
    mau_type: u16,
    ipv4: u32,
) -> Result<(), CodecError> {
    let mut port_status = [0u8; 4];
    port_status[0..2].copy_from_slice(&rtclass2.to_be_bytes());
    port_status[2..4].copy_from_slice(&rtclass3.to_be_bytes());
    write_org_specific(w, oui::PROFINET, profinet_subtype::PORT_STATUS, &port_status)?;

    write_org_specific(w, oui::PROFINET, profinet_subtype::CHASSIS_MAC, &device_mac)?;

    let mut mac_phy = [0u8; 5];
    mac_phy[0] = cap_aneg;
    mac_phy[1..3].copy_from_slice(&cap_phy.to_be_bytes());
    mac_phy[3..5].copy_from_slice(&mau_type.to_be_bytes());
    write_org_specific(w, oui::IEEE_8023, ieee_subtype::MAC_PHY_CONFIG, &mac_phy)?;

    // Management address TLV (type 8): addr-string-len, subtype, 4 IP bytes,
    // interface subtype, interface number, OID length.
    let length: u16 = 1 + 1 + 4 + 1 + 4 + 1;
    write_tlv_header(w, tlv_type::MANAGEMENT_ADDRESS, length)?;
    w.put_u8(management_tlv::ADDRESS_STRING_LENGTH)?;
    w.put_u8(management_tlv::ADDRESS_SUBTYPE_IPV4)?;
    w.put_bytes(&ipv4.to_be_bytes())?;
    w.put_u8(management_tlv::INTERFACE_SUBTYPE_INDEX)?;
    w.put_u32(0)?;
    w.put_u8(0)
}

/// Writes the zero-length end-of-LLDPDU TLV.
///
/// # Errors
/// Returns [`CodecError::Overflow`] if the frame buffer is exhausted.
pub fn write_end_tlv(w: &mut Writer<'_>) -> Result<(), CodecError> {
    write_tlv_header(w, tlv_type::END, 0)
}

/// One decoded LLDP TLV, as produced by [`TlvWalker`].
#[derive(Debug, Clone, Copy)]
pub enum TlvEvent<'a> {
    /// Chassis ID TLV: subtype plus raw payload.
    ChassisId { subtype: u8, bytes: &'a [u8] },
    /// Port ID TLV: subtype plus raw payload.
    PortId { subtype: u8, bytes: &'a [u8] },
    /// Time To Live, in seconds.
    Ttl(u16),
    /// PROFINET port status TLV.
    PortStatus { rtclass2: u16, rtclass3: u16 },
    /// PROFINET chassis MAC TLV.
    ChassisMac([u8; 6]),
    /// IEEE MAC/PHY configuration TLV.
    MacPhyConfig { cap_aneg: u8, cap_phy: u16, mau_type: u16 },
    /// Management address TLV (IPv4 address extracted).
    ManagementAddress { ipv4: u32 },
    /// A TLV this core does not interpret; callers should skip it.
    Unknown { tlv_type: u16 },
    /// End-of-LLDPDU marker; iteration stops after this.
    End,
}

/// Iterates the TLVs of an LLDP payload starting at `start_offset`.
pub struct TlvWalker<'a> {
    reader: Reader<'a>,
    done: bool,
}

impl<'a> TlvWalker<'a> {
    /// Creates a walker over `frame`, skipping the 14-byte (or tagged)
    /// Ethernet header the caller has already consumed up to `start_offset`.
    #[must_use]
    pub fn new(frame: &'a [u8], start_offset: usize) -> Self {
        Self {
            reader: Reader::new(frame, start_offset),
            done: false,
        }
    }

    fn decode_org_specific(&mut self, payload_len: usize) -> Result<TlvEvent<'a>, CodecError> {
        let org_oui_bytes = self.reader.take_bytes(3)?;
        let org_oui = [org_oui_bytes[0], org_oui_bytes[1], org_oui_bytes[2]];
        let subtype = self.reader.take_u8()?;
        let remaining = payload_len - 4;

        if org_oui == oui::PROFINET && subtype == profinet_subtype::PORT_STATUS && remaining == 4 {
            let rtclass2 = self.reader.take_u16()?;
            let rtclass3 = self.reader.take_u16()?;
            return Ok(TlvEvent::PortStatus { rtclass2, rtclass3 });
        }
        if org_oui == oui::PROFINET && subtype == profinet_subtype::CHASSIS_MAC && remaining == 6 {
            let mac_bytes = self.reader.take_bytes(6)?;
            let mut mac = [0u8; 6];
            mac.copy_from_slice(mac_bytes);
            return Ok(TlvEvent::ChassisMac(mac));
        }
        if org_oui == oui::IEEE_8023 && subtype == ieee_subtype::MAC_PHY_CONFIG && remaining == 5 {
            let cap_aneg = self.reader.take_u8()?;
            let cap_phy = self.reader.take_u16()?;
            let mau_type = self.reader.take_u16()?;
            return Ok(TlvEvent::MacPhyConfig { cap_aneg, cap_phy, mau_type });
        }
        self.reader.skip(remaining)?;
        Ok(TlvEvent::Unknown { tlv_type: tlv_type::ORG_SPECIFIC })
    }

    fn decode_next(&mut self) -> Result<TlvEvent<'a>, CodecError> {
        let header = self.reader.take_u16()?;
        let kind = header >> 9;
        let length = usize::from(header & 0x01FF);

        match kind {
            k if k == tlv_type::END => {
                self.done = true;
                Ok(TlvEvent::End)
            }
            k if k == tlv_type::CHASSIS_ID => {
                let subtype = self.reader.take_u8()?;
                let bytes = self.reader.take_bytes(length - 1)?;
                Ok(TlvEvent::ChassisId { subtype, bytes })
            }
            k if k == tlv_type::PORT_ID => {
                let subtype = self.reader.take_u8()?;
                let bytes = self.reader.take_bytes(length - 1)?;
                Ok(TlvEvent::PortId { subtype, bytes })
            }
            k if k == tlv_type::TTL => {
                // Read as 16 bits; the single-byte read some implementations
                // use truncates the encoded value.
                let ttl = self.reader.take_u16()?;
                Ok(TlvEvent::Ttl(ttl))
            }
            k if k == tlv_type::MANAGEMENT_ADDRESS => {
                let _addr_str_len = self.reader.take_u8()?;
                let _subtype = self.reader.take_u8()?;
                let ipv4 = self.reader.take_u32()?;
                self.reader.skip(length - 1 - 1 - 4)?;
                Ok(TlvEvent::ManagementAddress { ipv4 })
            }
            k if k == tlv_type::ORG_SPECIFIC => self.decode_org_specific(length),
            other => {
                self.reader.skip(length)?;
                Ok(TlvEvent::Unknown { tlv_type: other })
            }
        }
    }
}

impl<'a> Iterator for TlvWalker<'a> {
    type Item = Result<TlvEvent<'a>, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.reader.is_empty() {
            return None;
        }
        Some(self.decode_next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_mandatory_tlvs() {
        let mut buf = [0u8; 64];
        let mut w = Writer::new(&mut buf);
        mandatory_tlvs(&mut w, "", [0xAA; 6], "port-001", 20).unwrap();
        write_end_tlv(&mut w).unwrap();
        let len = w.position();

        let mut walker = TlvWalker::new(&buf[..len], 0);
        match walker.next().unwrap().unwrap() {
            TlvEvent::ChassisId { subtype, bytes } => {
                assert_eq!(subtype, id_subtype::CHASSIS_MAC_ADDRESS);
                assert_eq!(bytes, &[0xAA; 6]);
            }
            other => panic!("unexpected {other:?}"),
        }
        match walker.next().unwrap().unwrap() {
            TlvEvent::PortId { subtype, bytes } => {
                assert_eq!(subtype, id_subtype::LOCALLY_ASSIGNED);
                assert_eq!(bytes, b"port-001");
            }
            other => panic!("unexpected {other:?}"),
        }
        match walker.next().unwrap().unwrap() {
            TlvEvent::Ttl(ttl) => assert_eq!(ttl, 20),
            other => panic!("unexpected {other:?}"),
        }
        match walker.next().unwrap().unwrap() {
            TlvEvent::End => {}
            other => panic!("unexpected {other:?}"),
        }
        assert!(walker.next().is_none());
    }

    #[test]
    fn ttl_reads_full_16_bits() {
        let mut buf = [0u8; 4];
        let mut w = Writer::new(&mut buf);
        write_tlv_header(&mut w, tlv_type::TTL, 2).unwrap();
        w.put_u16(300).unwrap();

        let mut walker = TlvWalker::new(&buf, 0);
        match walker.next().unwrap().unwrap() {
            TlvEvent::Ttl(ttl) => assert_eq!(ttl, 300),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn decodes_optional_tlvs() {
        let mut buf = [0u8; 64];
        let mut w = Writer::new(&mut buf);
        optional_tlvs(&mut w, 1, 2, [0x01; 6], 0xFF, 0x8000, 0x10, 0xC0A8_0001).unwrap();
        let len = w.position();

        let mut walker = TlvWalker::new(&buf[..len], 0);
        match walker.next().unwrap().unwrap() {
            TlvEvent::PortStatus { rtclass2, rtclass3 } => {
                assert_eq!(rtclass2, 1);
                assert_eq!(rtclass3, 2);
            }
            other => panic!("unexpected {other:?}"),
        }
        match walker.next().unwrap().unwrap() {
            TlvEvent::ChassisMac(mac) => assert_eq!(mac, [0x01; 6]),
            other => panic!("unexpected {other:?}"),
        }
        match walker.next().unwrap().unwrap() {
            TlvEvent::MacPhyConfig { cap_aneg, cap_phy, mau_type } => {
                assert_eq!(cap_aneg, 0xFF);
                assert_eq!(cap_phy, 0x8000);
                assert_eq!(mau_type, 0x10);
            }
            other => panic!("unexpected {other:?}"),
        }
        match walker.next().unwrap().unwrap() {
            TlvEvent::ManagementAddress { ipv4 } => assert_eq!(ipv4, 0xC0A8_0001),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_tlv_is_skipped() {
        let mut buf = [0u8; 8];
        let mut w = Writer::new(&mut buf);
        write_tlv_header(&mut w, 9, 2).unwrap();
        w.put_u16(0xBEEF).unwrap();
        write_end_tlv(&mut w).unwrap();
        let len = w.position();

        let mut walker = TlvWalker::new(&buf[..len], 0);
        match walker.next().unwrap().unwrap() {
            TlvEvent::Unknown { tlv_type } => assert_eq!(tlv_type, 9),
            other => panic!("unexpected {other:?}"),
        }
        match walker.next().unwrap().unwrap() {
            TlvEvent::End => {}
            other => panic!("unexpected {other:?}"),
        }
    }
}
