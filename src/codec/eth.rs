use super::Writer;
use crate::constants::ETHERTYPE_VLAN;
use crate::error::CodecError;

/// Optional 802.1Q tag: 12-bit VID, 3-bit priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VlanTag {
    /// VLAN identifier, 0..=4095.
    pub vid: u16,
    /// Priority Code Point, 0..=7.
    pub pcp: u8,
}

/// Writes destination MAC, source MAC, an optional 802.1Q tag, and the
/// EtherType. Returns the number of bytes written.
///
/// # Errors
/// Returns [`CodecError::Overflow`] if the header does not fit.
pub fn write_eth_header(
    w: &mut Writer<'_>,
    dst_mac: [u8; 6],
    src_mac: [u8; 6],
    vlan: Option<VlanTag>,
    ethertype: u16,
) -> Result<(), CodecError> {
    w.put_bytes(&dst_mac)?;
    w.put_bytes(&src_mac)?;
    if let Some(tag) = vlan {
        w.put_u16(ETHERTYPE_VLAN)?;
        let tci = (u16::from(tag.pcp & 0x07) << 13) | (tag.vid & 0x0FFF);
        w.put_u16(tci)?;
    }
    w.put_u16(ethertype)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_tagged_header() {
        let mut buf = [0u8; 18];
        let mut w = Writer::new(&mut buf);
        write_eth_header(
            &mut w,
            [0xFF; 6],
            [0x02; 6],
            Some(VlanTag { vid: 100, pcp: 6 }),
            0x8892,
        )
        .unwrap();
        assert_eq!(w.position(), 18);
        assert_eq!(&buf[12..14], &[0x81, 0x00]);
        // pcp=6 (110) << 13 | vid=100 (0x064) = 0xC064
        assert_eq!(&buf[14..16], &[0xC0, 0x64]);
        assert_eq!(&buf[16..18], &[0x88, 0x92]);
    }

    #[test]
    fn writes_untagged_header() {
        let mut buf = [0u8; 14];
        let mut w = Writer::new(&mut buf);
        write_eth_header(&mut w, [0x01; 6], [0x02; 6], None, 0x88CC).unwrap();
        assert_eq!(w.position(), 14);
        assert_eq!(&buf[12..14], &[0x88, 0xCC]);
    }
}
