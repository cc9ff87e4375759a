//! Shared primitives used by several PDU kinds.

use std::fmt;

use serde::{Serialize, Serializer};

use super::layout;

/// 6-byte device address in on-wire (little-endian) byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mac(pub [u8; 6]);

impl fmt::Display for Mac {
    /// Conventional colon-separated form, most significant byte first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[5], b[4], b[3], b[2], b[1], b[0]
        )
    }
}

impl Serialize for Mac {
    /// Serializes as the display string, not the raw byte array.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 5-byte channel map: bit `i` set means data channel `i` is used.
/// Only the low 37 bits are significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelMap(pub [u8; 5]);

impl ChannelMap {
    pub fn is_used(&self, chan: u8) -> bool {
        if chan >= layout::CHM_CHANNELS {
            return false;
        }
        self.0[usize::from(chan) / 8] & (1 << (chan & 7)) != 0
    }

    pub fn is_all_used(&self) -> bool {
        self.0 == layout::CHM_ALL_USED
    }

    /// Data channels excluded from the map, ascending.
    pub fn excluded(&self) -> Vec<u8> {
        (0..layout::CHM_CHANNELS)
            .filter(|&chan| !self.is_used(chan))
            .collect()
    }
}

/// Reverse the bit order of a 24-bit value (CRC-init preparation).
pub fn rbit24(value: u32) -> u32 {
    let mut v = value & 0x00FF_FFFF;
    let mut out = 0u32;
    for _ in 0..24 {
        out = (out << 1) | (v & 1);
        v >>= 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_displays_reversed_with_colons() {
        let mac = Mac([0x66, 0x55, 0x44, 0x33, 0x22, 0x11]);
        assert_eq!(mac.to_string(), "11:22:33:44:55:66");
    }

    #[test]
    fn mac_serializes_as_its_display_form() {
        let mac = Mac([0x66, 0x55, 0x44, 0x33, 0x22, 0x11]);
        let value = serde_json::to_value(mac).expect("serialize mac");
        assert_eq!(value, "11:22:33:44:55:66");
    }

    #[test]
    fn all_channels_used_has_empty_exclude_list() {
        let chm = ChannelMap([0xFF, 0xFF, 0xFF, 0xFF, 0x1F]);
        assert!(chm.is_all_used());
        assert!(chm.excluded().is_empty());
    }

    #[test]
    fn single_channel_map_excludes_the_rest() {
        let chm = ChannelMap([0x01, 0x00, 0x00, 0x00, 0x00]);
        assert!(chm.is_used(0));
        let excluded = chm.excluded();
        assert_eq!(excluded, (1..=36).collect::<Vec<u8>>());
    }

    #[test]
    fn channels_past_map_width_are_unused() {
        let chm = ChannelMap([0xFF; 5]);
        assert!(chm.is_used(36));
        assert!(!chm.is_used(37));
        assert!(!chm.is_used(39));
    }

    #[test]
    fn rbit24_reverses_bit_order() {
        assert_eq!(rbit24(0x555555), 0xAAAAAA);
        assert_eq!(rbit24(0xAAAAAA), 0x555555);
        assert_eq!(rbit24(0x000001), 0x800000);
        assert_eq!(rbit24(rbit24(0x123456)), 0x123456);
    }
}
