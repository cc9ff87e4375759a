//! Raw capture records as produced by the sniffer hardware interface.
//!
//! A [`RawPacket`] is the immutable input unit of the decoder: one
//! link-layer packet as captured, before any PDU interpretation. The
//! capture collaborator owns the record; the decoder only borrows it.

use serde::{Deserialize, Serialize};

/// Reserved access address used by all advertising-channel traffic.
pub const BLE_ADV_AA: u32 = 0x8E89_BED6;

/// Physical layer a packet was received on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phy {
    /// LE 1M (1 Mbit/s uncoded).
    #[serde(rename = "1M")]
    OneM,
    /// LE 2M (2 Mbit/s uncoded).
    #[serde(rename = "2M")]
    TwoM,
    /// LE Coded, S=8 (125 kbit/s).
    #[serde(rename = "coded_s8")]
    CodedS8,
    /// LE Coded, S=2 (500 kbit/s).
    #[serde(rename = "coded_s2")]
    CodedS2,
}

/// Current mode of the surrounding sniffer-mode state machine.
///
/// Only [`SnifferMode::Scanning`] and [`SnifferMode::AdvertisingExt`]
/// influence decoding; the other modes are carried so the caller can
/// thread its full state through without translation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnifferMode {
    #[default]
    Static,
    AdvertSeek,
    AdvertHop,
    Data,
    Paused,
    Initiating,
    Central,
    Peripheral,
    Advertising,
    Scanning,
    AdvertisingExt,
}

/// One captured link-layer packet, as delivered by the capture collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPacket {
    /// Capture timestamp in monotonic seconds.
    pub ts: f64,
    /// Wall-clock timestamp in epoch seconds.
    pub ts_epoch: f64,
    /// Access address of the packet (32-bit).
    pub aa: u32,
    /// Received signal strength in dBm.
    pub rssi: i8,
    /// Channel index, 0..=39.
    pub chan: u8,
    /// PHY the packet was received on.
    pub phy: Phy,
    /// PDU body: link-layer header plus payload, 2..=255 bytes.
    pub body: Vec<u8>,
    /// Direction flag for data-channel PDUs; true = peripheral to central.
    #[serde(default)]
    pub data_dir: bool,
    /// Capture event counter.
    #[serde(default)]
    pub event: u32,
    /// Received CRC value in reversed bit order.
    #[serde(default)]
    pub crc_rev: u32,
}

impl RawPacket {
    /// True when the access address marks advertising-channel traffic.
    pub fn is_advertising(&self) -> bool {
        self.aa == BLE_ADV_AA
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advertising_classification_is_exact() {
        let mut pkt = RawPacket {
            ts: 0.0,
            ts_epoch: 0.0,
            aa: BLE_ADV_AA,
            rssi: -60,
            chan: 37,
            phy: Phy::OneM,
            body: vec![0x00, 0x00],
            data_dir: false,
            event: 0,
            crc_rev: 0,
        };
        assert!(pkt.is_advertising());
        pkt.aa = BLE_ADV_AA ^ 1;
        assert!(!pkt.is_advertising());
    }

    #[test]
    fn record_round_trips_through_json() {
        let pkt = RawPacket {
            ts: 1.5,
            ts_epoch: 1_700_000_000.25,
            aa: BLE_ADV_AA,
            rssi: -47,
            chan: 38,
            phy: Phy::TwoM,
            body: vec![0x42, 0x06, 1, 2, 3, 4, 5, 6],
            data_dir: false,
            event: 7,
            crc_rev: 0x123456,
        };
        let json = serde_json::to_string(&pkt).expect("serialize record");
        let back: RawPacket = serde_json::from_str(&json).expect("parse record");
        assert_eq!(back, pkt);
    }

    #[test]
    fn optional_capture_fields_default() {
        let json = r#"{"ts":0.5,"ts_epoch":100.0,"aa":1,"rssi":-80,"chan":3,
                       "phy":"1M","body":[1,2]}"#;
        let pkt: RawPacket = serde_json::from_str(json).expect("parse record");
        assert!(!pkt.data_dir);
        assert_eq!(pkt.event, 0);
        assert_eq!(pkt.crc_rev, 0);
    }
}
