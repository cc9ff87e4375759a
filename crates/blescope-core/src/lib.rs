//! BLEscope core library for BLE link-layer capture decoding.
//!
//! This crate implements the decode pipeline used by the CLI: raw capture
//! records are classified into typed PDUs (layout/reader/parser per PDU
//! family) and an optional per-session [`DecoderState`] correlates packets
//! across the timeline to resolve ambiguous extended-advertising PDUs and
//! track connection establishment. Field decoding is byte-oriented and
//! side-effect free; all correlation state lives in `decoder`.
//!
//! Invariants:
//! - [`decode`] never fails: undecodable records come back as `RAW`.
//! - Stateless decoding is a pure function of the record.
//! - Session state advances exactly once per successfully decoded PDU.
//!
//! # Examples
//! ```
//! use blescope_core::{BLE_ADV_AA, DecoderState, Phy, RawPacket, SnifferMode, decode};
//!
//! let pkt = RawPacket {
//!     ts: 1.0,
//!     ts_epoch: 1.0,
//!     aa: BLE_ADV_AA,
//!     rssi: -60,
//!     chan: 37,
//!     phy: Phy::OneM,
//!     body: vec![0x00, 0x06, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06],
//!     data_dir: false,
//!     event: 0,
//!     crc_rev: 0,
//! };
//! let mut state = DecoderState::new(SnifferMode::Advertising);
//! let pdu = decode(&pkt, Some(&mut state));
//! assert_eq!(pdu.kind_name(), "ADV_IND");
//! ```

mod decoder;
pub mod pdu;
mod record;

pub use decoder::{ActiveConnection, DecoderState, PendingChain, PendingConnection, decode};
pub use pdu::{
    AdvDataInfo, AdvDirectIndPdu, AdvFlags, AdvMode, AdvaPdu, AdvertPdu, AuxPtr, ChannelMap,
    ConnectIndPdu, ControlOpcode, ControlPdu, DataFlags, DataPdu, DecodedPdu, ExtAdvHeader,
    ExtAdvPdu, ExtHeaderParse, Mac, PduError, PduHeader, ScanReqPdu, rbit24,
};
pub use record::{BLE_ADV_AA, Phy, RawPacket, SnifferMode};
