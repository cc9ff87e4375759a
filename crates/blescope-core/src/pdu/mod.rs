//! Typed model of BLE link-layer PDUs.
//!
//! The module follows a layered structure:
//! - `layout`: byte offsets, ranges and bit masks (source of truth)
//! - `reader`: bounds-checked byte access
//! - `advert` / `ext` / `data`: field decoders per PDU family
//! - `error`: explicit decode errors
//!
//! Decoders are pure functions over a borrowed [`RawPacket`]; correlation
//! state lives in the `decoder` module.

pub mod advert;
pub mod common;
pub mod data;
pub mod error;
pub mod ext;
pub mod layout;
pub mod reader;

use serde::Serialize;

use crate::record::{Phy, RawPacket};

pub use advert::{AdvDirectIndPdu, AdvaPdu, AdvertPdu, ConnectIndPdu, ScanReqPdu};
pub use common::{ChannelMap, Mac, rbit24};
pub use data::{ControlOpcode, ControlPdu, DataPdu};
pub use error::PduError;
pub use ext::{AdvDataInfo, AdvMode, AuxPtr, ExtAdvHeader, ExtAdvPdu, ExtHeaderParse};

/// Common header fields copied from the raw capture record into every
/// decoded PDU. The raw body is retained for callers that need it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PduHeader {
    pub ts: f64,
    pub ts_epoch: f64,
    pub aa: u32,
    pub rssi: i8,
    pub chan: u8,
    pub phy: Phy,
    pub event: u32,
    pub crc_rev: u32,
    pub data_dir: bool,
    pub body: Vec<u8>,
}

impl PduHeader {
    pub fn from_record(pkt: &RawPacket) -> Self {
        Self {
            ts: pkt.ts,
            ts_epoch: pkt.ts_epoch,
            aa: pkt.aa,
            rssi: pkt.rssi,
            chan: pkt.chan,
            phy: pkt.phy,
            event: pkt.event,
            crc_rev: pkt.crc_rev,
            data_dir: pkt.data_dir,
            body: pkt.body.clone(),
        }
    }

    /// True for the three primary advertising channels (37..=39).
    pub fn is_primary_chan(&self) -> bool {
        self.chan >= layout::PRIMARY_CHAN_MIN
    }
}

/// Header flags shared by every advertising-channel PDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdvFlags {
    pub ch_sel: bool,
    pub tx_add: bool,
    pub rx_add: bool,
    pub ad_length: u8,
}

impl AdvFlags {
    pub(crate) fn parse(reader: &reader::PduReader<'_>) -> Result<Self, PduError> {
        let first = reader.read_u8(0)?;
        Ok(Self {
            ch_sel: (first >> layout::ADV_CHSEL_SHIFT) & 1 != 0,
            tx_add: (first >> layout::ADV_TXADD_SHIFT) & 1 != 0,
            rx_add: (first >> layout::ADV_RXADD_SHIFT) & 1 != 0,
            ad_length: reader.read_u8(layout::AD_LENGTH_OFFSET)?,
        })
    }
}

/// Header flags shared by every data-channel PDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataFlags {
    pub nesn: bool,
    pub sn: bool,
    pub md: bool,
    pub data_length: u8,
}

impl DataFlags {
    pub(crate) fn parse(reader: &reader::PduReader<'_>) -> Result<Self, PduError> {
        let first = reader.read_u8(0)?;
        Ok(Self {
            nesn: (first >> layout::DATA_NESN_SHIFT) & 1 != 0,
            sn: (first >> layout::DATA_SN_SHIFT) & 1 != 0,
            md: (first >> layout::DATA_MD_SHIFT) & 1 != 0,
            data_length: reader.read_u8(layout::DATA_LENGTH_OFFSET)?,
        })
    }
}

/// One decoded link-layer PDU. Exactly one variant is active per record;
/// kind-specific fields exist only on their owning variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "pdu")]
pub enum DecodedPdu {
    #[serde(rename = "ADV_IND")]
    AdvInd(AdvaPdu),
    #[serde(rename = "ADV_DIRECT_IND")]
    AdvDirectInd(AdvDirectIndPdu),
    #[serde(rename = "ADV_NONCONN_IND")]
    AdvNonconnInd(AdvaPdu),
    #[serde(rename = "SCAN_REQ")]
    ScanReq(ScanReqPdu),
    #[serde(rename = "SCAN_RSP")]
    ScanRsp(AdvaPdu),
    #[serde(rename = "CONNECT_IND")]
    ConnectInd(ConnectIndPdu),
    #[serde(rename = "ADV_SCAN_IND")]
    AdvScanInd(AdvaPdu),
    #[serde(rename = "ADV_EXT_IND")]
    AdvExtInd(ExtAdvPdu),
    #[serde(rename = "AUX_ADV_IND")]
    AuxAdvInd(ExtAdvPdu),
    #[serde(rename = "AUX_SCAN_REQ")]
    AuxScanReq(ScanReqPdu),
    #[serde(rename = "AUX_SCAN_RSP")]
    AuxScanRsp(ExtAdvPdu),
    #[serde(rename = "AUX_CHAIN_IND")]
    AuxChainInd(ExtAdvPdu),
    #[serde(rename = "AUX_CONNECT_REQ")]
    AuxConnectReq(ConnectIndPdu),
    #[serde(rename = "AUX_CONNECT_RSP")]
    AuxConnectRsp(ExtAdvPdu),
    /// Advertising PDU with an unrecognized type nibble; header only.
    #[serde(rename = "ADV_RFU")]
    Advert(AdvertPdu),
    #[serde(rename = "LL_DATA")]
    LlData(DataPdu),
    #[serde(rename = "LL_DATA_CONT")]
    LlDataCont(DataPdu),
    #[serde(rename = "LL_CONTROL")]
    LlControl(ControlPdu),
    /// Data-channel PDU with the reserved LLID value 0.
    #[serde(rename = "LL_RFU")]
    DataReserved(DataPdu),
    /// Undecoded record, returned when decoding fails entirely.
    #[serde(rename = "RAW")]
    Raw(PduHeader),
}

impl DecodedPdu {
    /// Wrap a record without interpreting it (failure-containment path).
    pub fn raw(pkt: &RawPacket) -> Self {
        DecodedPdu::Raw(PduHeader::from_record(pkt))
    }

    pub fn header(&self) -> &PduHeader {
        match self {
            DecodedPdu::AdvInd(p)
            | DecodedPdu::AdvNonconnInd(p)
            | DecodedPdu::ScanRsp(p)
            | DecodedPdu::AdvScanInd(p) => &p.header,
            DecodedPdu::AdvDirectInd(p) => &p.header,
            DecodedPdu::ScanReq(p) | DecodedPdu::AuxScanReq(p) => &p.header,
            DecodedPdu::ConnectInd(p) | DecodedPdu::AuxConnectReq(p) => &p.header,
            DecodedPdu::AdvExtInd(p)
            | DecodedPdu::AuxAdvInd(p)
            | DecodedPdu::AuxScanRsp(p)
            | DecodedPdu::AuxChainInd(p)
            | DecodedPdu::AuxConnectRsp(p) => &p.header,
            DecodedPdu::Advert(p) => &p.header,
            DecodedPdu::LlData(p) | DecodedPdu::LlDataCont(p) | DecodedPdu::DataReserved(p) => {
                &p.header
            }
            DecodedPdu::LlControl(p) => &p.header,
            DecodedPdu::Raw(header) => header,
        }
    }

    /// PDU kind as named by the Bluetooth core specification.
    pub fn kind_name(&self) -> &'static str {
        match self {
            DecodedPdu::AdvInd(_) => "ADV_IND",
            DecodedPdu::AdvDirectInd(_) => "ADV_DIRECT_IND",
            DecodedPdu::AdvNonconnInd(_) => "ADV_NONCONN_IND",
            DecodedPdu::ScanReq(_) => "SCAN_REQ",
            DecodedPdu::ScanRsp(_) => "SCAN_RSP",
            DecodedPdu::ConnectInd(_) => "CONNECT_IND",
            DecodedPdu::AdvScanInd(_) => "ADV_SCAN_IND",
            DecodedPdu::AdvExtInd(_) => "ADV_EXT_IND",
            DecodedPdu::AuxAdvInd(_) => "AUX_ADV_IND",
            DecodedPdu::AuxScanReq(_) => "AUX_SCAN_REQ",
            DecodedPdu::AuxScanRsp(_) => "AUX_SCAN_RSP",
            DecodedPdu::AuxChainInd(_) => "AUX_CHAIN_IND",
            DecodedPdu::AuxConnectReq(_) => "AUX_CONNECT_REQ",
            DecodedPdu::AuxConnectRsp(_) => "AUX_CONNECT_RSP",
            DecodedPdu::Advert(_) => "ADV_RFU",
            DecodedPdu::LlData(_) => "LL_DATA",
            DecodedPdu::LlDataCont(_) => "LL_DATA_CONT",
            DecodedPdu::LlControl(_) => "LL_CONTROL",
            DecodedPdu::DataReserved(_) => "LL_RFU",
            DecodedPdu::Raw(_) => "RAW",
        }
    }
}
