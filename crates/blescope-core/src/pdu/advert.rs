//! Field decoders for legacy advertising-channel PDUs.
//!
//! Each decoder copies the common header from the capture record and
//! extracts the fixed-offset fields of its kind. Offsets live in
//! `layout`; reads go through `PduReader` and never index past the body.

use serde::Serialize;

use super::common::{ChannelMap, Mac};
use super::error::PduError;
use super::layout;
use super::reader::PduReader;
use super::{AdvFlags, PduHeader};
use crate::record::RawPacket;

/// Advertising PDU with an unrecognized type nibble. Carries only the
/// common header and the advertising flag bits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvertPdu {
    #[serde(flatten)]
    pub header: PduHeader,
    pub flags: AdvFlags,
}

impl AdvertPdu {
    pub(crate) fn parse(pkt: &RawPacket) -> Result<Self, PduError> {
        let reader = PduReader::new(&pkt.body);
        Ok(Self {
            header: PduHeader::from_record(pkt),
            flags: AdvFlags::parse(&reader)?,
        })
    }
}

/// ADV_IND, ADV_NONCONN_IND, SCAN_RSP and ADV_SCAN_IND share this shape:
/// an advertiser address followed by advertising data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvaPdu {
    #[serde(flatten)]
    pub header: PduHeader,
    pub flags: AdvFlags,
    pub adv_a: Mac,
}

impl AdvaPdu {
    pub(crate) fn parse(pkt: &RawPacket) -> Result<Self, PduError> {
        let reader = PduReader::new(&pkt.body);
        Ok(Self {
            header: PduHeader::from_record(pkt),
            flags: AdvFlags::parse(&reader)?,
            adv_a: reader.read_mac(layout::ADVA_RANGE)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvDirectIndPdu {
    #[serde(flatten)]
    pub header: PduHeader,
    pub flags: AdvFlags,
    pub adv_a: Mac,
    pub target_a: Mac,
}

impl AdvDirectIndPdu {
    pub(crate) fn parse(pkt: &RawPacket) -> Result<Self, PduError> {
        let reader = PduReader::new(&pkt.body);
        Ok(Self {
            header: PduHeader::from_record(pkt),
            flags: AdvFlags::parse(&reader)?,
            adv_a: reader.read_mac(layout::ADVA_RANGE)?,
            target_a: reader.read_mac(layout::DIRECT_TARGETA_RANGE)?,
        })
    }
}

/// SCAN_REQ / AUX_SCAN_REQ: scanner address, then advertiser address.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReqPdu {
    #[serde(flatten)]
    pub header: PduHeader,
    pub flags: AdvFlags,
    pub scan_a: Mac,
    pub adv_a: Mac,
}

impl ScanReqPdu {
    pub(crate) fn parse(pkt: &RawPacket) -> Result<Self, PduError> {
        let reader = PduReader::new(&pkt.body);
        Ok(Self {
            header: PduHeader::from_record(pkt),
            flags: AdvFlags::parse(&reader)?,
            scan_a: reader.read_mac(layout::SCANA_RANGE)?,
            adv_a: reader.read_mac(layout::SCAN_ADVA_RANGE)?,
        })
    }
}

/// CONNECT_IND / AUX_CONNECT_REQ: addresses plus the connection
/// parameter block (LLData).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectIndPdu {
    #[serde(flatten)]
    pub header: PduHeader,
    pub flags: AdvFlags,
    pub init_a: Mac,
    pub adv_a: Mac,
    /// Access address the new connection will use (little-endian on wire).
    pub aa_conn: u32,
    /// 24-bit CRC initialization value, unreversed.
    pub crc_init: u32,
    pub win_size: u8,
    pub win_offset: u16,
    pub interval: u16,
    pub latency: u16,
    pub timeout: u16,
    pub chm: ChannelMap,
    pub hop: u8,
    pub sca: u8,
}

impl ConnectIndPdu {
    pub(crate) fn parse(pkt: &RawPacket) -> Result<Self, PduError> {
        let reader = PduReader::new(&pkt.body);
        let chm_bytes = reader.read_slice(layout::CONNECT_CHM_RANGE)?;
        let mut chm = [0u8; 5];
        chm.copy_from_slice(chm_bytes);
        let hop_sca = reader.read_u8(layout::CONNECT_HOP_SCA_OFFSET)?;
        Ok(Self {
            header: PduHeader::from_record(pkt),
            flags: AdvFlags::parse(&reader)?,
            init_a: reader.read_mac(layout::CONNECT_INITA_RANGE)?,
            adv_a: reader.read_mac(layout::CONNECT_ADVA_RANGE)?,
            aa_conn: reader.read_u32_le(layout::CONNECT_AA_RANGE)?,
            crc_init: reader.read_u24_le(layout::CONNECT_CRC_INIT_RANGE)?,
            win_size: reader.read_u8(layout::CONNECT_WIN_SIZE_OFFSET)?,
            win_offset: reader.read_u16_le(layout::CONNECT_WIN_OFFSET_RANGE)?,
            interval: reader.read_u16_le(layout::CONNECT_INTERVAL_RANGE)?,
            latency: reader.read_u16_le(layout::CONNECT_LATENCY_RANGE)?,
            timeout: reader.read_u16_le(layout::CONNECT_TIMEOUT_RANGE)?,
            chm: ChannelMap(chm),
            hop: hop_sca & layout::CONNECT_HOP_MASK,
            sca: hop_sca >> layout::CONNECT_SCA_SHIFT,
        })
    }
}
