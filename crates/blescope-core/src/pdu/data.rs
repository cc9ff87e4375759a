//! Field decoders for data-channel PDUs (LL Data and LL Control).

use serde::Serialize;

use super::error::PduError;
use super::layout;
use super::reader::PduReader;
use super::{DataFlags, PduHeader};
use crate::record::RawPacket;

/// LL_DATA, LL_DATA_CONT, and the reserved LLID 0 form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPdu {
    #[serde(flatten)]
    pub header: PduHeader,
    pub flags: DataFlags,
}

impl DataPdu {
    pub(crate) fn parse(pkt: &RawPacket) -> Result<Self, PduError> {
        let reader = PduReader::new(&pkt.body);
        Ok(Self {
            header: PduHeader::from_record(pkt),
            flags: DataFlags::parse(&reader)?,
        })
    }
}

/// LL_CONTROL: a data PDU whose first payload byte is a control opcode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlPdu {
    #[serde(flatten)]
    pub header: PduHeader,
    pub flags: DataFlags,
    pub opcode: ControlOpcode,
}

impl ControlPdu {
    pub(crate) fn parse(pkt: &RawPacket) -> Result<Self, PduError> {
        let reader = PduReader::new(&pkt.body);
        Ok(Self {
            header: PduHeader::from_record(pkt),
            flags: DataFlags::parse(&reader)?,
            opcode: ControlOpcode::from_raw(reader.read_u8(layout::CTRL_OPCODE_OFFSET)?),
        })
    }
}

/// Known LL control opcodes. Values outside the known range are kept as
/// [`ControlOpcode::Rfu`] with the raw byte preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControlOpcode {
    ConnectionUpdateInd,
    ChannelMapInd,
    TerminateInd,
    EncReq,
    EncRsp,
    StartEncReq,
    StartEncRsp,
    UnknownRsp,
    FeatureReq,
    FeatureRsp,
    PauseEncReq,
    PauseEncRsp,
    VersionInd,
    RejectInd,
    PeripheralFeatureReq,
    ConnectionParamReq,
    ConnectionParamRsp,
    RejectExtInd,
    PingReq,
    PingRsp,
    LengthReq,
    LengthRsp,
    PhyReq,
    PhyRsp,
    PhyUpdateInd,
    MinUsedChannelsInd,
    Rfu(u8),
}

impl ControlOpcode {
    pub fn from_raw(opcode: u8) -> Self {
        match opcode {
            0x00 => ControlOpcode::ConnectionUpdateInd,
            0x01 => ControlOpcode::ChannelMapInd,
            0x02 => ControlOpcode::TerminateInd,
            0x03 => ControlOpcode::EncReq,
            0x04 => ControlOpcode::EncRsp,
            0x05 => ControlOpcode::StartEncReq,
            0x06 => ControlOpcode::StartEncRsp,
            0x07 => ControlOpcode::UnknownRsp,
            0x08 => ControlOpcode::FeatureReq,
            0x09 => ControlOpcode::FeatureRsp,
            0x0A => ControlOpcode::PauseEncReq,
            0x0B => ControlOpcode::PauseEncRsp,
            0x0C => ControlOpcode::VersionInd,
            0x0D => ControlOpcode::RejectInd,
            0x0E => ControlOpcode::PeripheralFeatureReq,
            0x0F => ControlOpcode::ConnectionParamReq,
            0x10 => ControlOpcode::ConnectionParamRsp,
            0x11 => ControlOpcode::RejectExtInd,
            0x12 => ControlOpcode::PingReq,
            0x13 => ControlOpcode::PingRsp,
            0x14 => ControlOpcode::LengthReq,
            0x15 => ControlOpcode::LengthRsp,
            0x16 => ControlOpcode::PhyReq,
            0x17 => ControlOpcode::PhyRsp,
            0x18 => ControlOpcode::PhyUpdateInd,
            0x19 => ControlOpcode::MinUsedChannelsInd,
            other => ControlOpcode::Rfu(other),
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            ControlOpcode::ConnectionUpdateInd => 0x00,
            ControlOpcode::ChannelMapInd => 0x01,
            ControlOpcode::TerminateInd => 0x02,
            ControlOpcode::EncReq => 0x03,
            ControlOpcode::EncRsp => 0x04,
            ControlOpcode::StartEncReq => 0x05,
            ControlOpcode::StartEncRsp => 0x06,
            ControlOpcode::UnknownRsp => 0x07,
            ControlOpcode::FeatureReq => 0x08,
            ControlOpcode::FeatureRsp => 0x09,
            ControlOpcode::PauseEncReq => 0x0A,
            ControlOpcode::PauseEncRsp => 0x0B,
            ControlOpcode::VersionInd => 0x0C,
            ControlOpcode::RejectInd => 0x0D,
            ControlOpcode::PeripheralFeatureReq => 0x0E,
            ControlOpcode::ConnectionParamReq => 0x0F,
            ControlOpcode::ConnectionParamRsp => 0x10,
            ControlOpcode::RejectExtInd => 0x11,
            ControlOpcode::PingReq => 0x12,
            ControlOpcode::PingRsp => 0x13,
            ControlOpcode::LengthReq => 0x14,
            ControlOpcode::LengthRsp => 0x15,
            ControlOpcode::PhyReq => 0x16,
            ControlOpcode::PhyRsp => 0x17,
            ControlOpcode::PhyUpdateInd => 0x18,
            ControlOpcode::MinUsedChannelsInd => 0x19,
            ControlOpcode::Rfu(raw) => raw,
        }
    }
}
