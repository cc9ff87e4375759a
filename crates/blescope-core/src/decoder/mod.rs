//! PDU type dispatch and the top-level decode entry point.
//!
//! Dispatch picks exactly one decoder per record: advertising vs data
//! traffic by access address, then by channel class and the PDU-type
//! nibble (advertising) or the LLID field (data). One secondary-channel
//! type value is ambiguous and resolved against the session's pending
//! deadlines. Decode failures never propagate: the entry point reports
//! them and hands the record back as [`DecodedPdu::Raw`] so the capture
//! stream keeps flowing.

mod correlate;
mod state;

pub use state::{ActiveConnection, DecoderState, PendingChain, PendingConnection};

use tracing::warn;

use crate::pdu::{
    AdvDirectIndPdu, AdvaPdu, AdvertPdu, ConnectIndPdu, ControlPdu, DataPdu, DecodedPdu, ExtAdvPdu,
    PduError, ScanReqPdu, layout, reader::PduReader,
};
use crate::record::RawPacket;

/// Decode one capture record.
///
/// With a [`DecoderState`], the state is advanced once per successfully
/// decoded PDU and consulted to resolve ambiguous secondary-channel AUX
/// PDUs. Without one, this is a pure dispatch: no correlation is applied
/// and ambiguous AUX PDUs resolve to AUX_ADV_IND.
pub fn decode(pkt: &RawPacket, state: Option<&mut DecoderState>) -> DecodedPdu {
    match dispatch(pkt, state.as_deref()) {
        Ok(pdu) => {
            if let Some(state) = state {
                correlate::update_state(&pdu, state);
            }
            pdu
        }
        Err(err) => {
            warn!(
                chan = pkt.chan,
                body_len = pkt.body.len(),
                error = %err,
                "packet decode failed, returning undecoded record"
            );
            DecodedPdu::raw(pkt)
        }
    }
}

fn dispatch(pkt: &RawPacket, state: Option<&DecoderState>) -> Result<DecodedPdu, PduError> {
    if pkt.is_advertising() {
        decode_advert(pkt, state)
    } else {
        decode_data(pkt)
    }
}

fn decode_advert(pkt: &RawPacket, state: Option<&DecoderState>) -> Result<DecodedPdu, PduError> {
    let reader = PduReader::new(&pkt.body);
    let pdu_type = reader.read_u8(0)? & layout::ADV_TYPE_MASK;

    if pkt.chan >= layout::PRIMARY_CHAN_MIN {
        return Ok(match pdu_type {
            0 => DecodedPdu::AdvInd(AdvaPdu::parse(pkt)?),
            1 => DecodedPdu::AdvDirectInd(AdvDirectIndPdu::parse(pkt)?),
            2 => DecodedPdu::AdvNonconnInd(AdvaPdu::parse(pkt)?),
            3 => DecodedPdu::ScanReq(ScanReqPdu::parse(pkt)?),
            4 => DecodedPdu::ScanRsp(AdvaPdu::parse(pkt)?),
            5 => DecodedPdu::ConnectInd(ConnectIndPdu::parse(pkt)?),
            6 => DecodedPdu::AdvScanInd(AdvaPdu::parse(pkt)?),
            7 => DecodedPdu::AdvExtInd(ExtAdvPdu::parse(pkt)?),
            _ => DecodedPdu::Advert(AdvertPdu::parse(pkt)?),
        });
    }

    Ok(match pdu_type {
        3 => DecodedPdu::AuxScanReq(ScanReqPdu::parse(pkt)?),
        5 => DecodedPdu::AuxConnectReq(ConnectIndPdu::parse(pkt)?),
        7 => {
            let pdu = ExtAdvPdu::parse(pkt)?;
            match classify_aux_type7(pkt, state) {
                AuxKind::ScanRsp => DecodedPdu::AuxScanRsp(pdu),
                AuxKind::ChainInd => DecodedPdu::AuxChainInd(pdu),
                AuxKind::AdvInd => DecodedPdu::AuxAdvInd(pdu),
            }
        }
        8 => DecodedPdu::AuxConnectRsp(ExtAdvPdu::parse(pkt)?),
        _ => DecodedPdu::Advert(AdvertPdu::parse(pkt)?),
    })
}

enum AuxKind {
    ScanRsp,
    ChainInd,
    AdvInd,
}

/// Secondary-channel PDU-type 7 is ambiguous between AUX_SCAN_RSP,
/// AUX_CHAIN_IND and AUX_ADV_IND; only the session's pending deadlines
/// can tell them apart.
fn classify_aux_type7(pkt: &RawPacket, state: Option<&DecoderState>) -> AuxKind {
    let Some(state) = state else {
        return AuxKind::AdvInd;
    };
    if let Some(deadline) = state.pending_scan_rsp {
        if pkt.ts < deadline {
            return AuxKind::ScanRsp;
        }
    }
    if let Some(chain) = &state.pending_chain {
        // TODO: also require an ADI match before tagging a continuation;
        // channel and deadline alone can misattribute overlapping chains.
        if pkt.chan == chain.chan && pkt.ts < chain.deadline {
            return AuxKind::ChainInd;
        }
    }
    AuxKind::AdvInd
}

fn decode_data(pkt: &RawPacket) -> Result<DecodedPdu, PduError> {
    let reader = PduReader::new(&pkt.body);
    let llid = reader.read_u8(0)? & layout::DATA_LLID_MASK;
    Ok(match llid {
        1 => DecodedPdu::LlDataCont(DataPdu::parse(pkt)?),
        2 => DecodedPdu::LlData(DataPdu::parse(pkt)?),
        3 => DecodedPdu::LlControl(ControlPdu::parse(pkt)?),
        _ => DecodedPdu::DataReserved(DataPdu::parse(pkt)?),
    })
}
