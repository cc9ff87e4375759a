//! Human-readable summary lines for decoded PDUs (the `--text` output).

use std::fmt::Write as _;

use blescope_core::{AdvMode, DecodedPdu, ExtAdvPdu};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// One summary line: timestamp, channel, RSSI, PDU kind, then the fields
/// that identify the packet at a glance.
pub fn summary(pdu: &DecodedPdu) -> String {
    let header = pdu.header();
    let mut line = format!(
        "{} ch={:<2} rssi={:>4} {:<15}",
        format_epoch(header.ts_epoch),
        header.chan,
        header.rssi,
        pdu.kind_name(),
    );

    match pdu {
        DecodedPdu::AdvInd(p)
        | DecodedPdu::AdvNonconnInd(p)
        | DecodedPdu::ScanRsp(p)
        | DecodedPdu::AdvScanInd(p) => {
            let _ = write!(line, " adv_a={}", p.adv_a);
        }
        DecodedPdu::AdvDirectInd(p) => {
            let _ = write!(line, " adv_a={} target_a={}", p.adv_a, p.target_a);
        }
        DecodedPdu::ScanReq(p) | DecodedPdu::AuxScanReq(p) => {
            let _ = write!(line, " scan_a={} adv_a={}", p.scan_a, p.adv_a);
        }
        DecodedPdu::ConnectInd(p) | DecodedPdu::AuxConnectReq(p) => {
            let _ = write!(
                line,
                " adv_a={} aa=0x{:08X} interval={} hop={}",
                p.adv_a, p.aa_conn, p.interval, p.hop
            );
        }
        DecodedPdu::AdvExtInd(p)
        | DecodedPdu::AuxAdvInd(p)
        | DecodedPdu::AuxScanRsp(p)
        | DecodedPdu::AuxChainInd(p)
        | DecodedPdu::AuxConnectRsp(p) => ext_summary(&mut line, p),
        DecodedPdu::LlControl(p) => {
            let _ = write!(line, " opcode={:?} len={}", p.opcode, p.flags.data_length);
        }
        DecodedPdu::LlData(p) | DecodedPdu::LlDataCont(p) | DecodedPdu::DataReserved(p) => {
            let dir = if p.header.data_dir { "p->c" } else { "c->p" };
            let _ = write!(line, " dir={} len={}", dir, p.flags.data_length);
        }
        DecodedPdu::Advert(_) | DecodedPdu::Raw(_) => {
            let _ = write!(line, " len={}", header.body.len());
        }
    }
    line
}

fn ext_summary(line: &mut String, pdu: &ExtAdvPdu) {
    let _ = write!(line, " mode={}", mode_name(pdu.adv_mode));
    if let Some(adv_a) = &pdu.ext.adv_a {
        let _ = write!(line, " adv_a={}", adv_a);
    }
    if let Some(target_a) = &pdu.ext.target_a {
        let _ = write!(line, " target_a={}", target_a);
    }
    if let Some(adi) = pdu.ext.adi {
        let _ = write!(line, " did=0x{:03X} sid={}", adi.did, adi.sid);
    }
    if let Some(ptr) = pdu.ext.aux_ptr {
        let _ = write!(line, " aux=ch{}+{}us", ptr.chan, ptr.offset_usec);
    }
    if let Some(tx) = pdu.ext.tx_power {
        let _ = write!(line, " tx={}dBm", tx);
    }
}

fn mode_name(mode: AdvMode) -> &'static str {
    match mode {
        AdvMode::NonConnNonScan => "non_conn_non_scan",
        AdvMode::Connectable => "connectable",
        AdvMode::Scannable => "scannable",
        AdvMode::Rfu => "rfu",
    }
}

/// RFC3339 rendering of an epoch timestamp; falls back to raw seconds when
/// the value is outside the representable range.
fn format_epoch(ts_epoch: f64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos((ts_epoch * 1e9) as i128)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .unwrap_or_else(|| format!("{ts_epoch:.6}"))
}
