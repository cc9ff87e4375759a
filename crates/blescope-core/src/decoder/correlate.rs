//! Correlation state machine: (decoded PDU, previous state) -> next state.
//!
//! Rules are evaluated in order; the expiry sweep at the end runs
//! unconditionally so every pending hypothesis is bounded in time.

use crate::pdu::{AdvMode, DecodedPdu, ExtAdvPdu, rbit24};
use crate::record::SnifferMode;

use super::state::{ActiveConnection, DecoderState, PendingChain, PendingConnection};

/// Window after an AUX_SCAN_REQ in which a type-7 AUX PDU is its response.
pub(super) const SCAN_RSP_WINDOW_S: f64 = 0.0005;
/// Wider window used when the scan request itself was not observed.
pub(super) const UNSEEN_SCAN_REQ_WINDOW_S: f64 = 0.001;
/// Grace added past an AuxPtr offset when arming a chain expectation.
pub(super) const CHAIN_GRACE_S: f64 = 0.0005;

pub(super) fn update_state(pdu: &DecodedPdu, state: &mut DecoderState) {
    match pdu {
        DecodedPdu::ConnectInd(conn) | DecodedPdu::AuxConnectReq(conn) => {
            if conn.header.is_primary_chan() && state.last_mode != SnifferMode::AdvertisingExt {
                // Legacy establishment: the connection is live immediately.
                state.connection = Some(ActiveConnection {
                    aa: conn.aa_conn,
                    crc_init_rev: rbit24(conn.crc_init),
                });
            } else {
                // Extended establishment: hold until AUX_CONNECT_RSP.
                state.pending_connect = Some(PendingConnection {
                    aa: conn.aa_conn,
                    crc_init: conn.crc_init,
                });
            }
        }
        DecodedPdu::AuxConnectRsp(_) => {
            if let Some(pending) = state.pending_connect.take() {
                state.connection = Some(ActiveConnection {
                    aa: pending.aa,
                    crc_init_rev: rbit24(pending.crc_init),
                });
            }
        }
        DecodedPdu::AuxScanReq(req) => {
            state.pending_scan_rsp = Some(req.header.ts + SCAN_RSP_WINDOW_S);
        }
        DecodedPdu::AuxAdvInd(aux) | DecodedPdu::AuxScanRsp(aux) | DecodedPdu::AuxChainInd(aux) => {
            arm_aux_expectations(aux, state);
        }
        _ => {}
    }

    expire_pending(pdu, state);
}

fn arm_aux_expectations(aux: &ExtAdvPdu, state: &mut DecoderState) {
    if let Some(ptr) = &aux.ext.aux_ptr {
        state.pending_chain = Some(PendingChain {
            adi: aux.ext.adi,
            chan: ptr.chan,
            deadline: aux.header.ts + ptr.offset_secs() + CHAIN_GRACE_S,
        });
    } else if state.last_mode == SnifferMode::Scanning && aux.adv_mode == AdvMode::Scannable {
        // Scan requests may be filtered by hardware; still expect the
        // scan response that follows a scannable advertisement.
        state.pending_scan_rsp = Some(aux.header.ts + UNSEEN_SCAN_REQ_WINDOW_S);
    }
}

fn expire_pending(pdu: &DecodedPdu, state: &mut DecoderState) {
    let ts = pdu.header().ts;

    if let Some(deadline) = state.pending_scan_rsp {
        if ts > deadline || matches!(pdu, DecodedPdu::AuxScanRsp(_)) {
            state.pending_scan_rsp = None;
        }
    }
    if let Some(chain) = state.pending_chain {
        if ts > chain.deadline {
            state.pending_chain = None;
        } else if let DecodedPdu::AuxChainInd(aux) = pdu {
            if aux.header.chan == chain.chan && aux.ext.adi == chain.adi {
                state.pending_chain = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdu::{
        AdvFlags, AuxPtr, ChannelMap, ConnectIndPdu, ExtAdvHeader, Mac, PduHeader, ScanReqPdu,
    };
    use crate::record::{BLE_ADV_AA, Phy, RawPacket};

    fn header(ts: f64, chan: u8) -> PduHeader {
        PduHeader::from_record(&RawPacket {
            ts,
            ts_epoch: ts,
            aa: BLE_ADV_AA,
            rssi: -50,
            chan,
            phy: Phy::OneM,
            body: vec![0x00, 0x00],
            data_dir: false,
            event: 0,
            crc_rev: 0,
        })
    }

    fn adv_flags() -> AdvFlags {
        AdvFlags {
            ch_sel: false,
            tx_add: false,
            rx_add: false,
            ad_length: 0,
        }
    }

    fn connect_ind(ts: f64, chan: u8, aa_conn: u32, crc_init: u32) -> ConnectIndPdu {
        ConnectIndPdu {
            header: header(ts, chan),
            flags: adv_flags(),
            init_a: Mac([1; 6]),
            adv_a: Mac([2; 6]),
            aa_conn,
            crc_init,
            win_size: 1,
            win_offset: 0,
            interval: 24,
            latency: 0,
            timeout: 72,
            chm: ChannelMap([0xFF, 0xFF, 0xFF, 0xFF, 0x1F]),
            hop: 7,
            sca: 0,
        }
    }

    fn aux_adv(ts: f64, chan: u8, adv_mode: AdvMode, ext: ExtAdvHeader) -> ExtAdvPdu {
        ExtAdvPdu {
            header: header(ts, chan),
            flags: adv_flags(),
            adv_mode,
            ext,
        }
    }

    fn scan_req(ts: f64, chan: u8) -> ScanReqPdu {
        ScanReqPdu {
            header: header(ts, chan),
            flags: adv_flags(),
            scan_a: Mac([3; 6]),
            adv_a: Mac([4; 6]),
        }
    }

    #[test]
    fn primary_connect_ind_activates_immediately() {
        let mut state = DecoderState::new(SnifferMode::Advertising);
        let pdu = DecodedPdu::ConnectInd(connect_ind(1.0, 37, 0x50123456, 0x123456));
        update_state(&pdu, &mut state);
        assert_eq!(
            state.connection,
            Some(ActiveConnection {
                aa: 0x50123456,
                crc_init_rev: rbit24(0x123456),
            })
        );
        assert!(state.pending_connect.is_none());
    }

    #[test]
    fn secondary_connect_req_goes_pending_until_response() {
        let mut state = DecoderState::new(SnifferMode::AdvertisingExt);
        let pdu = DecodedPdu::AuxConnectReq(connect_ind(1.0, 4, 0x60ABCDEF, 0x00BEEF));
        update_state(&pdu, &mut state);
        assert!(state.connection.is_none());
        assert_eq!(
            state.pending_connect,
            Some(PendingConnection {
                aa: 0x60ABCDEF,
                crc_init: 0x00BEEF,
            })
        );

        let rsp = DecodedPdu::AuxConnectRsp(aux_adv(
            1.0003,
            4,
            AdvMode::Connectable,
            ExtAdvHeader::default(),
        ));
        update_state(&rsp, &mut state);
        assert_eq!(
            state.connection,
            Some(ActiveConnection {
                aa: 0x60ABCDEF,
                crc_init_rev: rbit24(0x00BEEF),
            })
        );
        assert!(state.pending_connect.is_none());
    }

    #[test]
    fn primary_connect_ind_in_extended_mode_goes_pending() {
        let mut state = DecoderState::new(SnifferMode::AdvertisingExt);
        let pdu = DecodedPdu::ConnectInd(connect_ind(1.0, 37, 0x11, 0x22));
        update_state(&pdu, &mut state);
        assert!(state.connection.is_none());
        assert!(state.pending_connect.is_some());
    }

    #[test]
    fn connect_rsp_without_pending_slot_is_a_no_op() {
        let mut state = DecoderState::default();
        let rsp = DecodedPdu::AuxConnectRsp(aux_adv(
            1.0,
            4,
            AdvMode::Connectable,
            ExtAdvHeader::default(),
        ));
        update_state(&rsp, &mut state);
        assert!(state.connection.is_none());
    }

    #[test]
    fn aux_scan_req_arms_scan_rsp_deadline() {
        let mut state = DecoderState::default();
        let pdu = DecodedPdu::AuxScanReq(scan_req(1.0, 5));
        update_state(&pdu, &mut state);
        assert_eq!(state.pending_scan_rsp, Some(1.0 + SCAN_RSP_WINDOW_S));
    }

    #[test]
    fn aux_ptr_arms_chain_with_offset_and_grace() {
        let mut state = DecoderState::default();
        let ext = ExtAdvHeader {
            aux_ptr: Some(AuxPtr {
                chan: 5,
                phy: 0,
                offset_usec: 1000,
            }),
            ..ExtAdvHeader::default()
        };
        let pdu = DecodedPdu::AuxAdvInd(aux_adv(2.0, 9, AdvMode::NonConnNonScan, ext));
        update_state(&pdu, &mut state);
        let chain = state.pending_chain.expect("chain armed");
        assert_eq!(chain.chan, 5);
        assert!((chain.deadline - 2.0015).abs() < 1e-9);
    }

    #[test]
    fn scannable_aux_adv_in_scanning_mode_arms_wide_window() {
        let mut state = DecoderState::new(SnifferMode::Scanning);
        let pdu = DecodedPdu::AuxAdvInd(aux_adv(
            3.0,
            8,
            AdvMode::Scannable,
            ExtAdvHeader::default(),
        ));
        update_state(&pdu, &mut state);
        assert_eq!(state.pending_scan_rsp, Some(3.0 + UNSEEN_SCAN_REQ_WINDOW_S));
    }

    #[test]
    fn aux_ptr_takes_precedence_over_scannable_window() {
        let mut state = DecoderState::new(SnifferMode::Scanning);
        let ext = ExtAdvHeader {
            aux_ptr: Some(AuxPtr {
                chan: 2,
                phy: 0,
                offset_usec: 600,
            }),
            ..ExtAdvHeader::default()
        };
        let pdu = DecodedPdu::AuxAdvInd(aux_adv(3.0, 8, AdvMode::Scannable, ext));
        update_state(&pdu, &mut state);
        assert!(state.pending_chain.is_some());
        assert!(state.pending_scan_rsp.is_none());
    }

    #[test]
    fn pending_slots_expire_on_late_packets() {
        let mut state = DecoderState::default();
        state.pending_scan_rsp = Some(1.0);
        state.pending_chain = Some(PendingChain {
            adi: None,
            chan: 5,
            deadline: 1.0,
        });

        let late = DecodedPdu::Advert(crate::pdu::AdvertPdu {
            header: header(1.5, 37),
            flags: adv_flags(),
        });
        update_state(&late, &mut state);
        assert!(state.pending_scan_rsp.is_none());
        assert!(state.pending_chain.is_none());
    }

    #[test]
    fn matching_chain_ind_consumes_the_pending_slot() {
        let mut state = DecoderState::default();
        state.pending_chain = Some(PendingChain {
            adi: None,
            chan: 5,
            deadline: 2.0,
        });
        let pdu = DecodedPdu::AuxChainInd(aux_adv(
            1.9,
            5,
            AdvMode::NonConnNonScan,
            ExtAdvHeader::default(),
        ));
        update_state(&pdu, &mut state);
        assert!(state.pending_chain.is_none());
    }

    #[test]
    fn chain_ind_with_aux_ptr_rearms_before_sweep() {
        // A chain link can itself point at the next link.
        let mut state = DecoderState::default();
        state.pending_chain = Some(PendingChain {
            adi: None,
            chan: 5,
            deadline: 2.0,
        });
        let ext = ExtAdvHeader {
            aux_ptr: Some(AuxPtr {
                chan: 11,
                phy: 0,
                offset_usec: 2000,
            }),
            ..ExtAdvHeader::default()
        };
        let pdu = DecodedPdu::AuxChainInd(aux_adv(1.9, 5, AdvMode::NonConnNonScan, ext));
        update_state(&pdu, &mut state);
        let chain = state.pending_chain.expect("next link armed");
        assert_eq!(chain.chan, 11);
    }

    #[test]
    fn scan_rsp_clears_its_own_deadline() {
        let mut state = DecoderState::default();
        state.pending_scan_rsp = Some(2.0);
        let pdu = DecodedPdu::AuxScanRsp(aux_adv(
            1.5,
            6,
            AdvMode::NonConnNonScan,
            ExtAdvHeader::default(),
        ));
        update_state(&pdu, &mut state);
        assert!(state.pending_scan_rsp.is_none());
    }
}
