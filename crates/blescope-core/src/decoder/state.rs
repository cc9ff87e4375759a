//! Per-session correlation state.
//!
//! One [`DecoderState`] models a single capture session's sequential
//! timeline. The caller owns it and threads it through every decode call;
//! the correlation state machine mutates it exactly once per successfully
//! decoded PDU. Pending slots are time-bounded hypotheses: each holds an
//! absolute deadline the next packets are evaluated against, so stale
//! state cannot mis-tag an unrelated later packet.

use crate::pdu::AdvDataInfo;
use crate::record::SnifferMode;

/// Connection whose establishment has been confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveConnection {
    /// Access address of the tracked connection.
    pub aa: u32,
    /// CRC-init for the connection, bit-reversed for the follower.
    pub crc_init_rev: u32,
}

/// Extended connection awaiting confirmation by an AUX_CONNECT_RSP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingConnection {
    pub aa: u32,
    /// CRC-init as carried by the CONNECT_IND, unreversed.
    pub crc_init: u32,
}

/// Expected AUX_CHAIN_IND continuation of an extended advertisement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingChain {
    /// Advertising data identifier of the advertisement being chained.
    pub adi: Option<AdvDataInfo>,
    /// Secondary channel the continuation was announced on.
    pub chan: u8,
    /// Absolute timestamp after which the expectation expires.
    pub deadline: f64,
}

/// Mutable decoder state for one capture session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecoderState {
    /// Last known mode of the sniffer-mode state machine (caller input).
    pub last_mode: SnifferMode,
    /// Currently tracked connection, absent until confirmed.
    pub connection: Option<ActiveConnection>,
    /// Extended connection establishment awaiting its response.
    pub pending_connect: Option<PendingConnection>,
    /// Deadline before which an ambiguous AUX PDU is a scan response.
    pub pending_scan_rsp: Option<f64>,
    /// Expected chain continuation, if any.
    pub pending_chain: Option<PendingChain>,
}

impl DecoderState {
    /// Fresh session state with the given sniffer mode.
    pub fn new(mode: SnifferMode) -> Self {
        Self {
            last_mode: mode,
            ..Self::default()
        }
    }
}
