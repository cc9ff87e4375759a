//! Byte offsets and bit masks for BLE link-layer PDU layouts.

use std::ops::Range;

// Advertising PDU header (body byte 0) and length (body byte 1).
pub const ADV_TYPE_MASK: u8 = 0x0F;
pub const ADV_CHSEL_SHIFT: u8 = 5;
pub const ADV_TXADD_SHIFT: u8 = 6;
pub const ADV_RXADD_SHIFT: u8 = 7;
pub const AD_LENGTH_OFFSET: usize = 1;

// ADV_IND / ADV_NONCONN_IND / SCAN_RSP / ADV_SCAN_IND
pub const ADVA_RANGE: Range<usize> = 2..8;

// ADV_DIRECT_IND
pub const DIRECT_TARGETA_RANGE: Range<usize> = 8..14;

// SCAN_REQ / AUX_SCAN_REQ
pub const SCANA_RANGE: Range<usize> = 2..8;
pub const SCAN_ADVA_RANGE: Range<usize> = 8..14;

// CONNECT_IND / AUX_CONNECT_REQ
pub const CONNECT_INITA_RANGE: Range<usize> = 2..8;
pub const CONNECT_ADVA_RANGE: Range<usize> = 8..14;
pub const CONNECT_AA_RANGE: Range<usize> = 14..18;
pub const CONNECT_CRC_INIT_RANGE: Range<usize> = 18..21;
pub const CONNECT_WIN_SIZE_OFFSET: usize = 21;
pub const CONNECT_WIN_OFFSET_RANGE: Range<usize> = 22..24;
pub const CONNECT_INTERVAL_RANGE: Range<usize> = 24..26;
pub const CONNECT_LATENCY_RANGE: Range<usize> = 26..28;
pub const CONNECT_TIMEOUT_RANGE: Range<usize> = 28..30;
pub const CONNECT_CHM_RANGE: Range<usize> = 30..35;
pub const CONNECT_HOP_SCA_OFFSET: usize = 35;
pub const CONNECT_HOP_MASK: u8 = 0x1F;
pub const CONNECT_SCA_SHIFT: u8 = 5;

// Extended advertising header (ADV_EXT_IND family).
pub const EXT_HEADER_LEN_OFFSET: usize = 2;
pub const EXT_HEADER_LEN_MASK: u8 = 0x3F;
pub const EXT_ADV_MODE_SHIFT: u8 = 6;
pub const EXT_FLAGS_OFFSET: usize = 3;
pub const EXT_FIELDS_OFFSET: usize = 4;

// Extended header presence flags, in field order on the wire.
pub const EXT_FLAG_ADVA: u8 = 0x01;
pub const EXT_FLAG_TARGETA: u8 = 0x02;
pub const EXT_FLAG_CTE_INFO: u8 = 0x04;
pub const EXT_FLAG_ADI: u8 = 0x08;
pub const EXT_FLAG_AUX_PTR: u8 = 0x10;
pub const EXT_FLAG_SYNC_INFO: u8 = 0x20;
pub const EXT_FLAG_TX_POWER: u8 = 0x40;

pub const MAC_LEN: usize = 6;
pub const CTE_INFO_LEN: usize = 1;
pub const ADI_LEN: usize = 2;
pub const AUX_PTR_LEN: usize = 3;
pub const SYNC_INFO_LEN: usize = 18;
pub const TX_POWER_LEN: usize = 1;

// AuxPtr sub-fields (3 bytes, little-endian bit order).
pub const AUX_PTR_CHAN_MASK: u8 = 0x3F;
pub const AUX_PTR_OFFSET_UNITS_MASK: u8 = 0x80;
pub const AUX_PTR_OFFSET_HIGH_MASK: u8 = 0x1F;
pub const AUX_PTR_PHY_SHIFT: u8 = 5;
pub const AUX_PTR_UNIT_LARGE_USEC: u32 = 300;
pub const AUX_PTR_UNIT_SMALL_USEC: u32 = 30;

// AdvDataInfo sub-fields (2 bytes).
pub const ADI_DID_HIGH_MASK: u8 = 0x0F;
pub const ADI_SID_SHIFT: u8 = 4;

// Data-channel PDU header (body byte 0) and length (body byte 1).
pub const DATA_LLID_MASK: u8 = 0x03;
pub const DATA_NESN_SHIFT: u8 = 2;
pub const DATA_SN_SHIFT: u8 = 3;
pub const DATA_MD_SHIFT: u8 = 4;
pub const DATA_LENGTH_OFFSET: usize = 1;
pub const CTRL_OPCODE_OFFSET: usize = 2;

/// First advertising channel index; 37..=39 are primary channels.
pub const PRIMARY_CHAN_MIN: u8 = 37;

/// Channel map bytes meaning "all 37 data channels in use".
pub const CHM_ALL_USED: [u8; 5] = [0xFF, 0xFF, 0xFF, 0xFF, 0x1F];
/// Number of data channels covered by a channel map.
pub const CHM_CHANNELS: u8 = 37;
