//! Extended Advertising header decoding (ADV_EXT_IND family).
//!
//! The extended header is variable: a presence bitmask selects, in fixed
//! left-to-right order, which optional fields are physically present, and
//! a declared header-body length bounds the whole walk. Malformed input
//! degrades to a partial parse: the walk stops at the last fully parsed
//! field, fields not yet reached stay absent, and the PDU is still
//! returned. Field presence is driven by the flag bits alone, so a zero
//! CTEInfo or TxPower byte decodes as `Some(0)`.

use serde::Serialize;
use tracing::debug;

use super::common::Mac;
use super::error::PduError;
use super::layout;
use super::reader::PduReader;
use super::{AdvFlags, PduHeader};
use crate::record::RawPacket;

/// Advertising mode bits of the extended header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvMode {
    NonConnNonScan,
    Connectable,
    Scannable,
    Rfu,
}

impl AdvMode {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => AdvMode::NonConnNonScan,
            1 => AdvMode::Connectable,
            2 => AdvMode::Scannable,
            _ => AdvMode::Rfu,
        }
    }
}

/// Pointer to a future secondary-channel packet continuing this
/// advertisement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuxPtr {
    /// Target secondary channel, 0..=36.
    pub chan: u8,
    /// Raw 3-bit PHY selector (0 = 1M, 1 = 2M, 2 = Coded; rest reserved).
    pub phy: u8,
    /// Time offset to the auxiliary packet in microseconds.
    pub offset_usec: u32,
}

impl AuxPtr {
    fn from_bytes(bytes: &[u8]) -> Self {
        let units = if bytes[0] & layout::AUX_PTR_OFFSET_UNITS_MASK != 0 {
            layout::AUX_PTR_UNIT_LARGE_USEC
        } else {
            layout::AUX_PTR_UNIT_SMALL_USEC
        };
        let raw_offset =
            u32::from(bytes[1]) | (u32::from(bytes[2] & layout::AUX_PTR_OFFSET_HIGH_MASK) << 8);
        Self {
            chan: bytes[0] & layout::AUX_PTR_CHAN_MASK,
            phy: bytes[2] >> layout::AUX_PTR_PHY_SHIFT,
            offset_usec: raw_offset * units,
        }
    }

    /// Pointer offset as seconds, for deadline arithmetic.
    pub fn offset_secs(&self) -> f64 {
        f64::from(self.offset_usec) * 1e-6
    }
}

/// Advertising Data Info: set identifier plus data identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdvDataInfo {
    pub did: u16,
    pub sid: u8,
}

impl AdvDataInfo {
    fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            did: u16::from(bytes[0]) | (u16::from(bytes[1] & layout::ADI_DID_HIGH_MASK) << 8),
            sid: bytes[1] >> layout::ADI_SID_SHIFT,
        }
    }
}

/// Optional fields of the extended header. Absent means the presence bit
/// was clear or the walk stopped before reaching the field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtAdvHeader {
    pub adv_a: Option<Mac>,
    pub target_a: Option<Mac>,
    pub cte_info: Option<u8>,
    pub adi: Option<AdvDataInfo>,
    pub aux_ptr: Option<AuxPtr>,
    pub sync_info: Option<[u8; 18]>,
    pub tx_power: Option<i8>,
    pub acad: Option<Vec<u8>>,
}

/// Outcome of the extended header walk: the advertising mode, the parsed
/// field prefix, and the error that stopped the walk, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtHeaderParse {
    pub adv_mode: AdvMode,
    pub header: ExtAdvHeader,
    pub error: Option<PduError>,
}

/// Walk the extended header of `body` (a full PDU body, link-layer header
/// included). Never reads past the buffer or the declared header length.
pub fn parse_ext_header(body: &[u8]) -> ExtHeaderParse {
    let mut header = ExtAdvHeader::default();
    let reader = PduReader::new(body);

    let len_byte = match reader.read_u8(layout::EXT_HEADER_LEN_OFFSET) {
        Ok(byte) => byte,
        Err(err) => {
            return ExtHeaderParse {
                adv_mode: AdvMode::Rfu,
                header,
                error: Some(err),
            };
        }
    };
    let adv_mode = AdvMode::from_bits(len_byte >> layout::EXT_ADV_MODE_SHIFT);
    let declared = usize::from(len_byte & layout::EXT_HEADER_LEN_MASK);
    if declared == 0 {
        return ExtHeaderParse {
            adv_mode,
            header,
            error: None,
        };
    }

    // The declared length counts the flags byte plus the optional fields.
    let declared_end = layout::EXT_FLAGS_OFFSET + declared;
    let (end, length_error) = if declared_end > body.len() {
        let err = PduError::ExtHeaderLength {
            declared,
            available: body.len() - layout::EXT_FLAGS_OFFSET,
        };
        (body.len(), Some(err))
    } else {
        (declared_end, None)
    };

    let walk_error = walk_fields(body, end, &mut header).err();
    let error = length_error.or(walk_error);

    // Trailing ACAD bytes are sized by the remainder of the declared
    // length, which is only well-defined on a clean walk.
    if error.is_none() {
        let acad_start = layout::EXT_FIELDS_OFFSET + consumed_fields_len(&header);
        if acad_start < end {
            header.acad = Some(body[acad_start..end].to_vec());
        }
    }

    ExtHeaderParse {
        adv_mode,
        header,
        error,
    }
}

fn walk_fields(body: &[u8], end: usize, header: &mut ExtAdvHeader) -> Result<(), PduError> {
    let take = |pos: &mut usize, field: &'static str, len: usize| -> Result<&[u8], PduError> {
        let next = *pos + len;
        if next > end {
            return Err(PduError::ExtHeaderField {
                field,
                needed: len,
                available: end - *pos,
            });
        }
        let slice = &body[*pos..next];
        *pos = next;
        Ok(slice)
    };

    let mut pos = layout::EXT_FLAGS_OFFSET;
    let flags = take(&mut pos, "Flags", 1)?[0];

    if flags & layout::EXT_FLAG_ADVA != 0 {
        let bytes = take(&mut pos, "AdvA", layout::MAC_LEN)?;
        let mut mac = [0u8; 6];
        mac.copy_from_slice(bytes);
        header.adv_a = Some(Mac(mac));
    }
    if flags & layout::EXT_FLAG_TARGETA != 0 {
        let bytes = take(&mut pos, "TargetA", layout::MAC_LEN)?;
        let mut mac = [0u8; 6];
        mac.copy_from_slice(bytes);
        header.target_a = Some(Mac(mac));
    }
    if flags & layout::EXT_FLAG_CTE_INFO != 0 {
        header.cte_info = Some(take(&mut pos, "CTEInfo", layout::CTE_INFO_LEN)?[0]);
    }
    if flags & layout::EXT_FLAG_ADI != 0 {
        let bytes = take(&mut pos, "AdvDataInfo", layout::ADI_LEN)?;
        header.adi = Some(AdvDataInfo::from_bytes(bytes));
    }
    if flags & layout::EXT_FLAG_AUX_PTR != 0 {
        let bytes = take(&mut pos, "AuxPtr", layout::AUX_PTR_LEN)?;
        header.aux_ptr = Some(AuxPtr::from_bytes(bytes));
    }
    if flags & layout::EXT_FLAG_SYNC_INFO != 0 {
        let bytes = take(&mut pos, "SyncInfo", layout::SYNC_INFO_LEN)?;
        let mut sync = [0u8; 18];
        sync.copy_from_slice(bytes);
        header.sync_info = Some(sync);
    }
    if flags & layout::EXT_FLAG_TX_POWER != 0 {
        header.tx_power = Some(take(&mut pos, "TxPower", layout::TX_POWER_LEN)?[0] as i8);
    }
    Ok(())
}

/// Bytes consumed by the parsed optional fields, excluding the flags byte.
/// Only meaningful after a clean walk.
fn consumed_fields_len(header: &ExtAdvHeader) -> usize {
    let mut len = 0;
    if header.adv_a.is_some() {
        len += layout::MAC_LEN;
    }
    if header.target_a.is_some() {
        len += layout::MAC_LEN;
    }
    if header.cte_info.is_some() {
        len += layout::CTE_INFO_LEN;
    }
    if header.adi.is_some() {
        len += layout::ADI_LEN;
    }
    if header.aux_ptr.is_some() {
        len += layout::AUX_PTR_LEN;
    }
    if header.sync_info.is_some() {
        len += layout::SYNC_INFO_LEN;
    }
    if header.tx_power.is_some() {
        len += layout::TX_POWER_LEN;
    }
    len
}

/// ADV_EXT_IND and its AUX_* secondary-channel forms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtAdvPdu {
    #[serde(flatten)]
    pub header: PduHeader,
    pub flags: AdvFlags,
    pub adv_mode: AdvMode,
    pub ext: ExtAdvHeader,
}

impl ExtAdvPdu {
    pub(crate) fn parse(pkt: &RawPacket) -> Result<Self, PduError> {
        let reader = PduReader::new(&pkt.body);
        let flags = AdvFlags::parse(&reader)?;
        let parsed = parse_ext_header(&pkt.body);
        if let Some(err) = &parsed.error {
            debug!(
                chan = pkt.chan,
                body_len = pkt.body.len(),
                error = %err,
                "malformed extended advertising header, keeping parsed prefix"
            );
        }
        Ok(Self {
            header: PduHeader::from_record(pkt),
            flags,
            adv_mode: parsed.adv_mode,
            ext: parsed.header,
        })
    }
}
