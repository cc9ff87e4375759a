use super::common::Mac;
use super::error::PduError;
use super::layout;

/// Bounds-checked access to a PDU body. All reads return
/// [`PduError::TooShort`] instead of indexing past the buffer.
pub struct PduReader<'a> {
    body: &'a [u8],
}

impl<'a> PduReader<'a> {
    pub fn new(body: &'a [u8]) -> Self {
        Self { body }
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, PduError> {
        self.body.get(offset).copied().ok_or(PduError::TooShort {
            needed: offset + 1,
            actual: self.body.len(),
        })
    }

    pub fn read_slice(&self, range: std::ops::Range<usize>) -> Result<&'a [u8], PduError> {
        self.body.get(range.clone()).ok_or(PduError::TooShort {
            needed: range.end,
            actual: self.body.len(),
        })
    }

    pub fn read_u16_le(&self, range: std::ops::Range<usize>) -> Result<u16, PduError> {
        let bytes = self.read_slice(range)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// 3-byte little-endian field widened to u32 (CRC-init packing).
    pub fn read_u24_le(&self, range: std::ops::Range<usize>) -> Result<u32, PduError> {
        let bytes = self.read_slice(range)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]))
    }

    pub fn read_u32_le(&self, range: std::ops::Range<usize>) -> Result<u32, PduError> {
        let bytes = self.read_slice(range)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// 6-byte device address, consumed verbatim in on-wire order.
    pub fn read_mac(&self, range: std::ops::Range<usize>) -> Result<Mac, PduError> {
        let bytes = self.read_slice(range)?;
        let mut mac = [0u8; layout::MAC_LEN];
        mac.copy_from_slice(bytes);
        Ok(Mac(mac))
    }
}
