/** ------------------------------------------------------------
 * CSI extraction from the record payload
 * ------------------------------------------------------------- */
use crate::errors::RecordError;
use crate::util::{get_i16_le, get_u32_le};
use bilge::prelude::*;
use num_complex::Complex64;

/// Subcarrier slot that carries the PHY rx status word on TestPhyStatus
pub const PHY_STATUS_SUBCARRIER: usize = 29;

/**
 * Packed PHY rx status 2 word, LSB first. The rx power byte overlaps
 * lnagn and pgagn and is read separately.
 */
#[bitsize(16)]
#[derive(FromBits, DebugBits, Clone, Copy)]
struct PhyRxStatus2 {
    foff: u10,
    pgagn: u4,
    lnagn: u2,
}

/**
 * Hardware status fields reported by the TestPhyStatus firmware
 */
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PhyStatus {
    pub rxpower: u16,
    pub lnagn: u16,
    pub pgagn: u16,
    pub foff: u16,
}

impl PhyStatus {
    pub fn from_word(word: i16) -> Self {
        let raw = word as u16;
        let status = PhyRxStatus2::from(raw);

        Self {
            rxpower: (raw & 0xFF00) >> 8,
            lnagn: status.lnagn().value() as u16,
            pgagn: status.pgagn().value() as u16,
            foff: status.foff().value(),
        }
    }
}

/**
 * CSI block of a single record
 */
#[derive(Debug, Clone, PartialEq)]
pub struct CsiPayload {
    pub csi: Vec<Complex64>,
    pub phy_status: Option<PhyStatus>,
}

/**
 * Select the CSI block at the tail of the payload
 *
 * Payloads of a multiple of 4 bytes are taken as little endian words,
 * one word per subcarrier. Others are taken byte-wise, four bytes per
 * subcarrier. Either way the last `sc_count` subcarrier slots hold the
 * CSI, returned as (real, imaginary) pairs.
 */
fn subcarrier_pairs(payload: &[u8], sc_count: usize) -> Result<Vec<(i16, i16)>, RecordError> {
    if payload.len() % 4 == 0 {
        let words: Vec<u32> = (0..payload.len() / 4)
            .map(|i| get_u32_le(payload, i * 4))
            .collect();
        if words.len() < sc_count {
            return Err(RecordError::InsufficientSubcarrierData {
                required: sc_count,
                available: words.len(),
            });
        }

        Ok(words[words.len() - sc_count..]
            .iter()
            .map(|&word| ((word & 0xFFFF) as u16 as i16, (word >> 16) as u16 as i16))
            .collect())
    } else {
        let available = payload.len() / 4;
        if available < sc_count {
            return Err(RecordError::InsufficientSubcarrierData {
                required: sc_count,
                available,
            });
        }

        let tail = &payload[payload.len() - sc_count * 4..];
        Ok(tail
            .chunks_exact(4)
            .map(|slot| (get_i16_le(slot, 0), get_i16_le(slot, 2)))
            .collect())
    }
}

/**
 * Extract the CSI of one record
 *
 * \param payload     Complete record data (incl_len bytes)
 * \param sc_count    Number of subcarriers of the session bandwidth
 * \param phy_status  Whether subcarrier 29 carries the PHY status word
 */
pub fn extract_csi(
    payload: &[u8],
    sc_count: usize,
    phy_status: bool,
) -> Result<CsiPayload, RecordError> {
    if payload.is_empty() {
        return Err(RecordError::EmptyPayload);
    }

    let pairs = subcarrier_pairs(payload, sc_count)?;

    // Only the real half of the slot is used for the status word
    let phy_status = if phy_status {
        pairs
            .get(PHY_STATUS_SUBCARRIER)
            .map(|&(word, _)| PhyStatus::from_word(word))
    } else {
        None
    };

    let csi = pairs
        .into_iter()
        .map(|(re, im)| Complex64::new(re as f64, im as f64))
        .collect();

    Ok(CsiPayload { csi, phy_status })
}
