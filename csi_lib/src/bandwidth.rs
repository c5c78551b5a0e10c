use crate::errors::CsiExtractionError;

/**
 * Channel bandwidth of a capture session
 *
 * Not recoverable from the capture itself, it has to be supplied by
 * the caller.
 */
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Bandwidth {
    Bw20 = 20,
    Bw40 = 40,
    Bw80 = 80,
}

impl Bandwidth {
    pub fn from_mhz(value: u32) -> Result<Bandwidth, CsiExtractionError> {
        match value {
            20 => Ok(Bandwidth::Bw20),
            40 => Ok(Bandwidth::Bw40),
            80 => Ok(Bandwidth::Bw80),
            _ => Err(CsiExtractionError::InvalidBandwidth(value)),
        }
    }

    pub fn to_mhz(self) -> u32 {
        self as u32
    }

    /**
     * Number of subcarriers (FFT bins), i.e. bandwidth * 3.2
     */
    pub fn subcarrier_count(self) -> usize {
        match self {
            Bandwidth::Bw20 => 64,
            Bandwidth::Bw40 => 128,
            Bandwidth::Bw80 => 256,
        }
    }
}
