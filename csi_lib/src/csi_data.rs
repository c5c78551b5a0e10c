/** ------------------------------------------------------------
 * CSI data structs used throughout the library.
 * ------------------------------------------------------------- */
use crate::bandwidth::Bandwidth;
use crate::csi_payload::PhyStatus;
use crate::errors::{CsiExtractionError, RecordError};
use crate::payload_header::PayloadHeader;
use crate::pcap::RecordHeader;
use crate::tool_version::CsiToolVersion;

/**
 * Session configuration. Neither value can be recovered from the
 * capture.
 */
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExtractionConfig {
    pub bandwidth: Bandwidth,
    pub tool_version: CsiToolVersion,
}

impl ExtractionConfig {
    pub fn new(bandwidth: Bandwidth, tool_version: CsiToolVersion) -> Self {
        Self {
            bandwidth,
            tool_version,
        }
    }

    /**
     * Build from raw values (bandwidth in MHz, numeric tool code)
     */
    pub fn from_raw(bandwidth_mhz: u32, tool_code: u8) -> Result<Self, CsiExtractionError> {
        Ok(Self::new(
            Bandwidth::from_mhz(bandwidth_mhz)?,
            CsiToolVersion::from_code(tool_code)?,
        ))
    }

    pub fn subcarrier_count(&self) -> usize {
        self.bandwidth.subcarrier_count()
    }

    pub fn expected_orig_len(&self) -> u32 {
        self.tool_version.expected_orig_len(self.subcarrier_count())
    }
}

/**
 * CSI decoded from a single capture record
 */
#[derive(Debug, Clone, PartialEq)]
pub struct CsiFrame {
    pub record_index: usize,
    pub record: RecordHeader,
    pub timestamp: f64,
    pub payload_header: PayloadHeader,
    pub csi: Vec<num_complex::Complex64>,
    pub phy_status: Option<PhyStatus>,
}

/**
 * A record left out of the output
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub record_index: usize,
    pub reason: RecordError,
}

/**
 * Accumulated data from the records of a capture
 */
#[derive(Debug, Clone)]
pub struct ExtractedCsiData {
    pub config: ExtractionConfig,
    pub frames: Vec<CsiFrame>,
    pub skipped: Vec<SkippedRecord>,
    pub records: usize,
}

impl ExtractedCsiData {
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            config,
            frames: Vec::new(),
            skipped: Vec::new(),
            records: 0,
        }
    }

    pub fn timestamps(&self) -> Vec<f64> {
        self.frames.iter().map(|f| f.timestamp).collect()
    }

    pub fn size_mismatches(&self) -> usize {
        self.count_skipped(|r| matches!(r, RecordError::SizeMismatch { .. }))
    }

    pub fn empty_payloads(&self) -> usize {
        self.count_skipped(|r| *r == RecordError::EmptyPayload)
    }

    fn count_skipped(&self, predicate: impl Fn(&RecordError) -> bool) -> usize {
        self.skipped.iter().filter(|s| predicate(&s.reason)).count()
    }
}
