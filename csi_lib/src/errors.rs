/** ------------------------------------------------------------
 * Error types raised by this lib.
 * ------------------------------------------------------------- */
use thiserror::Error;

/**
 * Errors of the pcap container walk
 */
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PcapError {
    #[error("File of {available} bytes is too short for the pcap global header ({required} bytes)")]
    TruncatedFile { required: usize, available: usize },
    #[error("Record at byte {offset} needs {required} bytes, only {available} left")]
    TruncatedRecord {
        offset: usize,
        required: usize,
        available: usize,
    },
}

/**
 * Per-record conditions. A record hitting one of these is skipped,
 * decoding continues with the next record.
 */
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("Record carries no CSI payload")]
    EmptyPayload,
    #[error("Record size mismatch: orig_len {actual} (expected: {expected})")]
    SizeMismatch { expected: u32, actual: u32 },
    #[error("Payload header truncated: {available} bytes (required: {required})")]
    TruncatedPayloadHeader { required: usize, available: usize },
    #[error("Insufficient subcarrier data: {available} subcarriers (required: {required})")]
    InsufficientSubcarrierData { required: usize, available: usize },
}

/**
 * Fatal errors aborting an extraction session
 */
#[derive(Debug, Error)]
pub enum CsiExtractionError {
    #[error("Invalid bandwidth: {0} MHz (supported: 20, 40, 80)")]
    InvalidBandwidth(u32),
    #[error("Unknown CSI tool version: {0}")]
    UnknownToolVersion(String),
    #[error("Truncated pcap file: {available} bytes (global header needs {required})")]
    TruncatedFile { required: usize, available: usize },
    #[error("Truncated record #{record} after {frames_decoded} decoded frames: {source}")]
    TruncatedRecord {
        record: usize,
        frames_decoded: usize,
        source: PcapError,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
