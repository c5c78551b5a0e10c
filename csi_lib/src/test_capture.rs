/** ------------------------------------------------------------
 * Synthetic capture buffers for tests
 * ------------------------------------------------------------- */
use crate::tool_version::{CsiToolVersion, UDP_HEADER_LENGTH};

/**
 * Builds a little endian pcap buffer record by record
 */
pub struct CaptureBuilder {
    data: Vec<u8>,
}

impl CaptureBuilder {
    pub fn new() -> Self {
        let mut data = Vec::new();
        data.extend_from_slice(&0xA1B2C3D4u32.to_le_bytes());
        data.extend_from_slice(&2u16.to_le_bytes());
        data.extend_from_slice(&4u16.to_le_bytes());
        data.extend_from_slice(&0i32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&65535u32.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes());
        Self { data }
    }

    pub fn record(mut self, ts_sec: u32, ts_usec: u32, payload: &[u8], orig_len: u32) -> Self {
        self.data.extend_from_slice(&ts_sec.to_le_bytes());
        self.data.extend_from_slice(&ts_usec.to_le_bytes());
        self.data.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        self.data.extend_from_slice(&orig_len.to_le_bytes());
        self.data.extend_from_slice(payload);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }
}

/**
 * Record payload as the CSI tool emits it: zeroed UDP headers, the
 * payload header (zero padded to the version's length), `padding`
 * filler bytes and the CSI block.
 */
pub fn csi_payload(
    version: CsiToolVersion,
    header: &[u8],
    padding: usize,
    csi: &[(i16, i16)],
) -> Vec<u8> {
    let mut payload = vec![0u8; UDP_HEADER_LENGTH];
    let mut payload_header = header.to_vec();
    payload_header.resize(version.header_length(), 0);
    payload.extend_from_slice(&payload_header);
    payload.extend(std::iter::repeat(0xEE).take(padding));
    for (re, im) in csi {
        payload.extend_from_slice(&re.to_le_bytes());
        payload.extend_from_slice(&im.to_le_bytes());
    }
    payload
}

/**
 * Distinct, non-trivial subcarrier values
 */
pub fn ramp(sc_count: usize) -> Vec<(i16, i16)> {
    (0..sc_count as i16).map(|k| (k * 3 - 100, -k * 7 + 5)).collect()
}
