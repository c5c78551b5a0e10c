/** ------------------------------------------------------------
 * Pcap container walk over an in-memory capture
 * ------------------------------------------------------------- */
use crate::errors::PcapError;
use crate::util::{get_i32_le, get_u16_le, get_u32_le};

pub const GLOBAL_HEADER_LENGTH: usize = 24;
pub const RECORD_HEADER_LENGTH: usize = 16;

/**
 * Pcap file header. Only its presence is checked, the magic number
 * is taken at face value.
 */
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GlobalHeader {
    pub magic_number: u32,
    pub version_major: u16,
    pub version_minor: u16,
    pub thiszone: i32,
    pub sigfigs: u32,
    pub snaplen: u32,
    pub network: u32,
}

impl GlobalHeader {
    pub fn from_bytes(data: &[u8]) -> Result<Self, PcapError> {
        if data.len() < GLOBAL_HEADER_LENGTH {
            return Err(PcapError::TruncatedFile {
                required: GLOBAL_HEADER_LENGTH,
                available: data.len(),
            });
        }

        Ok(Self {
            magic_number: get_u32_le(data, 0),
            version_major: get_u16_le(data, 4),
            version_minor: get_u16_le(data, 6),
            thiszone: get_i32_le(data, 8),
            sigfigs: get_u32_le(data, 12),
            snaplen: get_u32_le(data, 16),
            network: get_u32_le(data, 20),
        })
    }
}

/**
 * Per-record header
 */
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    pub ts_sec: u32,
    pub ts_usec: u32,
    pub incl_len: u32, // bytes stored in the file
    pub orig_len: u32, // bytes seen on the wire
}

impl RecordHeader {
    fn from_bytes(data: &[u8]) -> Self {
        Self {
            ts_sec: get_u32_le(data, 0),
            ts_usec: get_u32_le(data, 4),
            incl_len: get_u32_le(data, 8),
            orig_len: get_u32_le(data, 12),
        }
    }

    /**
     * Capture time in seconds
     */
    pub fn timestamp(&self) -> f64 {
        self.ts_sec as f64 + self.ts_usec as f64 * 1e-6
    }
}

/**
 * Forward-only cursor over the records of a capture buffer
 *
 * Yields `(RecordHeader, payload)` pairs borrowing from the buffer.
 * Iteration stops at the end of the buffer, or after the first
 * truncated record.
 */
pub struct PcapReader<'a> {
    data: &'a [u8],
    header: GlobalHeader,
    offset: usize,
    failed: bool,
}

impl<'a> PcapReader<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self, PcapError> {
        let header = GlobalHeader::from_bytes(data)?;

        Ok(Self {
            data,
            header,
            offset: GLOBAL_HEADER_LENGTH,
            failed: false,
        })
    }

    pub fn global_header(&self) -> &GlobalHeader {
        &self.header
    }

    /**
     * Byte offset of the next record header
     */
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn read_record(&mut self) -> Result<(RecordHeader, &'a [u8]), PcapError> {
        let data: &'a [u8] = self.data;
        let remaining = &data[self.offset..];
        if remaining.len() < RECORD_HEADER_LENGTH {
            return Err(PcapError::TruncatedRecord {
                offset: self.offset,
                required: RECORD_HEADER_LENGTH,
                available: remaining.len(),
            });
        }

        let header = RecordHeader::from_bytes(&remaining[..RECORD_HEADER_LENGTH]);
        let payload = &remaining[RECORD_HEADER_LENGTH..];
        let incl_len = header.incl_len as usize;
        if payload.len() < incl_len {
            return Err(PcapError::TruncatedRecord {
                offset: self.offset,
                required: RECORD_HEADER_LENGTH + incl_len,
                available: remaining.len(),
            });
        }

        self.offset += RECORD_HEADER_LENGTH + incl_len;
        Ok((header, &payload[..incl_len]))
    }
}

impl<'a> Iterator for PcapReader<'a> {
    type Item = Result<(RecordHeader, &'a [u8]), PcapError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.data.len() {
            return None;
        }

        let record = self.read_record();
        self.failed = record.is_err();
        Some(record)
    }
}
