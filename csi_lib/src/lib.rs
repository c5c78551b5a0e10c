mod bandwidth;
mod csi_data;
pub mod csi_payload;
mod errors;
pub mod payload_header;
pub mod pcap;
mod persistence;
mod tool_version;
mod util;

#[cfg(test)]
mod test_capture;

pub use bandwidth::Bandwidth;
pub use csi_data::{CsiFrame, ExtractedCsiData, ExtractionConfig, SkippedRecord};
pub use errors::{CsiExtractionError, PcapError, RecordError};
pub use tool_version::{CsiToolVersion, UDP_HEADER_LENGTH};

use csi_payload::{extract_csi, CsiPayload};
use payload_header::PayloadHeader;
use pcap::{PcapReader, RecordHeader};
use std::path::Path;
use tracing::{debug, info, warn};

/**
 * Turns capture records into CSI frames for one session configuration
 */
#[derive(Debug, Copy, Clone)]
pub struct CsiExtractor {
    config: ExtractionConfig,
}

impl CsiExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /**
     * Decode a single record
     *
     * Fails with the reason the record has to be skipped: no payload,
     * an `orig_len` not matching the session's subcarrier count, or a
     * payload too short for the header or the CSI block.
     */
    pub fn decode_record(
        &self,
        record: &RecordHeader,
        payload: &[u8],
    ) -> Result<(PayloadHeader, CsiPayload), RecordError> {
        if payload.is_empty() {
            return Err(RecordError::EmptyPayload);
        }

        let expected = self.config.expected_orig_len();
        if record.orig_len != expected {
            return Err(RecordError::SizeMismatch {
                expected,
                actual: record.orig_len,
            });
        }

        let version = self.config.tool_version;
        let header_data = payload.get(UDP_HEADER_LENGTH..).unwrap_or_default();
        let payload_header = PayloadHeader::from_bytes(version, header_data)?;
        let csi = extract_csi(
            payload,
            self.config.subcarrier_count(),
            version.has_phy_status(),
        )?;

        Ok((payload_header, csi))
    }

    /**
     * Extract data from an in-memory pcap capture
     *
     * Records failing `decode_record` are reported in
     * `ExtractedCsiData::skipped`, everything else ends up in `frames`
     * in capture order.
     */
    pub fn extract_from_bytes(&self, data: &[u8]) -> Result<ExtractedCsiData, CsiExtractionError> {
        let reader = PcapReader::new(data).map_err(|e| match e {
            PcapError::TruncatedFile {
                required,
                available,
            } => CsiExtractionError::TruncatedFile {
                required,
                available,
            },
            source => CsiExtractionError::TruncatedRecord {
                record: 0,
                frames_decoded: 0,
                source,
            },
        })?;

        info!(
            "Extracting {} captures at {} MHz",
            self.config.tool_version,
            self.config.bandwidth.to_mhz()
        );
        let header = reader.global_header();
        debug!(
            "pcap header: magic={:08x}, version={}.{}, snaplen={}, network={}",
            header.magic_number,
            header.version_major,
            header.version_minor,
            header.snaplen,
            header.network
        );

        let mut extracted_data = ExtractedCsiData::new(self.config);

        for (record_index, record) in reader.enumerate() {
            let (record, payload) = record.map_err(|source| CsiExtractionError::TruncatedRecord {
                record: record_index,
                frames_decoded: extracted_data.frames.len(),
                source,
            })?;
            extracted_data.records += 1;

            match self.decode_record(&record, payload) {
                Ok((payload_header, CsiPayload { csi, phy_status })) => {
                    extracted_data.frames.push(CsiFrame {
                        record_index,
                        record,
                        timestamp: record.timestamp(),
                        payload_header,
                        csi,
                        phy_status,
                    });
                }
                Err(reason) => {
                    match &reason {
                        RecordError::SizeMismatch { .. } => {
                            warn!("Skipped frame #{} with incorrect size: {}", record_index, reason)
                        }
                        _ => debug!("Skipped frame #{}: {}", record_index, reason),
                    }
                    extracted_data.skipped.push(SkippedRecord {
                        record_index,
                        reason,
                    });
                }
            }
        }

        info!(
            "Extracted {} frames from {} records ({} size mismatches, {} empty)",
            extracted_data.frames.len(),
            extracted_data.records,
            extracted_data.size_mismatches(),
            extracted_data.empty_payloads()
        );

        Ok(extracted_data)
    }

    /**
     * Extract data from a pcap file, read into memory as a whole
     */
    pub fn extract_from_capture(
        &self,
        capture_path: impl AsRef<Path>,
    ) -> Result<ExtractedCsiData, CsiExtractionError> {
        let capture_path = capture_path.as_ref();
        info!("Reading capture {}", capture_path.display());
        let data = std::fs::read(capture_path)?;
        self.extract_from_bytes(&data)
    }
}

/**
 * Extract data from a pcap file
 *
 * \param capture_path Path to pcap capture file
 * \param config       Bandwidth and CSI tool version of the capture
 *
 */
pub fn extract_from_capture(
    capture_path: impl AsRef<Path>,
    config: ExtractionConfig,
) -> Result<ExtractedCsiData, CsiExtractionError> {
    CsiExtractor::new(config).extract_from_capture(capture_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_capture::{csi_payload, ramp, CaptureBuilder};

    fn config(bandwidth: u32, version: CsiToolVersion) -> ExtractionConfig {
        ExtractionConfig::new(Bandwidth::from_mhz(bandwidth).unwrap(), version)
    }

    #[test]
    fn frames_in_record_order() {
        let config = config(20, CsiToolVersion::IncludeRssi);
        let orig_len = config.expected_orig_len();
        let mut builder = CaptureBuilder::new();
        for i in 0..5u8 {
            let mut header = vec![0u8; 22];
            header[2] = (-40 - i as i8) as u8;
            let payload = csi_payload(config.tool_version, &header, 0, &ramp(64));
            builder = builder.record(100 + i as u32, 0, &payload, orig_len);
        }

        let data = CsiExtractor::new(config)
            .extract_from_bytes(&builder.build())
            .unwrap();

        assert_eq!(data.records, 5);
        assert!(data.skipped.is_empty());
        for (i, frame) in data.frames.iter().enumerate() {
            assert_eq!(frame.record_index, i);
            assert_eq!(frame.record.ts_sec, 100 + i as u32);
            assert_eq!(frame.payload_header.rssi(), Some(-40 - i as i8));
            assert_eq!(frame.csi.len(), 64);
            assert_eq!(frame.csi[3].re, 3.0 * 3.0 - 100.0);
            assert_eq!(frame.csi[3].im, -7.0 * 3.0 + 5.0);
            assert!(frame.phy_status.is_none());
        }
        assert_eq!(data.timestamps(), vec![100.0, 101.0, 102.0, 103.0, 104.0]);
    }

    #[test]
    fn size_mismatch_is_skipped() {
        let config = config(40, CsiToolVersion::GainRecovery);
        let orig_len = config.expected_orig_len();
        let payload = csi_payload(config.tool_version, &[0; 30], 0, &ramp(128));

        let capture = CaptureBuilder::new()
            .record(1, 0, &payload, orig_len)
            .record(2, 0, &payload, orig_len + 1)
            .record(3, 0, &payload, orig_len - 1)
            .record(4, 0, &payload, orig_len)
            .build();

        let data = CsiExtractor::new(config).extract_from_bytes(&capture).unwrap();

        assert_eq!(data.records, 4);
        assert_eq!(
            data.frames.iter().map(|f| f.record_index).collect::<Vec<_>>(),
            vec![0, 3]
        );
        assert_eq!(data.size_mismatches(), 2);
        assert_eq!(
            data.skipped[0],
            SkippedRecord {
                record_index: 1,
                reason: RecordError::SizeMismatch {
                    expected: orig_len,
                    actual: orig_len + 1
                }
            }
        );
        assert_eq!(data.skipped[1].record_index, 2);
    }

    #[test]
    fn every_record_is_accounted_for() {
        let config = config(20, CsiToolVersion::Original);
        let orig_len = config.expected_orig_len();
        let payload = csi_payload(config.tool_version, &[], 0, &ramp(64));

        let capture = CaptureBuilder::new()
            .record(1, 0, &payload, orig_len)
            .record(2, 0, &[], 0)
            .record(3, 0, &payload, 17)
            .record(4, 0, &[], orig_len)
            .record(5, 0, &payload, orig_len)
            .build();

        let data = CsiExtractor::new(config).extract_from_bytes(&capture).unwrap();

        assert_eq!(data.frames.len(), 2);
        assert_eq!(data.size_mismatches(), 1);
        assert_eq!(data.empty_payloads(), 2);
        assert_eq!(
            data.frames.len() + data.size_mismatches() + data.empty_payloads(),
            data.records
        );
        assert_eq!(data.frames[0].payload_header, PayloadHeader::Original);
    }

    #[test]
    fn byte_aligned_records() {
        let config = config(20, CsiToolVersion::IncludeRssi);
        let orig_len = config.expected_orig_len();
        let aligned = csi_payload(config.tool_version, &[0, 0, 0xD8], 0, &ramp(64));
        let unaligned = csi_payload(config.tool_version, &[0, 0, 0xD8], 3, &ramp(64));
        assert_eq!(aligned.len() % 4, 0);
        assert_ne!(unaligned.len() % 4, 0);

        let capture = CaptureBuilder::new()
            .record(1, 0, &aligned, orig_len)
            .record(2, 0, &unaligned, orig_len)
            .build();

        let data = CsiExtractor::new(config).extract_from_bytes(&capture).unwrap();
        assert_eq!(data.frames.len(), 2);
        assert_eq!(data.frames[0].csi, data.frames[1].csi);
        assert_eq!(data.frames[1].payload_header.rssi(), Some(-40));
    }

    #[test]
    fn test_phy_status_frames() {
        let config = config(20, CsiToolVersion::TestPhyStatus);
        let mut csi = ramp(64);
        csi[29] = (0xABCDu16 as i16, 0);
        let payload = csi_payload(config.tool_version, &[0, 0, 0xC4], 0, &csi);

        let capture = CaptureBuilder::new()
            .record(1, 0, &payload, config.expected_orig_len())
            .build();

        let data = CsiExtractor::new(config).extract_from_bytes(&capture).unwrap();
        let status = data.frames[0].phy_status.unwrap();
        assert_eq!(status.rxpower, 0xAB);
        assert_eq!(status.lnagn, 2);
        assert_eq!(status.pgagn, 10);
        assert_eq!(status.foff, 0x3CD);
    }

    #[test]
    fn gain_recovery_v2_agc_gain() {
        let config = config(80, CsiToolVersion::GainRecoveryV2);
        let mut header = vec![0u8; 70];
        header[26..28].copy_from_slice(&77i16.to_le_bytes());
        header[66..68].copy_from_slice(&(-512i16).to_le_bytes());
        let payload = csi_payload(config.tool_version, &header, 0, &ramp(256));

        let capture = CaptureBuilder::new()
            .record(1, 0, &payload, config.expected_orig_len())
            .build();

        let data = CsiExtractor::new(config).extract_from_bytes(&capture).unwrap();
        assert_eq!(data.frames[0].payload_header.agc_gain(), Some(-512));
        assert_eq!(data.frames[0].csi.len(), 256);
    }

    #[test]
    fn short_records_are_skipped() {
        let config = config(20, CsiToolVersion::GainRecoveryV2);
        let orig_len = config.expected_orig_len();
        let valid = csi_payload(config.tool_version, &[], 0, &ramp(64));

        let capture = CaptureBuilder::new()
            .record(1, 0, &[0; 50], orig_len)
            .record(2, 0, &valid[..200], orig_len)
            .record(3, 0, &valid, orig_len)
            .build();

        let data = CsiExtractor::new(config).extract_from_bytes(&capture).unwrap();
        assert_eq!(data.records, 3);
        assert_eq!(data.frames.len(), 1);
        assert_eq!(
            data.skipped[0].reason,
            RecordError::TruncatedPayloadHeader {
                required: 70,
                available: 8
            }
        );
        assert_eq!(
            data.skipped[1].reason,
            RecordError::InsufficientSubcarrierData {
                required: 64,
                available: 50
            }
        );
        assert_eq!(data.frames[0].record_index, 2);
    }

    #[test]
    fn truncated_record_aborts() {
        let config = config(20, CsiToolVersion::IncludeRssi);
        let payload = csi_payload(config.tool_version, &[], 0, &ramp(64));
        let mut capture = CaptureBuilder::new()
            .record(1, 0, &payload, config.expected_orig_len())
            .record(2, 0, &payload, config.expected_orig_len())
            .build();
        capture.extend_from_slice(&[0; 10]);

        let result = CsiExtractor::new(config).extract_from_bytes(&capture);
        match result {
            Err(CsiExtractionError::TruncatedRecord {
                record,
                frames_decoded,
                ..
            }) => {
                assert_eq!(record, 2);
                assert_eq!(frames_decoded, 2);
            }
            other => panic!("Expected TruncatedRecord error, got {:?}", other),
        }
    }

    #[test]
    fn truncated_file() {
        let config = config(20, CsiToolVersion::IncludeRssi);
        let result = CsiExtractor::new(config).extract_from_bytes(&[0; 10]);
        assert!(matches!(
            result,
            Err(CsiExtractionError::TruncatedFile {
                required: 24,
                available: 10
            })
        ));
    }

    #[test]
    fn gain_recovery_agc_gain_from_csi_block() {
        let config = config(20, CsiToolVersion::GainRecovery);
        let mut header = vec![0u8; 30];
        header[26..28].copy_from_slice(&100i16.to_le_bytes());
        // Offset 66 after the UDP headers is 36 bytes into the CSI block,
        // the real half of subcarrier 9
        let mut csi = ramp(64);
        csi[9] = (-300, 5);
        let payload = csi_payload(config.tool_version, &header, 0, &csi);
        assert_eq!(&payload[UDP_HEADER_LENGTH + 66..][..2], &(-300i16).to_le_bytes());

        let capture = CaptureBuilder::new()
            .record(1, 0, &payload, config.expected_orig_len())
            .build();

        let data = CsiExtractor::new(config).extract_from_bytes(&capture).unwrap();
        let frame = &data.frames[0];
        assert_eq!(frame.payload_header.agc_gain(), Some(-300));
        assert_eq!(frame.csi[9].re, -300.0);
        assert_eq!(frame.csi.len(), 64);
    }

    #[test]
    fn extract_from_file() {
        let config = config(20, CsiToolVersion::IncludeRssi);
        let payload = csi_payload(config.tool_version, &[], 0, &ramp(64));
        let capture = CaptureBuilder::new()
            .record(1, 0, &payload, config.expected_orig_len())
            .build();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.pcap");
        std::fs::write(&path, capture).unwrap();

        let data = extract_from_capture(&path, config).unwrap();
        assert_eq!(data.frames.len(), 1);

        let missing = extract_from_capture(dir.path().join("missing.pcap"), config);
        assert!(matches!(missing, Err(CsiExtractionError::Io(_))));
    }
}
