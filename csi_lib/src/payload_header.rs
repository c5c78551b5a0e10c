/** ------------------------------------------------------------
 * Version dependent payload header decoding
 * ------------------------------------------------------------- */
use crate::errors::RecordError;
use crate::tool_version::{CsiToolVersion, GAIN_RECOVERY_V2_COLUMN_NAME_EXT, GAIN_STAGE_NAMES};
use crate::util::{get_i16_le, get_i8};

const RSSI_OFFSET: usize = 2;
const GAIN_STAGES_OFFSET: usize = 18;
const AGC_GAIN_OFFSET: usize = 26;
const AGC_GAIN_FINAL_OFFSET: usize = 66;
const GAIN_RECOVERY_V2_GROUPS: usize = 6;

/**
 * Receive chain gain settings reported for one gain-stage group
 */
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct GainStages {
    pub elna: i8,
    pub lna1: i8,
    pub lna2: i8,
    pub mix: i8,
    pub lpf0: i8,
    pub lpf1: i8,
    pub dvga: i8,
    pub tr_loss: i8,
}

impl GainStages {
    /**
     * Read the eight stages starting at `offset`, consecutive stages
     * being `stride` bytes apart
     */
    fn from_bytes(data: &[u8], offset: usize, stride: usize) -> Self {
        let stage = |i: usize| get_i8(data, offset + i * stride);
        Self {
            elna: stage(0),
            lna1: stage(1),
            lna2: stage(2),
            mix: stage(3),
            lpf0: stage(4),
            lpf1: stage(5),
            dvga: stage(6),
            tr_loss: stage(7),
        }
    }

    /// Values in `GAIN_STAGE_NAMES` order
    pub fn values(&self) -> [i8; 8] {
        [
            self.elna,
            self.lna1,
            self.lna2,
            self.mix,
            self.lpf0,
            self.lpf1,
            self.dvga,
            self.tr_loss,
        ]
    }
}

/**
 * Payload header fields, one variant per field set
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadHeader {
    Original,
    Rssi {
        rssi: i8,
    },
    GainRecovery {
        rssi: i8,
        gains: GainStages,
        agc_gain: i16,
    },
    GainRecoveryV2 {
        rssi: i8,
        gains: [GainStages; GAIN_RECOVERY_V2_GROUPS],
        agc_gain: i16,
    },
}

impl PayloadHeader {
    /**
     * Decode the payload header of a record
     *
     * \param data Record bytes following the UDP headers
     *
     * The agcGain value at offset 66 overrides the one read with the
     * GainRecovery layout at offset 26. The capture tool's reference
     * reader behaves this way and existing datasets depend on it.
     */
    pub fn from_bytes(version: CsiToolVersion, data: &[u8]) -> Result<Self, RecordError> {
        let required = version.header_length();
        if data.len() < required {
            return Err(RecordError::TruncatedPayloadHeader {
                required,
                available: data.len(),
            });
        }

        let header = match version {
            CsiToolVersion::Original => PayloadHeader::Original,
            CsiToolVersion::IncludeRssi | CsiToolVersion::TestPhyStatus => PayloadHeader::Rssi {
                rssi: get_i8(data, RSSI_OFFSET),
            },
            CsiToolVersion::GainRecovery => PayloadHeader::GainRecovery {
                rssi: get_i8(data, RSSI_OFFSET),
                gains: GainStages::from_bytes(data, GAIN_STAGES_OFFSET, 1),
                agc_gain: final_agc_gain(data).unwrap_or(get_i16_le(data, AGC_GAIN_OFFSET)),
            },
            CsiToolVersion::GainRecoveryV2 => {
                let mut gains = [GainStages::default(); GAIN_RECOVERY_V2_GROUPS];
                for (i, group) in gains.iter_mut().enumerate() {
                    *group = GainStages::from_bytes(
                        data,
                        GAIN_STAGES_OFFSET + i,
                        GAIN_RECOVERY_V2_GROUPS,
                    );
                }
                PayloadHeader::GainRecoveryV2 {
                    rssi: get_i8(data, RSSI_OFFSET),
                    gains,
                    // Always in bounds, the V2 header spans 70 bytes
                    agc_gain: get_i16_le(data, AGC_GAIN_FINAL_OFFSET),
                }
            }
        };

        Ok(header)
    }

    pub fn rssi(&self) -> Option<i8> {
        match self {
            PayloadHeader::Original => None,
            PayloadHeader::Rssi { rssi }
            | PayloadHeader::GainRecovery { rssi, .. }
            | PayloadHeader::GainRecoveryV2 { rssi, .. } => Some(*rssi),
        }
    }

    pub fn agc_gain(&self) -> Option<i16> {
        match self {
            PayloadHeader::GainRecovery { agc_gain, .. }
            | PayloadHeader::GainRecoveryV2 { agc_gain, .. } => Some(*agc_gain),
            _ => None,
        }
    }

    /**
     * Named fields, ordered like `CsiToolVersion::header_fields`
     */
    pub fn fields(&self) -> Vec<(String, i32)> {
        let mut fields = Vec::new();
        if let Some(rssi) = self.rssi() {
            fields.push(("rssi".to_string(), rssi as i32));
        }

        match self {
            PayloadHeader::GainRecovery { gains, .. } => {
                for (name, value) in GAIN_STAGE_NAMES.iter().zip(gains.values()) {
                    fields.push((name.to_string(), value as i32));
                }
            }
            PayloadHeader::GainRecoveryV2 { gains, .. } => {
                for (ext, group) in GAIN_RECOVERY_V2_COLUMN_NAME_EXT.iter().zip(gains) {
                    for (name, value) in GAIN_STAGE_NAMES.iter().zip(group.values()) {
                        fields.push((format!("{}{}", name, ext), value as i32));
                    }
                }
            }
            _ => {}
        }

        if let Some(agc_gain) = self.agc_gain() {
            fields.push(("agcGain".to_string(), agc_gain as i32));
        }
        fields
    }
}

fn final_agc_gain(data: &[u8]) -> Option<i16> {
    (data.len() >= AGC_GAIN_FINAL_OFFSET + 2).then(|| get_i16_le(data, AGC_GAIN_FINAL_OFFSET))
}
