/** ------------------------------------------------------------
 * CSI tool versions and their payload layouts
 * ------------------------------------------------------------- */
use crate::errors::CsiExtractionError;
use std::fmt;

/// Link-layer + IP + UDP headers preceding the payload header
pub const UDP_HEADER_LENGTH: usize = 42;

/// Name suffixes of the six gain-stage groups reported by `GainRecoveryV2`
pub const GAIN_RECOVERY_V2_COLUMN_NAME_EXT: [&str; 6] = ["_1", "_2", "_3", "_4", "_9", "_10"];

/// Gain stages in the order they are laid out in the payload header
pub const GAIN_STAGE_NAMES: [&str; 8] = [
    "elna", "lna1", "lna2", "mix", "lpf0", "lpf1", "dvga", "trLoss",
];

/**
 * Firmware version of the CSI extraction tool that wrote the capture
 */
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CsiToolVersion {
    Original = 0,
    IncludeRssi = 1,
    TestPhyStatus = 2,
    GainRecovery = 3,
    GainRecoveryV2 = 4,
}

impl CsiToolVersion {
    pub const ALL: [CsiToolVersion; 5] = [
        CsiToolVersion::Original,
        CsiToolVersion::IncludeRssi,
        CsiToolVersion::TestPhyStatus,
        CsiToolVersion::GainRecovery,
        CsiToolVersion::GainRecoveryV2,
    ];

    pub fn from_code(value: u8) -> Result<Self, CsiExtractionError> {
        Self::ALL
            .into_iter()
            .find(|v| *v as u8 == value)
            .ok_or_else(|| CsiExtractionError::UnknownToolVersion(value.to_string()))
    }

    /**
     * Bytes reserved for the payload header after the UDP headers
     */
    pub fn header_length(self) -> usize {
        match self {
            CsiToolVersion::Original
            | CsiToolVersion::IncludeRssi
            | CsiToolVersion::TestPhyStatus => 22,
            CsiToolVersion::GainRecovery => 30,
            CsiToolVersion::GainRecoveryV2 => 70,
        }
    }

    /**
     * Number of 4-byte words taken by link-layer, UDP and payload header.
     * Only used to derive the expected original record length.
     */
    pub fn outer_header_offset(self) -> u32 {
        match self {
            CsiToolVersion::Original | CsiToolVersion::IncludeRssi => 16,
            CsiToolVersion::TestPhyStatus => 17,
            CsiToolVersion::GainRecovery => 19,
            CsiToolVersion::GainRecoveryV2 => 29,
        }
    }

    /**
     * `orig_len` a well-formed record must report for `sc_count` subcarriers
     */
    pub fn expected_orig_len(self, sc_count: usize) -> u32 {
        sc_count as u32 * 4 + (self.outer_header_offset() - 1) * 4
    }

    /**
     * Whether the tool packs PHY status bits into the CSI block
     */
    pub fn has_phy_status(self) -> bool {
        self == CsiToolVersion::TestPhyStatus
    }

    /**
     * Names of the payload header fields, in the order
     * `PayloadHeader::fields` reports them
     */
    pub fn header_fields(self) -> Vec<String> {
        match self {
            CsiToolVersion::Original => Vec::new(),
            CsiToolVersion::IncludeRssi | CsiToolVersion::TestPhyStatus => vec!["rssi".into()],
            CsiToolVersion::GainRecovery => std::iter::once("rssi".to_string())
                .chain(GAIN_STAGE_NAMES.iter().map(|n| n.to_string()))
                .chain(std::iter::once("agcGain".to_string()))
                .collect(),
            CsiToolVersion::GainRecoveryV2 => std::iter::once("rssi".to_string())
                .chain(GAIN_RECOVERY_V2_COLUMN_NAME_EXT.iter().flat_map(|ext| {
                    GAIN_STAGE_NAMES
                        .iter()
                        .map(move |name| format!("{}{}", name, ext))
                }))
                .chain(std::iter::once("agcGain".to_string()))
                .collect(),
        }
    }

    /**
     * Table column names of the header fields. RSSI is upper case in
     * the capture tool's tables.
     */
    pub fn column_names(self) -> Vec<String> {
        self.header_fields()
            .into_iter()
            .map(|name| if name == "rssi" { "RSSI".to_string() } else { name })
            .collect()
    }
}

impl fmt::Display for CsiToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CsiToolVersion::Original => "original",
            CsiToolVersion::IncludeRssi => "include-rssi",
            CsiToolVersion::TestPhyStatus => "test-phy-status",
            CsiToolVersion::GainRecovery => "gain-recovery",
            CsiToolVersion::GainRecoveryV2 => "gain-recovery-v2",
        };
        f.write_str(name)
    }
}
