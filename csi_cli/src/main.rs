use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use csi_lib::pcap::PcapReader;
use csi_lib::{Bandwidth, CsiExtractor, CsiToolVersion, ExtractedCsiData, ExtractionConfig};
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

/**
 * Available CLI commands
 */
#[derive(Subcommand)]
enum Commands {
    /// Extract CSI and header fields from a pcap capture
    Extract {
        /// pcap input file
        #[arg(short = 'f', long, value_name = "FILE")]
        pcap_file: PathBuf,

        /// output file, written as csv for a .csv extension, parquet otherwise
        #[arg(short, long, value_name = "OUTFILE")]
        out_file: PathBuf,

        /// channel bandwidth in MHz (20, 40 or 80)
        #[arg(short, long, value_parser = parse_bandwidth, default_value = "80")]
        bandwidth: Bandwidth,

        /// CSI tool version (name or numeric code 0-4)
        #[arg(short, long, value_enum, default_value_t = ToolVersion::IncludeRssi)]
        tool_version: ToolVersion,

        /// Whether to print extracted frames
        #[arg(short, long)]
        print: bool,
    },
    /// Print the pcap header and number of records of a capture
    Info {
        /// pcap input file
        #[arg(short = 'f', long, value_name = "FILE")]
        pcap_file: PathBuf,
    },
}

/**
 * CSI tool versions selectable on the command line
 */
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ToolVersion {
    #[value(alias = "0")]
    Original,
    #[value(alias = "1")]
    IncludeRssi,
    #[value(alias = "2")]
    TestPhyStatus,
    #[value(alias = "3")]
    GainRecovery,
    #[value(alias = "4")]
    GainRecoveryV2,
}

impl From<ToolVersion> for CsiToolVersion {
    fn from(value: ToolVersion) -> Self {
        match value {
            ToolVersion::Original => CsiToolVersion::Original,
            ToolVersion::IncludeRssi => CsiToolVersion::IncludeRssi,
            ToolVersion::TestPhyStatus => CsiToolVersion::TestPhyStatus,
            ToolVersion::GainRecovery => CsiToolVersion::GainRecovery,
            ToolVersion::GainRecoveryV2 => CsiToolVersion::GainRecoveryV2,
        }
    }
}

fn parse_bandwidth(value: &str) -> Result<Bandwidth, String> {
    let mhz: u32 = value
        .parse()
        .map_err(|_| format!("'{}' is not a bandwidth in MHz", value))?;
    Bandwidth::from_mhz(mhz).map_err(|e| e.to_string())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/**
 * Print one line per decoded frame
 */
fn print_frames(extracted_data: &ExtractedCsiData) {
    for frame in &extracted_data.frames {
        let fields: Vec<String> = frame
            .payload_header
            .fields()
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        println!(
            "Frame #{} -- timestamp: {:.6}, subcarriers: {}, {}{}",
            frame.record_index,
            frame.timestamp,
            frame.csi.len(),
            fields.join(" "),
            frame
                .phy_status
                .map(|s| format!(
                    " rxpower={} lnagn={} pgagn={} foff={}",
                    s.rxpower, s.lnagn, s.pgagn, s.foff
                ))
                .unwrap_or_default()
        );
    }
    for skipped in &extracted_data.skipped {
        println!("Skipped record #{}: {}", skipped.record_index, skipped.reason);
    }
}

fn write_output(extracted_data: &ExtractedCsiData, out_file: &Path) -> anyhow::Result<()> {
    let is_csv = out_file
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let result = if is_csv {
        extracted_data.to_csv(out_file)
    } else {
        extracted_data.to_parquet(out_file)
    };
    result.with_context(|| format!("Writing {} failed", out_file.display()))
}

fn extract(
    pcap_file: &Path,
    out_file: &Path,
    config: ExtractionConfig,
    print: bool,
) -> anyhow::Result<()> {
    let extracted_data = CsiExtractor::new(config)
        .extract_from_capture(pcap_file)
        .with_context(|| format!("Extraction from {} failed", pcap_file.display()))?;

    if print {
        print_frames(&extracted_data);
    }

    write_output(&extracted_data, out_file)?;
    println!(
        "Data extraction completed: {} frames written, {} of {} records skipped\n",
        extracted_data.frames.len(),
        extracted_data.skipped.len(),
        extracted_data.records
    );
    Ok(())
}

/**
 * Print the global header and count the complete records
 */
fn info(pcap_file: &Path) -> anyhow::Result<usize> {
    let data = std::fs::read(pcap_file)
        .with_context(|| format!("Reading {} failed", pcap_file.display()))?;
    let mut reader = PcapReader::new(&data)?;
    let header = *reader.global_header();

    println!("magic number:  {:#010x}", header.magic_number);
    println!(
        "version:       {}.{}",
        header.version_major, header.version_minor
    );
    println!("thiszone:      {}", header.thiszone);
    println!("sigfigs:       {}", header.sigfigs);
    println!("snaplen:       {}", header.snaplen);
    println!("network:       {}", header.network);

    let mut records = 0;
    for record in reader.by_ref() {
        if let Err(e) = record {
            eprintln!("Stopped at truncated record: {}", e);
            break;
        }
        records += 1;
    }
    println!("records:       {}", records);
    println!("bytes read:    {} of {}", reader.offset(), data.len());
    Ok(records)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Extract {
            pcap_file,
            out_file,
            bandwidth,
            tool_version,
            print,
        }) => extract(
            &pcap_file,
            &out_file,
            ExtractionConfig::new(bandwidth, tool_version.into()),
            print,
        ),
        Some(Commands::Info { pcap_file }) => info(&pcap_file).map(|_| ()),
        None => Ok(()),
    }
}
