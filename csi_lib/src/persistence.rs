/** ------------------------------------------------------------
 * Persistence (saving extracted data to csv/parquet files)
 * ------------------------------------------------------------- */
use crate::csi_data::ExtractedCsiData;
use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use polars::{error::PolarsError, frame::DataFrame, series::Series};

/**
 * Table conversion of extracted CSI data
 */
impl ExtractedCsiData {
    /**
     * One row per frame: timestamps, real and imaginary part of every
     * subcarrier, then the tool version's header and status columns.
     */
    pub fn to_dataframe(&self) -> Result<DataFrame, PolarsError> {
        let frames = &self.frames;
        let mut columns = vec![
            Series::new("timestamps", self.timestamps()),
            Series::new(
                "ts_sec",
                frames.iter().map(|f| f.record.ts_sec).collect::<Vec<u32>>(),
            ),
            Series::new(
                "ts_usec",
                frames.iter().map(|f| f.record.ts_usec).collect::<Vec<u32>>(),
            ),
        ];

        for k in 0..self.config.subcarrier_count() {
            let re: Vec<f64> = frames.iter().map(|f| f.csi[k].re).collect();
            let im: Vec<f64> = frames.iter().map(|f| f.csi[k].im).collect();
            columns.push(Series::new(&format!("csi_re_{}", k), re));
            columns.push(Series::new(&format!("csi_im_{}", k), im));
        }

        // Header fields are widened to i32, polars has no native i8
        let header_fields: Vec<Vec<(String, i32)>> =
            frames.iter().map(|f| f.payload_header.fields()).collect();
        for (i, name) in self.config.tool_version.column_names().iter().enumerate() {
            let values: Vec<i32> = header_fields.iter().map(|fields| fields[i].1).collect();
            columns.push(Series::new(name, values));
        }

        if self.config.tool_version.has_phy_status() {
            let status = |get: fn(&crate::csi_payload::PhyStatus) -> u16| {
                frames
                    .iter()
                    .map(|f| f.phy_status.as_ref().map(|s| get(s) as u32))
                    .collect::<Vec<Option<u32>>>()
            };
            columns.push(Series::new("rxpower", status(|s| s.rxpower)));
            columns.push(Series::new("lnagn", status(|s| s.lnagn)));
            columns.push(Series::new("pgagn", status(|s| s.pgagn)));
            columns.push(Series::new("foff", status(|s| s.foff)));
        }

        DataFrame::new(columns)
    }

    pub fn to_csv(&self, file_path: impl AsRef<Path>) -> Result<(), PolarsError> {
        let mut df = self.to_dataframe()?;
        let mut file = File::create(file_path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)?;

        Ok(())
    }

    pub fn to_parquet(&self, file_path: impl AsRef<Path>) -> Result<(), PolarsError> {
        let mut df = self.to_dataframe()?;
        let file = File::create(file_path)?;
        ParquetWriter::new(file).finish(&mut df)?;

        Ok(())
    }
}
