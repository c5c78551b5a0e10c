use csi_lib::{extract_from_capture, CsiExtractionError, ExtractionConfig};
use numpy::{Complex64, PyArray1, PyArray2};
use pyo3::exceptions::{PyOSError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

#[pymodule]
fn csi_extract<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    /**
     * Extract CSI from a pcap file
     *
     * \param path:         Path to pcap file
     * \param bandwidth:    Channel bandwidth in MHz (20, 40 or 80)
     * \param tool_version: CSI tool version code (0-4)
     *
     * \returns A tuple (timestamps, csi, fields). csi has one row of
     *          complex subcarrier values per frame, fields maps each
     *          header/status column name to a numpy array.
     */
    #[allow(dead_code)]
    #[pyfn(m)]
    #[pyo3(signature = (path, bandwidth, tool_version = 1))]
    fn extract_from_pcap<'py>(
        py: Python<'py>,
        path: &str,
        bandwidth: u32,
        tool_version: u8,
    ) -> PyResult<(
        Bound<'py, PyArray1<f64>>,
        Bound<'py, PyArray2<Complex64>>,
        Bound<'py, PyDict>,
    )> {
        let config = ExtractionConfig::from_raw(bandwidth, tool_version).map_err(to_py_err)?;
        let extracted_data = extract_from_capture(path, config).map_err(to_py_err)?;

        let csi: Vec<Vec<Complex64>> = extracted_data
            .frames
            .iter()
            .map(|frame| frame.csi.clone())
            .collect();

        let fields = PyDict::new_bound(py);
        for (i, name) in config.tool_version.column_names().iter().enumerate() {
            let values: Vec<i32> = extracted_data
                .frames
                .iter()
                .map(|frame| frame.payload_header.fields()[i].1)
                .collect();
            fields.set_item(name, PyArray1::from_vec_bound(py, values))?;
        }
        if config.tool_version.has_phy_status() {
            let statuses: Vec<_> = extracted_data
                .frames
                .iter()
                .filter_map(|frame| frame.phy_status)
                .collect();
            let columns = [
                ("rxpower", statuses.iter().map(|s| s.rxpower).collect::<Vec<u16>>()),
                ("lnagn", statuses.iter().map(|s| s.lnagn).collect()),
                ("pgagn", statuses.iter().map(|s| s.pgagn).collect()),
                ("foff", statuses.iter().map(|s| s.foff).collect()),
            ];
            for (name, values) in columns {
                fields.set_item(name, PyArray1::from_vec_bound(py, values))?;
            }
        }

        Ok((
            PyArray1::from_vec_bound(py, extracted_data.timestamps()),
            PyArray2::from_vec2_bound(py, &csi)?,
            fields,
        ))
    }

    Ok(())
}

fn to_py_err(error: CsiExtractionError) -> PyErr {
    match error {
        CsiExtractionError::Io(e) => PyOSError::new_err(e.to_string()),
        e => PyValueError::new_err(e.to_string()),
    }
}
