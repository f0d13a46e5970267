use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::{
    batch::{self, BatchSummary},
    config::StudyParameters,
    datatypes::{ResultRow, ScanRecord, ScannerGeneration},
    error::MicroFeError,
    metrics, report_parser, rotation, scan_list,
};

pub const RESULTS_HEADER: &str = "scan_id,measurement_id,status,voxel_size,rot_x,rot_y,rot_z,\
elastic_modulus,u1,u2,u3,u_mag,total_reaction_force,threshold_strain,critical_strain,\
critical_volume_fraction,scale_factor,applied_strain,stiffness,failure_load,timestamp";

/// Renders a result row as one csv line, without the line break
pub fn format_row(row: &ResultRow) -> String {
    let m = &row.metrics;
    format!(
        "{id},{meas},{status},{vox},{rx},{ry},{rz},{e},{u1},{u2},{u3},{mag},{rf},{ees},{crit},{vcrit},{factor},{strain},{stiffness},{fl},{ts}",
        id = row.scan.scan_id,
        meas = row.scan.measurement_id,
        status = row.scan.status.as_str(),
        vox = row.generation.voxel_size(),
        rx = row.scan.angles.x,
        ry = row.scan.angles.y,
        rz = row.scan.angles.z,
        e = row.generation.elastic_modulus(),
        u1 = m.loading_vector.x,
        u2 = m.loading_vector.y,
        u3 = m.loading_vector.z,
        mag = m.loading_magnitude,
        rf = m.total_reaction_force,
        ees = m.threshold_strain,
        crit = row.critical_strain,
        vcrit = row.critical_volume_fraction,
        factor = m.scale_factor,
        strain = row.applied_strain,
        stiffness = m.stiffness,
        fl = m.failure_load,
        ts = row.timestamp,
    )
}

/// Appends a result row to the results csv
///
/// The header is written first when the file is new or empty.
///
/// # Arguments
/// * `results_file` - The results csv
/// * `row` - The row to append
pub fn append_row(results_file: &Path, row: &ResultRow) -> Result<(), MicroFeError> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(results_file)
        .map_err(|err| MicroFeError::io(results_file, err))?;

    let is_empty = file
        .metadata()
        .map_err(|err| MicroFeError::io(results_file, err))?
        .len()
        == 0;

    let mut text = String::new();
    if is_empty {
        text.push_str(RESULTS_HEADER);
        text.push('\n');
    }
    text.push_str(&format_row(row));
    text.push('\n');

    file.write_all(text.as_bytes())
        .map_err(|err| MicroFeError::io(results_file, err))
}

/// Computes the result row of one scan from its solver reports
///
/// # Arguments
/// * `scan` - The scan to process
/// * `reports_dir` - Directory holding the LISTING and POSTLIST files
/// * `params` - Study parameters
pub fn process_scan(
    scan: &ScanRecord,
    reports_dir: &Path,
    params: &StudyParameters,
) -> Result<ResultRow, MicroFeError> {
    let stem = scan.file_stem();
    let listing = report_parser::load_listing(&reports_dir.join(format!("{stem}.LISTING")))?;
    let postlist = report_parser::load_postlist(&reports_dir.join(format!("{stem}.POSTLIST")))?;

    let generation = match ScannerGeneration::from_slice_count(listing.slice_count) {
        Some(g) => g,
        None => {
            return Err(MicroFeError::ReportLayout(format!(
                "Listing of {stem} has {} slices, expected 110 or 168",
                listing.slice_count
            )))
        }
    };

    info!(
        scan_id = %scan.scan_id,
        measurement_id = %scan.measurement_id,
        elements = listing.element_total,
        nodes = listing.node_total,
        reaction_rows = listing.reaction_forces.len(),
        energy_values = postlist.energy_densities.len(),
        "read solver reports"
    );

    let loading_vector = rotation::loading_vector(
        &scan.angles,
        params.applied_strain,
        generation.total_length(),
    );
    let metrics = metrics::compute(
        loading_vector,
        &listing.reaction_forces,
        &postlist.energy_densities,
        params,
    )?;

    info!(
        scan_id = %scan.scan_id,
        measurement_id = %scan.measurement_id,
        stiffness = metrics.stiffness,
        failure_load = metrics.failure_load,
        "computed mechanical properties"
    );

    Ok(ResultRow {
        scan: scan.clone(),
        generation,
        metrics,
        critical_strain: params.critical_strain,
        critical_volume_fraction: params.critical_volume_fraction,
        applied_strain: params.applied_strain,
        timestamp: chrono::Local::now().to_rfc3339(),
    })
}

/// Post-processes every scan in the scan list into the results csv
///
/// # Arguments
/// * `scans_file` - The scan list csv
/// * `reports_dir` - Directory holding the solver reports
/// * `results_file` - Results csv, appended to
/// * `params` - Study parameters
/// * `keep_going` - Skip failing scans instead of aborting
pub fn run(
    scans_file: &Path,
    reports_dir: &Path,
    results_file: &Path,
    params: &StudyParameters,
    keep_going: bool,
) -> Result<BatchSummary, MicroFeError> {
    let scans = scan_list::load(scans_file)?;

    let summary = batch::for_each_scan(&scans, keep_going, |scan| {
        let row = process_scan(scan, reports_dir, params)?;
        append_row(results_file, &row)
    })?;

    info!("wrote results to {}", results_file.display());

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{MechanicalMetrics, RotationAngles, ScanStatus};
    use nalgebra::vector;
    use tempfile::TempDir;

    fn row() -> ResultRow {
        ResultRow {
            scan: ScanRecord {
                scan_id: "1001".to_owned(),
                measurement_id: "2".to_owned(),
                voxel_size: 82.0,
                status: ScanStatus::Moved,
                angles: RotationAngles {
                    x: 1.5,
                    y: 0.0,
                    z: -2.0,
                },
            },
            generation: ScannerGeneration::XtremeCt1,
            metrics: MechanicalMetrics {
                loading_vector: vector![0.001, -0.002, -0.09],
                loading_magnitude: 0.09,
                total_reaction_force: -1800.0,
                stiffness: 20000.0,
                threshold_strain: 0.0105,
                scale_factor: 0.6666,
                failure_load: -1200.0,
            },
            critical_strain: 0.007,
            critical_volume_fraction: 0.02,
            applied_strain: -0.01,
            timestamp: "2021-12-07T10:00:00+00:00".to_owned(),
        }
    }

    #[test]
    fn row_matches_header() {
        let line = format_row(&row());
        assert_eq!(
            line.split(',').count(),
            RESULTS_HEADER.split(',').count()
        );
        assert!(line.starts_with("1001,2,mov,82,1.5,0,-2,6829,0.001,-0.002,-0.09,"));
        assert!(line.ends_with(",20000,-1200,2021-12-07T10:00:00+00:00"));
    }

    #[test]
    fn header_written_once() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("results.csv");

        append_row(&path, &row()).unwrap();
        append_row(&path, &row()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], RESULTS_HEADER);
        assert_eq!(lines[1], lines[2]);
    }

    #[test]
    fn missing_reports_are_io_errors() {
        let tmp = TempDir::new().unwrap();
        let scan = row().scan;
        let err = process_scan(&scan, tmp.path(), &StudyParameters::default()).unwrap_err();
        assert!(matches!(err, MicroFeError::Io(_, _)));
    }
}
