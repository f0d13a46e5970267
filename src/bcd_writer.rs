use std::path::{Path, PathBuf};

use nalgebra::Vector3;
use tracing::{debug, info, warn};

use crate::{
    batch::{self, BatchSummary},
    config::StudyParameters,
    datatypes::{ScanRecord, ScannerGeneration},
    error::MicroFeError,
    rotation, scan_list,
};

/// Location of a vector component inside the template
struct FieldSlot {
    line: usize,
    /// Start column of a non-negative value. Negative values start one
    /// column earlier so the minus sign does not push the next field.
    column: usize,
}

const FIELD_SLOTS: [FieldSlot; 3] = [
    FieldSlot { line: 7, column: 43 },
    FieldSlot { line: 8, column: 67 },
    FieldSlot { line: 9, column: 91 },
];

const FIELD_WIDTH: usize = 10;

/// Formats a value like C's `%.4E` with the solver's `d` exponent marker
///
/// # Arguments
/// * `value` - The value to format
///
/// # Returns
/// A string such as `-9.0200d-02`
pub fn format_component(value: f64) -> Result<String, MicroFeError> {
    if !value.is_finite() {
        return Err(MicroFeError::TemplateFormat(format!(
            "Cannot write non-finite loading component {value}"
        )));
    }

    // fold -0.0 into 0.0
    let value = value + 0.0;
    let formatted = format!("{:.4e}", value);
    let (mantissa, exponent) = match formatted.split_once('e') {
        Some(parts) => parts,
        None => {
            return Err(MicroFeError::TemplateFormat(format!(
                "Unexpected float rendering {formatted}"
            )))
        }
    };
    let exponent: i32 = match exponent.parse() {
        Ok(e) => e,
        Err(_) => {
            return Err(MicroFeError::TemplateFormat(format!(
                "Unexpected float exponent in {formatted}"
            )))
        }
    };
    let sign = if exponent < 0 { '-' } else { '+' };

    Ok(format!("{mantissa}d{sign}{:02}", exponent.abs()))
}

/// Writes the loading vector into the fixed-column slots of a template
///
/// # Arguments
/// * `template` - Contents of the template BCD file
/// * `loading_vector` - The rotated loading vector
///
/// # Returns
/// The edited template. Bytes outside the three slots are left untouched.
pub fn splice_template(
    template: &str,
    loading_vector: &Vector3<f64>,
) -> Result<String, MicroFeError> {
    let mut lines: Vec<String> = template.split_inclusive('\n').map(str::to_owned).collect();

    let needed = FIELD_SLOTS.iter().map(|s| s.line).max().unwrap_or(0) + 1;
    if lines.len() < needed {
        return Err(MicroFeError::TemplateFormat(format!(
            "Template has {} lines, expected at least {needed}",
            lines.len()
        )));
    }

    for (slot, value) in FIELD_SLOTS.iter().zip(loading_vector.iter()) {
        let text = format_component(*value)?;
        let (start, width) = if *value >= 0. {
            (slot.column, FIELD_WIDTH)
        } else {
            (slot.column - 1, FIELD_WIDTH + 1)
        };

        if text.len() != width {
            return Err(MicroFeError::TemplateFormat(format!(
                "Value {text} does not fit the {width} character field on line {}",
                slot.line + 1
            )));
        }

        let line = &lines[slot.line];
        let content_len = line.trim_end_matches(['\r', '\n']).len();
        if content_len < start + width {
            return Err(MicroFeError::TemplateFormat(format!(
                "Line {} is {content_len} characters, field needs columns {start}..{}",
                slot.line + 1,
                start + width
            )));
        }

        let (head, tail) = match (line.get(..start), line.get(start + width..)) {
            (Some(h), Some(t)) => (h, t),
            _ => {
                return Err(MicroFeError::TemplateFormat(format!(
                    "Field on line {} does not fall on character boundaries",
                    slot.line + 1
                )))
            }
        };

        debug!(line = slot.line + 1, column = start, value = %text, "splicing field");
        let spliced = format!("{head}{text}{tail}");
        lines[slot.line] = spliced;
    }

    Ok(lines.concat())
}

/// Writes the boundary condition file of one scan
///
/// # Arguments
/// * `scan` - The scan to write
/// * `template` - Contents of the template BCD file
/// * `out_dir` - The directory that receives the file
/// * `params` - Study parameters
///
/// # Returns
/// The path of the written file
pub fn write_scan_bcd(
    scan: &ScanRecord,
    template: &str,
    out_dir: &Path,
    params: &StudyParameters,
) -> Result<PathBuf, MicroFeError> {
    let generation = ScannerGeneration::from_voxel_size(scan.voxel_size);
    if generation == ScannerGeneration::XtremeCt2 && scan.voxel_size != 60.7 {
        warn!(
            scan_id = %scan.scan_id,
            voxel_size = scan.voxel_size,
            "unrecognized voxel size, assuming second generation geometry"
        );
    }

    let loading_vector = rotation::loading_vector(
        &scan.angles,
        params.applied_strain,
        generation.total_length(),
    );
    let contents = splice_template(template, &loading_vector)?;

    let output = out_dir.join(format!("{}.BCD", scan.file_stem()));
    std::fs::write(&output, contents).map_err(|err| MicroFeError::io(&output, err))?;

    debug!(
        scan_id = %scan.scan_id,
        measurement_id = %scan.measurement_id,
        u1 = loading_vector.x,
        u2 = loading_vector.y,
        u3 = loading_vector.z,
        "wrote {}",
        output.display()
    );

    Ok(output)
}

/// Generates one boundary condition file per scan in the scan list
///
/// # Arguments
/// * `scans_file` - The scan list csv
/// * `template_file` - The template BCD file
/// * `out_dir` - Destination directory, created if missing
/// * `params` - Study parameters
/// * `keep_going` - Skip failing scans instead of aborting
pub fn run(
    scans_file: &Path,
    template_file: &Path,
    out_dir: &Path,
    params: &StudyParameters,
    keep_going: bool,
) -> Result<BatchSummary, MicroFeError> {
    let scans = scan_list::load(scans_file)?;
    let template =
        std::fs::read_to_string(template_file).map_err(|err| MicroFeError::io(template_file, err))?;
    std::fs::create_dir_all(out_dir).map_err(|err| MicroFeError::io(out_dir, err))?;

    info!("writing {} boundary condition files to {}", scans.len(), out_dir.display());

    batch::for_each_scan(&scans, keep_going, |scan| {
        write_scan_bcd(scan, &template, out_dir, params).map(|_| ())
    })
}
