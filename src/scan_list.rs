use std::path::Path;

use tracing::info;

use crate::{
    datatypes::{RotationAngles, ScanRecord, ScanStatus},
    error::MicroFeError,
};

const SCAN_ID: usize = 0;
const MEASUREMENT_ID: usize = 1;
const VOXEL_SIZE: usize = 4;
const STATUS: usize = 5;
const ROT_X: usize = 6;
const ROT_Y: usize = 7;
const ROT_Z: usize = 8;

fn field<'a>(fields: &[&'a str], index: usize, row: usize) -> Result<&'a str, MicroFeError> {
    match fields.get(index) {
        Some(f) => Ok(*f),
        None => Err(MicroFeError::InputParse(format!(
            "Row {row} of scan list has {} columns, missing column {index}",
            fields.len()
        ))),
    }
}

fn numeric_field(fields: &[&str], index: usize, row: usize) -> Result<f64, MicroFeError> {
    let value = field(fields, index, row)?;
    match value.parse() {
        Ok(v) => Ok(v),
        Err(_) => Err(MicroFeError::InputParse(format!(
            "Row {row} of scan list: non-numeric value '{value}' in column {index}"
        ))),
    }
}

/// Parses a single data row of the scan list
///
/// # Arguments
/// * `line` - The raw csv line
/// * `row` - One-based row number, used in error messages
pub fn parse_row(line: &str, row: usize) -> Result<ScanRecord, MicroFeError> {
    let fields: Vec<&str> = line
        .split(',')
        .map(|f| f.trim().trim_matches('"'))
        .collect();

    let scan_id = field(&fields, SCAN_ID, row)?.to_owned();
    let measurement_id = field(&fields, MEASUREMENT_ID, row)?.to_owned();
    let voxel_size = numeric_field(&fields, VOXEL_SIZE, row)?;

    let status = match field(&fields, STATUS, row)? {
        "ref" => ScanStatus::Reference,
        "mov" => ScanStatus::Moved,
        other => {
            return Err(MicroFeError::InputParse(format!(
                "Row {row} of scan list: unknown status '{other}', expected ref or mov"
            )))
        }
    };

    let angles = match status {
        ScanStatus::Reference => RotationAngles::default(),
        ScanStatus::Moved => RotationAngles {
            x: numeric_field(&fields, ROT_X, row)?,
            y: numeric_field(&fields, ROT_Y, row)?,
            z: numeric_field(&fields, ROT_Z, row)?,
        },
    };

    Ok(ScanRecord {
        scan_id,
        measurement_id,
        voxel_size,
        status,
        angles,
    })
}

/// Parses the contents of a scan list. The first non-empty line is a header.
pub fn parse(contents: &str) -> Result<Vec<ScanRecord>, MicroFeError> {
    let mut scans: Vec<ScanRecord> = Vec::new();
    let mut seen_header = false;

    for (i, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        if !seen_header {
            seen_header = true;
            continue;
        }
        scans.push(parse_row(line, i + 1)?);
    }

    Ok(scans)
}

/// Loads the list of scans with their registration angles
///
/// # Arguments
/// * `scans_file` - The path to the scan list csv
pub fn load(scans_file: &Path) -> Result<Vec<ScanRecord>, MicroFeError> {
    let contents =
        std::fs::read_to_string(scans_file).map_err(|err| MicroFeError::io(scans_file, err))?;
    let scans = parse(&contents)?;

    info!("loaded {} scans from {}", scans.len(), scans_file.display());

    Ok(scans)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &str = "\
xct,meas,site,date,voxel,status,rot_x,rot_y,rot_z
1001,1,tibia,2021-01-01,82,ref,,,

1001,2,tibia,2021-06-01,82,mov,1.5,-0.25,3
2002,1,radius,2021-02-01,60.7,mov,0,0,-12.75
";

    #[test]
    fn parses_reference_and_moved_rows() {
        let scans = parse(LIST).unwrap();
        assert_eq!(scans.len(), 3);

        assert_eq!(scans[0].scan_id, "1001");
        assert_eq!(scans[0].status, ScanStatus::Reference);
        assert_eq!(scans[0].angles, RotationAngles::default());
        assert_eq!(scans[0].voxel_size, 82.0);

        assert_eq!(scans[1].measurement_id, "2");
        assert_eq!(
            scans[1].angles,
            RotationAngles {
                x: 1.5,
                y: -0.25,
                z: 3.0
            }
        );
        assert_eq!(scans[2].voxel_size, 60.7);
        assert_eq!(scans[2].file_stem(), "2002_1_FE_3D_TB");
    }

    #[test]
    fn reference_rows_ignore_angle_columns() {
        let scan = parse_row("7,1,x,y,82,ref,junk", 2).unwrap();
        assert_eq!(scan.angles, RotationAngles::default());
    }

    #[test]
    fn rejects_bad_rows() {
        assert!(matches!(
            parse_row("1,1,a,b,82,moved,0,0,0", 2),
            Err(MicroFeError::InputParse(_))
        ));
        assert!(matches!(
            parse_row("1,1,a,b,82,mov,0,zero,0", 2),
            Err(MicroFeError::InputParse(_))
        ));
        assert!(matches!(
            parse_row("1,1,a,b,82,mov,0,0", 2),
            Err(MicroFeError::InputParse(_))
        ));
        assert!(matches!(
            parse_row("1,1,a,b,big,ref", 2),
            Err(MicroFeError::InputParse(_))
        ));
    }
}
