use nalgebra::Vector3;

/// Registration status of a scan relative to its baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    Reference,
    Moved,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Reference => "ref",
            ScanStatus::Moved => "mov",
        }
    }
}

/// Misalignment angles in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotationAngles {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanRecord {
    pub scan_id: String,
    pub measurement_id: String,
    pub voxel_size: f64,
    pub status: ScanStatus,
    pub angles: RotationAngles,
}

impl ScanRecord {
    /// Common stem of every file belonging to this scan
    pub fn file_stem(&self) -> String {
        format!("{}_{}_FE_3D_TB", self.scan_id, self.measurement_id)
    }
}

/// HR-pQCT scanner generation. Fixes the voxel size, the number of slices in
/// the model, and the tissue modulus used by the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerGeneration {
    XtremeCt1,
    XtremeCt2,
}

impl ScannerGeneration {
    /// Voxel size in micrometres
    pub fn voxel_size(&self) -> f64 {
        match self {
            ScannerGeneration::XtremeCt1 => 82.0,
            ScannerGeneration::XtremeCt2 => 60.7,
        }
    }

    pub fn slice_count(&self) -> u32 {
        match self {
            ScannerGeneration::XtremeCt1 => 110,
            ScannerGeneration::XtremeCt2 => 168,
        }
    }

    /// Tissue elastic modulus in MPa
    pub fn elastic_modulus(&self) -> f64 {
        match self {
            ScannerGeneration::XtremeCt1 => 6829.0,
            ScannerGeneration::XtremeCt2 => 8748.0,
        }
    }

    /// Height of the compressed section in millimetres
    pub fn total_length(&self) -> f64 {
        self.slice_count() as f64 * self.voxel_size() / 1000.0
    }

    /// Anything that is not an 82 µm scan is treated as second generation
    pub fn from_voxel_size(voxel_size: f64) -> ScannerGeneration {
        if voxel_size == 82.0 {
            ScannerGeneration::XtremeCt1
        } else {
            ScannerGeneration::XtremeCt2
        }
    }

    pub fn from_slice_count(slices: u32) -> Option<ScannerGeneration> {
        match slices {
            110 => Some(ScannerGeneration::XtremeCt1),
            168 => Some(ScannerGeneration::XtremeCt2),
            _ => None,
        }
    }
}

/// Values extracted from a LISTING report
#[derive(Debug, Clone, PartialEq)]
pub struct ListingReport {
    pub slice_count: u32,
    pub element_total: u64,
    pub node_total: u64,
    pub reaction_forces: Vec<Vector3<f64>>,
}

/// Values extracted from a POSTLIST report
#[derive(Debug, Clone, PartialEq)]
pub struct PostlistReport {
    pub energy_densities: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MechanicalMetrics {
    pub loading_vector: Vector3<f64>,
    pub loading_magnitude: f64,
    pub total_reaction_force: f64,
    pub stiffness: f64,
    pub threshold_strain: f64,
    pub scale_factor: f64,
    pub failure_load: f64,
}

/// One line of the results csv
#[derive(Debug, Clone)]
pub struct ResultRow {
    pub scan: ScanRecord,
    pub generation: ScannerGeneration,
    pub metrics: MechanicalMetrics,
    pub critical_strain: f64,
    pub critical_volume_fraction: f64,
    pub applied_strain: f64,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_lengths() {
        assert!((ScannerGeneration::XtremeCt1.total_length() - 9.02).abs() < 1e-12);
        assert!((ScannerGeneration::XtremeCt2.total_length() - 10.1976).abs() < 1e-12);
    }

    #[test]
    fn generation_lookup() {
        assert_eq!(
            ScannerGeneration::from_voxel_size(82.0),
            ScannerGeneration::XtremeCt1
        );
        assert_eq!(
            ScannerGeneration::from_voxel_size(60.7),
            ScannerGeneration::XtremeCt2
        );
        assert_eq!(
            ScannerGeneration::from_slice_count(168),
            Some(ScannerGeneration::XtremeCt2)
        );
        assert_eq!(ScannerGeneration::from_slice_count(100), None);
    }
}
