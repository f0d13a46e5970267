use nalgebra::Vector3;

use crate::{
    config::StudyParameters, datatypes::MechanicalMetrics, error::MicroFeError, rotation,
};

/// Sums the reaction forces projected onto the loading direction
///
/// # Arguments
/// * `forces` - Reaction force of every node on the loaded surface
/// * `direction` - Unit loading direction
pub fn total_reaction_force(forces: &[Vector3<f64>], direction: &Vector3<f64>) -> f64 {
    forces.iter().map(|f| f.dot(direction)).sum()
}

/// Finds the energy density that bounds the most strained
/// `critical_volume_fraction` of the tissue
///
/// Values are sorted ascending and the first one whose empirical CDF
/// (`i / n`) lies within `tolerance` of `1 - critical_volume_fraction` is
/// returned.
pub fn threshold_strain(
    energy_densities: &[f64],
    critical_volume_fraction: f64,
    tolerance: f64,
) -> Result<f64, MicroFeError> {
    let mut ordered = energy_densities.to_vec();
    ordered.sort_by(|a, b| a.total_cmp(b));

    let n = ordered.len() as f64;
    let target = 1. - critical_volume_fraction;

    match ordered
        .iter()
        .enumerate()
        .find(|(i, _)| (*i as f64 / n - target).abs() <= tolerance)
    {
        Some((_, value)) => Ok(*value),
        None => Err(MicroFeError::ThresholdNotFound(format!(
            "No CDF value of {} elements lies within {tolerance} of {target}",
            ordered.len()
        ))),
    }
}

/// Computes stiffness and failure load of one model
///
/// # Arguments
/// * `loading_vector` - The applied displacement vector
/// * `reaction_forces` - Reaction forces of the loaded surface
/// * `energy_densities` - Per-element strain energy densities
/// * `params` - Study parameters
pub fn compute(
    loading_vector: Vector3<f64>,
    reaction_forces: &[Vector3<f64>],
    energy_densities: &[f64],
    params: &StudyParameters,
) -> Result<MechanicalMetrics, MicroFeError> {
    let (direction, loading_magnitude) = rotation::unit_direction(&loading_vector);
    if !direction.iter().all(|c| c.is_finite()) {
        return Err(MicroFeError::InputParse(
            "Loading vector has zero magnitude".to_owned(),
        ));
    }

    let total_reaction_force = total_reaction_force(reaction_forces, &direction);
    let stiffness = -total_reaction_force / loading_magnitude;

    let threshold_strain = threshold_strain(
        energy_densities,
        params.critical_volume_fraction,
        params.cdf_tolerance,
    )?;
    let scale_factor = params.critical_strain / threshold_strain;
    let failure_load = scale_factor * total_reaction_force;

    Ok(MechanicalMetrics {
        loading_vector,
        loading_magnitude,
        total_reaction_force,
        stiffness,
        threshold_strain,
        scale_factor,
        failure_load,
    })
}
