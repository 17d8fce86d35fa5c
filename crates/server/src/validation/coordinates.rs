use crate::error::DispatchError;

/// Validate a coordinate triple from a dispatch request.
///
/// Latitude must be within [-90, 90], longitude within [-180, 180] and
/// accuracy, when present, non-negative. NaN fails every comparison and is
/// rejected like any other out-of-range value.
pub fn validate_coordinates(
    latitude: f64,
    longitude: f64,
    accuracy: Option<f64>,
) -> Result<(), DispatchError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(DispatchError::Validation(format!(
            "latitude {latitude} out of range [-90, 90]"
        )));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(DispatchError::Validation(format!(
            "longitude {longitude} out of range [-180, 180]"
        )));
    }
    if let Some(acc) = accuracy {
        if !(acc >= 0.0) {
            return Err(DispatchError::Validation(format!(
                "accuracy {acc} must be a non-negative number of meters"
            )));
        }
    }
    Ok(())
}
