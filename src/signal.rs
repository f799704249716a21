use ndarray::{Array, Dimension};
use ndarray_stats::QuantileExt;

/// Lowest decibel value ever reported; magnitude ratios below 1e-6 clamp here
/// so a zero sample never produces log(0).
pub const DB_FLOOR: f64 = -120.0;

const MIN_RATIO: f64 = 1e-6;

/// Decibel magnitude of `values` relative to the array's own peak magnitude.
/// The maximum of the result is 0 dB for any non-zero input.
pub fn decibel<D: Dimension>(values: &Array<f64, D>) -> Array<f64, D> {
    let reference = *values.mapv(f64::abs).max_skipnan();
    decibel_with_reference(values, reference)
}

pub fn decibel_with_reference<D: Dimension>(values: &Array<f64, D>, reference: f64) -> Array<f64, D> {
    values.mapv(|value| {
        if reference == 0.0 {
            return DB_FLOOR;
        }
        let ratio = (value.abs() / reference).max(MIN_RATIO);
        20.0 * ratio.log10()
    })
}
