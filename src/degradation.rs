use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};

/// Least-squares slope of lap time against tyre age, i.e. seconds lost per
/// lap on the current set. `points` are (tyre_age, lap_time) pairs.
///
/// Returns `None` when the points cannot determine a slope: fewer than two
/// laps, or every lap at the same tyre age.
pub fn stint_slope(points: &[(f64, f64)]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let first_age = points[0].0;
    if points.iter().all(|(age, _)| (age - first_age).abs() < f64::EPSILON) {
        return None;
    }

    let x = Array2::from_shape_vec((points.len(), 1), points.iter().map(|p| p.0).collect()).ok()?;
    let y = Array1::from_iter(points.iter().map(|p| p.1));
    let ds = Dataset::new(x, y);

    let fitted = LinearRegression::new().fit(&ds).ok()?;
    fitted.params().get(0).copied().filter(|s| s.is_finite())
}
