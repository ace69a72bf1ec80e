use crate::error::{EcgError, Result};

/// Min-max scales `signal` to `[0, 1]`.
///
/// A constant signal has no range to scale by and yields
/// [`EcgError::DivideByZero`]. An empty one is rejected as input.
pub fn normalize(signal: &[f64]) -> Result<Vec<f64>> {
    if signal.is_empty() {
        return Err(EcgError::Input("cannot normalize an empty signal".to_string()));
    }

    let min = signal.iter().copied().fold(f64::INFINITY, f64::min);
    let max = signal.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if range == 0.0 || !range.is_finite() {
        return Err(EcgError::DivideByZero);
    }

    Ok(signal
        .iter()
        // clamp guards against rounding just outside the unit interval
        .map(|&x| ((x - min) / range).clamp(0.0, 1.0))
        .collect())
}
