//! Descriptive statistics over metric series.
//!
//! Every function drops non-finite values first and returns `None` instead
//! of a statistic when nothing remains. Downstream summary rows report those
//! as absent; they never become zeros, NaN-as-a-value, or a panic.
//!
//! Percentiles use linear interpolation between closest ranks, matching the
//! convention of the tabular tooling this replaces.

/// Keep only finite values.
fn finite(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> Option<f64> {
    let vals = finite(values);
    if vals.is_empty() {
        return None;
    }
    Some(vals.iter().sum::<f64>() / vals.len() as f64)
}

/// Bessel-corrected sample standard deviation. Needs at least two values.
pub fn std_sample(values: &[f64]) -> Option<f64> {
    let vals = finite(values);
    if vals.len() < 2 {
        return None;
    }
    let m = vals.iter().sum::<f64>() / vals.len() as f64;
    let ss: f64 = vals.iter().map(|v| (v - m) * (v - m)).sum();
    Some((ss / (vals.len() - 1) as f64).sqrt())
}

/// Percentile `q` in `[0, 1]`, linearly interpolated between closest ranks.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    let mut vals = finite(values);
    if vals.is_empty() {
        return None;
    }
    vals.sort_by(|a, b| a.partial_cmp(b).expect("finite values are ordered"));

    let pos = (vals.len() - 1) as f64 * q;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return Some(vals[lo]);
    }
    let frac = pos - lo as f64;
    Some(vals[lo] + frac * (vals[hi] - vals[lo]))
}

/// Largest absolute value.
pub fn max_abs(values: &[f64]) -> Option<f64> {
    finite(values).into_iter().map(f64::abs).fold(None, fold_max)
}

/// Largest value.
pub fn max(values: &[f64]) -> Option<f64> {
    finite(values).into_iter().fold(None, fold_max)
}

fn fold_max(acc: Option<f64>, v: f64) -> Option<f64> {
    Some(match acc {
        Some(m) if m >= v => m,
        _ => v,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_std_basic() {
        let vals = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(mean(&vals), Some(2.5));
        let std = std_sample(&vals).unwrap();
        assert!((std - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn std_needs_two_values() {
        assert_eq!(std_sample(&[7.0]), None);
        assert_eq!(std_sample(&[]), None);
    }

    #[test]
    fn percentile_interpolates_between_ranks() {
        let vals: Vec<f64> = (1..=100).map(|v| v as f64).collect();
        let p95 = percentile(&vals, 0.95).unwrap();
        assert!((p95 - 95.05).abs() < 1e-9);
        assert_eq!(percentile(&vals, 0.5), Some(50.5));
        assert_eq!(percentile(&vals, 1.0), Some(100.0));
        assert_eq!(percentile(&vals, 0.0), Some(1.0));
    }

    #[test]
    fn non_finite_values_are_dropped() {
        let vals = [f64::NAN, -3.0, f64::INFINITY, 1.0];
        assert_eq!(mean(&vals), Some(-1.0));
        assert_eq!(max_abs(&vals), Some(3.0));
        assert_eq!(max(&vals), Some(1.0));
    }

    #[test]
    fn empty_or_all_missing_is_absent() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[f64::NAN, f64::NAN]), None);
        assert_eq!(percentile(&[], 0.95), None);
        assert_eq!(max_abs(&[f64::NAN]), None);
    }
}
