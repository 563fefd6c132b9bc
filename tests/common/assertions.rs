//! Domain-specific assertion macros for driftline harnesses.

/// Assert two floats agree to within an absolute tolerance (default 1e-9).
///
/// ```rust
/// assert_close!(sample.offset_s, -1.1e-5);
/// assert_close!(p95, 95.05, 1e-6);
/// ```
#[macro_export]
macro_rules! assert_close {
    ($actual:expr, $expected:expr) => {
        assert_close!($actual, $expected, 1e-9)
    };
    ($actual:expr, $expected:expr, $tol:expr) => {{
        let actual: f64 = $actual;
        let expected: f64 = $expected;
        assert!(
            (actual - expected).abs() <= $tol,
            "assert_close! failed:\n  actual:   {actual}\n  expected: {expected}\n  tolerance: {}",
            $tol
        );
    }};
}

/// Assert a run's relative timeline starts at zero and never decreases.
#[macro_export]
macro_rules! assert_timeline {
    ($samples:expr, $t_rel:expr) => {{
        let rels: Vec<f64> = $samples.iter().map($t_rel).collect();
        if let Some(first) = rels.first() {
            assert_eq!(*first, 0.0, "relative timeline must start at zero: {rels:?}");
        }
        assert!(
            rels.windows(2).all(|w| w[0] <= w[1]),
            "relative timeline must be non-decreasing: {rels:?}"
        );
    }};
}
