/// Standard placement-fee rate applied to the salary midpoint.
pub const PLACEMENT_FEE_RATE: f64 = 0.20;

/// Estimated placement fee for a job's salary range.
///
/// Uses the midpoint when both bounds are present, otherwise whichever bound
/// exists, otherwise zero. The realized fee of an actual hire is negotiated
/// separately and need not match this figure.
pub fn estimate_fee(salary_min: Option<i64>, salary_max: Option<i64>) -> f64 {
    let basis = match (salary_min, salary_max) {
        (Some(min), Some(max)) => (min as f64 + max as f64) / 2.0,
        (Some(only), None) | (None, Some(only)) => only as f64,
        (None, None) => 0.0,
    };
    basis * PLACEMENT_FEE_RATE
}
