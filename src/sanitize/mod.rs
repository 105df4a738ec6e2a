//! Neutral-default helpers. Telemetry is never rejected; anything non-finite or
//! out of range is replaced by a documented default before it reaches a model.

pub const MAX_FEATURE_ABS: f64 = 50.0;

/// Check whether a slice holds NaN or infinite values.
pub fn has_invalid_values(arr: &[f64]) -> bool {
    arr.iter().any(|x| !x.is_finite())
}

/// Replace non-finite context entries with 0 and clamp magnitude.
pub fn sanitize_feature_vector(x: &mut [f64]) {
    for val in x.iter_mut() {
        if !val.is_finite() {
            *val = 0.0;
        } else {
            *val = val.clamp(-MAX_FEATURE_ABS, MAX_FEATURE_ABS);
        }
    }
}

pub fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Exponential smoothing `alpha * observed + (1 - alpha) * previous`.
/// A non-finite `previous` is replaced by `prior`, a non-finite `observed`
/// leaves the previous value in place.
pub fn smooth(previous: f64, observed: f64, alpha: f64, prior: f64) -> f64 {
    let previous = finite_or(previous, prior);
    if !observed.is_finite() {
        return previous;
    }
    let alpha = clamp01(alpha);
    alpha * observed + (1.0 - alpha) * previous
}

/// Limit `raw` to at most `max_step` away from `previous`.
pub fn limit_step(raw: i64, previous: Option<i64>, max_step: i64) -> i64 {
    match previous {
        Some(prev) => raw.clamp(prev - max_step, prev + max_step),
        None => raw,
    }
}

/// Continuous counterpart of [`limit_step`].
pub fn limit_delta(raw: f64, previous: Option<f64>, max_delta: f64) -> f64 {
    match previous.filter(|p| p.is_finite()) {
        Some(prev) if raw.is_finite() => raw.clamp(prev - max_delta, prev + max_delta),
        Some(prev) => prev,
        None => raw,
    }
}
