/// Scanner confidence mapped to [0, 1]: `clamp(confidence, 0, 100) / 100`.
///
/// NaN counts as zero.
pub fn calculate(confidence: f64) -> f64 {
    if confidence.is_nan() {
        return 0.0;
    }
    confidence.clamp(0.0, 100.0) / 100.0
}
