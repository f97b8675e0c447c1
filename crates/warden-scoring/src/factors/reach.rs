/// Reach factor: `log10(views + 1) / log10(cap + 1)`, capped at 1.0.
///
/// A zero cap saturates immediately.
pub fn calculate(views: u64, cap: u64) -> f64 {
    if cap == 0 {
        return 1.0;
    }
    let scaled = (views as f64 + 1.0).log10() / (cap as f64 + 1.0).log10();
    scaled.clamp(0.0, 1.0)
}
