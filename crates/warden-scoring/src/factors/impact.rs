use warden_core::models::EstimatedImpact;

/// Impact factor: high = 1.0, medium = 0.6, low = 0.2.
pub fn calculate(impact: EstimatedImpact) -> f64 {
    match impact {
        EstimatedImpact::High => 1.0,
        EstimatedImpact::Medium => 0.6,
        EstimatedImpact::Low => 0.2,
    }
}
