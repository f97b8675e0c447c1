use warden_core::errors::{PolicyError, WardenResult};
use warden_core::models::AutomationPolicy;

/// Check a policy before it may be published.
pub fn validate_policy(policy: &AutomationPolicy) -> WardenResult<()> {
    check_threshold("auto_approve_threshold", policy.auto_approve_threshold)?;
    check_threshold("auto_reject_threshold", policy.auto_reject_threshold)?;
    check_order(
        policy.auto_approve_threshold,
        policy.auto_reject_threshold,
        "global".to_string(),
    )?;
    check_window("compliance_window_days", policy.compliance_window_days)?;

    for (platform, ov) in &policy.platform_overrides {
        if platform.trim().is_empty() {
            return Err(invalid("platform_overrides", "platform name is empty"));
        }
        if let Some(v) = ov.auto_approve_threshold {
            check_threshold(&format!("platform_overrides.{platform}.auto_approve_threshold"), v)?;
        }
        if let Some(v) = ov.auto_reject_threshold {
            check_threshold(&format!("platform_overrides.{platform}.auto_reject_threshold"), v)?;
        }
        if let Some(days) = ov.compliance_window_days {
            check_window(&format!("platform_overrides.{platform}.compliance_window_days"), days)?;
        }
        check_order(
            ov.auto_approve_threshold.unwrap_or(policy.auto_approve_threshold),
            ov.auto_reject_threshold.unwrap_or(policy.auto_reject_threshold),
            format!("platform {platform}"),
        )?;
    }

    for (jurisdiction, days) in &policy.jurisdiction_windows {
        if jurisdiction.trim().is_empty() {
            return Err(invalid("jurisdiction_windows", "jurisdiction code is empty"));
        }
        check_window(&format!("jurisdiction_windows.{jurisdiction}"), *days)?;
    }

    if policy.batching.default_concurrency == 0 {
        return Err(invalid("batching.default_concurrency", "must be at least 1"));
    }
    Ok(())
}

fn check_threshold(name: &str, value: f64) -> WardenResult<()> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(PolicyError::ThresholdOutOfRange {
            name: name.to_string(),
            value,
        }
        .into());
    }
    Ok(())
}

fn check_order(approve: f64, reject: f64, scope: String) -> WardenResult<()> {
    if reject >= approve {
        return Err(PolicyError::ThresholdOrder {
            approve,
            reject,
            scope,
        }
        .into());
    }
    Ok(())
}

fn check_window(name: &str, days: u32) -> WardenResult<()> {
    if days == 0 {
        return Err(invalid(name, "compliance window must be at least one day"));
    }
    Ok(())
}

fn invalid(name: &str, reason: &str) -> warden_core::WardenError {
    PolicyError::InvalidValue {
        name: name.to_string(),
        reason: reason.to_string(),
    }
    .into()
}
