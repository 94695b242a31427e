//! Per-instance eligibility check.

use std::fmt;

use crate::constraints::Constraint;

/// Inputs of the eligibility decision for one instance.
#[derive(Debug, Clone, Copy)]
pub struct Eligibility<'a> {
    /// Explicit enable label, or the exposed-by-default setting.
    pub enabled: bool,
    pub healthy: bool,
    pub tags: &'a [String],
}

/// Why an instance was left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    Disabled,
    NotHealthy,
    Constraint(Constraint),
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exclusion::Disabled => write!(f, "disabled"),
            Exclusion::NotHealthy => write!(f, "not healthy"),
            Exclusion::Constraint(c) => write!(f, "constraint {} not satisfied", c),
        }
    }
}

/// Check an instance against the enable flag, its health, then each constraint in order.
pub fn check_instance(instance: Eligibility<'_>, constraints: &[Constraint]) -> Result<(), Exclusion> {
    if !instance.enabled {
        return Err(Exclusion::Disabled);
    }
    if !instance.healthy {
        return Err(Exclusion::NotHealthy);
    }
    match constraints.iter().find(|c| !c.matches(instance.tags)) {
        Some(failed) => Err(Exclusion::Constraint(failed.clone())),
        None => Ok(()),
    }
}
