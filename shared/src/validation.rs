use thiserror::Error;

use crate::model::{Ambulance, Procedure};
use crate::AMBULANCE_STATUSES;

/// Capacity used when the raw input is not a positive integer.
pub const FALLBACK_CAPACITY: u32 = 1;
/// Price used when the raw input is not a finite, non-negative number.
pub const FALLBACK_PRICE: f64 = 0.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be at least {min}")]
    BelowMinimum { field: &'static str, min: f64 },

    #[error("{field} must be one of {allowed:?}, got '{value}'")]
    NotAllowed {
        field: &'static str,
        value: String,
        allowed: &'static [&'static str],
    },
}

impl FieldError {
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Required { field }
            | Self::BelowMinimum { field, .. }
            | Self::NotAllowed { field, .. } => field,
        }
    }
}

/// Declarative field rules. The editor recomputes validity from these after
/// every mutation.
pub trait Validate {
    fn violations(&self) -> Vec<FieldError>;

    fn is_valid(&self) -> bool {
        self.violations().is_empty()
    }
}

fn required(field: &'static str, value: &str, out: &mut Vec<FieldError>) {
    if value.trim().is_empty() {
        out.push(FieldError::Required { field });
    }
}

fn at_least(field: &'static str, value: f64, min: f64, out: &mut Vec<FieldError>) {
    if !value.is_finite() || value < min {
        out.push(FieldError::BelowMinimum { field, min });
    }
}

fn one_of(
    field: &'static str,
    value: &str,
    allowed: &'static [&'static str],
    out: &mut Vec<FieldError>,
) {
    if !allowed.contains(&value) {
        out.push(FieldError::NotAllowed {
            field,
            value: value.to_string(),
            allowed,
        });
    }
}

impl Validate for Ambulance {
    fn violations(&self) -> Vec<FieldError> {
        let mut out = Vec::new();
        required("name", &self.name, &mut out);
        required("location", &self.location, &mut out);
        required("department", &self.department, &mut out);
        at_least("capacity", f64::from(self.capacity), 1.0, &mut out);
        one_of("status", &self.status, AMBULANCE_STATUSES, &mut out);
        out
    }
}

impl Validate for Procedure {
    fn violations(&self) -> Vec<FieldError> {
        let mut out = Vec::new();
        required("description", &self.description, &mut out);
        required("patient", &self.patient, &mut out);
        at_least("price", self.price, 0.0, &mut out);
        required("payer", &self.payer, &mut out);
        required("ambulance_id", self.ambulance_id.as_str(), &mut out);
        out
    }
}

/// Parses raw capacity input. Anything that is not an integer of at least 1
/// becomes [`FALLBACK_CAPACITY`]; fractional input such as `3.7` is not
/// truncated.
pub fn coerce_capacity(raw: &str) -> u32 {
    match raw.trim().parse::<u32>() {
        Ok(capacity) if capacity >= 1 => capacity,
        _ => FALLBACK_CAPACITY,
    }
}

/// Parses raw price input. Unparseable, non-finite and negative values become
/// [`FALLBACK_PRICE`].
pub fn coerce_price(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => price,
        _ => FALLBACK_PRICE,
    }
}
