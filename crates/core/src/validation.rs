//! Field validation shared by promotions and products.
//!
//! Predicates are pure. A [`ValidationPipeline`] composes them into an ordered
//! list of `field → (predicate, reason)` rules and reports the first failure
//! per field as a value; mapping that value onto a transport error is the
//! boundary's job.

use chrono::{DateTime, Utc};

use crate::error::{DomainError, Reason};

/// `end` is strictly after `start`.
pub fn is_chronological(start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    end > start
}

/// `date` is strictly after `now`.
///
/// `now` must come from a [`Clock`](crate::Clock) read at call time.
pub fn is_future_date(date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    date > now
}

pub fn is_positive_integer(value: i64) -> bool {
    value > 0
}

/// Finite and not below zero (NaN and infinities are rejected).
pub fn is_non_negative_number(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

pub fn is_non_negative_integer(value: i64) -> bool {
    value >= 0
}

pub fn is_non_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// A partial payload whose recognized fields can be inspected for presence.
pub trait Patch {
    /// Names of the recognized fields that carry a usable value.
    fn present_fields(&self) -> Vec<&'static str>;
}

/// A text field counts as present only when it is not blank.
pub fn text_present(value: Option<&str>) -> bool {
    value.is_some_and(is_non_blank)
}

/// A numeric field counts as present only when it is not NaN.
pub fn number_present(value: Option<f64>) -> bool {
    value.is_some_and(|v| !v.is_nan())
}

/// At least one recognized field is present.
pub fn is_non_empty_payload<P: Patch + ?Sized>(payload: &P) -> bool {
    !payload.present_fields().is_empty()
}

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub reason: Reason,
    pub message: &'static str,
}

/// First failure per field, in rule order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn first(&self) -> Option<&FieldError> {
        self.0.first()
    }

    /// Collapse into a single domain error carrying the first failure's reason.
    pub fn into_domain_error(self) -> DomainError {
        let message = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        let reason = self
            .0
            .first()
            .map(|e| e.reason)
            .unwrap_or(Reason::ValidationFailed);
        DomainError::invalid_input(reason, message)
    }
}

type Predicate<T> = Box<dyn Fn(&T, DateTime<Utc>) -> bool + Send + Sync>;

struct Rule<T> {
    field: &'static str,
    reason: Reason,
    message: &'static str,
    predicate: Predicate<T>,
}

/// Ordered, composable set of field rules.
///
/// Rules are evaluated in insertion order. Once a field has failed, its later
/// rules are skipped so each field reports at most one error.
pub struct ValidationPipeline<T> {
    rules: Vec<Rule<T>>,
}

impl<T> ValidationPipeline<T> {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a rule that only looks at the value.
    pub fn rule<F>(
        self,
        field: &'static str,
        reason: Reason,
        message: &'static str,
        predicate: F,
    ) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.temporal_rule(field, reason, message, move |value, _now| predicate(value))
    }

    /// Add a rule that also needs the current time.
    pub fn temporal_rule<F>(
        mut self,
        field: &'static str,
        reason: Reason,
        message: &'static str,
        predicate: F,
    ) -> Self
    where
        F: Fn(&T, DateTime<Utc>) -> bool + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            field,
            reason,
            message,
            predicate: Box::new(predicate),
        });
        self
    }

    /// Evaluate every rule against `value`.
    pub fn run(&self, value: &T, now: DateTime<Utc>) -> ValidationErrors {
        let mut failures: Vec<FieldError> = Vec::new();
        for rule in &self.rules {
            if failures.iter().any(|f| f.field == rule.field) {
                continue;
            }
            if !(rule.predicate)(value, now) {
                failures.push(FieldError {
                    field: rule.field,
                    reason: rule.reason,
                    message: rule.message,
                });
            }
        }
        ValidationErrors(failures)
    }

    pub fn validate(&self, value: &T, now: DateTime<Utc>) -> Result<(), DomainError> {
        let errors = self.run(value, now);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.into_domain_error())
        }
    }
}

impl<T> Default for ValidationPipeline<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> core::fmt::Debug for ValidationPipeline<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| (r.field, r.reason)))
            .finish()
    }
}
