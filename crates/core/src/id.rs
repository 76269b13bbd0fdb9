//! Strongly-typed identifiers used across the domain.
//!
//! Records are keyed by positive integers assigned by the repository. Raw
//! values coming from callers go through `TryFrom<i64>` or `FromStr`, both of
//! which reject anything that is not a positive integer with `INVALID_ID`.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a user (principal identity, supplier, product author).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

/// Identifier of a promotion record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromotionId(u64);

/// Identifier of a product record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(u64);

macro_rules! impl_int_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Wrap a repository-assigned value.
            ///
            /// Zero is not a valid identifier; callers holding untrusted input
            /// should use `TryFrom<i64>` instead.
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            pub const fn get(&self) -> u64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl TryFrom<i64> for $t {
            type Error = DomainError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                if crate::validation::is_positive_integer(value) {
                    Ok(Self(value.unsigned_abs()))
                } else {
                    Err(DomainError::invalid_id(format!(
                        "{}: {} is not a positive integer",
                        $name, value
                    )))
                }
            }
        }

        impl From<$t> for u64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Self::try_from(raw)
            }
        }
    };
}

impl_int_newtype!(UserId, "UserId");
impl_int_newtype!(PromotionId, "PromotionId");
impl_int_newtype!(ProductId, "ProductId");
