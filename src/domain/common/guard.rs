use std::cmp::Ordering;
use std::fmt::Display;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::Cents;

// ============================================================================
// Guard Clauses - field-level invariants
// ============================================================================
//
// Shared by request validators and entity constructors/mutators.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GuardError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{0} must not be the nil id")]
    NilId(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: String },

    #[error("{field} must be greater than zero (got {value})")]
    NotPositive { field: &'static str, value: String },

    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        min: String,
        max: String,
        value: String,
    },

    #[error("{0} is too large")]
    Overflow(&'static str),

    #[error("{earlier} must be before {later}")]
    DateOrder {
        earlier: &'static str,
        later: &'static str,
    },

    #[error("{field} is not a valid email address: {value}")]
    InvalidEmail { field: &'static str, value: String },

    #[error("{field} may only contain lowercase letters, digits and hyphens: {value}")]
    InvalidSlug { field: &'static str, value: String },
}

impl GuardError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Empty(field) | Self::NilId(field) | Self::Overflow(field) => field,
            Self::TooLong { field, .. }
            | Self::Negative { field, .. }
            | Self::NotPositive { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::InvalidEmail { field, .. }
            | Self::InvalidSlug { field, .. } => field,
            Self::DateOrder { earlier, .. } => earlier,
        }
    }
}

pub fn not_nil(id: Uuid, field: &'static str) -> Result<Uuid, GuardError> {
    if id.is_nil() {
        return Err(GuardError::NilId(field));
    }
    Ok(id)
}

pub fn not_empty<'a>(value: &'a str, field: &'static str) -> Result<&'a str, GuardError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(GuardError::Empty(field));
    }
    Ok(trimmed)
}

pub fn max_len(value: &str, max: usize, field: &'static str) -> Result<(), GuardError> {
    if value.chars().count() > max {
        return Err(GuardError::TooLong { field, max });
    }
    Ok(())
}

/// Non-empty, trimmed and bounded text.
pub fn text(value: &str, max: usize, field: &'static str) -> Result<String, GuardError> {
    let trimmed = not_empty(value, field)?;
    max_len(trimmed, max, field)?;
    Ok(trimmed.to_string())
}

// NaN orders against nothing and fails every numeric guard.

pub fn non_negative<T>(value: T, field: &'static str) -> Result<T, GuardError>
where
    T: PartialOrd + Default + Display + Copy,
{
    if !matches!(value.partial_cmp(&T::default()), Some(Ordering::Greater | Ordering::Equal)) {
        return Err(GuardError::Negative {
            field,
            value: value.to_string(),
        });
    }
    Ok(value)
}

pub fn positive<T>(value: T, field: &'static str) -> Result<T, GuardError>
where
    T: PartialOrd + Default + Display + Copy,
{
    if value.partial_cmp(&T::default()) != Some(Ordering::Greater) {
        return Err(GuardError::NotPositive {
            field,
            value: value.to_string(),
        });
    }
    Ok(value)
}

pub fn in_range<T>(value: T, min: T, max: T, field: &'static str) -> Result<T, GuardError>
where
    T: PartialOrd + Display + Copy,
{
    let above_min = matches!(value.partial_cmp(&min), Some(Ordering::Greater | Ordering::Equal));
    let below_max = matches!(value.partial_cmp(&max), Some(Ordering::Less | Ordering::Equal));
    if !(above_min && below_max) {
        return Err(GuardError::OutOfRange {
            field,
            min: min.to_string(),
            max: max.to_string(),
            value: value.to_string(),
        });
    }
    Ok(value)
}

/// `unit_price * quantity` in cents.
pub fn line_total(unit_price: Cents, quantity: i32, field: &'static str) -> Result<Cents, GuardError> {
    unit_price
        .checked_mul(Cents::from(quantity))
        .ok_or(GuardError::Overflow(field))
}

pub fn checked_sum<I>(amounts: I, field: &'static str) -> Result<Cents, GuardError>
where
    I: IntoIterator<Item = Cents>,
{
    amounts
        .into_iter()
        .try_fold(0, |acc: Cents, amount| acc.checked_add(amount))
        .ok_or(GuardError::Overflow(field))
}

pub fn ordered(
    earlier: DateTime<Utc>,
    later: DateTime<Utc>,
    earlier_field: &'static str,
    later_field: &'static str,
) -> Result<(), GuardError> {
    if earlier >= later {
        return Err(GuardError::DateOrder {
            earlier: earlier_field,
            later: later_field,
        });
    }
    Ok(())
}

/// Basic shape check: one `@` with a non-empty local part and a dotted domain.
pub fn email(value: &str, field: &'static str) -> Result<String, GuardError> {
    let trimmed = not_empty(value, field)?;
    let valid = match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid {
        return Err(GuardError::InvalidEmail {
            field,
            value: trimmed.to_string(),
        });
    }
    Ok(trimmed.to_lowercase())
}

/// URL slug: lowercase ASCII letters, digits and single hyphens, no leading
/// or trailing hyphen.
pub fn slug(value: &str, max: usize, field: &'static str) -> Result<String, GuardError> {
    let slug = text(value, max, field)?;
    let valid = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--");

    if !valid {
        return Err(GuardError::InvalidSlug { field, value: slug });
    }
    Ok(slug)
}
