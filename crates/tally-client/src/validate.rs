//! Shared create-input schema, checked before anything is submitted.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;

use crate::error::ValidationError;
use crate::types::CreateExpenseInput;

pub const TITLE_MIN_CHARS: usize = 3;
pub const TITLE_MAX_CHARS: usize = 100;
pub const GROUP_MAX_CHARS: usize = 50;

fn amount_pattern() -> &'static Regex {
    static AMOUNT: OnceLock<Regex> = OnceLock::new();
    AMOUNT.get_or_init(|| {
        Regex::new(r"^[+-]?\d+(\.\d{1,2})?$").unwrap_or_else(|e| panic!("amount pattern: {e}"))
    })
}

/// Optional sign, digits, at most two decimals.
pub fn validate_amount(amount: &str) -> Result<(), ValidationError> {
    if amount_pattern().is_match(amount) {
        Ok(())
    } else {
        Err(ValidationError::new(
            "amount",
            format!("{:?} is not a valid amount", amount),
        ))
    }
}

/// RFC 3339 timestamp or `YYYY-MM-DD`.
pub fn validate_date(date: &str) -> Result<(), ValidationError> {
    let ok = DateTime::parse_from_rfc3339(date).is_ok()
        || NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok();

    if ok {
        Ok(())
    } else {
        Err(ValidationError::new(
            "date",
            format!("{:?} is not an ISO-8601 date", date),
        ))
    }
}

pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    let len = title.trim().chars().count();
    if len < TITLE_MIN_CHARS {
        return Err(ValidationError::new(
            "title",
            format!("must be at least {} characters", TITLE_MIN_CHARS),
        ));
    }
    if len > TITLE_MAX_CHARS {
        return Err(ValidationError::new(
            "title",
            format!("must be at most {} characters", TITLE_MAX_CHARS),
        ));
    }
    Ok(())
}

pub fn validate_group(group: Option<&str>) -> Result<(), ValidationError> {
    match group {
        Some(g) if g.chars().count() > GROUP_MAX_CHARS => Err(ValidationError::new(
            "expenseGroup",
            format!("must be at most {} characters", GROUP_MAX_CHARS),
        )),
        _ => Ok(()),
    }
}

impl CreateExpenseInput {
    /// First failing field, in form order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)?;
        validate_amount(&self.amount)?;
        validate_date(&self.date)?;
        validate_group(self.expense_group.as_deref())
    }
}
