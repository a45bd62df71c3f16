//! Input validation shared by the catalog and the order flow.
//!
//! Every check returns [`EngineError::ValidationError`] so that callers can propagate with `?`.
use std::sync::OnceLock;

use regex::Regex;
use rms_common::Money;

use crate::traits::EngineError;

pub const MIN_QUANTITY: i64 = 1;
pub const MAX_QUANTITY: i64 = 100;
const MIN_RATING: i64 = 1;
const MAX_RATING: i64 = 5;
const MIN_PREPARATION_TIME: i64 = 1;
const MAX_PREPARATION_TIME: i64 = 300;
/// Menu prices are capped at 999,999.99
pub const MAX_MENU_PRICE: Money = Money::from_cents(99_999_999);

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?\d{7,15}$").expect("phone regex is valid"))
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email regex is valid"))
}

pub fn validate_quantity(quantity: i64) -> Result<(), EngineError> {
    if (MIN_QUANTITY..=MAX_QUANTITY).contains(&quantity) {
        Ok(())
    } else {
        Err(EngineError::validation(format!(
            "Quantity must be between {MIN_QUANTITY} and {MAX_QUANTITY}, got {quantity}"
        )))
    }
}

pub fn validate_rating(rating: i64) -> Result<(), EngineError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(EngineError::validation(format!("Rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}")))
    }
}

pub fn validate_preparation_time(minutes: i64) -> Result<(), EngineError> {
    if (MIN_PREPARATION_TIME..=MAX_PREPARATION_TIME).contains(&minutes) {
        Ok(())
    } else {
        Err(EngineError::validation(format!(
            "Preparation time must be between {MIN_PREPARATION_TIME} and {MAX_PREPARATION_TIME} minutes, got {minutes}"
        )))
    }
}

pub fn validate_menu_price(price: Money) -> Result<(), EngineError> {
    if !price.is_positive() {
        return Err(EngineError::validation(format!("Price must be greater than zero, got {price}")));
    }
    if price > MAX_MENU_PRICE {
        return Err(EngineError::validation(format!("Price must not exceed {MAX_MENU_PRICE}, got {price}")));
    }
    Ok(())
}

pub fn validate_delivery_fee(fee: Money) -> Result<(), EngineError> {
    if fee.is_negative() {
        Err(EngineError::validation(format!("Delivery fee cannot be negative, got {fee}")))
    } else {
        Ok(())
    }
}

pub fn validate_not_blank(field: &str, value: &str) -> Result<(), EngineError> {
    if value.trim().is_empty() {
        Err(EngineError::validation(format!("{field} cannot be empty")))
    } else {
        Ok(())
    }
}

/// Phone numbers are optional, but when present must be in the format `+999999999`, with 7 to 15 digits.
pub fn validate_phone(phone: Option<&str>) -> Result<(), EngineError> {
    match phone {
        Some(p) if !phone_regex().is_match(p) => {
            Err(EngineError::validation(format!("Phone number '{p}' must be in the format '+999999999'")))
        },
        _ => Ok(()),
    }
}

pub fn validate_email(email: Option<&str>) -> Result<(), EngineError> {
    match email {
        Some(e) if !email_regex().is_match(e) => Err(EngineError::validation(format!("Invalid email format: '{e}'"))),
        _ => Ok(()),
    }
}

/// Lower-cases the name and collapses every run of non-alphanumeric characters into a single `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
