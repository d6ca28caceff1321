//! Currency conversion, formatting and validation.
//!
//! All money arithmetic uses `Decimal`. Conversions go through a static
//! table of units-per-USD rates (no live rates) and are rounded half-to-even
//! at two decimal places; rate tables and invoice lines are rounded the same
//! way.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use std::str::FromStr;
use tracing::info;

use shared::{AmountValidation, Currency, SessionRates, SessionType, Student};

/// Decimal places kept on every monetary value
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// Largest amount accepted by [`validate_currency_amount`]
pub fn max_amount() -> Decimal {
    Decimal::new(999_999, 0)
}

/// Units of `currency` per one US dollar
pub fn usd_rate(currency: Currency) -> Decimal {
    match currency {
        Currency::Usd => Decimal::ONE,
        Currency::Zar => Decimal::new(1850, 2),
        Currency::Gbp => Decimal::new(79, 2),
        Currency::Eur => Decimal::new(92, 2),
        Currency::Aed => Decimal::new(36725, 4),
    }
}

/// Base session rates, denominated in ZAR
fn base_rate_zar(session_type: SessionType) -> Decimal {
    match session_type {
        SessionType::Online => Decimal::new(250, 0),
        SessionType::InPersonClass => Decimal::new(200, 0),
        SessionType::InPersonOneOnOne => Decimal::new(350, 0),
    }
}

/// Round half-to-even at two decimal places
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_DECIMAL_PLACES, RoundingStrategy::MidpointNearestEven)
}

/// Convert `amount` from one currency to another using the static rate table.
///
/// Converting to the same currency returns the amount untouched; anything
/// else is rounded with [`round_money`].
pub fn convert_currency(amount: Decimal, from: Currency, to: Currency) -> Decimal {
    if from == to {
        return amount;
    }
    round_money(amount / usd_rate(from) * usd_rate(to))
}

/// The default session rate table converted into `currency`
pub fn get_default_rates_in_currency(currency: Currency) -> SessionRates {
    SessionType::ALL
        .iter()
        .map(|session_type| {
            let rate = convert_currency(base_rate_zar(*session_type), Currency::Zar, currency);
            (*session_type, rate)
        })
        .collect()
}

/// A student's rates in their billing currency: defaults overlaid with overrides
pub fn effective_rates(student: &Student) -> SessionRates {
    let mut rates = get_default_rates_in_currency(student.billing_currency());
    rates.extend(student.rates.iter().map(|(k, v)| (*k, *v)));
    rates
}

/// Rate charged to `student` per hour of `session_type`
pub fn rate_for(student: &Student, session_type: SessionType) -> Decimal {
    student
        .rates
        .get(&session_type)
        .copied()
        .unwrap_or_else(|| {
            convert_currency(base_rate_zar(session_type), Currency::Zar, student.billing_currency())
        })
}

pub fn currency_symbol(currency: Currency) -> &'static str {
    match currency {
        Currency::Zar => "R ",
        Currency::Usd => "$",
        Currency::Gbp => "£",
        Currency::Eur => "€",
        Currency::Aed => "AED ",
    }
}

/// Format an amount for display, e.g. `R 1,234.50` or `-$12.00`
pub fn format_currency(amount: Decimal, currency: Currency) -> String {
    let rounded = round_money(amount);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let plain = format!("{:.2}", rounded.abs());
    let (whole, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    format!(
        "{}{}{}.{}",
        sign,
        currency_symbol(currency),
        group_thousands(whole),
        fraction
    )
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Range and precision check for a monetary amount.
///
/// Accepts `0 <= amount <= 999999` with at most two decimal places.
pub fn validate_currency_amount(amount: Decimal) -> AmountValidation {
    let mut errors = Vec::new();

    if amount.is_sign_negative() && !amount.is_zero() {
        errors.push("Amount cannot be negative".to_string());
    }
    if amount > max_amount() {
        errors.push(format!("Amount cannot exceed {}", max_amount()));
    }
    if amount.normalize().scale() > MONEY_DECIMAL_PLACES {
        errors.push("Amount cannot have more than 2 decimal places".to_string());
    }

    AmountValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Validate free-form amount input such as `"R 1,250.00"`
pub fn validate_currency_input(input: &str) -> AmountValidation {
    match parse_amount_input(input) {
        Ok(amount) => validate_currency_amount(amount),
        Err(message) => AmountValidation {
            is_valid: false,
            errors: vec![message],
        },
    }
}

/// Validate an amount arriving as arbitrary JSON; only numbers and numeric strings pass the type check
pub fn validate_currency_value(value: &Value) -> AmountValidation {
    match value {
        Value::Number(number) => validate_currency_input(&number.to_string()),
        Value::String(text) => validate_currency_input(text),
        _ => AmountValidation {
            is_valid: false,
            errors: vec!["Amount must be a number".to_string()],
        },
    }
}

/// Strip currency symbols, codes, thousands separators and spaces, then parse
pub fn parse_amount_input(input: &str) -> Result<Decimal, String> {
    // Codes first: "EUR" contains the rand symbol "R"
    let mut cleaned = input.trim().to_string();
    for currency in Currency::ALL {
        cleaned = remove_ignore_ascii_case(&cleaned, currency.code());
    }
    for currency in Currency::ALL {
        cleaned = cleaned.replace(currency_symbol(currency).trim(), "");
    }
    let cleaned: String = cleaned
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Err("Amount is required".to_string());
    }

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map_err(|_| "Amount must be a valid number".to_string())
}

fn remove_ignore_ascii_case(text: &str, needle: &str) -> String {
    let upper = text.to_ascii_uppercase();
    let needle = needle.to_ascii_uppercase();
    let mut result = String::with_capacity(text.len());
    let mut start = 0;
    while let Some(offset) = upper[start..].find(&needle) {
        result.push_str(&text[start..start + offset]);
        start += offset + needle.len();
    }
    result.push_str(&text[start..]);
    result
}

/// Upgrade a record written before multi-currency billing.
///
/// Records without a preferred currency are moved to the default currency,
/// any rate missing from their table is filled from the defaults and
/// `updated_at` is stamped. Existing overrides are kept as they are. Running
/// it again on an upgraded record changes nothing. Returns whether the record
/// was modified.
pub fn migrate_student_currency(student: &mut Student, now: DateTime<Utc>) -> bool {
    if student.preferred_currency.is_some() {
        return false;
    }

    let currency = Currency::default();
    for (session_type, rate) in get_default_rates_in_currency(currency) {
        student.rates.entry(session_type).or_insert(rate);
    }
    student.preferred_currency = Some(currency);
    student.updated_at = now;

    info!("Migrated student {} to {} billing", student.id, currency);
    true
}
