//! # REST API for Currency Utilities
//!
//! Stateless wrappers over the conversion, rate and validation functions.

use axum::{
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::error::bad_request;
use crate::domain::currency::{
    convert_currency, format_currency, get_default_rates_in_currency, validate_currency_amount,
    validate_currency_value,
};
use shared::{ConvertCurrencyRequest, ConvertCurrencyResponse, Currency, RatesResponse};

#[derive(Debug, Default, Deserialize)]
pub struct CurrencyParams {
    pub currency: Option<String>,
}

impl CurrencyParams {
    /// The requested currency, or the default when none was given
    pub fn parse(&self) -> Result<Currency, String> {
        match self.currency.as_deref() {
            Some(code) if !code.is_empty() => code.parse::<Currency>(),
            _ => Ok(Currency::default()),
        }
    }
}

/// Default session rates in the requested currency
pub async fn get_rates(Query(params): Query<CurrencyParams>) -> impl IntoResponse {
    info!("GET /api/currency/rates - {:?}", params.currency);

    match params.parse() {
        Ok(currency) => (
            StatusCode::OK,
            Json(RatesResponse {
                currency,
                rates: get_default_rates_in_currency(currency),
            }),
        )
            .into_response(),
        Err(message) => bad_request(message),
    }
}

pub async fn convert(Json(request): Json<ConvertCurrencyRequest>) -> impl IntoResponse {
    info!(
        "POST /api/currency/convert - {} {} -> {}",
        request.amount, request.from, request.to
    );

    let validation = validate_currency_amount(request.amount);
    if !validation.is_valid {
        return bad_request(validation.errors.join(", "));
    }

    let converted = convert_currency(request.amount, request.from, request.to);
    (
        StatusCode::OK,
        Json(ConvertCurrencyResponse {
            amount: request.amount,
            from: request.from,
            to: request.to,
            converted,
            formatted: format_currency(converted, request.to),
        }),
    )
        .into_response()
}

/// Check `{"amount": ...}`; the verdict is in the body, never an error status
pub async fn validate_amount(Json(body): Json<Value>) -> impl IntoResponse {
    let amount = body.get("amount").cloned().unwrap_or(Value::Null);
    info!("POST /api/currency/validate - {}", amount);

    (StatusCode::OK, Json(validate_currency_value(&amount)))
}
