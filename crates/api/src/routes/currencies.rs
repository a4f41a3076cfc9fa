//! Currency listing, conversion and rate routes.

use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    routing::get,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use subtally_shared::AppError;
use subtally_shared::types::Currency;

use crate::error::ApiResult;
use crate::routes::parse_currency;
use crate::{ApiError, AppState, middleware::AuthUser};

/// Creates the currency routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/currencies", get(list_currencies))
        .route("/convert", get(convert))
        .route("/rates", get(current_rates))
}

/// Response for a currency.
#[derive(Debug, Serialize)]
pub struct CurrencyResponse {
    /// ISO 4217 code.
    pub code: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Display symbol.
    pub symbol: &'static str,
}

/// Query for `/convert`.
#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    /// Amount to convert.
    pub amount: Decimal,
    /// Source currency code.
    pub from: String,
    /// Target currency code.
    pub to: String,
}

/// Response for `/convert`.
#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    /// Amount as given.
    pub amount: Decimal,
    /// Source currency.
    pub from: Currency,
    /// Target currency.
    pub to: Currency,
    /// Converted amount.
    pub converted: Decimal,
}

/// Response for `/rates`.
#[derive(Debug, Serialize)]
pub struct RatesResponse {
    /// Pivot currency.
    pub base: Currency,
    /// Units of each currency per unit of `base`.
    pub rates: BTreeMap<&'static str, Decimal>,
}

#[derive(Debug, Serialize)]
struct CurrencyList {
    currencies: Vec<CurrencyResponse>,
}

/// GET `/currencies` - List supported currencies.
async fn list_currencies(_auth: AuthUser) -> Json<CurrencyList> {
    Json(CurrencyList {
        currencies: Currency::ALL
            .into_iter()
            .map(|c| CurrencyResponse {
                code: c.code(),
                name: c.name(),
                symbol: c.symbol(),
            })
            .collect(),
    })
}

/// GET `/convert` - Convert an amount between currencies.
async fn convert(
    State(state): State<AppState>,
    _auth: AuthUser,
    query: Result<Query<ConvertQuery>, QueryRejection>,
) -> ApiResult<Json<ConvertResponse>> {
    let Query(query) = query.map_err(|e| ApiError::validation(e.body_text()))?;
    let from = parse_currency(Some(&query.from))?;
    let to = parse_currency(Some(&query.to))?;

    let converted = state
        .converter
        .convert(query.amount, from, to)
        .await
        .map_err(AppError::from)?;

    Ok(Json(ConvertResponse {
        amount: query.amount,
        from,
        to,
        converted,
    }))
}

/// GET `/rates` - Current USD-relative rate table.
async fn current_rates(State(state): State<AppState>, _auth: AuthUser) -> Json<RatesResponse> {
    let table = state.converter.current_rates().await;

    Json(RatesResponse {
        base: Currency::Usd,
        rates: Currency::ALL
            .into_iter()
            .map(|c| (c.code(), table.rate(c)))
            .collect(),
    })
}
