// Copyright 2025 Opsdesk (https://github.com/opsdesk)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Aggregation endpoints.
//!
//! Handlers fetch the raw collections, strip the storage envelope, and hand
//! plain records to the pure functions in `opsdesk-analytics`. Thresholds
//! and categorization rules come from server configuration.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use opsdesk_analytics::{
    complaint_patterns as pattern_complaints, compute_summary, keyword_categorizer,
    rollup_by_customer, rollup_by_product, segment_customers, top_customers_by_spend,
    top_products_by_units, SegmentThresholds,
};
use opsdesk_core::{Complaint, Sale};
use serde::{Deserialize, Serialize};

use crate::api::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct RankingParams {
    #[serde(default = "default_ranking_limit")]
    pub limit: usize,
}

fn default_ranking_limit() -> usize {
    5
}

#[derive(Debug, Serialize)]
pub struct RankedEntry {
    pub name: String,
    pub quantity: u64,
    pub amount: f64,
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct RankingResponse {
    pub entries: Vec<RankedEntry>,
    /// Malformed sale rows excluded from the ranking.
    pub skipped: usize,
}

/// GET /api/v1/analytics/summary
pub async fn data_summary(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let (customers, sales, complaints, products) = tokio::try_join!(
        state.store.customers(),
        state.store.sales(),
        state.store.complaints(),
        state.store.products(),
    )?;

    let customers: Vec<_> = customers.into_iter().map(|s| s.record).collect();
    let sales: Vec<_> = sales.into_iter().map(|s| s.record).collect();
    let complaints: Vec<_> = complaints.into_iter().map(|s| s.record).collect();
    let products: Vec<_> = products.into_iter().map(|s| s.record).collect();

    Ok(Json(compute_summary(
        &customers,
        &sales,
        &complaints,
        &products,
    )))
}

/// GET /api/v1/analytics/top-products?limit=
pub async fn top_products(
    State(state): State<AppState>,
    Query(params): Query<RankingParams>,
) -> Result<impl IntoResponse, ApiError> {
    let sales = plain_sales(&state).await?;
    let report = rollup_by_product(&sales);
    let ranked = top_products_by_units(&report, params.limit);
    Ok(Json(ranking_response(ranked, report.skipped)))
}

/// GET /api/v1/analytics/top-customers?limit=
pub async fn top_customers(
    State(state): State<AppState>,
    Query(params): Query<RankingParams>,
) -> Result<impl IntoResponse, ApiError> {
    let sales = plain_sales(&state).await?;
    let report = rollup_by_customer(&sales);
    let ranked = top_customers_by_spend(&report, params.limit);
    Ok(Json(ranking_response(ranked, report.skipped)))
}

/// GET /api/v1/analytics/segments
///
/// Tier thresholds come from `[analytics]` in the server configuration.
pub async fn customer_segments(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let sales = plain_sales(&state).await?;
    let report = rollup_by_customer(&sales);
    let thresholds = SegmentThresholds {
        vip_min_purchases: state.config.analytics.vip_min_purchases,
        regular_min_purchases: state.config.analytics.regular_min_purchases,
    };
    Ok(Json(segment_customers(&report, thresholds)))
}

/// GET /api/v1/analytics/complaint-patterns
pub async fn complaint_patterns(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let complaints: Vec<Complaint> = state
        .store
        .complaints()
        .await?
        .into_iter()
        .map(|s| s.record)
        .collect();

    let rules: Vec<(String, Vec<String>)> = state
        .config
        .analytics
        .complaint_categories
        .iter()
        .map(|rule| (rule.name.clone(), rule.keywords.clone()))
        .collect();
    let categorize = keyword_categorizer(&rules);

    Ok(Json(pattern_complaints(&complaints, categorize)))
}

async fn plain_sales(state: &AppState) -> Result<Vec<Sale>, ApiError> {
    Ok(state
        .store
        .sales()
        .await?
        .into_iter()
        .map(|s| s.record)
        .collect())
}

fn ranking_response(
    ranked: Vec<(String, opsdesk_analytics::SaleRollup)>,
    skipped: usize,
) -> RankingResponse {
    RankingResponse {
        entries: ranked
            .into_iter()
            .map(|(name, rollup)| RankedEntry {
                name,
                quantity: rollup.quantity,
                amount: rollup.amount,
                count: rollup.count,
            })
            .collect(),
        skipped,
    }
}
