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

//! CRUD handlers for the business record kinds.
//!
//! Lookups go through the store's named indexes; per-customer and
//! per-product views attach a sales rollup computed by `opsdesk-analytics`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use opsdesk_analytics::rollup_all;
use opsdesk_core::{Complaint, Customer, Product, RecordId, Sale, Stored};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: RecordId,
}

#[derive(Debug, Deserialize)]
pub struct CustomerSearchParams {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Aggregate view over one party's sales.
#[derive(Debug, Serialize)]
pub struct SalesView {
    pub sales: Vec<Stored<Sale>>,
    pub total_quantity: u64,
    pub total_amount: f64,
    pub average_unit_price: f64,
}

impl SalesView {
    fn build(sales: Vec<Stored<Sale>>) -> Self {
        let plain: Vec<Sale> = sales.iter().map(|s| s.record.clone()).collect();
        let (totals, _skipped) = rollup_all(&plain);
        Self {
            total_quantity: totals.quantity,
            total_amount: totals.amount,
            average_unit_price: totals.average_unit_price(),
            sales,
        }
    }
}

// Customers

/// GET /api/v1/customers
pub async fn list_customers(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let customers = state.store.customers().await?;
    Ok(Json(customers))
}

/// GET /api/v1/customers/search?name=&email=
///
/// Exactly one of `name` or `email` must be given; matching is exact, the
/// same raw-string equality the aggregation engine joins on.
pub async fn search_customers(
    State(state): State<AppState>,
    Query(params): Query<CustomerSearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let customers = match (params.name, params.email) {
        (Some(name), None) => state.store.customers_by_name(&name).await?,
        (None, Some(email)) => state.store.customers_by_email(&email).await?,
        _ => {
            return Err(ApiError::BadRequest(
                "provide exactly one of `name` or `email`".to_string(),
            ))
        }
    };
    Ok(Json(customers))
}

/// POST /api/v1/customers
pub async fn create_customer(
    State(state): State<AppState>,
    Json(customer): Json<Customer>,
) -> Result<impl IntoResponse, ApiError> {
    if customer.name.trim().is_empty() {
        return Err(ApiError::BadRequest("customer name is required".to_string()));
    }
    let id = state.store.insert_customer(customer).await?;
    info!(id, "customer created");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// GET /api/v1/customers/:name/sales
pub async fn customer_sales(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let sales = state.store.sales_by_customer(&name).await?;
    Ok(Json(SalesView::build(sales)))
}

/// GET /api/v1/customers/:name/complaints
pub async fn customer_complaints(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let complaints = state.store.complaints_by_customer(&name).await?;
    Ok(Json(complaints))
}

// Sales

/// GET /api/v1/sales
pub async fn list_sales(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let sales = state.store.sales().await?;
    Ok(Json(sales))
}

/// POST /api/v1/sales
pub async fn create_sale(
    State(state): State<AppState>,
    Json(sale): Json<Sale>,
) -> Result<impl IntoResponse, ApiError> {
    if sale.customer_name.trim().is_empty() || sale.product_name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "customer_name and product_name are required".to_string(),
        ));
    }
    if !sale.amount.is_finite() || sale.amount < 0.0 {
        return Err(ApiError::BadRequest(
            "amount must be a finite, non-negative number".to_string(),
        ));
    }
    let id = state.store.insert_sale(sale).await?;
    info!(id, "sale recorded");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

// Products

/// GET /api/v1/products
pub async fn list_products(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let products = state.store.products().await?;
    Ok(Json(products))
}

/// POST /api/v1/products
pub async fn create_product(
    State(state): State<AppState>,
    Json(product): Json<Product>,
) -> Result<impl IntoResponse, ApiError> {
    if product.name.trim().is_empty() {
        return Err(ApiError::BadRequest("product name is required".to_string()));
    }
    if !product.price.is_finite() || product.price < 0.0 {
        return Err(ApiError::BadRequest(
            "price must be a finite, non-negative number".to_string(),
        ));
    }
    let id = state.store.insert_product(product).await?;
    info!(id, "product created");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// GET /api/v1/products/:name/sales
pub async fn product_sales(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let sales = state.store.sales_by_product(&name).await?;
    Ok(Json(SalesView::build(sales)))
}

// Complaints

/// GET /api/v1/complaints
pub async fn list_complaints(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let complaints = state.store.complaints().await?;
    Ok(Json(complaints))
}

/// POST /api/v1/complaints
pub async fn create_complaint(
    State(state): State<AppState>,
    Json(complaint): Json<Complaint>,
) -> Result<impl IntoResponse, ApiError> {
    if complaint.description.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "complaint description is required".to_string(),
        ));
    }
    let id = state.store.insert_complaint(complaint).await?;
    info!(id, "complaint filed");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}
