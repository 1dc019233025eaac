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

//! HTTP API surface.

pub mod absences;
pub mod analytics;
pub mod chat;
pub mod health;
pub mod records;

use crate::config::ServerConfig;
use crate::llm::LlmProvider;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use opsdesk_core::OpsdeskError;
use opsdesk_store::RecordStore;
use serde::Serialize;
use std::sync::Arc;

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Upstream provider error: {0}")]
    Gateway(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::Gateway(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<OpsdeskError> for ApiError {
    fn from(err: OpsdeskError) -> Self {
        match err {
            OpsdeskError::NotFound(msg) => ApiError::NotFound(msg),
            OpsdeskError::InvalidArgument(msg) => ApiError::BadRequest(msg),
            OpsdeskError::Gateway(msg) => ApiError::Gateway(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub llm: Arc<dyn LlmProvider>,
    pub config: Arc<ServerConfig>,
}

/// Build the API router. Routes are versioned under `/api/v1`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        // Business records
        .route(
            "/api/v1/customers",
            get(records::list_customers).post(records::create_customer),
        )
        .route("/api/v1/customers/search", get(records::search_customers))
        .route(
            "/api/v1/customers/:name/sales",
            get(records::customer_sales),
        )
        .route(
            "/api/v1/customers/:name/complaints",
            get(records::customer_complaints),
        )
        .route(
            "/api/v1/sales",
            get(records::list_sales).post(records::create_sale),
        )
        .route("/api/v1/products", get(records::list_products).post(records::create_product))
        .route("/api/v1/products/:name/sales", get(records::product_sales))
        .route(
            "/api/v1/complaints",
            get(records::list_complaints).post(records::create_complaint),
        )
        // Aggregation
        .route("/api/v1/analytics/summary", get(analytics::data_summary))
        .route(
            "/api/v1/analytics/top-products",
            get(analytics::top_products),
        )
        .route(
            "/api/v1/analytics/top-customers",
            get(analytics::top_customers),
        )
        .route("/api/v1/analytics/segments", get(analytics::customer_segments))
        .route(
            "/api/v1/analytics/complaint-patterns",
            get(analytics::complaint_patterns),
        )
        // Absence tracker
        .route(
            "/api/v1/absences",
            get(absences::list_absences).post(absences::register_absence),
        )
        .route(
            "/api/v1/absences/:id",
            patch(absences::patch_absence).delete(absences::delete_absence),
        )
        .route("/api/v1/absences/ranking", get(absences::absence_ranking))
        .route(
            "/api/v1/absences/student/:name",
            get(absences::student_absence_summary),
        )
        .route(
            "/api/v1/absences/parent/:name",
            get(absences::parent_absences),
        )
        .route("/api/v1/absences/date/:date", get(absences::date_absences))
        .route("/api/v1/absences/grade/:grade", get(absences::grade_absences))
        .route(
            "/api/v1/messages",
            get(absences::list_messages).post(absences::generate_message),
        )
        .route("/api/v1/messages/:id/sent", post(absences::mark_sent))
        // Conversational interface
        .route("/api/v1/chat", post(chat::chat))
        .route("/api/v1/chat/stream", post(chat::chat_stream))
        .route("/api/v1/chat/history", get(chat::chat_history))
        .route("/api/v1/chat/history/range", get(chat::chat_history_range))
        .with_state(state)
}
