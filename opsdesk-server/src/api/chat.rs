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

//! Conversational query interface over the business data.
//!
//! The pipeline per request: fetch the four collections concurrently, build
//! the grounding context (degrading per-section on fetch failure), invoke
//! the gateway, then persist the query/response pair fire-and-forget. A
//! failed log write never fails the request.

use axum::{
    body::Body,
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use opsdesk_analytics::{compute_summary, DataSummary};
use opsdesk_core::{now_iso, QueryLog};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;

use crate::api::{ApiError, AppState};
use crate::llm::ChatMessage;
use opsdesk_prompts::{ContextBuilder, ContextConfig, Section};

/// Minimum lengths below which a query/response pair is not worth logging.
const MIN_LOGGED_QUERY_LEN: usize = 3;
const MIN_LOGGED_RESPONSE_LEN: usize = 11;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    /// Optional model override for this request.
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponseBody {
    pub response: String,
    pub model: String,
    pub tokens_used: Option<u32>,
    pub duration_ms: u32,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

fn default_history_limit() -> usize {
    20
}

#[derive(Debug, Deserialize)]
pub struct HistoryRangeParams {
    /// Inclusive ISO-8601 lower bound.
    pub start: String,
    /// Inclusive ISO-8601 upper bound.
    pub end: String,
}

/// Collections gathered for one chat turn. Each slot is independent; a
/// failed fetch leaves its slot `None` and the request proceeds.
struct Snapshot {
    customers: Option<Vec<opsdesk_core::Customer>>,
    sales: Option<Vec<opsdesk_core::Sale>>,
    complaints: Option<Vec<opsdesk_core::Complaint>>,
    products: Option<Vec<opsdesk_core::Product>>,
}

impl Snapshot {
    async fn fetch(state: &AppState) -> Self {
        let (customers, sales, complaints, products) = tokio::join!(
            state.store.customers(),
            state.store.sales(),
            state.store.complaints(),
            state.store.products(),
        );

        Self {
            customers: unwrap_or_degrade(customers, "customers"),
            sales: unwrap_or_degrade(sales, "sales"),
            complaints: unwrap_or_degrade(complaints, "complaints"),
            products: unwrap_or_degrade(products, "products"),
        }
    }

    /// Statistics are computed only over a complete snapshot; a partial
    /// one would present misleading totals as authoritative.
    fn summary(&self) -> Option<DataSummary> {
        match (&self.customers, &self.sales, &self.complaints, &self.products) {
            (Some(cu), Some(sa), Some(co), Some(pr)) => {
                Some(compute_summary(cu, sa, co, pr))
            }
            _ => None,
        }
    }

    fn context(&self, config: &ContextConfig) -> String {
        let builder = ContextBuilder::new(config.clone());
        let summary = self.summary();
        builder.build(
            section(&self.customers),
            section(&self.sales),
            section(&self.complaints),
            section(&self.products),
            summary.as_ref(),
        )
    }
}

fn unwrap_or_degrade<T>(
    result: opsdesk_core::Result<Vec<opsdesk_core::Stored<T>>>,
    collection: &str,
) -> Option<Vec<T>> {
    match result {
        Ok(rows) => Some(rows.into_iter().map(|s| s.record).collect()),
        Err(err) => {
            warn!(collection, "collection fetch failed, degrading section: {}", err);
            None
        }
    }
}

fn section<T>(slot: &Option<Vec<T>>) -> Section<'_, T> {
    match slot {
        Some(rows) => Section::Available(rows),
        None => Section::Unavailable,
    }
}

fn context_config(state: &AppState) -> ContextConfig {
    ContextConfig {
        language: state.config.chat.language.clone(),
        max_rows_per_section: state.config.chat.max_context_rows,
    }
}

/// Persist the query/response pair without blocking the response path.
/// Trivial queries and empty/near-empty responses are not logged.
fn log_query_detached(state: &AppState, query: String, response: String) {
    if query.len() < MIN_LOGGED_QUERY_LEN || response.len() < MIN_LOGGED_RESPONSE_LEN {
        return;
    }
    let store = state.store.clone();
    tokio::spawn(async move {
        let entry = QueryLog {
            query,
            response,
            responded_at: now_iso(),
        };
        if let Err(err) = store.append_query_log(entry).await {
            warn!("failed to persist chat query log: {}", err);
        }
    });
}

/// POST /api/v1/chat
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.query.trim().is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".to_string()));
    }

    let snapshot = Snapshot::fetch(&state).await;
    let context = snapshot.context(&context_config(&state));

    let messages = vec![
        ChatMessage::system(context),
        ChatMessage::user(request.query.clone()),
    ];
    let response = state
        .llm
        .chat(messages, request.model)
        .await
        .map_err(|e| ApiError::Gateway(e.to_string()))?;

    log_query_detached(&state, request.query, response.content.clone());

    Ok(Json(ChatResponseBody {
        response: response.content,
        model: response.model,
        tokens_used: response.tokens_used,
        duration_ms: response.duration_ms,
    }))
}

/// POST /api/v1/chat/stream
///
/// Plain-text chunked response. The full response is accumulated alongside
/// the stream so the query log records the complete text.
pub async fn chat_stream(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.query.trim().is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".to_string()));
    }

    let snapshot = Snapshot::fetch(&state).await;
    let context = snapshot.context(&context_config(&state));

    let messages = vec![
        ChatMessage::system(context),
        ChatMessage::user(request.query.clone()),
    ];
    let mut rx = state
        .llm
        .stream_chat(messages, request.model)
        .await
        .map_err(|e| ApiError::Gateway(e.to_string()))?;

    let (tx, body_rx) = tokio::sync::mpsc::channel::<Result<String, std::io::Error>>(100);
    let log_state = state.clone();
    let query = request.query;
    tokio::spawn(async move {
        let mut full_response = String::new();
        while let Some(chunk) = rx.recv().await {
            full_response.push_str(&chunk);
            if tx.send(Ok(chunk)).await.is_err() {
                // Client hung up; finish draining so the log is complete.
                while let Some(rest) = rx.recv().await {
                    full_response.push_str(&rest);
                }
                break;
            }
        }
        log_query_detached(&log_state, query, full_response);
    });

    Ok(Body::from_stream(ReceiverStream::new(body_rx)))
}

/// GET /api/v1/chat/history?limit=
pub async fn chat_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = state.store.recent_queries(params.limit).await?;
    Ok(Json(entries))
}

/// GET /api/v1/chat/history/range?start=&end=
pub async fn chat_history_range(
    State(state): State<AppState>,
    Query(params): Query<HistoryRangeParams>,
) -> Result<impl IntoResponse, ApiError> {
    if params.start > params.end {
        return Err(ApiError::BadRequest(
            "start must not be after end".to_string(),
        ));
    }
    let entries = state
        .store
        .queries_between(&params.start, &params.end)
        .await?;
    Ok(Json(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::llm::{ChatResponse, LlmProvider};
    use opsdesk_core::{Customer, OpsdeskError, Sale};
    use opsdesk_store::{MemoryStore, RecordStore};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    struct MockProvider {
        reply: String,
    }

    #[async_trait::async_trait]
    impl LlmProvider for MockProvider {
        async fn chat(
            &self,
            messages: Vec<ChatMessage>,
            _model: Option<String>,
        ) -> anyhow::Result<ChatResponse> {
            assert_eq!(messages.len(), 2);
            assert_eq!(messages[0].role, "system");
            Ok(ChatResponse {
                content: self.reply.clone(),
                provider: "mock".to_string(),
                model: "mock-model".to_string(),
                tokens_used: Some(10),
                duration_ms: 1,
            })
        }

        async fn stream_chat(
            &self,
            _messages: Vec<ChatMessage>,
            _model: Option<String>,
        ) -> anyhow::Result<mpsc::Receiver<String>> {
            let (tx, rx) = mpsc::channel(4);
            let reply = self.reply.clone();
            tokio::spawn(async move {
                for chunk in reply.split_inclusive(' ') {
                    if tx.send(chunk.to_string()).await.is_err() {
                        break;
                    }
                }
            });
            Ok(rx)
        }

        fn name(&self) -> &str {
            "Mock"
        }
    }

    /// Store whose sales fetch always fails, for degraded-pipeline tests.
    struct BrokenSalesStore {
        inner: MemoryStore,
    }

    #[async_trait::async_trait]
    impl RecordStore for BrokenSalesStore {
        async fn sales(&self) -> opsdesk_core::Result<Vec<opsdesk_core::Stored<Sale>>> {
            Err(OpsdeskError::Store("sales table offline".to_string()))
        }

        async fn customers(
            &self,
        ) -> opsdesk_core::Result<Vec<opsdesk_core::Stored<Customer>>> {
            self.inner.customers().await
        }

        async fn customers_by_name(
            &self,
            name: &str,
        ) -> opsdesk_core::Result<Vec<opsdesk_core::Stored<Customer>>> {
            self.inner.customers_by_name(name).await
        }

        async fn customers_by_email(
            &self,
            email: &str,
        ) -> opsdesk_core::Result<Vec<opsdesk_core::Stored<Customer>>> {
            self.inner.customers_by_email(email).await
        }

        async fn insert_customer(
            &self,
            customer: Customer,
        ) -> opsdesk_core::Result<opsdesk_core::RecordId> {
            self.inner.insert_customer(customer).await
        }

        async fn sales_by_customer(
            &self,
            customer_name: &str,
        ) -> opsdesk_core::Result<Vec<opsdesk_core::Stored<Sale>>> {
            self.inner.sales_by_customer(customer_name).await
        }

        async fn sales_by_product(
            &self,
            product_name: &str,
        ) -> opsdesk_core::Result<Vec<opsdesk_core::Stored<Sale>>> {
            self.inner.sales_by_product(product_name).await
        }

        async fn insert_sale(
            &self,
            sale: Sale,
        ) -> opsdesk_core::Result<opsdesk_core::RecordId> {
            self.inner.insert_sale(sale).await
        }

        async fn products(
            &self,
        ) -> opsdesk_core::Result<Vec<opsdesk_core::Stored<opsdesk_core::Product>>> {
            self.inner.products().await
        }

        async fn products_by_name(
            &self,
            name: &str,
        ) -> opsdesk_core::Result<Vec<opsdesk_core::Stored<opsdesk_core::Product>>> {
            self.inner.products_by_name(name).await
        }

        async fn insert_product(
            &self,
            product: opsdesk_core::Product,
        ) -> opsdesk_core::Result<opsdesk_core::RecordId> {
            self.inner.insert_product(product).await
        }

        async fn complaints(
            &self,
        ) -> opsdesk_core::Result<Vec<opsdesk_core::Stored<opsdesk_core::Complaint>>> {
            self.inner.complaints().await
        }

        async fn complaints_by_customer(
            &self,
            customer_name: &str,
        ) -> opsdesk_core::Result<Vec<opsdesk_core::Stored<opsdesk_core::Complaint>>> {
            self.inner.complaints_by_customer(customer_name).await
        }

        async fn complaints_by_email(
            &self,
            email: &str,
        ) -> opsdesk_core::Result<Vec<opsdesk_core::Stored<opsdesk_core::Complaint>>> {
            self.inner.complaints_by_email(email).await
        }

        async fn insert_complaint(
            &self,
            complaint: opsdesk_core::Complaint,
        ) -> opsdesk_core::Result<opsdesk_core::RecordId> {
            self.inner.insert_complaint(complaint).await
        }

        async fn absences(
            &self,
        ) -> opsdesk_core::Result<Vec<opsdesk_core::Stored<opsdesk_core::Absence>>> {
            self.inner.absences().await
        }

        async fn absences_by_student(
            &self,
            student_name: &str,
        ) -> opsdesk_core::Result<Vec<opsdesk_core::Stored<opsdesk_core::Absence>>> {
            self.inner.absences_by_student(student_name).await
        }

        async fn absences_by_parent(
            &self,
            parent_name: &str,
        ) -> opsdesk_core::Result<Vec<opsdesk_core::Stored<opsdesk_core::Absence>>> {
            self.inner.absences_by_parent(parent_name).await
        }

        async fn absences_by_date(
            &self,
            absent_on: &str,
        ) -> opsdesk_core::Result<Vec<opsdesk_core::Stored<opsdesk_core::Absence>>> {
            self.inner.absences_by_date(absent_on).await
        }

        async fn absences_by_grade(
            &self,
            grade: &str,
        ) -> opsdesk_core::Result<Vec<opsdesk_core::Stored<opsdesk_core::Absence>>> {
            self.inner.absences_by_grade(grade).await
        }

        async fn insert_absence(
            &self,
            absence: opsdesk_core::Absence,
        ) -> opsdesk_core::Result<opsdesk_core::RecordId> {
            self.inner.insert_absence(absence).await
        }

        async fn patch_absence(
            &self,
            id: opsdesk_core::RecordId,
            patch: opsdesk_core::AbsencePatch,
        ) -> opsdesk_core::Result<()> {
            self.inner.patch_absence(id, patch).await
        }

        async fn delete_absence(&self, id: opsdesk_core::RecordId) -> opsdesk_core::Result<()> {
            self.inner.delete_absence(id).await
        }

        async fn insert_message(
            &self,
            message: opsdesk_core::ParentMessage,
        ) -> opsdesk_core::Result<opsdesk_core::RecordId> {
            self.inner.insert_message(message).await
        }

        async fn messages(
            &self,
        ) -> opsdesk_core::Result<Vec<opsdesk_core::Stored<opsdesk_core::ParentMessage>>> {
            self.inner.messages().await
        }

        async fn mark_message_sent(&self, id: opsdesk_core::RecordId) -> opsdesk_core::Result<()> {
            self.inner.mark_message_sent(id).await
        }

        async fn append_query_log(
            &self,
            entry: QueryLog,
        ) -> opsdesk_core::Result<opsdesk_core::RecordId> {
            self.inner.append_query_log(entry).await
        }

        async fn recent_queries(
            &self,
            limit: usize,
        ) -> opsdesk_core::Result<Vec<opsdesk_core::Stored<QueryLog>>> {
            self.inner.recent_queries(limit).await
        }

        async fn queries_between(
            &self,
            start: &str,
            end: &str,
        ) -> opsdesk_core::Result<Vec<opsdesk_core::Stored<QueryLog>>> {
            self.inner.queries_between(start, end).await
        }
    }

    fn test_state(store: Arc<dyn RecordStore>, reply: &str) -> AppState {
        AppState {
            store,
            llm: Arc::new(MockProvider {
                reply: reply.to_string(),
            }),
            config: Arc::new(ServerConfig::default()),
        }
    }

    fn customer(name: &str) -> Customer {
        Customer {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: "555-0100".to_string(),
            address: String::new(),
            registered_on: "2026-01-15".to_string(),
        }
    }

    #[tokio::test]
    async fn chat_responds_and_logs_the_exchange() {
        let store = Arc::new(MemoryStore::new());
        store.insert_customer(customer("Ana")).await.unwrap();
        let state = test_state(store.clone(), "Ana is your only customer.");

        let response = chat(
            State(state),
            Json(ChatRequest {
                query: "who are my customers?".to_string(),
                model: None,
            }),
        )
        .await
        .unwrap();
        let _ = response;

        // Detached log write; yield until it lands.
        for _ in 0..50 {
            tokio::task::yield_now().await;
            if !store.recent_queries(10).await.unwrap().is_empty() {
                break;
            }
        }
        let logged = store.recent_queries(10).await.unwrap();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].record.query, "who are my customers?");
        assert_eq!(logged[0].record.response, "Ana is your only customer.");
    }

    #[tokio::test]
    async fn short_exchanges_are_not_logged() {
        let store = Arc::new(MemoryStore::new());
        let state = test_state(store.clone(), "ok");

        // "hi" answers fine but the pair is below the logging thresholds.
        let _ = chat(
            State(state),
            Json(ChatRequest {
                query: "hi".to_string(),
                model: None,
            }),
        )
        .await;
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        assert!(store.recent_queries(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let state = test_state(store, "unused");
        let err = chat(
            State(state),
            Json(ChatRequest {
                query: "   ".to_string(),
                model: None,
            }),
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn degraded_store_still_answers() {
        let inner = MemoryStore::new();
        inner.insert_customer(customer("Ana")).await.unwrap();
        let store = Arc::new(BrokenSalesStore { inner });

        let snapshot = Snapshot::fetch(&test_state(store, "unused")).await;
        assert!(snapshot.customers.is_some());
        assert!(snapshot.sales.is_none());
        // Partial snapshot: no authoritative statistics.
        assert!(snapshot.summary().is_none());

        let context = snapshot.context(&ContextConfig::default());
        assert!(context.contains("(section unavailable)"));
        assert!(context.contains("Ana"));
    }

    #[tokio::test]
    async fn history_range_rejects_inverted_bounds() {
        let store = Arc::new(MemoryStore::new());
        let state = test_state(store, "unused");
        let err = chat_history_range(
            State(state),
            Query(HistoryRangeParams {
                start: "2026-03-01".to_string(),
                end: "2026-02-01".to_string(),
            }),
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
