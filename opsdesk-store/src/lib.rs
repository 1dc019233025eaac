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

//! Opsdesk Record Store
//!
//! Storage abstraction over the record kinds in `opsdesk-core`, with named
//! secondary indexes for the lookups the application performs. The store is
//! an explicitly constructed, explicitly passed dependency so callers stay
//! testable against fixture data instead of a live database.
//!
//! No transactional snapshot is guaranteed across fetches; single-request
//! aggregation treats each collection read as independent.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use opsdesk_core::{
    Absence, AbsencePatch, Complaint, Customer, ParentMessage, Product, QueryLog, RecordId,
    Result, Sale, Stored,
};

/// Record store contract: fetch-all and fetch-by-indexed-key per kind, plus
/// the handful of mutations the application performs.
///
/// Fetch failures surface as `OpsdeskError::Store` — a recoverable failure
/// callers degrade around, never a process-fatal condition.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // Customers (index: by name, by email)
    async fn customers(&self) -> Result<Vec<Stored<Customer>>>;
    async fn customers_by_name(&self, name: &str) -> Result<Vec<Stored<Customer>>>;
    async fn customers_by_email(&self, email: &str) -> Result<Vec<Stored<Customer>>>;
    async fn insert_customer(&self, customer: Customer) -> Result<RecordId>;

    // Sales (index: by customer, by product)
    async fn sales(&self) -> Result<Vec<Stored<Sale>>>;
    async fn sales_by_customer(&self, customer_name: &str) -> Result<Vec<Stored<Sale>>>;
    async fn sales_by_product(&self, product_name: &str) -> Result<Vec<Stored<Sale>>>;
    async fn insert_sale(&self, sale: Sale) -> Result<RecordId>;

    // Products (index: by name)
    async fn products(&self) -> Result<Vec<Stored<Product>>>;
    async fn products_by_name(&self, name: &str) -> Result<Vec<Stored<Product>>>;
    async fn insert_product(&self, product: Product) -> Result<RecordId>;

    // Complaints (index: by customer, by email)
    async fn complaints(&self) -> Result<Vec<Stored<Complaint>>>;
    async fn complaints_by_customer(&self, customer_name: &str) -> Result<Vec<Stored<Complaint>>>;
    async fn complaints_by_email(&self, email: &str) -> Result<Vec<Stored<Complaint>>>;
    async fn insert_complaint(&self, complaint: Complaint) -> Result<RecordId>;

    // Absences (index: by student, by parent, by date, by grade)
    async fn absences(&self) -> Result<Vec<Stored<Absence>>>;
    async fn absences_by_student(&self, student_name: &str) -> Result<Vec<Stored<Absence>>>;
    async fn absences_by_parent(&self, parent_name: &str) -> Result<Vec<Stored<Absence>>>;
    async fn absences_by_date(&self, absent_on: &str) -> Result<Vec<Stored<Absence>>>;
    async fn absences_by_grade(&self, grade: &str) -> Result<Vec<Stored<Absence>>>;
    async fn insert_absence(&self, absence: Absence) -> Result<RecordId>;
    /// Partial update; `None` fields are left untouched.
    async fn patch_absence(&self, id: RecordId, patch: AbsencePatch) -> Result<()>;
    async fn delete_absence(&self, id: RecordId) -> Result<()>;

    // Parent messages
    async fn insert_message(&self, message: ParentMessage) -> Result<RecordId>;
    /// All generated messages, newest first.
    async fn messages(&self) -> Result<Vec<Stored<ParentMessage>>>;
    /// Transition the sent flag false→true. Idempotent: marking an
    /// already-sent message is a no-op; there is no reverse transition.
    async fn mark_message_sent(&self, id: RecordId) -> Result<()>;

    // Chat query log (append-only)
    async fn append_query_log(&self, entry: QueryLog) -> Result<RecordId>;
    /// Most recent entries, newest first, at most `limit`.
    async fn recent_queries(&self, limit: usize) -> Result<Vec<Stored<QueryLog>>>;
    /// Entries whose response date lies in `[start, end]` (inclusive,
    /// lexicographic ISO-8601 comparison).
    async fn queries_between(&self, start: &str, end: &str) -> Result<Vec<Stored<QueryLog>>>;
}
