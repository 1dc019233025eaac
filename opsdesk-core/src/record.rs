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

//! Record kinds held by the store.
//!
//! Relationships between kinds are by denormalized name string, not by
//! identifier: a `Sale::customer_name` is not guaranteed to match exactly one
//! `Customer`. Name-based joins are best-effort string equality and live in
//! `opsdesk_analytics::join`.
//!
//! Dates are ISO-8601 strings so that range queries can use plain
//! lexicographic comparison.

use serde::{Deserialize, Serialize};

/// Store-assigned identifier for a persisted record.
pub type RecordId = u64;

/// A persisted record together with its store-assigned id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stored<T> {
    pub id: RecordId,
    #[serde(flatten)]
    pub record: T,
}

impl<T> Stored<T> {
    pub fn new(id: RecordId, record: T) -> Self {
        Self { id, record }
    }

    pub fn into_inner(self) -> T {
        self.record
    }
}

/// A registered customer. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    /// Unique key within the customer table.
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    /// Registration date (ISO-8601).
    pub registered_on: String,
}

/// A sale transaction. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sale {
    /// Customer reference by raw name, not id.
    pub customer_name: String,
    pub product_name: String,
    /// Units sold. Positive in well-formed records.
    pub quantity: u32,
    /// Monetary total for the line. Positive in well-formed records.
    pub amount: f64,
    /// Sale date (ISO-8601).
    pub sold_on: String,
}

/// A catalog product. Created/updated externally; read-only for aggregation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    /// Unique key within the product table.
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: u32,
}

/// A customer complaint. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Complaint {
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub description: String,
    /// Complaint date (ISO-8601).
    pub filed_on: String,
}

/// A student absence record. Mutable (partial patch) and deletable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Absence {
    pub parent_name: String,
    pub student_name: String,
    /// Days absent for this record. Positive in well-formed records.
    pub days_absent: u32,
    /// Absence date (ISO-8601).
    pub absent_on: String,
    /// Grade/class label, e.g. "3B".
    pub grade: String,
}

/// Partial update for an [`Absence`]. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AbsencePatch {
    pub parent_name: Option<String>,
    pub student_name: Option<String>,
    pub days_absent: Option<u32>,
    pub absent_on: Option<String>,
    pub grade: Option<String>,
}

impl AbsencePatch {
    pub fn is_empty(&self) -> bool {
        self.parent_name.is_none()
            && self.student_name.is_none()
            && self.days_absent.is_none()
            && self.absent_on.is_none()
            && self.grade.is_none()
    }
}

/// A generated parent-notification message.
///
/// The `sent` flag transitions false→true exactly once via
/// `RecordStore::mark_message_sent`; there is no reverse transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParentMessage {
    pub parent_name: String,
    pub student_name: String,
    pub message: String,
    /// Snapshot of the student's total absent days at generation time.
    pub total_absences: u32,
    /// Generation timestamp (ISO-8601).
    pub generated_at: String,
    pub sent: bool,
}

/// An append-only chat query/response pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryLog {
    pub query: String,
    pub response: String,
    /// Response timestamp (ISO-8601).
    pub responded_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_patch_is_detected() {
        assert!(AbsencePatch::default().is_empty());
        let patch = AbsencePatch {
            days_absent: Some(2),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn stored_serializes_flat() {
        let stored = Stored::new(
            7,
            Product {
                name: "Laptop".into(),
                description: "15 inch".into(),
                price: 1500.0,
                stock: 3,
            },
        );
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["name"], "Laptop");
    }
}
