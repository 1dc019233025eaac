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

//! In-memory record store with maintained secondary indexes.
//!
//! Rows live in per-kind `BTreeMap`s keyed by a monotonically increasing id,
//! so full scans come back in insertion order. String-keyed lookups go
//! through index maps that are kept in sync on insert, patch, and delete.

use crate::RecordStore;
use async_trait::async_trait;
use opsdesk_core::{
    Absence, AbsencePatch, Complaint, Customer, OpsdeskError, ParentMessage, Product, QueryLog,
    RecordId, Result, Sale, Stored,
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

/// Rows of one record kind, in insertion order.
struct Table<T> {
    rows: BTreeMap<RecordId, T>,
}

impl<T: Clone> Table<T> {
    fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }

    fn all(&self) -> Vec<Stored<T>> {
        self.rows
            .iter()
            .map(|(id, row)| Stored::new(*id, row.clone()))
            .collect()
    }

    fn select(&self, ids: &[RecordId]) -> Vec<Stored<T>> {
        ids.iter()
            .filter_map(|id| self.rows.get(id).map(|row| Stored::new(*id, row.clone())))
            .collect()
    }
}

/// Secondary index: string key to row ids, in insertion order per key.
#[derive(Default)]
struct Index {
    map: HashMap<String, Vec<RecordId>>,
}

impl Index {
    fn add(&mut self, key: &str, id: RecordId) {
        self.map.entry(key.to_string()).or_default().push(id);
    }

    fn remove(&mut self, key: &str, id: RecordId) {
        if let Some(ids) = self.map.get_mut(key) {
            ids.retain(|existing| *existing != id);
            if ids.is_empty() {
                self.map.remove(key);
            }
        }
    }

    fn get(&self, key: &str) -> Vec<RecordId> {
        self.map.get(key).cloned().unwrap_or_default()
    }
}

struct CustomerTable {
    table: Table<Customer>,
    by_name: Index,
    by_email: Index,
}

struct SaleTable {
    table: Table<Sale>,
    by_customer: Index,
    by_product: Index,
}

struct ProductTable {
    table: Table<Product>,
    by_name: Index,
}

struct ComplaintTable {
    table: Table<Complaint>,
    by_customer: Index,
    by_email: Index,
}

struct AbsenceTable {
    table: Table<Absence>,
    by_student: Index,
    by_parent: Index,
    by_date: Index,
    by_grade: Index,
}

/// In-memory [`RecordStore`] used by the server and by tests.
pub struct MemoryStore {
    next_id: AtomicU64,
    customers: RwLock<CustomerTable>,
    sales: RwLock<SaleTable>,
    products: RwLock<ProductTable>,
    complaints: RwLock<ComplaintTable>,
    absences: RwLock<AbsenceTable>,
    messages: RwLock<Table<ParentMessage>>,
    query_log: RwLock<Table<QueryLog>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            customers: RwLock::new(CustomerTable {
                table: Table::new(),
                by_name: Index::default(),
                by_email: Index::default(),
            }),
            sales: RwLock::new(SaleTable {
                table: Table::new(),
                by_customer: Index::default(),
                by_product: Index::default(),
            }),
            products: RwLock::new(ProductTable {
                table: Table::new(),
                by_name: Index::default(),
            }),
            complaints: RwLock::new(ComplaintTable {
                table: Table::new(),
                by_customer: Index::default(),
                by_email: Index::default(),
            }),
            absences: RwLock::new(AbsenceTable {
                table: Table::new(),
                by_student: Index::default(),
                by_parent: Index::default(),
                by_date: Index::default(),
                by_grade: Index::default(),
            }),
            messages: RwLock::new(Table::new()),
            query_log: RwLock::new(Table::new()),
        }
    }

    fn allocate_id(&self) -> RecordId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn customers(&self) -> Result<Vec<Stored<Customer>>> {
        Ok(self.customers.read().table.all())
    }

    async fn customers_by_name(&self, name: &str) -> Result<Vec<Stored<Customer>>> {
        let guard = self.customers.read();
        Ok(guard.table.select(&guard.by_name.get(name)))
    }

    async fn customers_by_email(&self, email: &str) -> Result<Vec<Stored<Customer>>> {
        let guard = self.customers.read();
        Ok(guard.table.select(&guard.by_email.get(email)))
    }

    async fn insert_customer(&self, customer: Customer) -> Result<RecordId> {
        let id = self.allocate_id();
        let mut guard = self.customers.write();
        guard.by_name.add(&customer.name, id);
        guard.by_email.add(&customer.email, id);
        guard.table.rows.insert(id, customer);
        Ok(id)
    }

    async fn sales(&self) -> Result<Vec<Stored<Sale>>> {
        Ok(self.sales.read().table.all())
    }

    async fn sales_by_customer(&self, customer_name: &str) -> Result<Vec<Stored<Sale>>> {
        let guard = self.sales.read();
        Ok(guard.table.select(&guard.by_customer.get(customer_name)))
    }

    async fn sales_by_product(&self, product_name: &str) -> Result<Vec<Stored<Sale>>> {
        let guard = self.sales.read();
        Ok(guard.table.select(&guard.by_product.get(product_name)))
    }

    async fn insert_sale(&self, sale: Sale) -> Result<RecordId> {
        let id = self.allocate_id();
        let mut guard = self.sales.write();
        guard.by_customer.add(&sale.customer_name, id);
        guard.by_product.add(&sale.product_name, id);
        guard.table.rows.insert(id, sale);
        Ok(id)
    }

    async fn products(&self) -> Result<Vec<Stored<Product>>> {
        Ok(self.products.read().table.all())
    }

    async fn products_by_name(&self, name: &str) -> Result<Vec<Stored<Product>>> {
        let guard = self.products.read();
        Ok(guard.table.select(&guard.by_name.get(name)))
    }

    async fn insert_product(&self, product: Product) -> Result<RecordId> {
        let id = self.allocate_id();
        let mut guard = self.products.write();
        guard.by_name.add(&product.name, id);
        guard.table.rows.insert(id, product);
        Ok(id)
    }

    async fn complaints(&self) -> Result<Vec<Stored<Complaint>>> {
        Ok(self.complaints.read().table.all())
    }

    async fn complaints_by_customer(&self, customer_name: &str) -> Result<Vec<Stored<Complaint>>> {
        let guard = self.complaints.read();
        Ok(guard.table.select(&guard.by_customer.get(customer_name)))
    }

    async fn complaints_by_email(&self, email: &str) -> Result<Vec<Stored<Complaint>>> {
        let guard = self.complaints.read();
        Ok(guard.table.select(&guard.by_email.get(email)))
    }

    async fn insert_complaint(&self, complaint: Complaint) -> Result<RecordId> {
        let id = self.allocate_id();
        let mut guard = self.complaints.write();
        guard.by_customer.add(&complaint.customer_name, id);
        guard.by_email.add(&complaint.email, id);
        guard.table.rows.insert(id, complaint);
        Ok(id)
    }

    async fn absences(&self) -> Result<Vec<Stored<Absence>>> {
        Ok(self.absences.read().table.all())
    }

    async fn absences_by_student(&self, student_name: &str) -> Result<Vec<Stored<Absence>>> {
        let guard = self.absences.read();
        Ok(guard.table.select(&guard.by_student.get(student_name)))
    }

    async fn absences_by_parent(&self, parent_name: &str) -> Result<Vec<Stored<Absence>>> {
        let guard = self.absences.read();
        Ok(guard.table.select(&guard.by_parent.get(parent_name)))
    }

    async fn absences_by_date(&self, absent_on: &str) -> Result<Vec<Stored<Absence>>> {
        let guard = self.absences.read();
        Ok(guard.table.select(&guard.by_date.get(absent_on)))
    }

    async fn absences_by_grade(&self, grade: &str) -> Result<Vec<Stored<Absence>>> {
        let guard = self.absences.read();
        Ok(guard.table.select(&guard.by_grade.get(grade)))
    }

    async fn insert_absence(&self, absence: Absence) -> Result<RecordId> {
        let id = self.allocate_id();
        let mut guard = self.absences.write();
        guard.by_student.add(&absence.student_name, id);
        guard.by_parent.add(&absence.parent_name, id);
        guard.by_date.add(&absence.absent_on, id);
        guard.by_grade.add(&absence.grade, id);
        guard.table.rows.insert(id, absence);
        Ok(id)
    }

    async fn patch_absence(&self, id: RecordId, patch: AbsencePatch) -> Result<()> {
        let mut guard = self.absences.write();
        let current = guard.table.rows.get(&id).cloned().ok_or_else(|| {
            tracing::warn!(id, "patch for missing absence");
            OpsdeskError::NotFound(format!("absence {id}"))
        })?;

        let updated = Absence {
            parent_name: patch.parent_name.unwrap_or(current.parent_name.clone()),
            student_name: patch.student_name.unwrap_or(current.student_name.clone()),
            days_absent: patch.days_absent.unwrap_or(current.days_absent),
            absent_on: patch.absent_on.unwrap_or(current.absent_on.clone()),
            grade: patch.grade.unwrap_or(current.grade.clone()),
        };

        if updated.student_name != current.student_name {
            guard.by_student.remove(&current.student_name, id);
            guard.by_student.add(&updated.student_name, id);
        }
        if updated.parent_name != current.parent_name {
            guard.by_parent.remove(&current.parent_name, id);
            guard.by_parent.add(&updated.parent_name, id);
        }
        if updated.absent_on != current.absent_on {
            guard.by_date.remove(&current.absent_on, id);
            guard.by_date.add(&updated.absent_on, id);
        }
        if updated.grade != current.grade {
            guard.by_grade.remove(&current.grade, id);
            guard.by_grade.add(&updated.grade, id);
        }
        guard.table.rows.insert(id, updated);
        Ok(())
    }

    async fn delete_absence(&self, id: RecordId) -> Result<()> {
        let mut guard = self.absences.write();
        let removed = guard.table.rows.remove(&id).ok_or_else(|| {
            tracing::warn!(id, "delete for missing absence");
            OpsdeskError::NotFound(format!("absence {id}"))
        })?;
        guard.by_student.remove(&removed.student_name, id);
        guard.by_parent.remove(&removed.parent_name, id);
        guard.by_date.remove(&removed.absent_on, id);
        guard.by_grade.remove(&removed.grade, id);
        Ok(())
    }

    async fn insert_message(&self, message: ParentMessage) -> Result<RecordId> {
        let id = self.allocate_id();
        self.messages.write().rows.insert(id, message);
        Ok(id)
    }

    async fn messages(&self) -> Result<Vec<Stored<ParentMessage>>> {
        let guard = self.messages.read();
        Ok(guard
            .rows
            .iter()
            .rev()
            .map(|(id, row)| Stored::new(*id, row.clone()))
            .collect())
    }

    async fn mark_message_sent(&self, id: RecordId) -> Result<()> {
        let mut guard = self.messages.write();
        let message = guard.rows.get_mut(&id).ok_or_else(|| {
            tracing::warn!(id, "sent-flag update for missing message");
            OpsdeskError::NotFound(format!("message {id}"))
        })?;
        message.sent = true;
        Ok(())
    }

    async fn append_query_log(&self, entry: QueryLog) -> Result<RecordId> {
        let id = self.allocate_id();
        self.query_log.write().rows.insert(id, entry);
        Ok(id)
    }

    async fn recent_queries(&self, limit: usize) -> Result<Vec<Stored<QueryLog>>> {
        let guard = self.query_log.read();
        Ok(guard
            .rows
            .iter()
            .rev()
            .take(limit)
            .map(|(id, row)| Stored::new(*id, row.clone()))
            .collect())
    }

    async fn queries_between(&self, start: &str, end: &str) -> Result<Vec<Stored<QueryLog>>> {
        let guard = self.query_log.read();
        Ok(guard
            .rows
            .iter()
            .filter(|(_, row)| row.responded_at.as_str() >= start && row.responded_at.as_str() <= end)
            .map(|(id, row)| Stored::new(*id, row.clone()))
            .collect())
    }
}
