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

//! Name-based joins between record kinds.
//!
//! Joins are best-effort raw string equality with no case or whitespace
//! normalization ("Ana" and "ana" are different customers). All aggregation
//! call sites go through these helpers so the join key can later move to a
//! stable identifier without touching the aggregation logic.

use opsdesk_core::{Complaint, Customer, Sale};

/// Sales whose customer name exactly matches `customer_name`.
pub fn sales_for_customer<'a>(sales: &'a [Sale], customer_name: &str) -> Vec<&'a Sale> {
    sales
        .iter()
        .filter(|s| s.customer_name == customer_name)
        .collect()
}

/// Complaints whose customer name exactly matches `customer_name`.
pub fn complaints_for_customer<'a>(
    complaints: &'a [Complaint],
    customer_name: &str,
) -> Vec<&'a Complaint> {
    complaints
        .iter()
        .filter(|c| c.customer_name == customer_name)
        .collect()
}

/// The customer record a sale refers to, when exactly one matches.
pub fn customer_for_sale<'a>(customers: &'a [Customer], sale: &Sale) -> Option<&'a Customer> {
    let mut matches = customers.iter().filter(|c| c.name == sale.customer_name);
    let first = matches.next()?;
    if matches.next().is_some() {
        return None;
    }
    Some(first)
}
