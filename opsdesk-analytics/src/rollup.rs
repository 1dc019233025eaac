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

//! Per-key rollups over the sale collection.
//!
//! The grouping key is the raw name string; no case or whitespace
//! normalization is applied, so callers must pass consistent keys or accept
//! fragmented groups (see `join`).

use crate::summary::amount_is_well_formed;
use opsdesk_core::Sale;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Running totals for one rollup group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaleRollup {
    pub quantity: u64,
    pub amount: f64,
    pub count: u64,
}

impl SaleRollup {
    fn add(&mut self, sale: &Sale) {
        self.quantity += sale.quantity as u64;
        self.amount += sale.amount;
        self.count += 1;
    }

    /// Average unit price across the group.
    ///
    /// Guarded: a group whose total quantity is zero displays a unit price
    /// of 0 while its rows still count toward `amount` and `count`.
    pub fn average_unit_price(&self) -> f64 {
        if self.quantity == 0 {
            0.0
        } else {
            self.amount / self.quantity as f64
        }
    }
}

/// Rollup output: deterministic key order plus a malformed-row count.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RollupReport {
    pub groups: BTreeMap<String, SaleRollup>,
    /// Rows skipped because their amount was non-finite or negative.
    pub skipped: usize,
}

impl RollupReport {
    pub fn get(&self, key: &str) -> Option<&SaleRollup> {
        self.groups.get(key)
    }
}

/// Per-line unit price, guarded against zero-quantity rows.
pub fn unit_price(sale: &Sale) -> f64 {
    if sale.quantity == 0 {
        0.0
    } else {
        sale.amount / sale.quantity as f64
    }
}

/// Group sales by an extracted key and accumulate quantity/amount/count.
///
/// Malformed rows are skipped and counted, never aborting the rollup.
pub fn rollup_by<F>(sales: &[Sale], key: F) -> RollupReport
where
    F: Fn(&Sale) -> &str,
{
    let mut report = RollupReport::default();
    for sale in sales {
        if !amount_is_well_formed(sale.amount) {
            report.skipped += 1;
            continue;
        }
        report
            .groups
            .entry(key(sale).to_string())
            .or_default()
            .add(sale);
    }
    if report.skipped > 0 {
        tracing::debug!(skipped = report.skipped, "rollup skipped malformed sales");
    }
    report
}

/// Single-group rollup over a slice, with the same malformed-row handling
/// as `rollup_by`. Returns the totals and the skipped count.
pub fn rollup_all(sales: &[Sale]) -> (SaleRollup, usize) {
    let mut totals = SaleRollup::default();
    let mut skipped = 0;
    for sale in sales {
        if !amount_is_well_formed(sale.amount) {
            skipped += 1;
            continue;
        }
        totals.add(sale);
    }
    (totals, skipped)
}

/// Rollup keyed by customer name.
pub fn rollup_by_customer(sales: &[Sale]) -> RollupReport {
    rollup_by(sales, |s| s.customer_name.as_str())
}

/// Rollup keyed by product name.
pub fn rollup_by_product(sales: &[Sale]) -> RollupReport {
    rollup_by(sales, |s| s.product_name.as_str())
}
