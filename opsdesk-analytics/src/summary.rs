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

//! Executive summary over the four transactional collections.

use opsdesk_core::{Complaint, Customer, Product, Sale};
use serde::{Deserialize, Serialize};

/// Fixed-shape executive summary.
///
/// `average_amount` is guarded: it is `0.0` over an empty sale set, never
/// NaN/Infinity, so every consumer can format it as a plain number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSummary {
    pub total_customers: u64,
    pub total_sales: u64,
    pub total_complaints: u64,
    pub total_products: u64,
    pub total_amount: f64,
    pub average_amount: f64,
    pub products_in_stock: u64,
}

/// Whether a sale amount is usable in monetary sums.
pub(crate) fn amount_is_well_formed(amount: f64) -> bool {
    amount.is_finite() && amount >= 0.0
}

/// Compute the executive summary over the full record collections.
///
/// Pure function of its inputs. Row counts cover every record; monetary
/// sums and the average consider only well-formed amounts, so a single
/// corrupt row cannot poison the totals.
pub fn compute_summary(
    customers: &[Customer],
    sales: &[Sale],
    complaints: &[Complaint],
    products: &[Product],
) -> DataSummary {
    let mut total_amount = 0.0f64;
    let mut priced_sales = 0u64;
    for sale in sales {
        if amount_is_well_formed(sale.amount) {
            total_amount += sale.amount;
            priced_sales += 1;
        }
    }

    let average_amount = if priced_sales > 0 {
        total_amount / priced_sales as f64
    } else {
        0.0
    };

    DataSummary {
        total_customers: customers.len() as u64,
        total_sales: sales.len() as u64,
        total_complaints: complaints.len() as u64,
        total_products: products.len() as u64,
        total_amount,
        average_amount,
        products_in_stock: products.iter().filter(|p| p.stock > 0).count() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale(customer: &str, product: &str, quantity: u32, amount: f64) -> Sale {
        Sale {
            customer_name: customer.to_string(),
            product_name: product.to_string(),
            quantity,
            amount,
            sold_on: "2026-02-01".to_string(),
        }
    }

    #[test]
    fn empty_collections_yield_all_zeros() {
        let summary = compute_summary(&[], &[], &[], &[]);
        assert_eq!(summary, DataSummary::default());
        assert_eq!(summary.average_amount, 0.0);
    }

    #[test]
    fn average_is_sum_over_count() {
        let sales = vec![sale("Ana", "Laptop", 2, 3000.0), sale("Ana", "Mouse", 1, 30.0)];
        let summary = compute_summary(&[], &sales, &[], &[]);
        assert_eq!(summary.total_sales, 2);
        assert_eq!(summary.total_amount, 3030.0);
        assert_eq!(summary.average_amount, 1515.0);
        assert_eq!(format!("{:.2}", summary.average_amount), "1515.00");
    }

    #[test]
    fn malformed_amounts_do_not_poison_totals() {
        let sales = vec![
            sale("Ana", "Laptop", 1, 100.0),
            sale("Ana", "Mouse", 1, f64::NAN),
            sale("Ana", "Cable", 1, -5.0),
        ];
        let summary = compute_summary(&[], &sales, &[], &[]);
        assert_eq!(summary.total_sales, 3);
        assert_eq!(summary.total_amount, 100.0);
        assert_eq!(summary.average_amount, 100.0);
        assert!(summary.average_amount.is_finite());
    }

    #[test]
    fn products_in_stock_counts_nonzero_stock_only() {
        let products = vec![
            Product {
                name: "Laptop".into(),
                description: String::new(),
                price: 1500.0,
                stock: 3,
            },
            Product {
                name: "Mouse".into(),
                description: String::new(),
                price: 30.0,
                stock: 0,
            },
        ];
        let summary = compute_summary(&[], &[], &[], &products);
        assert_eq!(summary.total_products, 2);
        assert_eq!(summary.products_in_stock, 1);
    }
}
