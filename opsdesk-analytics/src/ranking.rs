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

//! Bounded, ordered ranking extraction (top-N).

use crate::rollup::RollupReport;
use crate::SaleRollup;
use std::cmp::Ordering;

/// Select the top `n` items, descending by `metric`.
///
/// Ties are broken by `tie_break` ascending so output is reproducible for
/// any input order. Returns `min(n, items.len())` items; a limit beyond the
/// available count is not an error. NaN metrics sort last.
pub fn top_n<T, M, K, O>(items: &[T], n: usize, metric: M, tie_break: K) -> Vec<T>
where
    T: Clone,
    M: Fn(&T) -> f64,
    K: Fn(&T) -> O,
    O: Ord,
{
    let mut ranked: Vec<T> = items.to_vec();
    ranked.sort_by(|a, b| {
        descending(metric(a), metric(b)).then_with(|| tie_break(a).cmp(&tie_break(b)))
    });
    ranked.truncate(n);
    ranked
}

fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Top products by units sold, ties broken by product name ascending.
pub fn top_products_by_units(by_product: &RollupReport, n: usize) -> Vec<(String, SaleRollup)> {
    let entries: Vec<(String, SaleRollup)> = by_product
        .groups
        .iter()
        .map(|(name, rollup)| (name.clone(), rollup.clone()))
        .collect();
    top_n(&entries, n, |(_, r)| r.quantity as f64, |(name, _)| name.clone())
}

/// Top customers by spend, ties broken by customer name ascending.
pub fn top_customers_by_spend(by_customer: &RollupReport, n: usize) -> Vec<(String, SaleRollup)> {
    let entries: Vec<(String, SaleRollup)> = by_customer
        .groups
        .iter()
        .map(|(name, rollup)| (name.clone(), rollup.clone()))
        .collect();
    top_n(&entries, n, |(_, r)| r.amount, |(name, _)| name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rollup::rollup_by_product;
    use opsdesk_core::Sale;
    use proptest::prelude::*;

    fn sale(product: &str, quantity: u32) -> Sale {
        Sale {
            customer_name: "Ana".to_string(),
            product_name: product.to_string(),
            quantity,
            amount: 10.0 * quantity as f64,
            sold_on: "2026-02-01".to_string(),
        }
    }

    #[test]
    fn returns_three_highest_of_five_with_name_ties() {
        let sales = vec![
            sale("Webcam", 28),
            sale("Laptop", 45),
            sale("Monitor", 32),
            sale("Mouse", 120),
            sale("Keyboard", 45),
        ];
        let top = top_products_by_units(&rollup_by_product(&sales), 3);
        let names: Vec<&str> = top.iter().map(|(n, _)| n.as_str()).collect();
        // Keyboard and Laptop tie at 45; name ascending puts Keyboard first.
        assert_eq!(names, vec!["Mouse", "Keyboard", "Laptop"]);
    }

    #[test]
    fn limit_beyond_available_returns_everything() {
        let sales = vec![sale("Mouse", 1), sale("Laptop", 2)];
        let top = top_products_by_units(&rollup_by_product(&sales), 10);
        assert_eq!(top.len(), 2);
    }

    #[test]
    fn empty_input_yields_empty_ranking() {
        let top = top_products_by_units(&RollupReport::default(), 3);
        assert!(top.is_empty());
    }

    #[test]
    fn nan_metrics_sort_last() {
        let items = vec![("a", f64::NAN), ("b", 1.0), ("c", 2.0)];
        let top = top_n(&items, 3, |(_, m)| *m, |(k, _)| *k);
        let keys: Vec<&str> = top.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["c", "b", "a"]);
    }

    proptest! {
        #[test]
        fn length_is_min_of_n_and_available(
            metrics in prop::collection::vec(0u32..1000, 0..30),
            n in 0usize..40,
        ) {
            let items: Vec<(usize, u32)> = metrics.into_iter().enumerate().collect();
            let top = top_n(&items, n, |(_, m)| *m as f64, |(i, _)| *i);
            prop_assert_eq!(top.len(), n.min(items.len()));
            for pair in top.windows(2) {
                prop_assert!(pair[0].1 >= pair[1].1);
            }
        }
    }
}
