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

//! Customer tiering and complaint-pattern analysis.

use crate::rollup::RollupReport;
use opsdesk_core::Complaint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Customer classification bucket derived from purchase count.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Vip,
    Regular,
    Occasional,
}

/// Business-configured tier boundaries, always supplied by the caller.
///
/// A customer with at least `vip_min_purchases` transactions is VIP, at
/// least `regular_min_purchases` is regular, anything below is occasional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentThresholds {
    pub vip_min_purchases: u64,
    pub regular_min_purchases: u64,
}

impl Default for SegmentThresholds {
    fn default() -> Self {
        // 5+ purchases VIP, 2-4 regular, 1 occasional.
        Self {
            vip_min_purchases: 5,
            regular_min_purchases: 2,
        }
    }
}

impl SegmentThresholds {
    pub fn classify(&self, purchase_count: u64) -> Tier {
        if purchase_count >= self.vip_min_purchases {
            Tier::Vip
        } else if purchase_count >= self.regular_min_purchases {
            Tier::Regular
        } else {
            Tier::Occasional
        }
    }
}

/// Partition rollup keys into tiers.
///
/// Every customer present in the rollup lands in exactly one tier; the
/// union of all tiers is the full key set. Customer lists stay in the
/// rollup's deterministic key order.
pub fn segment_customers(
    by_customer: &RollupReport,
    thresholds: SegmentThresholds,
) -> BTreeMap<Tier, Vec<String>> {
    let mut tiers: BTreeMap<Tier, Vec<String>> = BTreeMap::new();
    tiers.insert(Tier::Vip, Vec::new());
    tiers.insert(Tier::Regular, Vec::new());
    tiers.insert(Tier::Occasional, Vec::new());

    for (name, rollup) in &by_customer.groups {
        let tier = thresholds.classify(rollup.count);
        tiers.entry(tier).or_default().push(name.clone());
    }
    tiers
}

/// Frequency of one complaint category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplaintPattern {
    pub category: String,
    pub count: u64,
    /// Share of all complaints, 0–100.
    pub percent: f64,
}

/// Category bucket for complaints the categorizer does not recognize.
pub const UNCATEGORIZED: &str = "other";

/// Group complaints by a caller-supplied categorization function.
///
/// `None` from the categorizer lands in the [`UNCATEGORIZED`] bucket, so
/// percentages across the output always sum to 100 (or to nothing over an
/// empty input). Output is sorted descending by count, ties by category
/// name ascending.
pub fn complaint_patterns<F>(complaints: &[Complaint], categorize: F) -> Vec<ComplaintPattern>
where
    F: Fn(&Complaint) -> Option<String>,
{
    if complaints.is_empty() {
        return Vec::new();
    }

    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for complaint in complaints {
        let category = categorize(complaint).unwrap_or_else(|| UNCATEGORIZED.to_string());
        *counts.entry(category).or_default() += 1;
    }

    let total = complaints.len() as f64;
    let mut patterns: Vec<ComplaintPattern> = counts
        .into_iter()
        .map(|(category, count)| ComplaintPattern {
            category,
            count,
            percent: count as f64 / total * 100.0,
        })
        .collect();
    patterns.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
    patterns
}

/// Build a categorizer from `(category, keywords)` rules.
///
/// Matching is case-insensitive on both sides; the first rule with a
/// keyword contained in the description wins, so rule order is the
/// caller's priority order.
pub fn keyword_categorizer(
    rules: &[(String, Vec<String>)],
) -> impl Fn(&Complaint) -> Option<String> + '_ {
    move |complaint: &Complaint| {
        let description = complaint.description.to_lowercase();
        rules
            .iter()
            .find(|(_, keywords)| {
                keywords
                    .iter()
                    .any(|k| description.contains(&k.to_lowercase()))
            })
            .map(|(category, _)| category.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rollup::rollup_by_customer;
    use opsdesk_core::Sale;

    fn sales_for(customer: &str, count: usize) -> Vec<Sale> {
        (0..count)
            .map(|i| Sale {
                customer_name: customer.to_string(),
                product_name: format!("Item{i}"),
                quantity: 1,
                amount: 10.0,
                sold_on: "2026-02-01".to_string(),
            })
            .collect()
    }

    fn complaint(description: &str) -> Complaint {
        Complaint {
            customer_name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            phone: String::new(),
            description: description.to_string(),
            filed_on: "2026-02-01".to_string(),
        }
    }

    #[test]
    fn tiers_partition_the_customer_set() {
        let mut sales = sales_for("Vera", 6);
        sales.extend(sales_for("Rita", 3));
        sales.extend(sales_for("Omar", 1));
        let report = rollup_by_customer(&sales);

        let tiers = segment_customers(&report, SegmentThresholds::default());
        assert_eq!(tiers[&Tier::Vip], vec!["Vera".to_string()]);
        assert_eq!(tiers[&Tier::Regular], vec!["Rita".to_string()]);
        assert_eq!(tiers[&Tier::Occasional], vec!["Omar".to_string()]);

        let assigned: usize = tiers.values().map(|v| v.len()).sum();
        assert_eq!(assigned, report.groups.len());
    }

    #[test]
    fn thresholds_are_caller_tunable() {
        let thresholds = SegmentThresholds {
            vip_min_purchases: 2,
            regular_min_purchases: 1,
        };
        assert_eq!(thresholds.classify(2), Tier::Vip);
        assert_eq!(thresholds.classify(1), Tier::Regular);
        assert_eq!(thresholds.classify(0), Tier::Occasional);
    }

    #[test]
    fn complaint_percentages_sum_to_hundred() {
        let rules = vec![
            ("shipping".to_string(), vec!["late".to_string(), "delay".to_string()]),
            ("quality".to_string(), vec!["broken".to_string(), "damaged".to_string()]),
        ];
        let complaints = vec![
            complaint("Package arrived late"),
            complaint("Item was broken on arrival"),
            complaint("Damaged box"),
            complaint("Nobody answers the phone"),
        ];

        let patterns = complaint_patterns(&complaints, keyword_categorizer(&rules));
        let total_percent: f64 = patterns.iter().map(|p| p.percent).sum();
        assert!((total_percent - 100.0).abs() < 1e-9);

        assert_eq!(patterns[0].category, "quality");
        assert_eq!(patterns[0].count, 2);
        assert!(patterns.iter().any(|p| p.category == UNCATEGORIZED));
    }

    #[test]
    fn keyword_match_ignores_case_on_both_sides() {
        let rules = vec![("quality".to_string(), vec!["Broken".to_string()])];
        let categorize = keyword_categorizer(&rules);
        assert_eq!(
            categorize(&complaint("The screen arrived BROKEN")),
            Some("quality".to_string())
        );
        assert_eq!(categorize(&complaint("Works fine")), None);
    }

    #[test]
    fn empty_complaints_yield_empty_patterns() {
        let patterns = complaint_patterns(&[], |_| None);
        assert!(patterns.is_empty());
    }
}
