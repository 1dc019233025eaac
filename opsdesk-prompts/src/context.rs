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

//! Grounding-context assembly for the sales chat.
//!
//! The builder is a pure transform: identical inputs produce byte-identical
//! text, which keeps it cacheable and trivially testable. Empty collections
//! are stated as "no records" so the downstream model does not hallucinate
//! data, and a section whose upstream fetch failed is marked unavailable
//! instead of failing the whole pipeline.

use opsdesk_analytics::{rollup::unit_price, DataSummary};
use opsdesk_core::{Complaint, Customer, Product, Sale};

/// One grounding section: fetched rows, or a failed upstream fetch.
#[derive(Debug, Clone, Copy)]
pub enum Section<'a, T> {
    Available(&'a [T]),
    Unavailable,
}

/// Context assembly settings.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Language the model is instructed to answer in.
    pub language: String,
    /// Row cap per section, keeping the block bounded for large stores.
    pub max_rows_per_section: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            language: "Spanish".to_string(),
            max_rows_per_section: 50,
        }
    }
}

/// Assembles the system-prompt context block for the sales chat.
pub struct ContextBuilder {
    config: ContextConfig,
}

impl ContextBuilder {
    pub fn new(config: ContextConfig) -> Self {
        Self { config }
    }

    /// Serialize the collections and summary into the grounding block.
    ///
    /// No side effects; the caller owns gateway invocation and any
    /// persistence of the resulting conversation.
    pub fn build(
        &self,
        customers: Section<'_, Customer>,
        sales: Section<'_, Sale>,
        complaints: Section<'_, Complaint>,
        products: Section<'_, Product>,
        summary: Option<&DataSummary>,
    ) -> String {
        let mut out = String::new();

        out.push_str("SALES DATA ANALYSIS ASSISTANT\n\n");
        out.push_str(
            "You are a data analyst for a small business. You answer questions about \
             customers, sales, complaints, and products.\n\n",
        );
        out.push_str("CURRENT DATABASE SNAPSHOT\n\n");

        self.push_summary(&mut out, summary);
        self.push_section(&mut out, "CUSTOMERS", customers, |c: &Customer| {
            format!("  - {} | Email: {} | Phone: {}", c.name, c.email, c.phone)
        });
        self.push_section(&mut out, "SALES", sales, |s: &Sale| {
            format!(
                "  - {} - {}: {} units x ${:.2} = ${:.2}",
                s.customer_name,
                s.product_name,
                s.quantity,
                unit_price(s),
                s.amount
            )
        });
        self.push_section(&mut out, "COMPLAINTS", complaints, |c: &Complaint| {
            format!("  - {}: \"{}\" ({})", c.customer_name, c.description, c.filed_on)
        });
        self.push_section(&mut out, "PRODUCTS", products, |p: &Product| {
            format!("  - {}: ${:.2} | Stock: {} units", p.name, p.price, p.stock)
        });

        out.push_str("INSTRUCTIONS:\n");
        out.push_str("1. Use ONLY the data above. Never invent records or figures.\n");
        out.push_str(&format!(
            "2. Respond in {}, clearly and professionally.\n",
            self.config.language
        ));
        out.push_str("3. Include concrete numbers and comparisons where relevant.\n");
        out.push_str(
            "4. If asked about something with no rows above, answer that there are no \
             records of it in the current data.\n",
        );
        out
    }

    fn push_summary(&self, out: &mut String, summary: Option<&DataSummary>) {
        out.push_str("GENERAL STATISTICS:\n");
        match summary {
            Some(s) => {
                out.push_str(&format!("- Total customers: {}\n", s.total_customers));
                out.push_str(&format!("- Total sales: {}\n", s.total_sales));
                out.push_str(&format!("- Total sales amount: ${:.2}\n", s.total_amount));
                out.push_str(&format!("- Average sale: ${:.2}\n", s.average_amount));
                out.push_str(&format!("- Products in stock: {}\n", s.products_in_stock));
                out.push_str(&format!("- Complaints on file: {}\n", s.total_complaints));
            }
            None => out.push_str("  (section unavailable)\n"),
        }
        out.push('\n');
    }

    fn push_section<T, F>(&self, out: &mut String, title: &str, section: Section<'_, T>, line: F)
    where
        F: Fn(&T) -> String,
    {
        match section {
            Section::Unavailable => {
                out.push_str(&format!("{title}:\n"));
                out.push_str("  (section unavailable)\n");
            }
            Section::Available(rows) if rows.is_empty() => {
                out.push_str(&format!("{title} (0 total):\n"));
                out.push_str("  (no records)\n");
            }
            Section::Available(rows) => {
                out.push_str(&format!("{title} ({} total):\n", rows.len()));
                for row in rows.iter().take(self.config.max_rows_per_section) {
                    out.push_str(&line(row));
                    out.push('\n');
                }
                if rows.len() > self.config.max_rows_per_section {
                    out.push_str(&format!(
                        "  ... and {} more\n",
                        rows.len() - self.config.max_rows_per_section
                    ));
                }
            }
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsdesk_analytics::compute_summary;

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
    fn identical_inputs_produce_identical_text() {
        let sales = vec![sale("Ana", "Laptop", 2, 3000.0)];
        let summary = compute_summary(&[], &sales, &[], &[]);
        let builder = ContextBuilder::new(ContextConfig::default());

        let first = builder.build(
            Section::Available(&[]),
            Section::Available(&sales),
            Section::Available(&[]),
            Section::Available(&[]),
            Some(&summary),
        );
        let second = builder.build(
            Section::Available(&[]),
            Section::Available(&sales),
            Section::Available(&[]),
            Section::Available(&[]),
            Some(&summary),
        );
        assert_eq!(first, second);
    }

    #[test]
    fn empty_sections_state_no_records() {
        let builder = ContextBuilder::new(ContextConfig::default());
        let text = builder.build(
            Section::Available(&[]),
            Section::Available(&[]),
            Section::Available(&[]),
            Section::Available(&[]),
            None,
        );
        assert!(text.contains("CUSTOMERS (0 total):\n  (no records)"));
        assert!(text.contains("GENERAL STATISTICS:\n  (section unavailable)"));
    }

    #[test]
    fn failed_fetch_marks_section_unavailable() {
        let builder = ContextBuilder::new(ContextConfig::default());
        let text = builder.build(
            Section::Unavailable,
            Section::Available(&[]),
            Section::Available(&[]),
            Section::Available(&[]),
            None,
        );
        assert!(text.contains("CUSTOMERS:\n  (section unavailable)"));
        // The block stays well formed around the failed section.
        assert!(text.contains("INSTRUCTIONS:"));
    }

    #[test]
    fn sale_lines_carry_guarded_unit_price() {
        let sales = vec![sale("Ana", "Laptop", 2, 3000.0), sale("Ana", "Voucher", 0, 50.0)];
        let builder = ContextBuilder::new(ContextConfig::default());
        let text = builder.build(
            Section::Available(&[]),
            Section::Available(&sales),
            Section::Available(&[]),
            Section::Available(&[]),
            None,
        );
        assert!(text.contains("  - Ana - Laptop: 2 units x $1500.00 = $3000.00"));
        assert!(text.contains("  - Ana - Voucher: 0 units x $0.00 = $50.00"));
    }

    #[test]
    fn long_sections_are_truncated_deterministically() {
        let sales: Vec<Sale> = (0..5).map(|i| sale("Ana", &format!("P{i}"), 1, 1.0)).collect();
        let builder = ContextBuilder::new(ContextConfig {
            language: "English".to_string(),
            max_rows_per_section: 3,
        });
        let text = builder.build(
            Section::Available(&[]),
            Section::Available(&sales),
            Section::Available(&[]),
            Section::Available(&[]),
            None,
        );
        assert!(text.contains("SALES (5 total):"));
        assert!(text.contains("  ... and 2 more"));
        assert!(!text.contains("P3"));
    }
}
