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

//! Opsdesk Aggregation Engine
//!
//! Pure, synchronous functions deriving summaries, rollups, rankings, and
//! segment buckets from raw record collections. Nothing here mutates its
//! inputs or performs I/O; every invocation is independent and idempotent
//! given the same snapshot of input collections.
//!
//! Empty inputs are never an error: sums and averages over zero records
//! yield zero. Malformed records (non-finite or negative amounts) are
//! skipped and counted, never aborting an aggregation.

pub mod absence;
pub mod join;
pub mod ranking;
pub mod rollup;
pub mod segment;
pub mod summary;

pub use absence::{student_summary, students_by_total_days, StudentAbsenceTotal, StudentSummary};
pub use ranking::{top_customers_by_spend, top_n, top_products_by_units};
pub use rollup::{
    rollup_all, rollup_by, rollup_by_customer, rollup_by_product, RollupReport, SaleRollup,
};
pub use segment::{
    complaint_patterns, keyword_categorizer, segment_customers, ComplaintPattern,
    SegmentThresholds, Tier,
};
pub use summary::{compute_summary, DataSummary};
