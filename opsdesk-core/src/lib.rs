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

//! Opsdesk Core
//!
//! Fundamental record types shared by the store, the aggregation engine,
//! and the HTTP surface.

pub mod error;
pub mod record;
pub mod time;

pub use error::{OpsdeskError, Result};
pub use record::{
    Absence, AbsencePatch, Complaint, Customer, ParentMessage, Product, QueryLog, RecordId, Sale,
    Stored,
};
pub use time::now_iso;
