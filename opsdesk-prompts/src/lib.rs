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

//! Opsdesk Prompts
//!
//! Pure text assembly for the generative-text gateway: the grounding
//! context block for the sales chat and the parent-notification prompt.
//! Nothing here calls the gateway or persists anything.

pub mod absence_message;
pub mod context;

pub use absence_message::{build_absence_message_prompt, MessageTone};
pub use context::{ContextBuilder, ContextConfig, Section};
