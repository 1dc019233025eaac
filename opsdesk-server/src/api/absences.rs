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

//! Absence tracker: registration, ranking, and parent-message generation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use opsdesk_analytics::{student_summary, students_by_total_days};
use opsdesk_core::{now_iso, Absence, AbsencePatch, ParentMessage, RecordId};
use opsdesk_prompts::{build_absence_message_prompt, MessageTone};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{ApiError, AppState};
use crate::llm::ChatMessage;

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: RecordId,
}

/// GET /api/v1/absences
pub async fn list_absences(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let absences = state.store.absences().await?;
    Ok(Json(absences))
}

/// POST /api/v1/absences
pub async fn register_absence(
    State(state): State<AppState>,
    Json(absence): Json<Absence>,
) -> Result<impl IntoResponse, ApiError> {
    if absence.student_name.trim().is_empty() || absence.parent_name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "student_name and parent_name are required".to_string(),
        ));
    }
    if absence.days_absent == 0 {
        return Err(ApiError::BadRequest(
            "days_absent must be positive".to_string(),
        ));
    }
    let id = state.store.insert_absence(absence).await?;
    info!(id, "absence registered");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// PATCH /api/v1/absences/:id
pub async fn patch_absence(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Json(patch): Json<AbsencePatch>,
) -> Result<impl IntoResponse, ApiError> {
    if patch.is_empty() {
        return Err(ApiError::BadRequest("empty patch".to_string()));
    }
    if patch.days_absent == Some(0) {
        return Err(ApiError::BadRequest(
            "days_absent must be positive".to_string(),
        ));
    }
    state.store.patch_absence(id, patch).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/absences/:id
pub async fn delete_absence(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.delete_absence(id).await?;
    info!(id, "absence deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/absences/ranking
///
/// Students by total absent days, most absent first.
pub async fn absence_ranking(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let absences: Vec<Absence> = state
        .store
        .absences()
        .await?
        .into_iter()
        .map(|s| s.record)
        .collect();
    Ok(Json(students_by_total_days(&absences)))
}

/// GET /api/v1/absences/student/:name
///
/// 404 when the student has no absence records.
pub async fn student_absence_summary(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = fetch_student_summary(&state, &name).await?;
    Ok(Json(summary))
}

/// GET /api/v1/absences/parent/:name
pub async fn parent_absences(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let absences = state.store.absences_by_parent(&name).await?;
    Ok(Json(absences))
}

/// GET /api/v1/absences/date/:date
pub async fn date_absences(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let absences = state.store.absences_by_date(&date).await?;
    Ok(Json(absences))
}

/// GET /api/v1/absences/grade/:grade
pub async fn grade_absences(
    State(state): State<AppState>,
    Path(grade): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let absences = state.store.absences_by_grade(&grade).await?;
    Ok(Json(absences))
}

#[derive(Debug, Deserialize)]
pub struct GenerateMessageRequest {
    pub student_name: String,
    #[serde(default)]
    pub tone: MessageTone,
}

#[derive(Debug, Serialize)]
pub struct GenerateMessageResponse {
    pub id: RecordId,
    pub message: String,
    pub total_absences: u32,
}

/// POST /api/v1/messages
///
/// Drafts a parent message over the student's full absence history and
/// persists it unsent. Sending is a human decision; the server only records
/// the transition via `mark_sent`.
pub async fn generate_message(
    State(state): State<AppState>,
    Json(request): Json<GenerateMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = fetch_student_summary(&state, &request.student_name).await?;

    let prompt =
        build_absence_message_prompt(&summary, request.tone, &state.config.chat.language);
    let response = state
        .llm
        .chat(vec![ChatMessage::user(prompt)], None)
        .await
        .map_err(|e| ApiError::Gateway(e.to_string()))?;

    let total_absences = saturating_day_count(summary.total_days);
    let message = ParentMessage {
        parent_name: summary.parent_name,
        student_name: summary.student_name,
        message: response.content.clone(),
        total_absences,
        generated_at: now_iso(),
        sent: false,
    };
    let id = state.store.insert_message(message).await?;
    info!(id, student = %request.student_name, "parent message generated");

    Ok((
        StatusCode::CREATED,
        Json(GenerateMessageResponse {
            id,
            message: response.content,
            total_absences,
        }),
    ))
}

/// GET /api/v1/messages
pub async fn list_messages(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let messages = state.store.messages().await?;
    Ok(Json(messages))
}

/// POST /api/v1/messages/:id/sent
pub async fn mark_sent(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.mark_message_sent(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The message snapshot stores the day count as u32; totals beyond that
/// saturate instead of wrapping.
fn saturating_day_count(total_days: u64) -> u32 {
    u32::try_from(total_days).unwrap_or(u32::MAX)
}

async fn fetch_student_summary(
    state: &AppState,
    student_name: &str,
) -> Result<opsdesk_analytics::StudentSummary, ApiError> {
    let absences: Vec<Absence> = state
        .store
        .absences_by_student(student_name)
        .await?
        .into_iter()
        .map(|s| s.record)
        .collect();
    student_summary(&absences, student_name).ok_or_else(|| {
        ApiError::NotFound(format!("no absence records for student {student_name}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_count_saturates_instead_of_wrapping() {
        assert_eq!(saturating_day_count(3), 3);
        assert_eq!(saturating_day_count(u32::MAX as u64), u32::MAX);
        assert_eq!(saturating_day_count(u32::MAX as u64 + 1), u32::MAX);
    }
}
