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

//! Parent-notification prompt for the absence tracker.

use opsdesk_analytics::StudentSummary;
use serde::{Deserialize, Serialize};

/// Tone requested for the generated parent message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageTone {
    #[default]
    Formal,
    Friendly,
    Serious,
}

impl MessageTone {
    fn label(self) -> &'static str {
        match self {
            MessageTone::Formal => "formal",
            MessageTone::Friendly => "friendly",
            MessageTone::Serious => "serious",
        }
    }

    fn guidance(self) -> &'static str {
        match self {
            MessageTone::Formal => "Be professional and respectful.",
            MessageTone::Friendly => "Be understanding but clear, and offer support.",
            MessageTone::Serious => {
                "Express concern and request a meeting or a conversation."
            }
        }
    }
}

/// Build the generation prompt for a parent-notification message.
///
/// Deterministic: the absence list is rendered in the summary's stored
/// order. The prompt instructs plain text only so the result can be copied
/// into any channel unchanged.
pub fn build_absence_message_prompt(
    summary: &StudentSummary,
    tone: MessageTone,
    language: &str,
) -> String {
    let dates = summary
        .absences
        .iter()
        .map(|a| {
            let unit = if a.days_absent == 1 { "day" } else { "days" };
            format!("{} ({} {})", a.absent_on, a.days_absent, unit)
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are a school assistant drafting messages to parents about their \
         children's absences.\n\n\
         Student information:\n\
         - Student name: {student}\n\
         - Parent name: {parent}\n\
         - Grade: {grade}\n\
         - Total days absent: {total_days}\n\
         - Number of absence records: {records}\n\
         - Absence dates: {dates}\n\n\
         Write a {tone} message for the parent. The message must:\n\
         1. Open with an appropriate salutation addressing {parent}.\n\
         2. Report the absences in a {tone} manner.\n\
         3. Mention the dates and the total days absent.\n\
         4. {guidance}\n\
         5. Close with an appropriate sign-off.\n\
         6. Use plain text only, no markdown.\n\
         7. Write the message in {language}, ready to copy and send.\n\n\
         Produce ONLY the message, with no extra commentary.",
        student = summary.student_name,
        parent = summary.parent_name,
        grade = summary.grade,
        total_days = summary.total_days,
        records = summary.total_records,
        dates = dates,
        tone = tone.label(),
        guidance = tone.guidance(),
        language = language,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsdesk_analytics::student_summary;
    use opsdesk_core::Absence;

    fn fixture() -> StudentSummary {
        let absences = vec![
            Absence {
                parent_name: "Maria".to_string(),
                student_name: "Luis".to_string(),
                days_absent: 1,
                absent_on: "2026-02-03".to_string(),
                grade: "3B".to_string(),
            },
            Absence {
                parent_name: "Maria".to_string(),
                student_name: "Luis".to_string(),
                days_absent: 2,
                absent_on: "2026-02-10".to_string(),
                grade: "3B".to_string(),
            },
        ];
        student_summary(&absences, "Luis").unwrap()
    }

    #[test]
    fn prompt_carries_dates_and_totals() {
        let prompt = build_absence_message_prompt(&fixture(), MessageTone::Formal, "Spanish");
        assert!(prompt.contains("2026-02-03 (1 day), 2026-02-10 (2 days)"));
        assert!(prompt.contains("Total days absent: 3"));
        assert!(prompt.contains("Write a formal message"));
        assert!(prompt.contains("in Spanish"));
    }

    #[test]
    fn serious_tone_requests_a_meeting() {
        let prompt = build_absence_message_prompt(&fixture(), MessageTone::Serious, "Spanish");
        assert!(prompt.contains("request a meeting"));
    }

    #[test]
    fn prompt_is_deterministic() {
        let summary = fixture();
        let a = build_absence_message_prompt(&summary, MessageTone::Friendly, "English");
        let b = build_absence_message_prompt(&summary, MessageTone::Friendly, "English");
        assert_eq!(a, b);
    }
}
