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

//! Per-student absence rollups.

use opsdesk_core::Absence;
use serde::Serialize;
use std::collections::BTreeMap;

/// Total days absent for one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentAbsenceTotal {
    pub student_name: String,
    pub total_days: u64,
}

/// Accumulate total absent days per student, sorted descending.
///
/// Ties are broken by student name ascending so the ranking is stable for
/// any input order. Grouping is by raw name string.
pub fn students_by_total_days(absences: &[Absence]) -> Vec<StudentAbsenceTotal> {
    let mut totals: BTreeMap<String, u64> = BTreeMap::new();
    for absence in absences {
        *totals.entry(absence.student_name.clone()).or_default() += absence.days_absent as u64;
    }

    let mut ranked: Vec<StudentAbsenceTotal> = totals
        .into_iter()
        .map(|(student_name, total_days)| StudentAbsenceTotal {
            student_name,
            total_days,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.total_days
            .cmp(&a.total_days)
            .then_with(|| a.student_name.cmp(&b.student_name))
    });
    ranked
}

/// Complete absence picture for one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentSummary {
    pub student_name: String,
    /// Parent name from the most recent record.
    pub parent_name: String,
    /// Grade label from the most recent record.
    pub grade: String,
    pub total_days: u64,
    pub total_records: u64,
    pub absences: Vec<Absence>,
}

/// Summarize one student's absences, or `None` when there are no rows.
///
/// Parent and grade come from the most recent record since both can change
/// over a school year.
pub fn student_summary(absences: &[Absence], student_name: &str) -> Option<StudentSummary> {
    let mut rows: Vec<Absence> = absences
        .iter()
        .filter(|a| a.student_name == student_name)
        .cloned()
        .collect();
    if rows.is_empty() {
        return None;
    }

    rows.sort_by(|a, b| a.absent_on.cmp(&b.absent_on));
    let latest = rows.last().expect("rows is non-empty");

    Some(StudentSummary {
        student_name: student_name.to_string(),
        parent_name: latest.parent_name.clone(),
        grade: latest.grade.clone(),
        total_days: rows.iter().map(|a| a.days_absent as u64).sum(),
        total_records: rows.len() as u64,
        absences: rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn absence(student: &str, parent: &str, days: u32, date: &str, grade: &str) -> Absence {
        Absence {
            parent_name: parent.to_string(),
            student_name: student.to_string(),
            days_absent: days,
            absent_on: date.to_string(),
            grade: grade.to_string(),
        }
    }

    #[test]
    fn totals_rank_descending_with_name_ties() {
        let absences = vec![
            absence("Luis", "Maria", 2, "2026-02-01", "3B"),
            absence("Sofia", "Pedro", 3, "2026-02-02", "2A"),
            absence("Luis", "Maria", 1, "2026-02-03", "3B"),
            absence("Diego", "Juan", 3, "2026-02-04", "1C"),
        ];
        let ranked = students_by_total_days(&absences);
        let names: Vec<&str> = ranked.iter().map(|t| t.student_name.as_str()).collect();
        // Luis 3 days ties with Sofia and Diego; name ascending breaks ties.
        assert_eq!(names, vec!["Diego", "Luis", "Sofia"]);
        assert_eq!(ranked[0].total_days, 3);
    }

    #[test]
    fn summary_uses_most_recent_parent_and_grade() {
        let absences = vec![
            absence("Luis", "Maria", 2, "2026-01-10", "3A"),
            absence("Luis", "Roberto", 1, "2026-02-20", "3B"),
        ];
        let summary = student_summary(&absences, "Luis").unwrap();
        assert_eq!(summary.parent_name, "Roberto");
        assert_eq!(summary.grade, "3B");
        assert_eq!(summary.total_days, 3);
        assert_eq!(summary.total_records, 2);
        assert_eq!(summary.absences[0].absent_on, "2026-01-10");
    }

    #[test]
    fn unknown_student_yields_none() {
        assert!(student_summary(&[], "Luis").is_none());
    }
}
