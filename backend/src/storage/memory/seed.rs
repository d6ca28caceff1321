//! Sample records for running the server without a hosted backend.

use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::info;

use super::MemoryStore;
use crate::storage::traits::{AttendanceStorage, MarksStorage, StudentStorage};
use shared::{
    AttendanceStatus, Currency, NewAttendance, NewMark, NewStudent, ParentContact, SessionRates,
    SessionType, Student,
};

impl MemoryStore {
    /// Store pre-populated with a few students, sessions and marks.
    ///
    /// One student is left without a preferred currency so the currency
    /// migration has something to upgrade.
    pub async fn with_sample_data(latency: Duration) -> Result<Self> {
        let store = Self::new(Duration::ZERO);

        let mut gbp_rates = SessionRates::new();
        gbp_rates.insert(SessionType::InPersonOneOnOne, Decimal::new(2000, 2));

        let students = [
            sample_student("Amahle", "Zulu", "Grade 11", Some(Currency::Zar), SessionRates::new(), Some("+27 82 555 0101"), None),
            sample_student("Oliver", "Hughes", "Year 12", Some(Currency::Gbp), gbp_rates, None, Some("oWx-parent-hughes")),
            sample_student("Wei", "Chen", "Grade 9", Some(Currency::Usd), SessionRates::new(), Some("+1 415 555 0199"), Some("oWx-parent-chen")),
            sample_student("Sipho", "Ndlovu", "Grade 10", None, SessionRates::new(), Some("082 555 0123"), None),
        ];

        let today = Utc::now().date_naive();
        for student in &students {
            let student_id = store.add_student(student).await?;

            for (days_ago, session_type, status) in [
                (14, SessionType::Online, AttendanceStatus::Present),
                (7, SessionType::InPersonOneOnOne, AttendanceStatus::Late),
                (3, SessionType::InPersonClass, AttendanceStatus::Absent),
            ] {
                store
                    .add_attendance(&NewAttendance {
                        student_id: student_id.clone(),
                        date: today - ChronoDuration::days(days_ago),
                        session_type,
                        duration_hours: Decimal::new(15, 1),
                        status,
                        notes: None,
                    })
                    .await?;
            }

            for (subject, mark) in student.subjects.iter().zip([68.0, 81.5]) {
                store
                    .add_mark_for_student(&NewMark {
                        student_id: student_id.clone(),
                        subject: subject.clone(),
                        term: "Term 1".to_string(),
                        mark,
                        comment: None,
                    })
                    .await?;
            }
        }

        info!("Seeded in-memory store with {} students", students.len());

        Ok(Self { latency, ..store })
    }
}

fn sample_student(
    first_name: &str,
    last_name: &str,
    grade: &str,
    preferred_currency: Option<Currency>,
    rates: SessionRates,
    parent_phone: Option<&str>,
    parent_wechat: Option<&str>,
) -> NewStudent {
    NewStudent {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: None,
        phone: None,
        grade: grade.to_string(),
        subjects: vec!["Mathematics".to_string(), "Physical Sciences".to_string()],
        parent_contact: ParentContact {
            name: format!("Parent of {}", Student::full_name(first_name, last_name)),
            phone: parent_phone.map(str::to_string),
            wechat_open_id: parent_wechat.map(str::to_string),
            email: None,
        },
        preferred_currency,
        rates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sample_data_contains_legacy_student() {
        let store = MemoryStore::with_sample_data(Duration::ZERO).await.unwrap();
        let students = store.list_students().await.unwrap();

        assert_eq!(students.len(), 4);
        assert!(students.iter().any(|s| s.preferred_currency.is_none()));

        let attendance = store.get_attendance(&students[0].id).await.unwrap();
        assert_eq!(attendance.len(), 3);
    }
}
