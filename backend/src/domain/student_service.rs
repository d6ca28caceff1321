use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::currency::{get_default_rates_in_currency, migrate_student_currency, validate_currency_amount};
use crate::domain::errors::DomainError;
use crate::domain::pagination::paginate;
use crate::storage::{DataStore, StoreError};
use shared::{
    CreateStudentRequest, CurrencyMigrationResponse, ListQuery, ListResponse, NewStudent,
    SessionRates, Student, StudentResponse, UpdateStudentRequest,
};

const MAX_NAME_LENGTH: usize = 100;

/// Service for managing student records
#[derive(Clone)]
pub struct StudentService {
    store: Arc<dyn DataStore>,
}

impl StudentService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Create a new student.
    ///
    /// Rates not given explicitly are filled from the defaults in the
    /// student's preferred currency.
    pub async fn create_student(&self, request: CreateStudentRequest) -> Result<StudentResponse> {
        info!(
            "Creating student: {} {} (grade {})",
            request.first_name, request.last_name, request.grade
        );

        self.validate_name("First name", &request.first_name)?;
        self.validate_name("Last name", &request.last_name)?;
        self.validate_rates(&request.rates)?;

        let currency = request.preferred_currency.unwrap_or_default();
        let mut rates = get_default_rates_in_currency(currency);
        rates.extend(request.rates);

        let new_student = NewStudent {
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            email: request.email,
            phone: request.phone,
            grade: request.grade.trim().to_string(),
            subjects: request.subjects,
            parent_contact: request.parent_contact,
            preferred_currency: Some(currency),
            rates,
        };

        let student_id = self.store.add_student(&new_student).await?;
        let student = self.require_student(&student_id).await?;

        info!("Created student: {} with ID: {}", student.name, student.id);

        Ok(StudentResponse {
            student,
            success_message: "Student created successfully".to_string(),
        })
    }

    /// Get a student by ID
    pub async fn get_student(&self, student_id: &str) -> Result<Option<Student>> {
        let student = self.store.get_student(student_id).await?;
        if student.is_none() {
            warn!("Student not found: {}", student_id);
        }
        Ok(student)
    }

    /// Get a student by ID, failing with `NotFound` when absent
    pub async fn require_student(&self, student_id: &str) -> Result<Student> {
        self.store
            .get_student(student_id)
            .await?
            .ok_or_else(|| StoreError::not_found("students", student_id).into())
    }

    /// List students ordered by name
    pub async fn list_students(&self, query: ListQuery) -> Result<ListResponse<Student>> {
        let mut students = self.store.list_students().await?;
        students.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        info!("Found {} students", students.len());
        Ok(paginate(students, &query, |s| s.id.as_str()))
    }

    /// Update an existing student in place
    pub async fn update_student(
        &self,
        student_id: &str,
        request: UpdateStudentRequest,
    ) -> Result<StudentResponse> {
        info!("Updating student: {}", student_id);

        let mut student = self.require_student(student_id).await?;

        if let Some(ref first_name) = request.first_name {
            self.validate_name("First name", first_name)?;
        }
        if let Some(ref last_name) = request.last_name {
            self.validate_name("Last name", last_name)?;
        }
        if let Some(ref rates) = request.rates {
            self.validate_rates(rates)?;
        }

        if let Some(first_name) = request.first_name {
            student.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = request.last_name {
            student.last_name = last_name.trim().to_string();
        }
        student.name = Student::full_name(&student.first_name, &student.last_name);

        if let Some(email) = request.email {
            student.email = Some(email);
        }
        if let Some(phone) = request.phone {
            student.phone = Some(phone);
        }
        if let Some(grade) = request.grade {
            student.grade = grade.trim().to_string();
        }
        if let Some(subjects) = request.subjects {
            student.subjects = subjects;
        }
        if let Some(parent_contact) = request.parent_contact {
            student.parent_contact = parent_contact;
        }
        if let Some(currency) = request.preferred_currency {
            if student.billing_currency() != currency {
                // Overrides were priced in the old currency
                student.rates = get_default_rates_in_currency(currency);
            }
            student.preferred_currency = Some(currency);
        }
        if let Some(rates) = request.rates {
            student.rates.extend(rates);
        }

        student.updated_at = Utc::now();
        self.store.update_student(&student).await?;

        info!("Updated student: {} with ID: {}", student.name, student.id);

        Ok(StudentResponse {
            student,
            success_message: "Student updated successfully".to_string(),
        })
    }

    pub async fn delete_student(&self, student_id: &str) -> Result<()> {
        info!("Deleting student: {}", student_id);
        self.store.delete_student(student_id).await?;
        Ok(())
    }

    /// Apply the currency migration to every stored student
    pub async fn migrate_all_currencies(&self) -> Result<CurrencyMigrationResponse> {
        let students = self.store.list_students().await?;
        let total_students = students.len();
        let now = Utc::now();

        let mut migrated_count = 0;
        for mut student in students {
            if migrate_student_currency(&mut student, now) {
                self.store.update_student(&student).await?;
                migrated_count += 1;
            }
        }

        info!("Currency migration: {} of {} students upgraded", migrated_count, total_students);
        Ok(CurrencyMigrationResponse {
            migrated_count,
            total_students,
        })
    }

    fn validate_name(&self, field: &str, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(DomainError::validation(format!("{} cannot be empty", field)).into());
        }
        if value.len() > MAX_NAME_LENGTH {
            return Err(DomainError::validation(format!(
                "{} cannot exceed {} characters",
                field, MAX_NAME_LENGTH
            ))
            .into());
        }
        Ok(())
    }

    fn validate_rates(&self, rates: &SessionRates) -> Result<()> {
        for (session_type, rate) in rates {
            let validation = validate_currency_amount(*rate);
            if !validation.is_valid {
                return Err(DomainError::validation(format!(
                    "Invalid {} rate: {}",
                    session_type.label(),
                    validation.errors.join(", ")
                ))
                .into());
            }
        }
        Ok(())
    }
}
