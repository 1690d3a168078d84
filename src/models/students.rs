use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

/// Family status as stored in the `students` table. The table holds the
/// Arabic labels the registration form offers; English names are accepted on
/// read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FamilyStatus {
    #[serde(rename = "أعزب", alias = "single")]
    Single,
    #[serde(rename = "متزوج", alias = "married")]
    Married,
    #[serde(rename = "مطلق", alias = "divorced")]
    Divorced,
    #[serde(rename = "أرمل", alias = "widowed")]
    Widowed,
}

impl FamilyStatus {
    /// The label written to the table.
    pub fn as_str(&self) -> &'static str {
        match self {
            FamilyStatus::Single => "أعزب",
            FamilyStatus::Married => "متزوج",
            FamilyStatus::Divorced => "مطلق",
            FamilyStatus::Widowed => "أرمل",
        }
    }
}

impl std::str::FromStr for FamilyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "أعزب" | "single" => Ok(FamilyStatus::Single),
            "متزوج" | "married" => Ok(FamilyStatus::Married),
            "مطلق" | "divorced" => Ok(FamilyStatus::Divorced),
            "أرمل" | "widowed" => Ok(FamilyStatus::Widowed),
            _ => Err(format!("Invalid family status: {}", s)),
        }
    }
}

impl std::fmt::Display for FamilyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub student_name: String,
    pub birth_date: NaiveDate,
    pub residence: String,
    pub nationality: String,
    #[serde(default)]
    pub guardian_name: String,
    #[serde(default)]
    pub previous_courses: String,
    pub quran_memorized: String,
    #[serde(default)]
    pub computer_proficiency: bool,
    #[serde(default)]
    pub certificate: String,
    pub family_status: FamilyStatus,
    #[serde(default)]
    pub books_read: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    /// Case-insensitive substring match on the student's name.
    pub fn name_contains(&self, term: &str) -> bool {
        self.student_name
            .to_lowercase()
            .contains(&term.to_lowercase())
    }
}

/// The editable part of a student. Never carries `id` or timestamps; those
/// belong to the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct StudentDraft {
    #[validate(custom(function = "not_blank", message = "Student name is required"))]
    pub student_name: String,
    #[validate(required)]
    pub birth_date: Option<NaiveDate>,
    #[validate(custom(function = "not_blank", message = "Residence is required"))]
    pub residence: String,
    #[validate(custom(function = "not_blank", message = "Nationality is required"))]
    pub nationality: String,
    #[serde(default)]
    pub guardian_name: String,
    #[serde(default)]
    pub previous_courses: String,
    #[validate(custom(function = "not_blank", message = "Quran memorized amount is required"))]
    pub quran_memorized: String,
    #[serde(default)]
    pub computer_proficiency: bool,
    #[serde(default)]
    pub certificate: String,
    #[validate(required)]
    pub family_status: Option<FamilyStatus>,
    #[serde(default)]
    pub books_read: String,
}

impl From<&Student> for StudentDraft {
    fn from(student: &Student) -> Self {
        StudentDraft {
            student_name: student.student_name.clone(),
            birth_date: Some(student.birth_date),
            residence: student.residence.clone(),
            nationality: student.nationality.clone(),
            guardian_name: student.guardian_name.clone(),
            previous_courses: student.previous_courses.clone(),
            quran_memorized: student.quran_memorized.clone(),
            computer_proficiency: student.computer_proficiency,
            certificate: student.certificate.clone(),
            family_status: Some(student.family_status),
            books_read: student.books_read.clone(),
        }
    }
}

/// PATCH body for an update: the draft plus the client-side `updated_at`.
#[derive(Debug, Serialize)]
pub struct StudentUpdate<'a> {
    #[serde(flatten)]
    pub draft: &'a StudentDraft,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Cards,
    Table,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some(Cow::from("must not be blank"));
        return Err(error);
    }
    Ok(())
}
