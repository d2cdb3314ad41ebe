use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{BloodType, Gender};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub dob: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub blood_type: Option<BloodType>,
    pub managed_by_staff: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// Validated dossier fields shared by every patient form.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientFields {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub dob: Option<NaiveDate>,
    pub gender: Gender,
    pub blood_type: Option<BloodType>,
}
