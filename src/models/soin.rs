use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::SoinStatus;

/// Scheduled care task attached to a hospitalization stay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Soin {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub hospitalisation_id: Option<Uuid>,
    pub type_soin: String,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub assigned_to_nurse_id: Option<Uuid>,
    pub status: SoinStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// List row: the task plus the joined patient name.
#[derive(Debug, Clone, Serialize)]
pub struct SoinListing {
    pub soin: Soin,
    pub patient_name: Option<String>,
}
