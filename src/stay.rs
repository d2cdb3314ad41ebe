//! Hospitalization stays across the two coexisting schemas.
//!
//! The legacy `hospitalizations` table (English columns, `active|discharged|planned`)
//! and the current `hospitalisations` table (French columns, `planifiee|en_cours|
//! terminee|annulee`) both hold stays. Everything above the repository layer works
//! on the unified [`Stay`]; this module owns the mapping in both directions and the
//! care-task matching rule.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::datetime::parse_instant;
use crate::models::enums::{HospitalisationStatut, HospitalizationStatus};

/// Which table a stay lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StaySource {
    Legacy,
    Current,
}

impl StaySource {
    pub fn table(&self) -> &'static str {
        match self {
            Self::Legacy => "hospitalizations",
            Self::Current => "hospitalisations",
        }
    }
}

/// Lifecycle of a stay, independent of the storage schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StayStatus {
    Planned,
    Active,
    Discharged,
    Cancelled,
}

impl StayStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Planned => "Planifiée",
            Self::Active => "En cours",
            Self::Discharged => "Sortie",
            Self::Cancelled => "Annulée",
        }
    }

    /// The legacy schema has no cancelled state; a cancelled stay is closed.
    pub fn to_legacy(self) -> HospitalizationStatus {
        match self {
            Self::Planned => HospitalizationStatus::Planned,
            Self::Active => HospitalizationStatus::Active,
            Self::Discharged | Self::Cancelled => HospitalizationStatus::Discharged,
        }
    }

    pub fn to_statut(self) -> HospitalisationStatut {
        match self {
            Self::Planned => HospitalisationStatut::Planifiee,
            Self::Active => HospitalisationStatut::EnCours,
            Self::Discharged => HospitalisationStatut::Terminee,
            Self::Cancelled => HospitalisationStatut::Annulee,
        }
    }
}

impl From<HospitalizationStatus> for StayStatus {
    fn from(status: HospitalizationStatus) -> Self {
        match status {
            HospitalizationStatus::Active => Self::Active,
            HospitalizationStatus::Discharged => Self::Discharged,
            HospitalizationStatus::Planned => Self::Planned,
        }
    }
}

impl From<HospitalisationStatut> for StayStatus {
    fn from(statut: HospitalisationStatut) -> Self {
        match statut {
            HospitalisationStatut::Planifiee => Self::Planned,
            HospitalisationStatut::EnCours => Self::Active,
            HospitalisationStatut::Terminee => Self::Discharged,
            HospitalisationStatut::Annulee => Self::Cancelled,
        }
    }
}

/// A hospitalization stay from either schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stay {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub source: StaySource,
    pub ward: Option<String>,
    pub room: Option<String>,
    pub bed: Option<String>,
    pub reason: Option<String>,
    pub admitted_at: DateTime<Utc>,
    pub planned_discharge_at: Option<DateTime<Utc>>,
    pub discharged_at: Option<DateTime<Utc>>,
    pub status: StayStatus,
}

impl Stay {
    /// Whether `at` falls inside `[admitted_at, discharged_at]`.
    /// An open stay (no discharge yet) has no upper bound.
    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        if *at < self.admitted_at {
            return false;
        }
        match &self.discharged_at {
            Some(end) => at <= end,
            None => true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == StayStatus::Active
    }
}

/// List row with the joined patient name.
#[derive(Debug, Clone, Serialize)]
pub struct StayListing {
    pub stay: Stay,
    pub patient_name: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum StayMappingError {
    #[error("invalid {field} in {table}: {value}")]
    InvalidValue {
        table: &'static str,
        field: &'static str,
        value: String,
    },
}

/// Raw `hospitalizations` row as stored.
#[derive(Debug, Clone)]
pub struct LegacyStayRow {
    pub id: String,
    pub patient_id: String,
    pub ward: Option<String>,
    pub room: Option<String>,
    pub bed: Option<String>,
    pub admitted_at: String,
    pub discharged_at: Option<String>,
    pub status: String,
}

/// Raw `hospitalisations` row as stored.
#[derive(Debug, Clone)]
pub struct CurrentStayRow {
    pub id: String,
    pub patient_id: String,
    pub service: Option<String>,
    pub chambre: Option<String>,
    pub lit: Option<String>,
    pub motif: Option<String>,
    pub date_admission: String,
    pub date_sortie_prevue: Option<String>,
    pub date_sortie_reelle: Option<String>,
    pub statut: String,
}

fn invalid(source: StaySource, field: &'static str, value: &str) -> StayMappingError {
    StayMappingError::InvalidValue {
        table: source.table(),
        field,
        value: value.to_string(),
    }
}

fn map_uuid(source: StaySource, field: &'static str, value: &str) -> Result<Uuid, StayMappingError> {
    Uuid::parse_str(value).map_err(|_| invalid(source, field, value))
}

fn map_instant(
    source: StaySource,
    field: &'static str,
    value: &str,
) -> Result<DateTime<Utc>, StayMappingError> {
    parse_instant(value).ok_or_else(|| invalid(source, field, value))
}

fn map_optional_instant(
    source: StaySource,
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<DateTime<Utc>>, StayMappingError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => map_instant(source, field, v).map(Some),
        None => Ok(None),
    }
}

impl TryFrom<LegacyStayRow> for Stay {
    type Error = StayMappingError;

    fn try_from(row: LegacyStayRow) -> Result<Self, Self::Error> {
        let src = StaySource::Legacy;
        let status = HospitalizationStatus::from_str(&row.status)
            .map_err(|_| invalid(src, "status", &row.status))?;
        Ok(Stay {
            id: map_uuid(src, "id", &row.id)?,
            patient_id: map_uuid(src, "patient_id", &row.patient_id)?,
            source: src,
            ward: row.ward,
            room: row.room,
            bed: row.bed,
            reason: None,
            admitted_at: map_instant(src, "admitted_at", &row.admitted_at)?,
            planned_discharge_at: None,
            discharged_at: map_optional_instant(src, "discharged_at", row.discharged_at.as_deref())?,
            status: status.into(),
        })
    }
}

impl TryFrom<CurrentStayRow> for Stay {
    type Error = StayMappingError;

    fn try_from(row: CurrentStayRow) -> Result<Self, Self::Error> {
        let src = StaySource::Current;
        let statut = HospitalisationStatut::from_str(&row.statut)
            .map_err(|_| invalid(src, "statut", &row.statut))?;
        Ok(Stay {
            id: map_uuid(src, "id", &row.id)?,
            patient_id: map_uuid(src, "patient_id", &row.patient_id)?,
            source: src,
            ward: row.service,
            room: row.chambre,
            bed: row.lit,
            reason: row.motif,
            admitted_at: map_instant(src, "date_admission", &row.date_admission)?,
            planned_discharge_at: map_optional_instant(
                src,
                "date_sortie_prevue",
                row.date_sortie_prevue.as_deref(),
            )?,
            discharged_at: map_optional_instant(
                src,
                "date_sortie_reelle",
                row.date_sortie_reelle.as_deref(),
            )?,
            status: statut.into(),
        })
    }
}

/// Ordering used to pick among equally-recent stays: later admission wins,
/// then the current schema over the legacy one, then the greater id.
fn recency(a: &Stay, b: &Stay) -> Ordering {
    a.admitted_at
        .cmp(&b.admitted_at)
        .then_with(|| (a.source == StaySource::Current).cmp(&(b.source == StaySource::Current)))
        .then_with(|| a.id.cmp(&b.id))
}

/// Pick the stay a care task scheduled at `at` belongs to.
///
/// Only active stays whose admission/discharge window contains `at` qualify;
/// among those the most recently admitted one is returned.
pub fn select_for_care<'a>(stays: &'a [Stay], at: &DateTime<Utc>) -> Option<&'a Stay> {
    stays
        .iter()
        .filter(|s| s.is_active() && s.contains(at))
        .max_by(|a, b| recency(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        parse_instant(s).unwrap()
    }

    fn stay(source: StaySource, admitted: &str, discharged: Option<&str>, status: StayStatus) -> Stay {
        Stay {
            id: Uuid::new_v4(),
            patient_id: Uuid::nil(),
            source,
            ward: None,
            room: None,
            bed: None,
            reason: None,
            admitted_at: ts(admitted),
            planned_discharge_at: None,
            discharged_at: discharged.map(ts),
            status,
        }
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let s = stay(
            StaySource::Legacy,
            "2024-03-01T08:00",
            Some("2024-03-05T12:00"),
            StayStatus::Active,
        );
        assert!(s.contains(&ts("2024-03-01T08:00")));
        assert!(s.contains(&ts("2024-03-05T12:00")));
        assert!(!s.contains(&ts("2024-03-01T07:59")));
        assert!(!s.contains(&ts("2024-03-05T12:01")));
    }

    #[test]
    fn open_stay_has_no_upper_bound() {
        let s = stay(StaySource::Current, "2024-03-01T08:00", None, StayStatus::Active);
        assert!(s.contains(&ts("2030-01-01T00:00")));
    }

    #[test]
    fn selects_latest_admission_among_matches() {
        let older = stay(StaySource::Legacy, "2024-01-01T00:00", None, StayStatus::Active);
        let newer = stay(StaySource::Legacy, "2024-02-01T00:00", None, StayStatus::Active);
        let stays = vec![older, newer.clone()];
        let picked = select_for_care(&stays, &ts("2024-02-10T09:00")).unwrap();
        assert_eq!(picked.id, newer.id);
    }

    #[test]
    fn ignores_non_active_stays() {
        let planned = stay(StaySource::Legacy, "2024-02-01T00:00", None, StayStatus::Planned);
        let discharged = stay(
            StaySource::Current,
            "2024-02-01T00:00",
            Some("2024-03-01T00:00"),
            StayStatus::Discharged,
        );
        let stays = vec![planned, discharged];
        assert!(select_for_care(&stays, &ts("2024-02-10T09:00")).is_none());
    }

    #[test]
    fn ignores_stays_outside_window() {
        let s = stay(
            StaySource::Legacy,
            "2024-01-01T00:00",
            Some("2024-01-10T00:00"),
            StayStatus::Active,
        );
        let later = stay(StaySource::Legacy, "2024-03-01T00:00", None, StayStatus::Active);
        let stays = vec![s, later];
        assert!(select_for_care(&stays, &ts("2024-02-01T00:00")).is_none());
    }

    #[test]
    fn tie_prefers_current_schema() {
        let legacy = stay(StaySource::Legacy, "2024-02-01T00:00", None, StayStatus::Active);
        let current = stay(StaySource::Current, "2024-02-01T00:00", None, StayStatus::Active);
        let stays = vec![current.clone(), legacy];
        let picked = select_for_care(&stays, &ts("2024-02-02T00:00")).unwrap();
        assert_eq!(picked.id, current.id);
    }

    #[test]
    fn maps_current_row_columns_and_statut() {
        let id = Uuid::new_v4();
        let patient = Uuid::new_v4();
        let row = CurrentStayRow {
            id: id.to_string(),
            patient_id: patient.to_string(),
            service: Some("Cardiologie".into()),
            chambre: Some("12".into()),
            lit: Some("B".into()),
            motif: Some("Surveillance".into()),
            date_admission: "2024-04-01T10:00:00Z".into(),
            date_sortie_prevue: Some("2024-04-08".into()),
            date_sortie_reelle: None,
            statut: "en_cours".into(),
        };
        let s = Stay::try_from(row).unwrap();
        assert_eq!(s.source, StaySource::Current);
        assert_eq!(s.ward.as_deref(), Some("Cardiologie"));
        assert_eq!(s.room.as_deref(), Some("12"));
        assert_eq!(s.bed.as_deref(), Some("B"));
        assert_eq!(s.status, StayStatus::Active);
        assert_eq!(s.planned_discharge_at, Some(ts("2024-04-08")));
        assert!(s.discharged_at.is_none());
    }

    #[test]
    fn legacy_row_with_bad_admission_is_rejected() {
        let row = LegacyStayRow {
            id: Uuid::new_v4().to_string(),
            patient_id: Uuid::new_v4().to_string(),
            ward: None,
            room: None,
            bed: None,
            admitted_at: "not a date".into(),
            discharged_at: None,
            status: "active".into(),
        };
        let err = Stay::try_from(row).unwrap_err();
        assert!(err.to_string().contains("admitted_at"));
    }

    #[test]
    fn blank_discharge_is_treated_as_open() {
        let row = LegacyStayRow {
            id: Uuid::new_v4().to_string(),
            patient_id: Uuid::new_v4().to_string(),
            ward: Some("A".into()),
            room: None,
            bed: None,
            admitted_at: "2024-01-01T00:00:00Z".into(),
            discharged_at: Some("".into()),
            status: "active".into(),
        };
        let s = Stay::try_from(row).unwrap();
        assert!(s.discharged_at.is_none());
    }

    #[test]
    fn status_mapping_round_trips_through_both_schemas() {
        for status in [StayStatus::Planned, StayStatus::Active, StayStatus::Discharged] {
            assert_eq!(StayStatus::from(status.to_legacy()), status);
            assert_eq!(StayStatus::from(status.to_statut()), status);
        }
        assert_eq!(StayStatus::Cancelled.to_legacy(), HospitalizationStatus::Discharged);
    }
}
