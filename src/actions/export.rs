//! Daily care-task sheet as CSV.

use std::collections::HashMap;

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use super::{ActionError, ActionResult, Actor};
use crate::datetime::{day_bounds, format_instant};
use crate::db::repository as repo;
use crate::stay::Stay;
use crate::validation::{optional, optional_id};

const HEADER: [&str; 7] = [
    "patient_name",
    "title",
    "description",
    "scheduled_at",
    "ward",
    "bed",
    "nurse_name",
];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExportQuery {
    pub date: Option<String>,
    pub nurse_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub body: String,
}

/// Quote a field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_line<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| csv_field(v.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Admin: still-scheduled tasks of one UTC day, optionally for one nurse.
pub fn export_soins_csv(conn: &Connection, actor: &Actor, query: &ExportQuery) -> ActionResult<CsvExport> {
    actor.require_admin("Accès refusé: admin requis")?;
    let date_raw = optional(query.date.as_deref())
        .ok_or_else(|| ActionError::validation("Paramètre 'date' requis"))?;
    let date = NaiveDate::parse_from_str(&date_raw, "%Y-%m-%d")
        .map_err(|_| ActionError::validation("Paramètre 'date' invalide"))?;
    let nurse = optional_id(query.nurse_id.as_deref())?;

    let (start, end) = day_bounds(date);
    let rows = repo::scheduled_soins_between(conn, &start, &end, nurse.as_ref())?;

    let mut stays: HashMap<Uuid, Option<Stay>> = HashMap::new();
    let nurse_ids: Vec<Uuid> = rows.iter().filter_map(|r| r.soin.assigned_to_nurse_id).collect();
    let nurse_names = repo::profile_names(conn, &nurse_ids)?;

    let mut lines = vec![csv_line(HEADER)];
    for row in &rows {
        let stay = match row.soin.hospitalisation_id {
            Some(id) => match stays.get(&id) {
                Some(cached) => cached.clone(),
                None => {
                    let found = repo::locate_stay(conn, &id)?;
                    stays.insert(id, found.clone());
                    found
                }
            },
            None => None,
        };
        let nurse_name = row
            .soin
            .assigned_to_nurse_id
            .and_then(|id| nurse_names.get(&id).cloned())
            .unwrap_or_default();
        lines.push(csv_line([
            row.patient_name.clone().unwrap_or_default(),
            row.soin.title.clone(),
            row.soin.description.clone().unwrap_or_default(),
            format_instant(&row.soin.scheduled_at),
            stay.as_ref().and_then(|s| s.ward.clone()).unwrap_or_default(),
            stay.as_ref().and_then(|s| s.bed.clone()).unwrap_or_default(),
            nurse_name,
        ]));
    }

    let filename = match nurse {
        Some(id) => format!("soins_{date_raw}_{id}.csv"),
        None => format!("soins_{date_raw}.csv"),
    };
    tracing::info!(actor = %actor.user_id, rows = rows.len(), %filename, "Soins exported");
    Ok(CsvExport {
        filename,
        body: lines.join("\n"),
    })
}
