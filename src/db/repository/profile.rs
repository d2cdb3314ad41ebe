use std::collections::HashMap;

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{col_ts, col_uuid, now_ts};
use crate::datetime::format_instant;
use crate::db::DatabaseError;
use crate::models::enums::Role;
use crate::models::*;
use crate::rbac::role_from_profile;

const PROFILE_COLUMNS: &str =
    "id, email, role, nom, prenom, telephone, avatar_url, specialite, service, actif, created_at";

fn row_to_profile(row: &Row<'_>) -> rusqlite::Result<Profile> {
    let role: Option<String> = row.get(2)?;
    Ok(Profile {
        id: col_uuid(row, 0)?,
        email: row.get(1)?,
        role: role_from_profile(role.as_deref()),
        nom: row.get(3)?,
        prenom: row.get(4)?,
        telephone: row.get(5)?,
        avatar_url: row.get(6)?,
        specialite: row.get(7)?,
        service: row.get(8)?,
        actif: row.get::<_, i64>(9)? != 0,
        created_at: col_ts(row, 10)?,
    })
}

pub fn insert_profile(conn: &Connection, profile: &Profile) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO profiles (id, email, role, nom, prenom, telephone, avatar_url, specialite, service, actif, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            profile.id.to_string(),
            profile.email,
            profile.role.as_str(),
            profile.nom,
            profile.prenom,
            profile.telephone,
            profile.avatar_url,
            profile.specialite,
            profile.service,
            profile.actif as i64,
            format_instant(&profile.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_profile(conn: &Connection, id: &Uuid) -> Result<Option<Profile>, DatabaseError> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1");
    let profile = conn
        .query_row(&sql, params![id.to_string()], row_to_profile)
        .optional()?;
    Ok(profile)
}

/// Create the profile on first setup, or refresh its identity fields.
///
/// The role column is only written on insert (as `patient`); an existing
/// profile keeps the role an administrator gave it.
pub fn upsert_profile(conn: &Connection, draft: &ProfileDraft) -> Result<Profile, DatabaseError> {
    conn.execute(
        "INSERT INTO profiles (id, email, role, nom, prenom, telephone, avatar_url, actif, created_at)
         VALUES (?1, ?2, 'patient', ?3, ?4, ?5, ?6, 1, ?7)
         ON CONFLICT(id) DO UPDATE SET
            email = excluded.email,
            nom = excluded.nom,
            prenom = excluded.prenom,
            telephone = excluded.telephone,
            avatar_url = excluded.avatar_url",
        params![
            draft.id.to_string(),
            draft.email,
            draft.nom,
            draft.prenom,
            draft.telephone,
            draft.avatar_url,
            now_ts(),
        ],
    )?;
    get_profile(conn, &draft.id)?.ok_or_else(|| DatabaseError::not_found("profile", draft.id))
}

pub fn list_profiles(conn: &Connection) -> Result<Vec<Profile>, DatabaseError> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY created_at DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], row_to_profile)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn list_profiles_by_role(conn: &Connection, role: Role) -> Result<Vec<Profile>, DatabaseError> {
    let sql = format!(
        "SELECT {PROFILE_COLUMNS} FROM profiles WHERE role = ?1 ORDER BY nom, prenom"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![role.as_str()], row_to_profile)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn update_role(conn: &Connection, id: &Uuid, role: Role) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE profiles SET role = ?1 WHERE id = ?2",
        params![role.as_str(), id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("profile", id));
    }
    Ok(())
}

pub fn update_preferences(
    conn: &Connection,
    id: &Uuid,
    specialite: Option<&str>,
    service: Option<&str>,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE profiles SET specialite = ?1, service = ?2 WHERE id = ?3",
        params![specialite, service, id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("profile", id));
    }
    Ok(())
}

/// Display names for a set of profile ids. Unknown ids are absent from the map.
pub fn profile_names(conn: &Connection, ids: &[Uuid]) -> Result<HashMap<Uuid, String>, DatabaseError> {
    let mut names = HashMap::new();
    for id in ids {
        if names.contains_key(id) {
            continue;
        }
        if let Some(profile) = get_profile(conn, id)? {
            names.insert(*id, profile.display_name());
        }
    }
    Ok(names)
}
