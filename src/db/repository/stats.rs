use rusqlite::Connection;
use serde::Serialize;

use crate::db::DatabaseError;

/// Row counts shown on the role landing pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LandingStats {
    pub patients: i64,
    pub stays: i64,
    pub soins: i64,
    pub appointments: i64,
    pub notifications: i64,
}

fn count(conn: &Connection, table: &str) -> Result<i64, DatabaseError> {
    let n = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
    Ok(n)
}

pub fn landing_stats(conn: &Connection) -> Result<LandingStats, DatabaseError> {
    Ok(LandingStats {
        patients: count(conn, "patients")?,
        stays: count(conn, "hospitalizations")? + count(conn, "hospitalisations")?,
        soins: count(conn, "soins")?,
        appointments: count(conn, "appointments")?,
        notifications: count(conn, "notifications")?,
    })
}
