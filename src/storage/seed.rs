//! First-run seed data
//!
//! An empty `roles` table gets `guest`, `user` and `admin`. An empty `people`
//! table gets three sample people, each holding the `user` role. Both steps run
//! in one transaction followed by a single flush; a failed flush removes
//! the seeded rows again.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;
use crate::{id, Result};
use super::Database;

pub const SEED_ROLES: &[&str] = &["guest", "user", "admin"];

/// (name, age, email)
pub const SEED_PEOPLE: &[(&str, i64, &str)] = &[
    ("Alice Johnson", 29, "alice@example.com"),
    ("Ben Thompson", 34, "ben.t@example.com"),
    ("Carla Mendez", 22, "carla.m@example.com"),
];

/// Role given to every seeded person
pub const DEFAULT_ROLE: &str = "user";

/// What a seed run inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub roles: usize,
    pub people: usize,
    pub assignments: usize,
}

impl SeedReport {
    pub fn is_empty(&self) -> bool {
        self.roles == 0 && self.people == 0
    }
}

/// Ids inserted by one seed run, kept so a failed flush can remove them again
struct Seeded {
    report: SeedReport,
    role_ids: Vec<String>,
    person_ids: Vec<String>,
}

/// Seed an empty database. Tables that already hold rows are left alone.
pub fn seed(db: &Database) -> Result<SeedReport> {
    let role_count: i64 = db
        .conn()
        .query_row("SELECT COUNT(*) FROM roles", [], |row| row.get(0))?;
    let people_count: i64 = db
        .conn()
        .query_row("SELECT COUNT(*) FROM people", [], |row| row.get(0))?;
    if role_count > 0 && people_count > 0 {
        return Ok(SeedReport::default());
    }

    let seeded = db.write(
        |conn| insert_seed_rows(conn, role_count == 0, people_count == 0),
        remove_seed_rows,
    )?;
    Ok(seeded.report)
}

fn insert_seed_rows(conn: &Connection, roles: bool, people: bool) -> Result<Seeded> {
    let mut seeded = Seeded {
        report: SeedReport::default(),
        role_ids: Vec::new(),
        person_ids: Vec::new(),
    };

    if roles {
        for &role_name in SEED_ROLES {
            let role_id = id::generate();
            conn.execute(
                "INSERT INTO roles (role_id, role_name) VALUES (?1, ?2)",
                [role_id.as_str(), role_name],
            )?;
            seeded.role_ids.push(role_id);
        }
        seeded.report.roles = seeded.role_ids.len();
        info!(count = seeded.report.roles, "seeded roles");
    }

    if people {
        let default_role: Option<String> = conn
            .query_row(
                "SELECT role_id FROM roles WHERE role_name = ?1",
                [DEFAULT_ROLE],
                |row| row.get(0),
            )
            .optional()?;

        for &(name, age, email) in SEED_PEOPLE {
            let person_id = id::generate();
            conn.execute(
                "INSERT INTO people (id, name, age, email) VALUES (?1, ?2, ?3, ?4)",
                params![person_id, name, age, email],
            )?;

            if let Some(role_id) = &default_role {
                conn.execute(
                    "INSERT INTO user_roles (user_id, role_id) VALUES (?1, ?2)",
                    [person_id.as_str(), role_id.as_str()],
                )?;
                seeded.report.assignments += 1;
            }
            seeded.person_ids.push(person_id);
        }
        seeded.report.people = seeded.person_ids.len();
        info!(
            count = seeded.report.people,
            assignments = seeded.report.assignments,
            "seeded people"
        );
    }

    Ok(seeded)
}

fn remove_seed_rows(conn: &Connection, seeded: &Seeded) -> Result<()> {
    for person_id in &seeded.person_ids {
        conn.execute("DELETE FROM user_roles WHERE user_id = ?1", [person_id])?;
        conn.execute("DELETE FROM people WHERE id = ?1", [person_id])?;
    }
    for role_id in &seeded.role_ids {
        conn.execute("DELETE FROM roles WHERE role_id = ?1", [role_id])?;
    }
    Ok(())
}
