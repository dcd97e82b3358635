//! User-role assignment repository
//!
//! Assignments are only ever replaced wholesale for one user. The replace runs
//! as a single transaction: `BEGIN -> DELETE -> INSERT* -> COMMIT`, or
//! `ROLLBACK` on the first failing statement, so a partial set is never visible.
//! If the image cannot be written afterwards, the previous set is put back.

use rusqlite::Connection;
use tracing::{debug, warn};
use crate::model::{FromRow, Role};
use crate::Result;
use super::Database;

pub struct UserRoleRepository<'a> {
    db: &'a Database,
}

impl<'a> UserRoleRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Roles held by `user_id`, in join order.
    ///
    /// Unknown users and users without roles both yield an empty list.
    /// Assignments pointing at a deleted role are skipped by the join.
    pub fn get_user_roles(&self, user_id: &str) -> Result<Vec<Role>> {
        let mut stmt = self.db.conn().prepare(
            "SELECT roles.role_id AS role_id, roles.role_name AS role_name
             FROM roles
             JOIN user_roles ON roles.role_id = user_roles.role_id
             WHERE user_roles.user_id = ?1",
        )?;

        let roles = stmt
            .query_map([user_id], |row| Role::from_row(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(roles)
    }

    /// Replace every role assignment of `user_id` with `role_ids`.
    ///
    /// Duplicate ids violate the `(user_id, role_id)` key; the whole replace is
    /// rolled back and the previous set stays in place.
    pub fn set_roles_for_user<S: AsRef<str>>(
        &self,
        user_id: &str,
        role_ids: &[S],
    ) -> Result<()> {
        let previous = assigned_ids(self.db.conn(), user_id)?;

        let removed = self
            .db
            .write(
                |conn| replace(conn, user_id, role_ids),
                |conn, _| replace(conn, user_id, previous.as_slice()).map(|_| ()),
            )
            .inspect_err(|err| warn!(%user_id, error = %err, "role replace rolled back"))?;

        debug!(%user_id, removed, added = role_ids.len(), "replaced user roles");
        Ok(())
    }
}

/// Role ids assigned to `user_id`, including ones whose role no longer exists
fn assigned_ids(conn: &Connection, user_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT role_id FROM user_roles WHERE user_id = ?1")?;
    let ids = stmt
        .query_map([user_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(ids)
}

fn replace<S: AsRef<str>>(conn: &Connection, user_id: &str, role_ids: &[S]) -> Result<usize> {
    let removed = conn.execute("DELETE FROM user_roles WHERE user_id = ?1", [user_id])?;
    for role_id in role_ids {
        conn.execute(
            "INSERT INTO user_roles (user_id, role_id) VALUES (?1, ?2)",
            [user_id, role_id.as_ref()],
        )?;
    }
    Ok(removed)
}
