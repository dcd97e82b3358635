//! Role repository

use rusqlite::{Connection, OptionalExtension};
use tracing::debug;
use crate::model::{FromRow, Role};
use crate::{Error, Result};
use super::Database;

/// CRUD and search over the `roles` table
pub struct RoleRepository<'a> {
    db: &'a Database,
}

impl<'a> RoleRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn query(&self, sql: &str, args: impl rusqlite::Params) -> Result<Vec<Role>> {
        let mut stmt = self.db.conn().prepare(sql)?;
        let roles = stmt
            .query_map(args, |row| Role::from_row(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(roles)
    }

    /// All roles ordered by name
    pub fn get_all(&self) -> Result<Vec<Role>> {
        self.query(
            &format!("SELECT {} FROM roles ORDER BY role_name", Role::COLUMNS),
            [],
        )
    }

    /// Roles whose name contains `query`, ordered by name
    pub fn search(&self, query: &str) -> Result<Vec<Role>> {
        let pattern = format!("%{}%", query);
        self.query(
            &format!(
                "SELECT {} FROM roles WHERE role_name LIKE ?1 ORDER BY role_name",
                Role::COLUMNS
            ),
            [pattern],
        )
    }

    pub fn get_by_id(&self, role_id: &str) -> Result<Option<Role>> {
        self.db
            .conn()
            .query_row(
                &format!("SELECT {} FROM roles WHERE role_id = ?1", Role::COLUMNS),
                [role_id],
                |row| Role::from_row(row),
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn get_by_name(&self, role_name: &str) -> Result<Option<Role>> {
        self.db
            .conn()
            .query_row(
                &format!("SELECT {} FROM roles WHERE role_name = ?1", Role::COLUMNS),
                [role_name],
                |row| Role::from_row(row),
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn insert(&self, role_id: &str, role_name: &str) -> Result<Role> {
        self.db.write(
            |conn| {
                conn.execute(
                    "INSERT INTO roles (role_id, role_name) VALUES (?1, ?2)",
                    [role_id, role_name],
                )?;
                Ok(())
            },
            |conn, _| remove(conn, role_id),
        )?;
        debug!(%role_id, %role_name, "inserted role");

        self.get_by_id(role_id)?
            .ok_or_else(|| Error::NotFound(format!("Role {}", role_id)))
    }

    pub fn update(&self, role_id: &str, role_name: &str) -> Result<Role> {
        let previous = self.get_by_id(role_id)?;
        let changed = self.db.write(
            |conn| rename(conn, role_id, role_name),
            |conn, _| match &previous {
                Some(role) => rename(conn, &role.role_id, &role.role_name).map(|_| ()),
                None => Ok(()),
            },
        )?;
        debug!(%role_id, changed, "updated role");

        self.get_by_id(role_id)?
            .ok_or_else(|| Error::NotFound(format!("Role {}", role_id)))
    }

    /// Remove a role; assignments referencing it are kept
    pub fn delete(&self, role_id: &str) -> Result<()> {
        let previous = self.get_by_id(role_id)?;
        self.db.write(
            |conn| remove(conn, role_id),
            |conn, _| match &previous {
                Some(role) => {
                    conn.execute(
                        "INSERT INTO roles (role_id, role_name) VALUES (?1, ?2)",
                        [&role.role_id, &role.role_name],
                    )?;
                    Ok(())
                }
                None => Ok(()),
            },
        )?;
        debug!(%role_id, existed = previous.is_some(), "deleted role");
        Ok(())
    }
}

fn rename(conn: &Connection, role_id: &str, role_name: &str) -> Result<usize> {
    Ok(conn.execute(
        "UPDATE roles SET role_name = ?1 WHERE role_id = ?2",
        [role_name, role_id],
    )?)
}

fn remove(conn: &Connection, role_id: &str) -> Result<()> {
    conn.execute("DELETE FROM roles WHERE role_id = ?1", [role_id])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> Database {
        let db = Database::open_in_memory().unwrap();
        let repo = RoleRepository::new(&db);
        repo.insert("r-user", "user").unwrap();
        repo.insert("r-admin", "admin").unwrap();
        repo.insert("r-guest", "guest").unwrap();
        db
    }

    #[test]
    fn test_role_crud() {
        let db = populated();
        let repo = RoleRepository::new(&db);

        assert_eq!(
            repo.get_by_id("r-admin").unwrap(),
            Some(Role::new("r-admin", "admin"))
        );

        let renamed = repo.update("r-admin", "administrator").unwrap();
        assert_eq!(renamed.role_name, "administrator");
        assert!(repo.get_by_name("admin").unwrap().is_none());

        repo.delete("r-admin").unwrap();
        repo.delete("r-admin").unwrap();
        assert!(repo.get_by_id("r-admin").unwrap().is_none());
    }

    #[test]
    fn test_get_all_ordered_by_name() {
        let db = populated();
        let names: Vec<String> = RoleRepository::new(&db)
            .get_all()
            .unwrap()
            .into_iter()
            .map(|r| r.role_name)
            .collect();
        assert_eq!(names, vec!["admin", "guest", "user"]);
    }

    #[test]
    fn test_search_matches_name_only() {
        let db = populated();
        let repo = RoleRepository::new(&db);

        let found = repo.search("us").unwrap();
        assert_eq!(found, vec![Role::new("r-user", "user")]);

        // role ids are not searched
        assert!(repo.search("r-").unwrap().is_empty());
        assert_eq!(repo.search("").unwrap().len(), 3);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let db = populated();
        let result = RoleRepository::new(&db).insert("r-other", "user");
        assert!(matches!(result, Err(Error::Constraint(_))));
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let db = populated();
        let result = RoleRepository::new(&db).update("r-none", "nobody");
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_role_mutations_reach_the_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roles.db");

        let db = Database::load(&path).unwrap();
        let repo = RoleRepository::new(&db);
        repo.insert("r-user", "user").unwrap();
        repo.insert("r-admin", "admin").unwrap();
        repo.insert("r-guest", "guest").unwrap();
        repo.update("r-admin", "administrator").unwrap();
        repo.delete("r-guest").unwrap();
        drop(db);

        let reloaded = Database::load(&path).unwrap();
        let roles = RoleRepository::new(&reloaded).get_all().unwrap();
        assert_eq!(
            roles,
            vec![Role::new("r-admin", "administrator"), Role::new("r-user", "user")]
        );
    }

    #[test]
    fn test_failed_flush_reverts_role_change() {
        let dir = tempfile::tempdir().unwrap();
        let image_dir = dir.path().join("data");
        std::fs::create_dir(&image_dir).unwrap();

        let db = Database::load(&image_dir.join("roles.db")).unwrap();
        let repo = RoleRepository::new(&db);
        repo.insert("r-user", "user").unwrap();
        std::fs::remove_dir_all(&image_dir).unwrap();

        assert!(repo.insert("r-admin", "admin").is_err());
        assert!(repo.get_by_id("r-admin").unwrap().is_none());

        assert!(repo.update("r-user", "member").is_err());
        assert_eq!(repo.get_by_id("r-user").unwrap(), Some(Role::new("r-user", "user")));

        assert!(repo.delete("r-user").is_err());
        assert!(repo.get_by_id("r-user").unwrap().is_some());
    }
}
