//! Person repository

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;
use crate::model::{FromRow, Person};
use crate::{Error, Result};
use super::Database;

/// CRUD and search over the `people` table
pub struct PersonRepository<'a> {
    db: &'a Database,
}

impl<'a> PersonRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn query(&self, sql: &str, args: impl rusqlite::Params) -> Result<Vec<Person>> {
        let mut stmt = self.db.conn().prepare(sql)?;
        let people = stmt
            .query_map(args, |row| Person::from_row(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(people)
    }

    /// All people ordered by name
    pub fn get_all(&self) -> Result<Vec<Person>> {
        self.query(
            &format!("SELECT {} FROM people ORDER BY name", Person::COLUMNS),
            [],
        )
    }

    /// People whose name or email contains `query` (SQL `LIKE` semantics), ordered by name
    pub fn search(&self, query: &str) -> Result<Vec<Person>> {
        let pattern = format!("%{}%", query);
        debug!(%query, "searching people");
        self.query(
            &format!(
                "SELECT {} FROM people WHERE name LIKE ?1 OR email LIKE ?1 ORDER BY name",
                Person::COLUMNS
            ),
            [pattern],
        )
    }

    pub fn get_by_id(&self, id: &str) -> Result<Option<Person>> {
        self.db
            .conn()
            .query_row(
                &format!("SELECT {} FROM people WHERE id = ?1", Person::COLUMNS),
                [id],
                |row| Person::from_row(row),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Insert a person and return the stored row.
    ///
    /// Fails with `Error::Constraint` if the id or email is already taken.
    pub fn insert(&self, id: &str, name: &str, age: i64, email: &str) -> Result<Person> {
        self.db.write(
            |conn| {
                conn.execute(
                    "INSERT INTO people (id, name, age, email) VALUES (?1, ?2, ?3, ?4)",
                    params![id, name, age, email],
                )?;
                Ok(())
            },
            |conn, _| remove(conn, id),
        )?;
        debug!(%id, "inserted person");

        self.get_by_id(id)?
            .ok_or_else(|| Error::NotFound(format!("Person {}", id)))
    }

    /// Overwrite name, age and email of an existing person
    pub fn update(&self, id: &str, name: &str, age: i64, email: &str) -> Result<Person> {
        let previous = self.get_by_id(id)?;
        let changed = self.db.write(
            |conn| {
                Ok(conn.execute(
                    "UPDATE people SET name = ?1, age = ?2, email = ?3 WHERE id = ?4",
                    params![name, age, email, id],
                )?)
            },
            |conn, _| match &previous {
                Some(p) => {
                    conn.execute(
                        "UPDATE people SET name = ?1, age = ?2, email = ?3 WHERE id = ?4",
                        params![p.name, p.age, p.email, p.id],
                    )?;
                    Ok(())
                }
                None => Ok(()),
            },
        )?;
        debug!(%id, changed, "updated person");

        self.get_by_id(id)?
            .ok_or_else(|| Error::NotFound(format!("Person {}", id)))
    }

    /// Remove a person. Deleting an absent id is not an error.
    /// Role assignments held by the person are left in place.
    pub fn delete(&self, id: &str) -> Result<()> {
        let previous = self.get_by_id(id)?;
        self.db.write(
            |conn| remove(conn, id),
            |conn, _| match &previous {
                Some(p) => {
                    conn.execute(
                        "INSERT INTO people (id, name, age, email) VALUES (?1, ?2, ?3, ?4)",
                        params![p.id, p.name, p.age, p.email],
                    )?;
                    Ok(())
                }
                None => Ok(()),
            },
        )?;
        debug!(%id, existed = previous.is_some(), "deleted person");
        Ok(())
    }
}

fn remove(conn: &Connection, id: &str) -> Result<()> {
    conn.execute("DELETE FROM people WHERE id = ?1", [id])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> Database {
        let db = Database::open_in_memory().unwrap();
        let repo = PersonRepository::new(&db);
        repo.insert("c", "Carla Mendez", 22, "carla.m@example.com").unwrap();
        repo.insert("a", "Alice Johnson", 29, "alice@example.com").unwrap();
        repo.insert("b", "Ben Thompson", 34, "ben.t@example.com").unwrap();
        db
    }

    #[test]
    fn test_insert_then_get() {
        let db = Database::open_in_memory().unwrap();
        let repo = PersonRepository::new(&db);

        let inserted = repo.insert("d1", "Dana", 40, "dana@x.com").unwrap();
        assert_eq!(inserted, Person::new("d1", "Dana", 40, "dana@x.com"));

        let fetched = repo.get_by_id("d1").unwrap().unwrap();
        assert_eq!(fetched, inserted);
    }

    #[test]
    fn test_get_missing_is_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(PersonRepository::new(&db).get_by_id("nope").unwrap().is_none());
    }

    #[test]
    fn test_get_all_ordered_by_name() {
        let db = populated();
        let names: Vec<String> = PersonRepository::new(&db)
            .get_all()
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Alice Johnson", "Ben Thompson", "Carla Mendez"]);
    }

    #[test]
    fn test_get_all_empty() {
        let db = Database::open_in_memory().unwrap();
        assert!(PersonRepository::new(&db).get_all().unwrap().is_empty());
    }

    #[test]
    fn test_search_matches_name_or_email() {
        let db = populated();
        let repo = PersonRepository::new(&db);

        let by_name = repo.search("Thomp").unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, "b");

        let by_email = repo.search("carla.m@").unwrap();
        assert_eq!(by_email.len(), 1);
        assert_eq!(by_email[0].id, "c");

        let both = repo.search("e").unwrap();
        let names: Vec<&str> = both.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Alice Johnson", "Ben Thompson", "Carla Mendez"]);

        assert!(repo.search("zzz").unwrap().is_empty());
    }

    #[test]
    fn test_empty_search_matches_everything() {
        let db = populated();
        let repo = PersonRepository::new(&db);
        assert_eq!(repo.search("").unwrap().len(), repo.get_all().unwrap().len());
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let db = populated();
        let repo = PersonRepository::new(&db);

        let result = repo.insert("x", "Other Alice", 50, "alice@example.com");
        assert!(matches!(result, Err(Error::Constraint(_))));
        assert_eq!(db.stats().unwrap().people, 3);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let db = populated();
        let repo = PersonRepository::new(&db);

        let result = repo.insert("a", "Someone", 50, "someone@example.com");
        assert!(matches!(result, Err(Error::Constraint(_))));
        assert_eq!(db.stats().unwrap().people, 3);
    }

    #[test]
    fn test_update_is_idempotent() {
        let db = populated();
        let repo = PersonRepository::new(&db);

        let first = repo.update("a", "Alice Smith", 30, "alice.s@example.com").unwrap();
        let second = repo.update("a", "Alice Smith", 30, "alice.s@example.com").unwrap();
        assert_eq!(first, second);
        assert_eq!(first, Person::new("a", "Alice Smith", 30, "alice.s@example.com"));
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let db = populated();
        let result = PersonRepository::new(&db).update("ghost", "Ghost", 1, "ghost@example.com");
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_update_to_taken_email_rejected() {
        let db = populated();
        let repo = PersonRepository::new(&db);

        let result = repo.update("a", "Alice Johnson", 29, "ben.t@example.com");
        assert!(matches!(result, Err(Error::Constraint(_))));
        assert_eq!(repo.get_by_id("a").unwrap().unwrap().email, "alice@example.com");
    }

    #[test]
    fn test_delete_is_idempotent() {
        let db = populated();
        let repo = PersonRepository::new(&db);

        repo.delete("a").unwrap();
        repo.delete("a").unwrap();
        assert!(repo.get_by_id("a").unwrap().is_none());
        assert_eq!(db.stats().unwrap().people, 2);
    }

    #[test]
    fn test_mutations_reach_the_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.db");

        let db = Database::load(&path).unwrap();
        PersonRepository::new(&db).insert("d1", "Dana", 40, "dana@x.com").unwrap();
        drop(db);

        let reloaded = Database::load(&path).unwrap();
        let person = PersonRepository::new(&reloaded).get_by_id("d1").unwrap();
        assert_eq!(person, Some(Person::new("d1", "Dana", 40, "dana@x.com")));
    }

    #[test]
    fn test_update_and_delete_reach_the_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.db");

        let db = Database::load(&path).unwrap();
        let repo = PersonRepository::new(&db);
        repo.insert("a", "Alice", 29, "alice@example.com").unwrap();
        repo.insert("b", "Ben", 34, "ben@example.com").unwrap();
        repo.update("a", "Alice Smith", 30, "alice.s@example.com").unwrap();
        repo.delete("b").unwrap();
        drop(db);

        let reloaded = Database::load(&path).unwrap();
        let people = PersonRepository::new(&reloaded).get_all().unwrap();
        assert_eq!(people, vec![Person::new("a", "Alice Smith", 30, "alice.s@example.com")]);
    }

    #[test]
    fn test_failed_flush_leaves_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let image_dir = dir.path().join("data");
        std::fs::create_dir(&image_dir).unwrap();
        let path = image_dir.join("people.db");

        let db = Database::load(&path).unwrap();
        let repo = PersonRepository::new(&db);
        repo.insert("a", "Alice", 29, "alice@example.com").unwrap();
        std::fs::remove_dir_all(&image_dir).unwrap();

        assert!(repo.insert("p1", "Dana", 40, "dana@x.com").is_err());
        assert!(repo.get_by_id("p1").unwrap().is_none());

        assert!(repo.update("a", "Alice Smith", 30, "alice.s@example.com").is_err());
        assert_eq!(repo.get_by_id("a").unwrap().unwrap().email, "alice@example.com");

        assert!(repo.delete("a").is_err());
        assert!(repo.get_by_id("a").unwrap().is_some());

        // once the image is writable again the same insert succeeds
        std::fs::create_dir(&image_dir).unwrap();
        repo.insert("p1", "Dana", 40, "dana@x.com").unwrap();
        drop(db);

        let reloaded = Database::load(&path).unwrap();
        let ids: Vec<String> = PersonRepository::new(&reloaded)
            .get_all()
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["a", "p1"]);
    }
}
