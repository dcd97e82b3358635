//! Directory records
//!
//! Two entity types are stored:
//! - `Person`: a named member of the directory, unique by email
//! - `Role`: a named role a person can hold, unique by name
//!
//! Assignments between the two live only in the `user_roles` table and are
//! surfaced as lists of `Role`.

use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// Mapping from a named-column result row into a typed record.
pub trait FromRow: Sized {
    /// Column list selected for this record, in a form usable in `SELECT`
    const COLUMNS: &'static str;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// A person in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Generated identifier, immutable once assigned
    pub id: String,
    pub name: String,
    pub age: i64,
    /// Unique across all people
    pub email: String,
}

#[cfg(test)]
impl Person {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        age: i64,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            age,
            email: email.into(),
        }
    }
}

impl FromRow for Person {
    const COLUMNS: &'static str = "id, name, age, email";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Person {
            id: row.get("id")?,
            name: row.get("name")?,
            age: row.get("age")?,
            email: row.get("email")?,
        })
    }
}

/// A role a person can hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role {
    pub role_id: String,
    /// Unique across all roles
    pub role_name: String,
}

#[cfg(test)]
impl Role {
    pub fn new(role_id: impl Into<String>, role_name: impl Into<String>) -> Self {
        Self {
            role_id: role_id.into(),
            role_name: role_name.into(),
        }
    }
}

impl FromRow for Role {
    const COLUMNS: &'static str = "role_id, role_name";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Role {
            role_id: row.get("role_id")?,
            role_name: row.get("role_name")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_wire_shape() {
        let person = Person::new("abc123", "Dana", 40, "dana@x.com");
        let json = serde_json::to_value(&person).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "abc123", "name": "Dana", "age": 40, "email": "dana@x.com"})
        );
    }

    #[test]
    fn test_role_wire_shape() {
        let role = Role::new("r1", "admin");
        let json = serde_json::to_value(&role).unwrap();
        assert_eq!(json, serde_json::json!({"role_id": "r1", "role_name": "admin"}));
    }

    #[test]
    fn test_person_from_named_columns() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        // Columns deliberately out of table order
        let person = conn
            .query_row(
                "SELECT 'dana@x.com' AS email, 40 AS age, 'id1' AS id, 'Dana' AS name",
                [],
                |row| Person::from_row(row),
            )
            .unwrap();
        assert_eq!(person, Person::new("id1", "Dana", 40, "dana@x.com"));
    }
}
