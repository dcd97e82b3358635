//! Database schema definitions

/// SQL to create the people table
pub const CREATE_PEOPLE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS people (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    age INTEGER NOT NULL,
    email TEXT NOT NULL UNIQUE
)
"#;

/// SQL to create the roles table
pub const CREATE_ROLES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS roles (
    role_id TEXT PRIMARY KEY,
    role_name TEXT NOT NULL UNIQUE
)
"#;

/// SQL to create the user_roles table
/// References into people and roles are not enforced; deletes leave these rows behind.
pub const CREATE_USER_ROLES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS user_roles (
    user_id TEXT NOT NULL,
    role_id TEXT NOT NULL,
    PRIMARY KEY (user_id, role_id)
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_people_name ON people(name)",
    "CREATE INDEX IF NOT EXISTS idx_roles_name ON roles(role_name)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_PEOPLE_TABLE,
        CREATE_ROLES_TABLE,
        CREATE_USER_ROLES_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
