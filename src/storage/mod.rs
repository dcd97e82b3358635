//! Storage Layer - SQLite-backed persistence
//!
//! System of record is an in-memory SQLite database, flushed as a whole image
//! to disk after every write, with tables:
//! - people(id, name, age, email)
//! - roles(role_id, role_name)
//! - user_roles(user_id, role_id)

pub mod schema;
pub mod sqlite;
pub mod people;
pub mod roles;
pub mod user_roles;
pub mod seed;

pub use sqlite::{Database, DbStats};
pub use people::PersonRepository;
pub use roles::RoleRepository;
pub use user_roles::UserRoleRepository;
pub use seed::{seed, SeedReport};
