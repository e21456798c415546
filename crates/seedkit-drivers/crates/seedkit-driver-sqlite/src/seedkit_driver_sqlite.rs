//! SQLite backend for seedkit
//!
//! Implements the seedkit collaborator traits over a single rusqlite
//! connection with foreign key enforcement switched on, so a wrongly ordered
//! delete or insert fails the same way it would on a production database.

mod backend;
mod introspection;
mod values;

pub use backend::SqliteBackend;
pub use values::{native_to_json, native_to_sqlite, sqlite_to_json};
