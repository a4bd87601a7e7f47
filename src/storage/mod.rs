//! Embedded relational store, schema, and forward-only migrations.
//!
//! The store owns all persistent state (§4.A). Every other component borrows
//! a transactional handle for the scope of one command; no component keeps a
//! long-lived in-memory mirror of the database outside that scope.

pub mod migrations;
pub mod pool;
pub mod schema;

pub use migrations::{MIGRATIONS, MigrationError, reconcile_mirror, run_pending_migrations};
pub use pool::{SqlitePool, StorageOpenError, StoragePools};
