//! # Tinyorm - Minimal Object-Relational Mapper
//!
//! Maps plain data-record types to relational tables and tracks loaded rows
//! within a unit-of-work session.
//!
//! Tinyorm provides:
//! - Declarative entity metadata (`EntityDef`) resolved once per type into a
//!   process-wide descriptor registry
//! - SQL statement synthesis from resolved metadata (insert, update,
//!   select-by-id, delete, create-table)
//! - A per-session first-level identity cache guaranteeing one in-memory
//!   instance per loaded row
//! - A `Session` unit of work with eager recursive relation loading
//! - An in-memory reference backend for tests and demos
//!
//! The database itself is an external collaborator behind the [`Connection`]
//! trait; any driver that can execute parametrized statements, report
//! affected rows and generated keys, and commit/rollback can back a session.

pub mod cache;
pub mod config;
pub mod conn;
pub mod entity;
pub mod macros;
pub mod mem;
pub mod metadata;
pub mod session;
pub mod sql;
pub mod value;

#[cfg(test)]
pub(crate) mod testutil;

// Re-exports for convenient access
pub use cache::IdentityCache;
pub use conn::{Connection, ConnectionSource, ExecResult, Row};
pub use entity::{Entity, EntityDef, FieldDef, FieldRole, Shared};
pub use mem::MemoryDb;
pub use metadata::EntityMeta;
pub use session::{Session, SessionFactory};
pub use value::{ScalarKind, Value};

/// Result type alias for tinyorm operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for tinyorm operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or incomplete mapping metadata (missing entity marker,
    /// missing identifier field, update with zero settable columns).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Update or delete attempted on an entity whose identifier is unset.
    #[error("Entity {0} has no identifier")]
    MissingId(&'static str),

    /// Operation invoked on a session after `close()`.
    #[error("Session is closed")]
    SessionClosed,

    /// Failure surfaced by the database collaborator.
    #[error("Database error: {0}")]
    Database(String),
}
