//! Entity contract - the static capability behind the mapper
//!
//! Where a reflective ORM inspects fields at runtime, tinyorm requires each
//! mapped type to implement [`Entity`]: a declarative field list plus ordered
//! accessors for the identifier, plain columns, and relations. The
//! [`entity!`](crate::entity!) macro generates the implementation; writing it
//! by hand is equally supported.

use crate::session::Session;
use crate::value::{ScalarKind, Value};
use crate::Result;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared handle to an entity instance within a session.
///
/// The identity cache hands out clones of this handle, which is what makes
/// two lookups of the same row reference-identical. Sessions are
/// single-threaded by contract, so plain `Rc<RefCell<_>>` is sufficient.
pub type Shared<E> = Rc<RefCell<E>>;

/// Declarative metadata for a mapped type - the already-parsed form of the
/// persistence annotations, as written by the registration step.
#[derive(Debug)]
pub struct EntityDef {
    /// The Rust type name, used for the default table name and diagnostics.
    pub type_name: &'static str,
    /// Entity marker. Resolution fails when absent.
    pub marked_entity: bool,
    /// Explicit table-name override.
    pub table: Option<&'static str>,
    /// Declared fields, in declaration order.
    pub fields: &'static [FieldDef],
}

/// One declared field and its persistence role.
#[derive(Debug)]
pub struct FieldDef {
    pub name: &'static str,
    pub role: FieldRole,
}

/// Persistence role of a declared field.
#[derive(Debug)]
pub enum FieldRole {
    /// The row identifier. Exactly one per entity; its column is always `id`.
    Id,
    /// A plain scalar column. `name` overrides the column name (defaults to
    /// the field name); `scalar` drives the create-table type mapping.
    Column {
        name: Option<&'static str>,
        scalar: ScalarKind,
    },
    /// A many-to-one relation to another entity. `join_column` overrides the
    /// foreign-key column name (defaults to the field name).
    Relation { join_column: Option<&'static str> },
    /// Not persisted.
    Transient,
}

/// A data-record type mapped to a relational table.
///
/// Accessor ordering must match the declaration order in
/// [`def()`](Entity::def): plain columns first, relations second, each in
/// declared order. The statement builder emits columns in that same order,
/// which is what lets the session bind parameters positionally.
pub trait Entity: Default + 'static {
    /// The declarative metadata this type was registered with.
    fn def() -> &'static EntityDef;

    /// Current identifier, or `None` before the row has been persisted.
    fn id(&self) -> Option<i64>;

    /// Write back a database-assigned identifier.
    fn set_id(&mut self, id: i64);

    /// Plain-column values, in declared order.
    fn column_values(&self) -> Vec<Value>;

    /// Write one plain column, addressed by field name. Values of the wrong
    /// shape are ignored.
    fn set_column(&mut self, field: &str, value: Value);

    /// Identifier of each relation target, in declared order. `None` for an
    /// absent relation or an unsaved target.
    fn relation_ids(&self) -> Vec<Option<i64>>;

    /// Load the entity identified by `id` through the session and attach it
    /// to the relation field `field`.
    fn set_relation(&mut self, field: &str, id: i64, session: &mut Session) -> Result<()>;
}
