//! Metadata resolution - declarative defs to table descriptors
//!
//! [`resolve`] validates an entity's declarative metadata and turns it into
//! an [`EntityMeta`] descriptor: table name, identifier column, plain
//! columns, and relation join columns, each with a deterministic resolved
//! name. Descriptors are built once per type and cached in a process-wide
//! registry; failed resolution caches nothing.

use crate::entity::{Entity, FieldRole};
use crate::value::ScalarKind;
use crate::{Error, Result};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

/// The identifier column name, fixed regardless of any name override.
pub const ID_COLUMN: &str = "id";

/// Resolved descriptor for a mapped type. Immutable after construction.
#[derive(Debug)]
pub struct EntityMeta {
    /// The Rust type name (for diagnostics).
    pub type_name: &'static str,
    /// Resolved table name: explicit override, or the lower-cased type name.
    pub table: String,
    /// Identifier column name - always [`ID_COLUMN`].
    pub id_column: &'static str,
    /// Plain columns, in declared order.
    pub columns: Vec<ColumnMeta>,
    /// Relation fields, in declared order.
    pub relations: Vec<RelationMeta>,
}

/// A resolved plain column.
#[derive(Debug)]
pub struct ColumnMeta {
    /// The entity field this column maps.
    pub field: &'static str,
    /// Resolved column name: explicit override, or the field name.
    pub column: String,
    /// Scalar kind for create-table synthesis.
    pub scalar: ScalarKind,
}

/// A resolved many-to-one relation.
#[derive(Debug)]
pub struct RelationMeta {
    /// The entity field holding the related instance.
    pub field: &'static str,
    /// Resolved foreign-key column: explicit override, or the field name.
    pub join_column: String,
}

fn registry() -> &'static RwLock<HashMap<TypeId, Arc<EntityMeta>>> {
    static REGISTRY: OnceLock<RwLock<HashMap<TypeId, Arc<EntityMeta>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Resolve the descriptor for `E`, building and caching it on first use.
///
/// Resolution is concurrency-safe: when two threads race on the first use of
/// a type, both build a candidate but only one is inserted, and every caller
/// observes that single descriptor from then on.
pub fn resolve<E: Entity>() -> Result<Arc<EntityMeta>> {
    let key = TypeId::of::<E>();
    {
        let cached = registry().read().unwrap_or_else(|e| e.into_inner());
        if let Some(meta) = cached.get(&key) {
            return Ok(meta.clone());
        }
    }

    // Build outside the lock; a validation failure must cache nothing.
    let built = Arc::new(build_meta::<E>()?);

    let mut registry = registry().write().unwrap_or_else(|e| e.into_inner());
    Ok(registry.entry(key).or_insert(built).clone())
}

fn build_meta<E: Entity>() -> Result<EntityMeta> {
    let def = E::def();

    if !def.marked_entity {
        return Err(Error::Validation(format!(
            "{} is not marked as an entity",
            def.type_name
        )));
    }

    let table = def
        .table
        .map_or_else(|| def.type_name.to_lowercase(), str::to_string);

    let mut columns = Vec::new();
    let mut relations = Vec::new();
    let mut has_id = false;

    for field in def.fields {
        match &field.role {
            FieldRole::Id => {
                if has_id {
                    return Err(Error::Validation(format!(
                        "{} declares more than one identifier field",
                        def.type_name
                    )));
                }
                has_id = true;
            }
            FieldRole::Column { name, scalar } => columns.push(ColumnMeta {
                field: field.name,
                column: name.unwrap_or(field.name).to_string(),
                scalar: *scalar,
            }),
            FieldRole::Relation { join_column } => relations.push(RelationMeta {
                field: field.name,
                join_column: join_column.unwrap_or(field.name).to_string(),
            }),
            FieldRole::Transient => {}
        }
    }

    if !has_id {
        return Err(Error::Validation(format!(
            "{} must declare an identifier field",
            def.type_name
        )));
    }

    Ok(EntityMeta {
        type_name: def.type_name,
        table,
        id_column: ID_COLUMN,
        columns,
        relations,
    })
}
