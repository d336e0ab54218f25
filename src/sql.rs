//! SQL synthesis - pure functions from descriptor to statement text
//!
//! Column order in every generated statement is plain columns followed by
//! relation join columns, each in declared order. The session binds
//! parameters positionally against that same order, so the two must never
//! diverge.
//!
//! Dialect contract: identifiers are emitted unquoted, placeholders are
//! positional `?`, `CREATE TABLE` uses `IF NOT EXISTS`, and the identifier
//! column is `BIGINT AUTO_INCREMENT PRIMARY KEY`.

use crate::metadata::EntityMeta;
use crate::{Error, Result};

fn settable_columns(meta: &EntityMeta) -> Vec<&str> {
    meta.columns
        .iter()
        .map(|c| c.column.as_str())
        .chain(meta.relations.iter().map(|r| r.join_column.as_str()))
        .collect()
}

/// `INSERT INTO <table> (<cols>) VALUES (?, ...)`.
///
/// The identifier column is omitted; it is assumed database-generated.
pub fn insert(meta: &EntityMeta) -> String {
    let cols = settable_columns(meta);
    let placeholders = vec!["?"; cols.len()];
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        meta.table,
        cols.join(", "),
        placeholders.join(", ")
    )
}

/// `UPDATE <table> SET <col> = ?, ... WHERE id = ?`.
///
/// Fails when the entity has no settable columns at all.
pub fn update(meta: &EntityMeta) -> Result<String> {
    let cols = settable_columns(meta);
    if cols.is_empty() {
        return Err(Error::Validation(format!(
            "no columns to update for table {}",
            meta.table
        )));
    }
    let sets: Vec<String> = cols.iter().map(|c| format!("{} = ?", c)).collect();
    Ok(format!(
        "UPDATE {} SET {} WHERE {} = ?",
        meta.table,
        sets.join(", "),
        meta.id_column
    ))
}

/// `SELECT * FROM <table> WHERE id = ?`.
pub fn select_by_id(meta: &EntityMeta) -> String {
    format!(
        "SELECT * FROM {} WHERE {} = ?",
        meta.table, meta.id_column
    )
}

/// `DELETE FROM <table> WHERE id = ?`.
pub fn delete(meta: &EntityMeta) -> String {
    format!(
        "DELETE FROM {} WHERE {} = ?",
        meta.table, meta.id_column
    )
}

/// `CREATE TABLE IF NOT EXISTS <table> (...)`.
///
/// The identifier becomes an auto-incrementing primary key, plain columns
/// are typed by their scalar kind, and relation join columns are BIGINT
/// (related identifiers are 64-bit).
pub fn create_table(meta: &EntityMeta) -> String {
    let mut defs = vec![format!(
        "{} BIGINT AUTO_INCREMENT PRIMARY KEY",
        meta.id_column
    )];
    for col in &meta.columns {
        defs.push(format!("{} {}", col.column, col.scalar.sql_type()));
    }
    for rel in &meta.relations {
        defs.push(format!("{} BIGINT", rel.join_column));
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        meta.table,
        defs.join(", ")
    )
}
