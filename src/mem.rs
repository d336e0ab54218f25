//! In-memory reference backend
//!
//! A tiny table store implementing the [`Connection`] interface for tests
//! and demos. It understands exactly the statement shapes the SQL builder
//! emits (create-table, insert, update, select-by-id, delete) and nothing
//! else - it is a collaborator stand-in, not a SQL engine.
//!
//! Transaction model: with autocommit off every change stays in the
//! connection's working copy; `commit` publishes the working copy to the
//! shared committed state, `rollback` re-clones the committed state. A new
//! connection starts from a clone of the committed state.

use crate::conn::{Connection, ConnectionSource, ExecResult, Row};
use crate::value::Value;
use crate::{Error, Result};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::debug;

#[derive(Debug, Clone, Default)]
struct Table {
    /// Column names in create order (identifier column first).
    columns: Vec<String>,
    /// The auto-increment column, if one was declared.
    auto_column: Option<String>,
    /// Auto-increment counter.
    next_id: i64,
    rows: Vec<HashMap<String, Value>>,
}

type TableMap = HashMap<String, Table>;

/// Shared in-memory database. Cloning the handle shares the same committed
/// state; use it as the [`ConnectionSource`] for a `SessionFactory`.
#[derive(Clone, Default)]
pub struct MemoryDb {
    shared: Arc<Mutex<TableMap>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConnectionSource for MemoryDb {
    fn connection(&self) -> Result<Box<dyn Connection>> {
        let working = lock(&self.shared).clone();
        Ok(Box::new(MemoryConnection {
            shared: self.shared.clone(),
            working,
            autocommit: true,
            open: true,
        }))
    }
}

struct MemoryConnection {
    shared: Arc<Mutex<TableMap>>,
    working: TableMap,
    autocommit: bool,
    open: bool,
}

fn lock(shared: &Arc<Mutex<TableMap>>) -> std::sync::MutexGuard<'_, TableMap> {
    shared.lock().unwrap_or_else(|e| e.into_inner())
}

struct Shapes {
    create: Regex,
    insert: Regex,
    update: Regex,
    select: Regex,
    delete: Regex,
}

fn shapes() -> &'static Shapes {
    static SHAPES: OnceLock<Shapes> = OnceLock::new();
    SHAPES.get_or_init(|| Shapes {
        create: Regex::new(r"^CREATE TABLE IF NOT EXISTS (\w+) \((.+)\)$").expect("static regex"),
        insert: Regex::new(r"^INSERT INTO (\w+) \(([^)]*)\) VALUES \(([^)]*)\)$")
            .expect("static regex"),
        update: Regex::new(r"^UPDATE (\w+) SET (.+) WHERE (\w+) = \?$").expect("static regex"),
        select: Regex::new(r"^SELECT \* FROM (\w+) WHERE (\w+) = \?$").expect("static regex"),
        delete: Regex::new(r"^DELETE FROM (\w+) WHERE (\w+) = \?$").expect("static regex"),
    })
}

fn split_list(list: &str) -> Vec<&str> {
    if list.trim().is_empty() {
        Vec::new()
    } else {
        list.split(", ").collect()
    }
}

impl MemoryConnection {
    fn check_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(Error::Database("connection is closed".to_string()))
        }
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.working
            .get_mut(name)
            .ok_or_else(|| Error::Database(format!("no such table: {}", name)))
    }

    fn publish(&mut self) {
        *lock(&self.shared) = self.working.clone();
    }

    fn exec_create(&mut self, table: &str, column_defs: &str) -> Result<ExecResult> {
        if !self.working.contains_key(table) {
            let mut columns = Vec::new();
            let mut auto_column = None;
            for def in split_list(column_defs) {
                let name = def
                    .split_whitespace()
                    .next()
                    .ok_or_else(|| Error::Database(format!("bad column definition: {}", def)))?;
                if def.contains("AUTO_INCREMENT") {
                    auto_column = Some(name.to_string());
                }
                columns.push(name.to_string());
            }
            self.working.insert(
                table.to_string(),
                Table {
                    columns,
                    auto_column,
                    next_id: 0,
                    rows: Vec::new(),
                },
            );
        }
        Ok(ExecResult {
            rows_affected: 0,
            generated_id: None,
        })
    }

    fn exec_insert(&mut self, table: &str, cols: &str, params: &[Value]) -> Result<ExecResult> {
        let cols = split_list(cols);
        if cols.len() != params.len() {
            return Err(Error::Database(format!(
                "expected {} parameters, got {}",
                cols.len(),
                params.len()
            )));
        }
        let table = self.table_mut(table)?;
        let mut row: HashMap<String, Value> = cols
            .iter()
            .zip(params)
            .map(|(c, v)| (c.to_string(), v.clone()))
            .collect();
        let generated_id = table.auto_column.clone().map(|auto| {
            table.next_id += 1;
            row.insert(auto, Value::Int(table.next_id));
            table.next_id
        });
        table.rows.push(row);
        Ok(ExecResult {
            rows_affected: 1,
            generated_id,
        })
    }

    fn exec_update(
        &mut self,
        table: &str,
        sets: &str,
        where_col: &str,
        params: &[Value],
    ) -> Result<ExecResult> {
        let set_cols: Vec<String> = split_list(sets)
            .iter()
            .map(|s| s.trim_end_matches(" = ?").to_string())
            .collect();
        if params.len() != set_cols.len() + 1 {
            return Err(Error::Database(format!(
                "expected {} parameters, got {}",
                set_cols.len() + 1,
                params.len()
            )));
        }
        let needle = &params[set_cols.len()];
        let table = self.table_mut(table)?;
        let mut affected = 0;
        for row in table
            .rows
            .iter_mut()
            .filter(|row| row.get(where_col) == Some(needle))
        {
            for (col, value) in set_cols.iter().zip(params) {
                row.insert(col.clone(), value.clone());
            }
            affected += 1;
        }
        Ok(ExecResult {
            rows_affected: affected,
            generated_id: None,
        })
    }

    fn exec_delete(&mut self, table: &str, where_col: &str, params: &[Value]) -> Result<ExecResult> {
        let needle = params
            .first()
            .ok_or_else(|| Error::Database("missing parameter".to_string()))?;
        let table = self.table_mut(table)?;
        let before = table.rows.len();
        table.rows.retain(|row| row.get(where_col) != Some(needle));
        Ok(ExecResult {
            rows_affected: (before - table.rows.len()) as u64,
            generated_id: None,
        })
    }
}

impl Connection for MemoryConnection {
    fn set_autocommit(&mut self, enabled: bool) -> Result<()> {
        self.check_open()?;
        self.autocommit = enabled;
        Ok(())
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<ExecResult> {
        self.check_open()?;
        debug!("mem execute: {}", sql);
        let shapes = shapes();
        let result = if let Some(c) = shapes.create.captures(sql) {
            self.exec_create(&c[1], &c[2])
        } else if let Some(c) = shapes.insert.captures(sql) {
            self.exec_insert(&c[1], &c[2], params)
        } else if let Some(c) = shapes.update.captures(sql) {
            let (table, sets, where_col) = (c[1].to_string(), c[2].to_string(), c[3].to_string());
            self.exec_update(&table, &sets, &where_col, params)
        } else if let Some(c) = shapes.delete.captures(sql) {
            let (table, where_col) = (c[1].to_string(), c[2].to_string());
            self.exec_delete(&table, &where_col, params)
        } else {
            Err(Error::Database(format!("unsupported statement: {}", sql)))
        }?;
        if self.autocommit {
            self.publish();
        }
        Ok(result)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.check_open()?;
        debug!("mem query: {}", sql);
        let captures = shapes()
            .select
            .captures(sql)
            .ok_or_else(|| Error::Database(format!("unsupported query: {}", sql)))?;
        let needle = params
            .first()
            .ok_or_else(|| Error::Database("missing parameter".to_string()))?;
        let where_col = &captures[2];
        let table = self
            .working
            .get(&captures[1])
            .ok_or_else(|| Error::Database(format!("no such table: {}", &captures[1])))?;

        Ok(table
            .rows
            .iter()
            .filter(|row| row.get(where_col) == Some(needle))
            .map(|row| {
                let values = table
                    .columns
                    .iter()
                    .map(|col| row.get(col).cloned().unwrap_or(Value::Null))
                    .collect();
                Row::new(table.columns.clone(), values)
            })
            .collect())
    }

    fn commit(&mut self) -> Result<()> {
        self.check_open()?;
        self.publish();
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.check_open()?;
        self.working = lock(&self.shared).clone();
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.check_open()?;
        self.open = false;
        self.working.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CREATE_USERS: &str = "CREATE TABLE IF NOT EXISTS users (id BIGINT AUTO_INCREMENT PRIMARY KEY, username VARCHAR(255), email VARCHAR(255))";

    fn conn(db: &MemoryDb) -> Box<dyn Connection> {
        db.connection().unwrap()
    }

    #[test]
    fn test_insert_assigns_generated_keys() {
        let db = MemoryDb::new();
        let mut conn = conn(&db);
        conn.execute(CREATE_USERS, &[]).unwrap();

        let sql = "INSERT INTO users (username, email) VALUES (?, ?)";
        let first = conn
            .execute(sql, &[Value::from("a"), Value::from("a@test.com")])
            .unwrap();
        let second = conn
            .execute(sql, &[Value::from("b"), Value::from("b@test.com")])
            .unwrap();
        assert_eq!(first.generated_id, Some(1));
        assert_eq!(second.generated_id, Some(2));
        assert_eq!(second.rows_affected, 1);
    }

    #[test]
    fn test_insert_without_auto_column_has_no_key() {
        let db = MemoryDb::new();
        let mut conn = conn(&db);
        conn.execute(
            "CREATE TABLE IF NOT EXISTS audit_log (id BIGINT PRIMARY KEY, message VARCHAR(255))",
            &[],
        )
        .unwrap();
        let result = conn
            .execute(
                "INSERT INTO audit_log (message) VALUES (?)",
                &[Value::from("hello")],
            )
            .unwrap();
        assert_eq!(result.generated_id, None);
    }

    #[test]
    fn test_select_by_id() {
        let db = MemoryDb::new();
        let mut conn = conn(&db);
        conn.execute(CREATE_USERS, &[]).unwrap();
        conn.execute(
            "INSERT INTO users (username, email) VALUES (?, ?)",
            &[Value::from("a"), Value::from("a@test.com")],
        )
        .unwrap();

        let rows = conn
            .query("SELECT * FROM users WHERE id = ?", &[Value::Int(1)])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("username"), Some(&Value::from("a")));
        assert_eq!(rows[0].get("id"), Some(&Value::Int(1)));

        let missing = conn
            .query("SELECT * FROM users WHERE id = ?", &[Value::Int(99)])
            .unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn test_update_and_delete_report_affected_rows() {
        let db = MemoryDb::new();
        let mut conn = conn(&db);
        conn.execute(CREATE_USERS, &[]).unwrap();
        conn.execute(
            "INSERT INTO users (username, email) VALUES (?, ?)",
            &[Value::from("a"), Value::from("a@test.com")],
        )
        .unwrap();

        let updated = conn
            .execute(
                "UPDATE users SET username = ?, email = ? WHERE id = ?",
                &[Value::from("b"), Value::from("b@test.com"), Value::Int(1)],
            )
            .unwrap();
        assert_eq!(updated.rows_affected, 1);

        let none = conn
            .execute(
                "UPDATE users SET username = ?, email = ? WHERE id = ?",
                &[Value::from("c"), Value::from("c@test.com"), Value::Int(9)],
            )
            .unwrap();
        assert_eq!(none.rows_affected, 0);

        let deleted = conn
            .execute("DELETE FROM users WHERE id = ?", &[Value::Int(1)])
            .unwrap();
        assert_eq!(deleted.rows_affected, 1);
        let rows = conn
            .query("SELECT * FROM users WHERE id = ?", &[Value::Int(1)])
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_commit_publishes_to_new_connections() {
        let db = MemoryDb::new();
        let mut writer = conn(&db);
        writer.set_autocommit(false).unwrap();
        writer.execute(CREATE_USERS, &[]).unwrap();
        writer
            .execute(
                "INSERT INTO users (username, email) VALUES (?, ?)",
                &[Value::from("a"), Value::from("a@test.com")],
            )
            .unwrap();

        // Not yet committed: a fresh connection sees nothing.
        let mut reader = conn(&db);
        assert!(reader
            .query("SELECT * FROM users WHERE id = ?", &[Value::Int(1)])
            .is_err());

        writer.commit().unwrap();
        let mut reader = conn(&db);
        let rows = reader
            .query("SELECT * FROM users WHERE id = ?", &[Value::Int(1)])
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_rollback_restores_committed_state() {
        let db = MemoryDb::new();
        let mut conn = conn(&db);
        conn.execute(CREATE_USERS, &[]).unwrap();
        conn.set_autocommit(false).unwrap();
        conn.execute(
            "INSERT INTO users (username, email) VALUES (?, ?)",
            &[Value::from("a"), Value::from("a@test.com")],
        )
        .unwrap();
        conn.rollback().unwrap();

        let rows = conn
            .query("SELECT * FROM users WHERE id = ?", &[Value::Int(1)])
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_unsupported_statement_is_an_error() {
        let db = MemoryDb::new();
        let mut conn = conn(&db);
        let err = conn.execute("TRUNCATE TABLE users", &[]).unwrap_err();
        assert!(matches!(err, Error::Database(_)));
    }

    #[test]
    fn test_closed_connection_rejects_everything() {
        let db = MemoryDb::new();
        let mut conn = conn(&db);
        conn.close().unwrap();
        assert!(conn.execute(CREATE_USERS, &[]).is_err());
        assert!(conn.commit().is_err());
        assert!(conn.close().is_err());
    }
}
