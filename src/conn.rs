//! Database collaborator interface
//!
//! The mapper never talks to a concrete database; it talks to a
//! [`Connection`]: execute a parametrized statement, get back affected rows
//! and an optional generated key, or query and get rows with column access
//! by name. [`ConnectionSource`] is the factory side (a pool or a single
//! endpoint) that sessions draw their connection from.

use crate::value::Value;
use crate::Result;

/// Outcome of a non-query statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecResult {
    /// Number of rows the statement affected.
    pub rows_affected: u64,
    /// Database-assigned key for an insert into an auto-increment table.
    pub generated_id: Option<i64>,
}

/// One fetched row, with column access by name.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// The value of column `name`, or `None` when the row has no such column.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c == name)?;
        self.values.get(idx)
    }

    /// Column names, in select order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

/// A single database connection.
///
/// A session owns exactly one connection for its whole lifetime and is the
/// only user of it. All statements issued through the connection share one
/// transaction context; with autocommit off, nothing is visible to other
/// connections until `commit`.
pub trait Connection {
    /// Toggle autocommit. Sessions switch it off right after opening.
    fn set_autocommit(&mut self, enabled: bool) -> Result<()>;

    /// Execute a non-query statement with positional parameters.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<ExecResult>;

    /// Execute a query with positional parameters and materialize all rows.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Commit the pending transaction.
    fn commit(&mut self) -> Result<()>;

    /// Roll back the pending transaction.
    fn rollback(&mut self) -> Result<()>;

    /// Release the connection. Further use is an error.
    fn close(&mut self) -> Result<()>;
}

/// Source of connections (a pool, or a single-endpoint opener).
pub trait ConnectionSource {
    fn connection(&self) -> Result<Box<dyn Connection>>;
}
