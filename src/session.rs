//! Session - the unit of work
//!
//! A session owns exactly one database connection and one identity cache for
//! its whole lifetime, and runs every operation synchronously on the
//! caller's thread. Save, update, delete, and find go through resolved
//! metadata and synthesized SQL; relation fields are resolved eagerly and
//! recursively through the session's own `find`.
//!
//! Transaction semantics are delegated entirely to the connection, which is
//! switched to non-autocommit when the session opens. Rollback is
//! best-effort: its failure is logged, never propagated.

use crate::cache::{shared, IdentityCache};
use crate::conn::{Connection, ConnectionSource};
use crate::entity::{Entity, Shared};
use crate::value::Value;
use crate::{metadata, sql, Error, Result};
use tracing::{debug, error, info, warn};

/// Opens sessions over a connection source.
pub struct SessionFactory {
    source: Box<dyn ConnectionSource>,
}

impl SessionFactory {
    pub fn new(source: impl ConnectionSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    /// Draw a connection, switch it to non-autocommit, and wrap it in a
    /// fresh session with an empty identity cache.
    pub fn open_session(&self) -> Result<Session> {
        let mut conn = self.source.connection()?;
        conn.set_autocommit(false)?;
        Ok(Session {
            conn: Some(conn),
            cache: IdentityCache::new(),
        })
    }
}

/// Unit of work over one connection.
///
/// Open until [`close`](Session::close); every other operation fails with
/// [`Error::SessionClosed`] afterwards. Dropping an open session releases
/// the connection (failures are logged, never escalated).
pub struct Session {
    conn: Option<Box<dyn Connection>>,
    cache: IdentityCache,
}

impl Session {
    fn conn_mut(&mut self) -> Result<&mut Box<dyn Connection>> {
        self.conn.as_mut().ok_or(Error::SessionClosed)
    }

    /// Advisory transaction marker. The connection is already in
    /// non-autocommit mode, so statements accumulate until commit/rollback.
    pub fn begin_transaction(&mut self) -> Result<()> {
        self.conn_mut()?;
        info!("transaction started");
        Ok(())
    }

    /// Commit the pending transaction.
    pub fn commit(&mut self) -> Result<()> {
        self.conn_mut()?.commit()?;
        info!("transaction committed");
        Ok(())
    }

    /// Roll back the pending transaction. Best-effort: a rollback failure is
    /// logged and swallowed, because rollback usually runs during
    /// already-failing cleanup and must not mask the original failure.
    pub fn rollback(&mut self) -> Result<()> {
        match self.conn_mut()?.rollback() {
            Ok(()) => warn!("transaction rolled back"),
            Err(e) => error!("failed to rollback: {}", e),
        }
        Ok(())
    }

    /// Insert `entity` and hand back the session-owned shared handle.
    ///
    /// Binds plain columns then relation identifiers (a `NULL` for each
    /// absent relation), executes, writes the database-generated key back
    /// into the entity, and caches it under that key. When the database
    /// yields no generated key the identifier stays unset and nothing is
    /// cached.
    pub fn save<E: Entity>(&mut self, entity: E) -> Result<Shared<E>> {
        let meta = metadata::resolve::<E>()?;
        let statement = sql::insert(&meta);
        let mut params = entity.column_values();
        params.extend(relation_params(&entity));

        debug!("executing save: {}", statement);
        let result = self.conn_mut()?.execute(&statement, &params)?;

        let handle = shared(entity);
        if let Some(id) = result.generated_id {
            handle.borrow_mut().set_id(id);
            self.cache.put::<E>(id, handle.clone());
        }
        Ok(handle)
    }

    /// Update the row backing `entity`. Requires a set identifier.
    ///
    /// Zero affected rows is not an error; it is logged as a warning (the
    /// identifier matched no row). The cache entry for the key is refreshed
    /// with this same instance.
    pub fn update<E: Entity>(&mut self, entity: &Shared<E>) -> Result<()> {
        let meta = metadata::resolve::<E>()?;
        let statement = sql::update(&meta)?;
        let (id, params) = {
            let e = entity.borrow();
            let id = e.id().ok_or(Error::MissingId(meta.type_name))?;
            let mut params = e.column_values();
            params.extend(relation_params(&*e));
            params.push(Value::Int(id));
            (id, params)
        };

        debug!("executing update: {}", statement);
        let result = self.conn_mut()?.execute(&statement, &params)?;
        if result.rows_affected == 0 {
            warn!("update affected 0 rows for {} id {}", meta.table, id);
        }
        self.cache.put::<E>(id, entity.clone());
        Ok(())
    }

    /// Delete the row backing `entity` and drop its cache entry. Requires a
    /// set identifier. The in-memory instance itself is left untouched.
    pub fn delete<E: Entity>(&mut self, entity: &Shared<E>) -> Result<()> {
        let meta = metadata::resolve::<E>()?;
        let statement = sql::delete(&meta);
        let id = entity
            .borrow()
            .id()
            .ok_or(Error::MissingId(meta.type_name))?;

        debug!("executing delete: {}", statement);
        self.conn_mut()?.execute(&statement, &[Value::Int(id)])?;
        self.cache.remove::<E>(id);
        Ok(())
    }

    /// Look up `E` by identifier.
    ///
    /// A cache hit returns the cached instance without touching the
    /// database. On a miss the row is fetched and mapped into a fresh
    /// instance, which is cached *before* its relation fields are resolved -
    /// recursive resolution of a cyclic foreign-key graph therefore
    /// terminates with a cache hit instead of recursing forever. No matching
    /// row is a normal outcome (`Ok(None)`), not a failure.
    pub fn find<E: Entity>(&mut self, id: i64) -> Result<Option<Shared<E>>> {
        if let Some(cached) = self.cache.get::<E>(id) {
            debug!("cache hit for {} id {}", E::def().type_name, id);
            return Ok(Some(cached));
        }

        let meta = metadata::resolve::<E>()?;
        let statement = sql::select_by_id(&meta);
        debug!("executing find: {}", statement);
        let rows = self.conn_mut()?.query(&statement, &[Value::Int(id)])?;
        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };

        let handle = shared(E::default());
        {
            let mut e = handle.borrow_mut();
            if let Some(row_id) = row.get(meta.id_column).and_then(Value::as_i64) {
                e.set_id(row_id);
            }
            for col in &meta.columns {
                if let Some(value) = row.get(&col.column) {
                    e.set_column(col.field, value.clone());
                }
            }
        }
        self.cache.put::<E>(id, handle.clone());

        for rel in &meta.relations {
            if let Some(fk) = row.get(&rel.join_column).and_then(Value::as_i64) {
                handle.borrow_mut().set_relation(rel.field, fk, self)?;
            }
        }
        Ok(Some(handle))
    }

    /// Create the table backing `E` (`IF NOT EXISTS`, so idempotent).
    pub fn create_table<E: Entity>(&mut self) -> Result<()> {
        let meta = metadata::resolve::<E>()?;
        let statement = sql::create_table(&meta);
        debug!("executing create table: {}", statement);
        self.conn_mut()?.execute(&statement, &[])?;
        info!("created table: {}", meta.table);
        Ok(())
    }

    /// Release the connection and clear the identity cache. The cache is
    /// cleared even when the release itself fails.
    pub fn close(&mut self) -> Result<()> {
        let mut conn = self.conn.take().ok_or(Error::SessionClosed)?;
        let released = conn.close();
        self.cache.clear();
        released
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            if let Err(e) = conn.close() {
                error!("failed to release connection: {}", e);
            }
        }
        self.cache.clear();
    }
}

fn relation_params<E: Entity>(entity: &E) -> Vec<Value> {
    entity.relation_ids().into_iter().map(Value::from).collect()
}
