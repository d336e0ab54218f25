//! First-level identity cache
//!
//! Per-session map from (entity type, identifier) to the one shared handle
//! representing that row. Keyed two-level - by `TypeId`, then by id - so
//! identifiers never collide across types. This is a correctness cache, not
//! a bounded performance cache: entries live until removal or `clear()`.

use crate::entity::Shared;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Session-scoped identity map. Each session owns its own instance; the
/// cache is never shared across sessions.
#[derive(Default)]
pub struct IdentityCache {
    entries: HashMap<TypeId, HashMap<i64, Box<dyn Any>>>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `entity` as the loaded instance for `(E, id)`.
    pub fn put<E: 'static>(&mut self, id: i64, entity: Shared<E>) {
        self.entries
            .entry(TypeId::of::<E>())
            .or_default()
            .insert(id, Box::new(entity));
    }

    /// The cached handle for `(E, id)`, if any. The returned handle points
    /// at the same allocation as every other handle for this key.
    pub fn get<E: 'static>(&self, id: i64) -> Option<Shared<E>> {
        self.entries
            .get(&TypeId::of::<E>())?
            .get(&id)?
            .downcast_ref::<Shared<E>>()
            .cloned()
    }

    /// Drop the entry for `(E, id)`, if present.
    pub fn remove<E: 'static>(&mut self, id: i64) {
        if let Some(per_type) = self.entries.get_mut(&TypeId::of::<E>()) {
            per_type.remove(&id);
        }
    }

    /// Whether `(E, id)` is currently cached.
    pub fn contains<E: 'static>(&self, id: i64) -> bool {
        self.get::<E>(id).is_some()
    }

    /// Drop every entry. Called when the session ends.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Convenience constructor for a shared entity handle.
pub fn shared<E>(entity: E) -> Shared<E> {
    Rc::new(RefCell::new(entity))
}
