//! Shared test fixtures: mapped types used across the module tests.

use crate::entity::{Entity, EntityDef, FieldDef, FieldRole};
use crate::session::Session;
use crate::value::{FromValue, ScalarKind, Value};
use crate::{Error, Result};

crate::entity! {
    /// A user row.
    pub struct User {
        table: "users",
        id: id,
        columns: {
            username: String => "username",
            email: String => "email",
        },
        relations: {},
    }
}

crate::entity! {
    /// An order row referencing its user.
    pub struct Order {
        table: "orders",
        id: id,
        columns: {
            amount: f64 => "amount",
        },
        relations: {
            user: User => "user_id",
        },
    }
}

crate::entity! {
    /// Self-referential: an employee may point at a manager, possibly
    /// themselves. Exercises cyclic relation resolution.
    pub struct Employee {
        table: "employees",
        id: id,
        columns: {
            name: String => "name",
        },
        relations: {
            manager: Employee => "manager_id",
        },
    }
}

crate::entity! {
    /// Backed by a table with no auto-increment key.
    pub struct AuditLog {
        table: "audit_log",
        id: id,
        columns: {
            message: String => "message",
        },
        relations: {},
    }
}

/// Hand-written registration: no table override, no column-name override,
/// and one untagged (transient) field in the declaration.
#[derive(Debug, Default)]
pub struct Bare {
    pub id: Option<i64>,
    pub note: String,
}

impl Entity for Bare {
    fn def() -> &'static EntityDef {
        static DEF: EntityDef = EntityDef {
            type_name: "Bare",
            marked_entity: true,
            table: None,
            fields: &[
                FieldDef {
                    name: "id",
                    role: FieldRole::Id,
                },
                FieldDef {
                    name: "note",
                    role: FieldRole::Column {
                        name: None,
                        scalar: ScalarKind::Text,
                    },
                },
                FieldDef {
                    name: "scratch",
                    role: FieldRole::Transient,
                },
            ],
        };
        &DEF
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn column_values(&self) -> Vec<Value> {
        vec![Value::from(self.note.clone())]
    }

    fn set_column(&mut self, field: &str, value: Value) {
        if field == "note" {
            if let Some(v) = String::from_value(value) {
                self.note = v;
            }
        }
    }

    fn relation_ids(&self) -> Vec<Option<i64>> {
        Vec::new()
    }

    fn set_relation(&mut self, field: &str, _id: i64, _session: &mut Session) -> Result<()> {
        Err(Error::Validation(format!(
            "Bare has no relation field named {}",
            field
        )))
    }
}

macro_rules! stub_entity {
    ($name:ident, $def:expr) => {
        #[derive(Debug, Default)]
        pub struct $name;

        impl Entity for $name {
            fn def() -> &'static EntityDef {
                static DEF: EntityDef = $def;
                &DEF
            }

            fn id(&self) -> Option<i64> {
                None
            }

            fn set_id(&mut self, _id: i64) {}

            fn column_values(&self) -> Vec<Value> {
                Vec::new()
            }

            fn set_column(&mut self, _field: &str, _value: Value) {}

            fn relation_ids(&self) -> Vec<Option<i64>> {
                Vec::new()
            }

            fn set_relation(
                &mut self,
                field: &str,
                _id: i64,
                _session: &mut Session,
            ) -> Result<()> {
                Err(Error::Validation(format!(
                    "no relation field named {}",
                    field
                )))
            }
        }
    };
}

// Declared without the entity marker: resolution must fail.
stub_entity!(
    NotMarked,
    EntityDef {
        type_name: "NotMarked",
        marked_entity: false,
        table: None,
        fields: &[FieldDef {
            name: "id",
            role: FieldRole::Id,
        }],
    }
);

// Declared without an identifier field: resolution must fail.
stub_entity!(
    NoId,
    EntityDef {
        type_name: "NoId",
        marked_entity: true,
        table: None,
        fields: &[FieldDef {
            name: "note",
            role: FieldRole::Column {
                name: None,
                scalar: ScalarKind::Text,
            },
        }],
    }
);

// Identifier only: valid metadata, but nothing to update.
stub_entity!(
    Empty,
    EntityDef {
        type_name: "Empty",
        marked_entity: true,
        table: None,
        fields: &[FieldDef {
            name: "id",
            role: FieldRole::Id,
        }],
    }
);
