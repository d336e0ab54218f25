//! Registration macro - generates the `Entity` implementation
//!
//! `entity!` is the declarative registration step: it expands a mapping
//! block into the struct definition plus its [`Entity`](crate::Entity)
//! implementation, so field roles are written once and the ordered accessors
//! can never drift from the metadata.
//!
//! ```
//! use tinyorm::entity;
//!
//! entity! {
//!     /// A user row.
//!     pub struct User {
//!         table: "users",
//!         id: id,
//!         columns: {
//!             username: String => "username",
//!             email: String => "email",
//!         },
//!         relations: {},
//!     }
//! }
//! ```
//!
//! The identifier field becomes `Option<i64>` (unset before the first save)
//! and every relation field becomes `Option<Shared<Target>>`.

/// Declares a mapped struct and implements [`Entity`](crate::Entity) for it.
#[macro_export]
macro_rules! entity {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            table: $table:literal,
            id: $idfield:ident,
            columns: { $( $col:ident : $cty:ty => $cname:literal ),* $(,)? },
            relations: { $( $rel:ident : $rty:ty => $rcol:literal ),* $(,)? } $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Default)]
        $vis struct $name {
            pub $idfield: Option<i64>,
            $( pub $col: $cty, )*
            $( pub $rel: Option<$crate::entity::Shared<$rty>>, )*
        }

        impl $crate::entity::Entity for $name {
            fn def() -> &'static $crate::entity::EntityDef {
                static DEF: $crate::entity::EntityDef = $crate::entity::EntityDef {
                    type_name: stringify!($name),
                    marked_entity: true,
                    table: Some($table),
                    fields: &[
                        $crate::entity::FieldDef {
                            name: stringify!($idfield),
                            role: $crate::entity::FieldRole::Id,
                        },
                        $(
                            $crate::entity::FieldDef {
                                name: stringify!($col),
                                role: $crate::entity::FieldRole::Column {
                                    name: Some($cname),
                                    scalar: <$cty as $crate::value::ColumnType>::SCALAR,
                                },
                            },
                        )*
                        $(
                            $crate::entity::FieldDef {
                                name: stringify!($rel),
                                role: $crate::entity::FieldRole::Relation {
                                    join_column: Some($rcol),
                                },
                            },
                        )*
                    ],
                };
                &DEF
            }

            fn id(&self) -> Option<i64> {
                self.$idfield
            }

            fn set_id(&mut self, id: i64) {
                self.$idfield = Some(id);
            }

            fn column_values(&self) -> Vec<$crate::value::Value> {
                vec![ $( $crate::value::Value::from(self.$col.clone()), )* ]
            }

            fn set_column(&mut self, field: &str, value: $crate::value::Value) {
                let _ = &value;
                match field {
                    $(
                        stringify!($col) => {
                            if let Some(v) =
                                <$cty as $crate::value::FromValue>::from_value(value)
                            {
                                self.$col = v;
                            }
                        }
                    )*
                    _ => {}
                }
            }

            fn relation_ids(&self) -> Vec<Option<i64>> {
                vec![
                    $(
                        self.$rel
                            .as_ref()
                            .and_then(|e| $crate::entity::Entity::id(&*e.borrow())),
                    )*
                ]
            }

            fn set_relation(
                &mut self,
                field: &str,
                id: i64,
                session: &mut $crate::session::Session,
            ) -> $crate::Result<()> {
                let _ = (id, &session);
                match field {
                    $(
                        stringify!($rel) => {
                            self.$rel = session.find::<$rty>(id)?;
                            Ok(())
                        }
                    )*
                    other => Err($crate::Error::Validation(format!(
                        "{} has no relation field named {}",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}
