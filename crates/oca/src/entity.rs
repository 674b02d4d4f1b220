//! The [`Entity`] trait: a record type mapped to a table row.
//!
//! Implementations are normally generated with `#[derive(Entity)]`:
//!
//! ```ignore
//! use oca::Entity;
//!
//! #[derive(Debug, Default, Entity)]
//! #[db(table = "users")]
//! struct User {
//!     #[db("id,pk,auto")]
//!     id: i64,
//!     #[db("name")]
//!     name: String,
//!     #[db("created_at")]
//!     #[schema("default:now()")]
//!     created_at: chrono::DateTime<chrono::Utc>,
//!     // not mapped
//!     scratch: Vec<String>,
//! }
//! ```

use crate::value::{ScanTarget, Value};

/// Static declaration of one struct field.
///
/// `binding` is the `column[,pk][,auto]` annotation and `schema` the
/// `key:value[,key:value]` annotation, both unparsed. The position of a descriptor
/// in [`Entity::fields`] is the field's ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub binding: Option<&'static str>,
    pub schema: Option<&'static str>,
}

impl FieldDescriptor {
    /// An unannotated field.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            binding: None,
            schema: None,
        }
    }

    /// Attach the column binding annotation.
    pub const fn binding(mut self, binding: &'static str) -> Self {
        self.binding = Some(binding);
        self
    }

    /// Attach the schema options annotation.
    pub const fn schema(mut self, schema: &'static str) -> Self {
        self.schema = Some(schema);
        self
    }
}

/// A record type that can be read from and written to a table.
pub trait Entity: Default + Send + Sync + 'static {
    /// Explicit table name. `None` falls back to lowercase type name + `s`.
    fn table_name() -> Option<&'static str> {
        None
    }

    /// Unqualified type name used for the fallback table name.
    fn type_name() -> &'static str {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// Every field of the type, in declaration order.
    fn fields() -> &'static [FieldDescriptor];

    /// Current value of the field at `ordinal`, if that field is mapped.
    fn field_value(&self, ordinal: usize) -> Option<Value>;

    /// Writable slot for the field at `ordinal`, if that field is mapped.
    fn field_target(&mut self, ordinal: usize) -> Option<&mut dyn ScanTarget>;
}
