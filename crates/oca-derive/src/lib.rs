//! Derive macros for oca
//!
//! Provides `#[derive(Entity)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod entity;

/// Derive the `Entity` trait for a struct.
///
/// # Example
///
/// ```ignore
/// use oca::Entity;
///
/// #[derive(Default, Entity)]
/// #[db(table = "users")]
/// struct User {
///     #[db("id,pk,auto")]
///     id: i64,
///     #[db("email")]
///     email: String,
///     #[db("created_at")]
///     #[schema("default:now()")]
///     created_at: Option<chrono::NaiveDateTime>,
///     cache: Vec<u8>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[db(table = "name")]` on the struct - Table name (default: lowercase type name + `s`)
/// - `#[db("column[,pk][,auto]")]` - Map the field to a column; `"-"` or no attribute leaves it unmapped
/// - `#[schema("key:value[,key:value]")]` - Column options; `default:now()` is written as `NOW()` on insert
///
/// Mapped fields must convert into `oca::Value` and implement `oca::FromValue`.
#[proc_macro_derive(Entity, attributes(db, schema))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    entity::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
