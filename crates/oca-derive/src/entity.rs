//! Entity derive macro implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Entity can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Entity can only be derived for structs",
            ));
        }
    };

    let table = get_table_name(&input.attrs)?;

    let mut descriptors = Vec::new();
    let mut value_arms = Vec::new();
    let mut target_arms = Vec::new();

    for (ordinal, field) in fields.iter().enumerate() {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let field_name = ident.to_string();
        let binding = get_str_attr(&field.attrs, "db")?;
        let schema = get_str_attr(&field.attrs, "schema")?;

        let mut descriptor = quote! { oca::FieldDescriptor::new(#field_name) };
        if let Some(binding) = &binding {
            descriptor = quote! { #descriptor.binding(#binding) };
        }
        if let Some(schema) = &schema {
            descriptor = quote! { #descriptor.schema(#schema) };
        }
        descriptors.push(descriptor);

        if binding.as_deref().is_some_and(is_mapped) {
            value_arms.push(quote! {
                #ordinal => ::core::option::Option::Some(
                    oca::Value::from(::core::clone::Clone::clone(&self.#ident))
                ),
            });
            target_arms.push(quote! {
                #ordinal => ::core::option::Option::Some(&mut self.#ident),
            });
        }
    }

    let table_fn = table.map(|table| {
        quote! {
            fn table_name() -> ::core::option::Option<&'static str> {
                ::core::option::Option::Some(#table)
            }
        }
    });

    Ok(quote! {
        impl #impl_generics oca::Entity for #name #ty_generics #where_clause {
            #table_fn

            fn fields() -> &'static [oca::FieldDescriptor] {
                const FIELDS: &[oca::FieldDescriptor] = &[#(#descriptors),*];
                FIELDS
            }

            fn field_value(&self, ordinal: usize) -> ::core::option::Option<oca::Value> {
                match ordinal {
                    #(#value_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            fn field_target(
                &mut self,
                ordinal: usize,
            ) -> ::core::option::Option<&mut dyn oca::ScanTarget> {
                match ordinal {
                    #(#target_arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    })
}

/// A binding maps a field unless its column part is empty or `-`.
fn is_mapped(binding: &str) -> bool {
    let column = binding.split(',').next().unwrap_or("").trim();
    !column.is_empty() && column != "-"
}

/// `#[db(table = "name")]` on the struct.
fn get_table_name(attrs: &[Attribute]) -> Result<Option<String>> {
    let mut table = None;
    for attr in attrs {
        if !attr.path().is_ident("db") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let value: LitStr = meta.value()?.parse()?;
                table = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("expected `table = \"...\"`"))
            }
        })?;
    }
    Ok(table)
}

/// `#[name("...")]` on a field.
fn get_str_attr(attrs: &[Attribute], name: &str) -> Result<Option<String>> {
    let mut found = None;
    for attr in attrs {
        if attr.path().is_ident(name) {
            let lit: LitStr = attr.parse_args()?;
            if found.is_some() {
                return Err(syn::Error::new_spanned(
                    attr,
                    format!("duplicate #[{name}] attribute"),
                ));
            }
            found = Some(lit.value());
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_str(src: &str) -> Result<String> {
        let input: DeriveInput = syn::parse_str(src)?;
        expand(input).map(|ts| ts.to_string())
    }

    #[test]
    fn mapped_fields_get_accessors() {
        let out = expand_str(
            r#"
            #[db(table = "users")]
            struct User {
                #[db("id,pk,auto")]
                id: i64,
                #[db("-")]
                ignored: String,
                note: String,
            }
            "#,
        )
        .unwrap();
        assert!(out.contains("Some (\"users\")"));
        assert!(out.contains("self . id"));
        assert!(!out.contains("self . ignored"));
        assert!(!out.contains("self . note"));
        assert!(out.contains("FieldDescriptor :: new (\"note\")"));
    }

    #[test]
    fn rejects_tuple_structs() {
        assert!(expand_str("struct Pair(i32, i32);").is_err());
    }

    #[test]
    fn rejects_enums() {
        assert!(expand_str("enum E { A }").is_err());
    }

    #[test]
    fn rejects_unknown_struct_option() {
        assert!(expand_str("#[db(name = \"x\")] struct S { a: i32 }").is_err());
    }

    #[test]
    fn mapping_rule() {
        assert!(is_mapped("id,pk"));
        assert!(is_mapped(" title "));
        assert!(!is_mapped("-"));
        assert!(!is_mapped(" - ,pk"));
        assert!(!is_mapped(""));
    }
}
