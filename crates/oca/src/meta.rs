//! Field metadata resolution.
//!
//! Parses the binding (`column[,pk][,auto]`) and schema (`key:value,...`)
//! annotations of an [`Entity`] into [`FieldMeta`] values. Each entity type is
//! resolved once; the result is cached by `TypeId` and every caller receives its own
//! copy.
//!
//! Malformed annotations never fail the caller: the offending field is skipped.

use crate::entity::{Entity, FieldDescriptor};
use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// Resolved mapping of one struct field to a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMeta {
    /// Rust field name
    pub name: String,
    /// Column name from the binding annotation
    pub column: String,
    /// Position of the field in the struct
    pub ordinal: usize,
    /// Marked `pk`
    pub is_primary: bool,
    /// Marked `auto` (database generated)
    pub is_auto: bool,
    /// Options from the schema annotation
    pub schema: BTreeMap<String, String>,
}

impl FieldMeta {
    /// Whether the schema declares `default:now()`.
    pub fn defaults_to_now(&self) -> bool {
        self.schema
            .get("default")
            .is_some_and(|v| v == "now()")
    }
}

type MetaCache = RwLock<HashMap<TypeId, Arc<[FieldMeta]>>>;

fn cache() -> &'static MetaCache {
    static CACHE: OnceLock<MetaCache> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Resolved field metadata for `T`, in declaration order.
pub fn metadata<T: Entity>() -> Vec<FieldMeta> {
    let key = TypeId::of::<T>();

    if let Some(cached) = cache()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        return cached.to_vec();
    }

    // Computed outside the lock; a racing resolver produces the same slice.
    let resolved: Arc<[FieldMeta]> = resolve(T::type_name(), T::fields()).into();

    let mut map = cache().write().unwrap_or_else(PoisonError::into_inner);
    map.entry(key).or_insert(resolved).to_vec()
}

/// Column names of `T`, in declaration order.
pub fn column_names<T: Entity>() -> Vec<String> {
    metadata::<T>().into_iter().map(|m| m.column).collect()
}

/// Column name → field ordinal for `T`.
pub fn column_map<T: Entity>() -> HashMap<String, usize> {
    metadata::<T>()
        .into_iter()
        .map(|m| (m.column, m.ordinal))
        .collect()
}

/// Table name for `T`: the entity's own name, else lowercase type name + `s`.
pub fn table_name<T: Entity>() -> String {
    match T::table_name() {
        Some(name) => name.to_string(),
        None => format!("{}s", T::type_name().to_lowercase()),
    }
}

fn resolve(entity: &str, fields: &[FieldDescriptor]) -> Vec<FieldMeta> {
    let mut out = Vec::with_capacity(fields.len());
    for (ordinal, field) in fields.iter().enumerate() {
        let Some(binding) = field.binding else {
            continue;
        };
        match parse_binding(binding) {
            Some(parsed) => out.push(FieldMeta {
                name: field.name.to_string(),
                column: parsed.column,
                ordinal,
                is_primary: parsed.is_primary,
                is_auto: parsed.is_auto,
                schema: field.schema.map(parse_schema).unwrap_or_default(),
            }),
            None if binding.trim() == "-" => {}
            None => {
                tracing::warn!(
                    target: "oca.meta",
                    entity,
                    field = field.name,
                    binding,
                    "skipping field with malformed binding"
                );
            }
        }
    }
    tracing::debug!(target: "oca.meta", entity, columns = out.len(), "resolved entity metadata");
    out
}

#[derive(Debug, PartialEq, Eq)]
struct Binding {
    column: String,
    is_primary: bool,
    is_auto: bool,
}

/// Parse `column[,flag...]`. `None` means the field is not mapped.
fn parse_binding(binding: &str) -> Option<Binding> {
    let mut parts = binding.split(',');
    let column = parts.next()?.trim();
    if column.is_empty() || column == "-" || !is_sql_identifier(column) {
        return None;
    }

    let mut parsed = Binding {
        column: column.to_string(),
        is_primary: false,
        is_auto: false,
    };
    for flag in parts {
        match flag.trim() {
            "pk" => parsed.is_primary = true,
            "auto" => parsed.is_auto = true,
            _ => {}
        }
    }
    Some(parsed)
}

/// Parse `key:value[,key:value...]`; segments without a key are dropped.
fn parse_schema(schema: &str) -> BTreeMap<String, String> {
    schema
        .split(',')
        .filter_map(|segment| {
            let (key, value) = segment.split_once(':')?;
            let key = key.trim();
            (!key.is_empty()).then(|| (key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Bare parts (a letter or `_`, then letters, digits, `_` or `$`) or `"quoted"`
/// parts, joined by dots. Letters include non-ASCII ones.
fn is_sql_identifier(s: &str) -> bool {
    let mut chars = s.chars().peekable();
    loop {
        match chars.next() {
            Some('"') => {
                let mut len = 0;
                loop {
                    match chars.next() {
                        Some('"') if chars.peek() == Some(&'"') => {
                            chars.next();
                            len += 1;
                        }
                        Some('"') => break,
                        Some('\0') | None => return false,
                        Some(_) => len += 1,
                    }
                }
                if len == 0 {
                    return false;
                }
            }
            Some(c) if c.is_alphabetic() || c == '_' => {
                while chars
                    .peek()
                    .is_some_and(|c| c.is_alphanumeric() || *c == '_' || *c == '$')
                {
                    chars.next();
                }
            }
            _ => return false,
        }
        match chars.next() {
            None => return true,
            Some('.') => continue,
            Some(_) => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{ScanTarget, Value};

    #[derive(Default)]
    struct Todo {
        id: i64,
        title: String,
        created_at: Option<chrono::NaiveDateTime>,
    }

    impl Entity for Todo {
        fn fields() -> &'static [FieldDescriptor] {
            static FIELDS: [FieldDescriptor; 5] = [
                FieldDescriptor::new("id").binding("id,pk,auto"),
                FieldDescriptor::new("title").binding(" title "),
                FieldDescriptor::new("scratch"),
                FieldDescriptor::new("ignored").binding("-"),
                FieldDescriptor::new("created_at")
                    .binding("created_at")
                    .schema("default:now(), comment : creation time"),
            ];
            &FIELDS
        }

        fn field_value(&self, ordinal: usize) -> Option<Value> {
            match ordinal {
                0 => Some(self.id.into()),
                1 => Some(self.title.clone().into()),
                4 => Some(self.created_at.into()),
                _ => None,
            }
        }

        fn field_target(&mut self, ordinal: usize) -> Option<&mut dyn ScanTarget> {
            match ordinal {
                0 => Some(&mut self.id),
                1 => Some(&mut self.title),
                4 => Some(&mut self.created_at),
                _ => None,
            }
        }
    }

    #[test]
    fn resolves_bindings_in_order() {
        let metas = metadata::<Todo>();
        let columns: Vec<_> = metas.iter().map(|m| m.column.as_str()).collect();
        assert_eq!(columns, ["id", "title", "created_at"]);

        let id = &metas[0];
        assert!(id.is_primary && id.is_auto);
        assert_eq!(id.ordinal, 0);
        assert_eq!(metas[2].ordinal, 4);
        assert!(metas[2].defaults_to_now());
        assert_eq!(metas[2].schema.get("comment").map(String::as_str), Some("creation time"));
    }

    #[test]
    fn only_lowercase_now_default_is_recognized() {
        let field = |default: &str| FieldMeta {
            name: "created_at".into(),
            column: "created_at".into(),
            ordinal: 0,
            is_primary: false,
            is_auto: false,
            schema: parse_schema(&format!("default:{default}")),
        };
        assert!(field("now()").defaults_to_now());
        assert!(!field("NOW()").defaults_to_now());
        assert!(!field("now").defaults_to_now());
    }

    #[test]
    fn cached_reads_are_copies() {
        let mut first = metadata::<Todo>();
        first[0].column = "mutated".to_string();
        first.clear();
        let second = metadata::<Todo>();
        assert_eq!(second[0].column, "id");
        assert_eq!(second.len(), 3);
    }

    #[test]
    fn concurrent_first_resolution_is_consistent() {
        #[derive(Default)]
        struct Fresh;
        impl Entity for Fresh {
            fn fields() -> &'static [FieldDescriptor] {
                static FIELDS: [FieldDescriptor; 2] = [
                    FieldDescriptor::new("a").binding("a,pk"),
                    FieldDescriptor::new("b").binding("b"),
                ];
                &FIELDS
            }
            fn field_value(&self, _: usize) -> Option<Value> {
                None
            }
            fn field_target(&mut self, _: usize) -> Option<&mut dyn ScanTarget> {
                None
            }
        }

        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(metadata::<Fresh>))
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(results[0].len(), 2);
    }

    #[test]
    fn fallback_table_name() {
        assert_eq!(table_name::<Todo>(), "todos");
    }

    #[test]
    fn column_helpers() {
        assert_eq!(column_names::<Todo>(), ["id", "title", "created_at"]);
        let map = column_map::<Todo>();
        assert_eq!(map["created_at"], 4);
        assert_eq!(map["title"], 1);
    }

    #[test]
    fn binding_flags() {
        assert_eq!(
            parse_binding("user_id, pk ,auto,unknown"),
            Some(Binding {
                column: "user_id".into(),
                is_primary: true,
                is_auto: true
            })
        );
        assert_eq!(parse_binding("-"), None);
        assert_eq!(parse_binding(""), None);
        assert_eq!(parse_binding(",pk"), None);
        assert_eq!(parse_binding("bad column"), None);
        assert!(parse_binding("public.\"Users\"").is_some());
        assert_eq!(parse_binding("größe").map(|b| b.column), Some("größe".to_string()));
    }

    #[test]
    fn schema_options() {
        let opts = parse_schema("default:now(),size:255,broken, :x");
        assert_eq!(opts.len(), 2);
        assert_eq!(opts["default"], "now()");
        assert_eq!(opts["size"], "255");
    }

    #[test]
    fn identifiers() {
        assert!(is_sql_identifier("created_at"));
        assert!(is_sql_identifier("t.col$1"));
        assert!(is_sql_identifier("\"Weird \"\"Name\"\"\""));
        assert!(!is_sql_identifier("1abc"));
        assert!(!is_sql_identifier("a."));
        assert!(!is_sql_identifier("\"\""));
        assert!(!is_sql_identifier("a;drop"));
        assert!(is_sql_identifier("größe"));
        assert!(is_sql_identifier("_ñame$2"));
        assert!(!is_sql_identifier("2größe"));
    }
}
