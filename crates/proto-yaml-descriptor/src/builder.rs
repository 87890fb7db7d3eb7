//! Pool construction.
//!
//! Type references are declared by full name and resolved in `build()`, so
//! message graphs may be recursive. Map fields synthesize a hidden
//! `<Message>.<FieldName>Entry` message with `key`/`value` fields, the same
//! shape schema compilers emit.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;

use crate::kind::{Cardinality, Kind};
use crate::pool::{DescriptorPool, EnumInner, FieldInner, MessageInner, PoolInner, TypeEntry};
use crate::well_known::WellKnown;

/// Error building a [`DescriptorPool`].
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("duplicate type name `{0}`")]
    DuplicateType(String),
    #[error("unknown type `{type_name}` referenced by field `{field}`")]
    UnknownType { field: String, type_name: String },
    #[error("field `{field}`: kind {kind} requires a named enum or message type")]
    MissingTypeName { field: String, kind: Kind },
    #[error("field `{field}`: {kind} is not usable as a map key kind")]
    InvalidMapKeyKind { field: String, kind: Kind },
}

/// Declared type of a field, resolved by name at build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Scalar(Kind),
    Enum(String),
    Message(String),
}

impl FieldType {
    pub fn message(full_name: impl Into<String>) -> Self {
        Self::Message(full_name.into())
    }

    pub fn enumeration(full_name: impl Into<String>) -> Self {
        Self::Enum(full_name.into())
    }
}

impl From<Kind> for FieldType {
    fn from(kind: Kind) -> Self {
        Self::Scalar(kind)
    }
}

struct FieldProto {
    name: String,
    cardinality: Cardinality,
    ty: FieldType,
    map_key: Option<Kind>,
}

/// Declaration of one message type.
pub struct MessageBuilder {
    full_name: String,
    fields: Vec<FieldProto>,
}

impl MessageBuilder {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            fields: Vec::new(),
        }
    }

    /// Declares a singular field.
    pub fn field(&mut self, name: &str, ty: impl Into<FieldType>) -> &mut Self {
        self.push(name, Cardinality::Singular, ty.into(), None)
    }

    /// Declares a repeated field.
    pub fn repeated(&mut self, name: &str, ty: impl Into<FieldType>) -> &mut Self {
        self.push(name, Cardinality::List, ty.into(), None)
    }

    /// Declares a map field with the given key kind and value type.
    pub fn map(&mut self, name: &str, key: Kind, value: impl Into<FieldType>) -> &mut Self {
        self.push(name, Cardinality::Map, value.into(), Some(key))
    }

    fn push(
        &mut self,
        name: &str,
        cardinality: Cardinality,
        ty: FieldType,
        map_key: Option<Kind>,
    ) -> &mut Self {
        self.fields.push(FieldProto {
            name: name.to_owned(),
            cardinality,
            ty,
            map_key,
        });
        self
    }
}

/// Builder for a [`DescriptorPool`].
#[derive(Default)]
pub struct DescriptorPoolBuilder {
    messages: Vec<MessageBuilder>,
    enums: Vec<EnumInner>,
}

impl DescriptorPoolBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an enum type with its `(name, number)` value table.
    pub fn add_enum<'a>(
        &mut self,
        full_name: impl Into<String>,
        values: impl IntoIterator<Item = (&'a str, i32)>,
    ) -> &mut Self {
        let values: Vec<(String, i32)> = values
            .into_iter()
            .map(|(name, number)| (name.to_owned(), number))
            .collect();
        let by_name = values.iter().map(|(n, v)| (n.clone(), *v)).collect();
        self.enums.push(EnumInner {
            full_name: full_name.into(),
            values,
            by_name,
        });
        self
    }

    /// Registers a message type.
    pub fn add_message(&mut self, message: MessageBuilder) -> &mut Self {
        self.messages.push(message);
        self
    }

    /// Resolves all type references and produces the immutable pool.
    ///
    /// Descriptors for the well-known `google.protobuf` wrapper types are
    /// added automatically unless a type of the same name was declared.
    pub fn build(self) -> Result<DescriptorPool, PoolError> {
        let mut by_name: HashMap<String, TypeEntry> = HashMap::new();
        for (index, e) in self.enums.iter().enumerate() {
            if by_name
                .insert(e.full_name.clone(), TypeEntry::Enum(index))
                .is_some()
            {
                return Err(PoolError::DuplicateType(e.full_name.clone()));
            }
        }
        for (index, m) in self.messages.iter().enumerate() {
            if by_name
                .insert(m.full_name.clone(), TypeEntry::Message(index))
                .is_some()
            {
                return Err(PoolError::DuplicateType(m.full_name.clone()));
            }
        }

        // Reserve slots for the builtin wrapper types that were not declared
        // by hand. Their indices come right after the user messages.
        let mut next_index = self.messages.len();
        let mut builtins: Vec<WellKnown> = Vec::new();
        for wk in WellKnown::ALL {
            if !by_name.contains_key(wk.full_name()) {
                by_name.insert(wk.full_name().to_owned(), TypeEntry::Message(next_index));
                builtins.push(wk);
                next_index += 1;
            }
        }

        let mut entries: Vec<MessageInner> = Vec::new();
        let mut resolved: Vec<MessageInner> = Vec::new();
        for m in &self.messages {
            let mut fields: IndexMap<String, FieldInner> = IndexMap::new();
            for f in &m.fields {
                let field_full_name = format!("{}.{}", m.full_name, f.name);
                let (kind, type_ref) = resolve_type(&by_name, &field_full_name, &f.ty)?;
                let inner = if f.cardinality == Cardinality::Map {
                    let key = f.map_key.unwrap_or(Kind::String);
                    if matches!(key, Kind::Enum | Kind::Message) {
                        return Err(PoolError::InvalidMapKeyKind {
                            field: field_full_name,
                            kind: key,
                        });
                    }
                    let entry_name = format!("{}.{}Entry", m.full_name, camel_case(&f.name));
                    if by_name
                        .insert(entry_name.clone(), TypeEntry::Message(next_index))
                        .is_some()
                    {
                        return Err(PoolError::DuplicateType(entry_name));
                    }
                    let mut entry_fields: IndexMap<String, FieldInner> = IndexMap::new();
                    entry_fields.insert(
                        "key".to_owned(),
                        FieldInner {
                            name: "key".to_owned(),
                            kind: key,
                            cardinality: Cardinality::Singular,
                            type_ref: None,
                        },
                    );
                    entry_fields.insert(
                        "value".to_owned(),
                        FieldInner {
                            name: "value".to_owned(),
                            kind,
                            cardinality: Cardinality::Singular,
                            type_ref,
                        },
                    );
                    entries.push(MessageInner {
                        full_name: entry_name,
                        fields: entry_fields,
                        is_map_entry: true,
                        well_known: None,
                    });
                    let entry_index = next_index;
                    next_index += 1;
                    FieldInner {
                        name: f.name.clone(),
                        kind: Kind::Message,
                        cardinality: Cardinality::Map,
                        type_ref: Some(TypeEntry::Message(entry_index)),
                    }
                } else {
                    FieldInner {
                        name: f.name.clone(),
                        kind,
                        cardinality: f.cardinality,
                        type_ref,
                    }
                };
                fields.insert(f.name.clone(), inner);
            }
            resolved.push(MessageInner {
                full_name: m.full_name.clone(),
                fields,
                is_map_entry: false,
                well_known: None,
            });
        }

        let mut messages = resolved;
        for wk in builtins {
            messages.push(wk.builtin_inner());
        }
        messages.extend(entries);

        Ok(DescriptorPool {
            inner: Arc::new(PoolInner {
                messages,
                enums: self.enums,
                by_name,
            }),
        })
    }
}

fn resolve_type(
    by_name: &HashMap<String, TypeEntry>,
    field: &str,
    ty: &FieldType,
) -> Result<(Kind, Option<TypeEntry>), PoolError> {
    match ty {
        FieldType::Scalar(kind) => {
            if matches!(kind, Kind::Enum | Kind::Message) {
                return Err(PoolError::MissingTypeName {
                    field: field.to_owned(),
                    kind: *kind,
                });
            }
            Ok((*kind, None))
        }
        FieldType::Enum(name) => match by_name.get(name) {
            Some(entry @ TypeEntry::Enum(_)) => Ok((Kind::Enum, Some(*entry))),
            _ => Err(PoolError::UnknownType {
                field: field.to_owned(),
                type_name: name.clone(),
            }),
        },
        FieldType::Message(name) => match by_name.get(name) {
            Some(entry @ TypeEntry::Message(_)) => Ok((Kind::Message, Some(*entry))),
            _ => Err(PoolError::UnknownType {
                field: field.to_owned(),
                type_name: name.clone(),
            }),
        },
    }
}

/// `foo_bar_baz` → `FooBarBaz`, the conventional map-entry type naming.
fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
