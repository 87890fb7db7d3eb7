//! Descriptor arena and handle types.
//!
//! The pool owns all metadata behind an `Arc`; descriptors are (pool, index)
//! handles, so cloning a descriptor never copies schema data and lookups are
//! plain index/array accesses.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::kind::{Cardinality, Kind};
use crate::well_known::WellKnown;

/// Immutable set of message and enum descriptors.
///
/// Built once by [`crate::DescriptorPoolBuilder`], then shared freely; a
/// clone is a reference-count bump.
#[derive(Clone)]
pub struct DescriptorPool {
    pub(crate) inner: Arc<PoolInner>,
}

pub(crate) struct PoolInner {
    pub(crate) messages: Vec<MessageInner>,
    pub(crate) enums: Vec<EnumInner>,
    pub(crate) by_name: HashMap<String, TypeEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TypeEntry {
    Message(usize),
    Enum(usize),
}

pub(crate) struct MessageInner {
    pub(crate) full_name: String,
    pub(crate) fields: IndexMap<String, FieldInner>,
    pub(crate) is_map_entry: bool,
    /// Set only on the auto-registered builtin wrapper descriptors. A
    /// user-declared type of the same full name decodes by its own fields.
    pub(crate) well_known: Option<WellKnown>,
}

pub(crate) struct FieldInner {
    pub(crate) name: String,
    pub(crate) kind: Kind,
    pub(crate) cardinality: Cardinality,
    /// Target of enum/message kinds. `None` is legal only for the dynamic
    /// payload field of the builtin `google.protobuf.Any` type.
    pub(crate) type_ref: Option<TypeEntry>,
}

pub(crate) struct EnumInner {
    pub(crate) full_name: String,
    pub(crate) values: Vec<(String, i32)>,
    pub(crate) by_name: HashMap<String, i32>,
}

impl DescriptorPool {
    /// Looks up a message type by its full name.
    pub fn message_by_name(&self, full_name: &str) -> Option<MessageDescriptor> {
        match self.inner.by_name.get(full_name)? {
            TypeEntry::Message(index) => Some(MessageDescriptor {
                pool: self.clone(),
                index: *index,
            }),
            TypeEntry::Enum(_) => None,
        }
    }

    /// Looks up an enum type by its full name.
    pub fn enum_by_name(&self, full_name: &str) -> Option<EnumDescriptor> {
        match self.inner.by_name.get(full_name)? {
            TypeEntry::Enum(index) => Some(EnumDescriptor {
                pool: self.clone(),
                index: *index,
            }),
            TypeEntry::Message(_) => None,
        }
    }

    /// All message types in the pool, in registration order.
    pub fn messages(&self) -> impl Iterator<Item = MessageDescriptor> + '_ {
        (0..self.inner.messages.len()).map(move |index| MessageDescriptor {
            pool: self.clone(),
            index,
        })
    }

    fn same_pool(&self, other: &DescriptorPool) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for DescriptorPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorPool")
            .field("messages", &self.inner.messages.len())
            .field("enums", &self.inner.enums.len())
            .finish()
    }
}

/// Handle to one message type in a [`DescriptorPool`].
#[derive(Clone)]
pub struct MessageDescriptor {
    pool: DescriptorPool,
    index: usize,
}

impl MessageDescriptor {
    fn inner(&self) -> &MessageInner {
        &self.pool.inner.messages[self.index]
    }

    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }

    pub fn full_name(&self) -> &str {
        // Handles keep the pool alive, so the borrow can be tied to `self`.
        &self.pool.inner.messages[self.index].full_name
    }

    /// The well-known identity of this type. `None` for every user-declared
    /// type, including one that reuses a builtin's full name.
    pub fn well_known(&self) -> Option<WellKnown> {
        self.inner().well_known
    }

    /// True for the synthetic entry type backing a map field.
    pub fn is_map_entry(&self) -> bool {
        self.inner().is_map_entry
    }

    pub fn field_by_name(&self, name: &str) -> Option<FieldDescriptor> {
        let field = self.inner().fields.get_index_of(name)?;
        Some(FieldDescriptor {
            pool: self.pool.clone(),
            message: self.index,
            field,
        })
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = FieldDescriptor> + '_ {
        (0..self.inner().fields.len()).map(move |field| FieldDescriptor {
            pool: self.pool.clone(),
            message: self.index,
            field,
        })
    }

    /// Key field of a map-entry type.
    pub fn map_key(&self) -> Option<FieldDescriptor> {
        if !self.is_map_entry() {
            return None;
        }
        self.field_by_name("key")
    }

    /// Value field of a map-entry type.
    pub fn map_value(&self) -> Option<FieldDescriptor> {
        if !self.is_map_entry() {
            return None;
        }
        self.field_by_name("value")
    }
}

impl PartialEq for MessageDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.pool.same_pool(&other.pool)
    }
}

impl Eq for MessageDescriptor {}

impl fmt::Debug for MessageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageDescriptor({})", self.full_name())
    }
}

/// Handle to one field of a message type.
#[derive(Clone)]
pub struct FieldDescriptor {
    pool: DescriptorPool,
    message: usize,
    field: usize,
}

impl FieldDescriptor {
    fn inner(&self) -> &FieldInner {
        &self.pool.inner.messages[self.message].fields[self.field]
    }

    pub fn name(&self) -> &str {
        &self.pool.inner.messages[self.message].fields[self.field].name
    }

    /// `<containing message full name>.<field name>`.
    pub fn full_name(&self) -> String {
        format!(
            "{}.{}",
            self.pool.inner.messages[self.message].full_name,
            self.name()
        )
    }

    pub fn kind(&self) -> Kind {
        self.inner().kind
    }

    pub fn cardinality(&self) -> Cardinality {
        self.inner().cardinality
    }

    pub fn is_list(&self) -> bool {
        self.cardinality() == Cardinality::List
    }

    pub fn is_map(&self) -> bool {
        self.cardinality() == Cardinality::Map
    }

    pub fn containing_message(&self) -> MessageDescriptor {
        MessageDescriptor {
            pool: self.pool.clone(),
            index: self.message,
        }
    }

    /// Enum table of an enum-kind field.
    pub fn enum_type(&self) -> Option<EnumDescriptor> {
        match self.inner().type_ref {
            Some(TypeEntry::Enum(index)) => Some(EnumDescriptor {
                pool: self.pool.clone(),
                index,
            }),
            _ => None,
        }
    }

    /// Message type of a message-kind field (the synthetic entry type for a
    /// map field). `None` for the dynamic `Any` payload field.
    pub fn message_type(&self) -> Option<MessageDescriptor> {
        match self.inner().type_ref {
            Some(TypeEntry::Message(index)) => Some(MessageDescriptor {
                pool: self.pool.clone(),
                index,
            }),
            _ => None,
        }
    }

    /// Key field of the entry type behind a map field.
    pub fn map_key(&self) -> Option<FieldDescriptor> {
        self.message_type()?.map_key()
    }

    /// Value field of the entry type behind a map field.
    pub fn map_value(&self) -> Option<FieldDescriptor> {
        self.message_type()?.map_value()
    }
}

impl PartialEq for FieldDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
            && self.field == other.field
            && self.pool.same_pool(&other.pool)
    }
}

impl Eq for FieldDescriptor {}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldDescriptor({})", self.full_name())
    }
}

/// Handle to one enum type in a [`DescriptorPool`].
#[derive(Clone)]
pub struct EnumDescriptor {
    pool: DescriptorPool,
    index: usize,
}

impl EnumDescriptor {
    fn inner(&self) -> &EnumInner {
        &self.pool.inner.enums[self.index]
    }

    pub fn full_name(&self) -> &str {
        &self.pool.inner.enums[self.index].full_name
    }

    /// Declared number of a value name.
    pub fn value_by_name(&self, name: &str) -> Option<i32> {
        self.inner().by_name.get(name).copied()
    }

    /// `(name, number)` pairs in declaration order.
    pub fn values(&self) -> impl Iterator<Item = (&str, i32)> + '_ {
        self.inner().values.iter().map(|(n, v)| (n.as_str(), *v))
    }
}

impl PartialEq for EnumDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.pool.same_pool(&other.pool)
    }
}

impl Eq for EnumDescriptor {}

impl fmt::Debug for EnumDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnumDescriptor({})", self.full_name())
    }
}
