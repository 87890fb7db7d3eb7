use indexmap::IndexMap;

use proto_yaml_descriptor::{FieldDescriptor, MessageDescriptor};

use crate::map_key::MapKey;
use crate::value::Value;

/// A mutable, in-progress instance of a described message type.
///
/// Fields are stored by declared name in set order. The `mutable_*`
/// accessors hand out plain `&mut` borrows scoped to the caller; nothing is
/// retained past them.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicMessage {
    descriptor: MessageDescriptor,
    fields: IndexMap<String, Value>,
}

impl DynamicMessage {
    pub fn new(descriptor: MessageDescriptor) -> Self {
        Self {
            descriptor,
            fields: IndexMap::new(),
        }
    }

    pub fn descriptor(&self) -> &MessageDescriptor {
        &self.descriptor
    }

    /// Set fields in set order. Unset fields are absent.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn get(&self, field: &FieldDescriptor) -> Option<&Value> {
        self.fields.get(field.name())
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Assigns a singular field. A later set overwrites an earlier one.
    pub fn set(&mut self, field: &FieldDescriptor, value: Value) {
        self.fields.insert(field.name().to_owned(), value);
    }

    /// Mutable handle to a nested message field, lazily initialized to an
    /// empty instance of the field's type.
    ///
    /// `None` when the field carries no concrete message type (the dynamic
    /// `Any` payload field).
    pub fn mutable_message(&mut self, field: &FieldDescriptor) -> Option<&mut DynamicMessage> {
        let ty = field.message_type()?;
        let slot = self
            .fields
            .entry(field.name().to_owned())
            .or_insert_with(|| Value::Message(DynamicMessage::new(ty.clone())));
        if !matches!(slot, Value::Message(_)) {
            *slot = Value::Message(DynamicMessage::new(ty));
        }
        match slot {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }

    /// Mutable handle to a list field, lazily initialized to an empty
    /// (present) list.
    pub fn mutable_list(&mut self, field: &FieldDescriptor) -> &mut Vec<Value> {
        let slot = self
            .fields
            .entry(field.name().to_owned())
            .or_insert_with(|| Value::List(Vec::new()));
        if !matches!(slot, Value::List(_)) {
            *slot = Value::List(Vec::new());
        }
        match slot {
            Value::List(items) => items,
            _ => unreachable!("slot was just normalized to a list"),
        }
    }

    /// Mutable handle to a map field, lazily initialized to an empty
    /// (present) map.
    pub fn mutable_map(&mut self, field: &FieldDescriptor) -> &mut IndexMap<MapKey, Value> {
        let slot = self
            .fields
            .entry(field.name().to_owned())
            .or_insert_with(|| Value::Map(IndexMap::new()));
        if !matches!(slot, Value::Map(_)) {
            *slot = Value::Map(IndexMap::new());
        }
        match slot {
            Value::Map(map) => map,
            _ => unreachable!("slot was just normalized to a map"),
        }
    }
}
