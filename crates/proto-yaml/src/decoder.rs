//! The schema-guided decoding engine.
//!
//! `decode_message` walks mapping entries against the destination's
//! descriptor, `decode_field` dispatches on the field's declared
//! cardinality and kind, and `decode_value` coerces leaf scalars. Declared
//! cardinality is authoritative: a node shape that disagrees with it is a
//! hard error, never reinterpreted.

use std::sync::Arc;

use base64::prelude::{Engine as _, BASE64_STANDARD};
use serde::Deserialize;

use proto_yaml_descriptor::{Cardinality, FieldDescriptor, GlobalRegistry, Kind, TypeResolver};
use proto_yaml_value::{DynamicMessage, MapKey, Value};

use crate::error::DecodeError;
use crate::known;
use crate::node::TreeNode as Node;

/// Interprets `input` as a single YAML document and populates `dest`.
pub fn unmarshal(input: &[u8], dest: &mut DynamicMessage) -> Result<(), DecodeError> {
    Decoder::from_slice(input).decode(dest)
}

/// Decodes a stream of YAML documents as dynamic messages.
///
/// Each [`decode`](Decoder::decode) call consumes one document. A decoder
/// holds the stream cursor, so it serves one caller at a time; independent
/// decoders share nothing mutable and may run in parallel.
pub struct Decoder {
    input: Vec<u8>,
    documents: Option<std::vec::IntoIter<Result<Node, serde_yaml::Error>>>,
    resolver: Arc<dyn TypeResolver>,
}

impl Decoder {
    pub fn from_slice(input: &[u8]) -> Self {
        Self {
            input: input.to_vec(),
            documents: None,
            resolver: Arc::new(GlobalRegistry),
        }
    }

    /// Swaps the resolver used for `Any` discriminator lookup. The default
    /// is the process-wide [`GlobalRegistry`].
    pub fn set_type_resolver(&mut self, resolver: Arc<dyn TypeResolver>) {
        self.resolver = resolver;
    }

    pub(crate) fn resolver(&self) -> &dyn TypeResolver {
        &*self.resolver
    }

    /// Decodes the next document into `dest`.
    ///
    /// A syntax error surfaces on the call that reaches the faulty
    /// document; earlier documents decode normally. Returns
    /// [`DecodeError::EndOfStream`] once the stream is exhausted; that is a
    /// sentinel, not a failure.
    pub fn decode(&mut self, dest: &mut DynamicMessage) -> Result<(), DecodeError> {
        if self.documents.is_none() {
            let documents: Vec<Result<Node, serde_yaml::Error>> =
                serde_yaml::Deserializer::from_slice(&self.input)
                    .map(Node::deserialize)
                    .collect();
            self.documents = Some(documents.into_iter());
        }
        let node = match self.documents.as_mut().and_then(Iterator::next) {
            Some(document) => document?,
            None => return Err(DecodeError::EndOfStream),
        };
        self.decode_message(dest, &node)
    }

    /// Decodes one node as a message of `dest`'s described type. Dispatch
    /// to a well-known override happens here, before field iteration.
    pub(crate) fn decode_message(
        &self,
        dest: &mut DynamicMessage,
        node: &Node,
    ) -> Result<(), DecodeError> {
        if let Some(wk) = dest.descriptor().well_known() {
            return known::decode_well_known(self, wk, dest, node);
        }

        let Some(mapping) = node.as_mapping() else {
            return Err(DecodeError::TypeMismatch {
                context: dest.descriptor().full_name().to_owned(),
                expected: "mapping",
                actual: node.shape_name(),
            });
        };
        self.decode_message_entries(dest, mapping.iter().map(|(k, v)| (k, v)))
    }

    /// Decodes (key, value) entries against `dest`'s field table. Shared
    /// with the `Any` override, which filters out its discriminator entry.
    pub(crate) fn decode_message_entries<'a, I>(
        &self,
        dest: &mut DynamicMessage,
        entries: I,
    ) -> Result<(), DecodeError>
    where
        I: IntoIterator<Item = (&'a Node, &'a Node)>,
    {
        for (key_node, value_node) in entries {
            let Some(name) = key_node.scalar_text() else {
                return Err(DecodeError::TypeMismatch {
                    context: dest.descriptor().full_name().to_owned(),
                    expected: "scalar field name",
                    actual: key_node.shape_name(),
                });
            };
            let Some(fd) = dest.descriptor().field_by_name(&name) else {
                return Err(DecodeError::UnknownField {
                    message: dest.descriptor().full_name().to_owned(),
                    field: name,
                });
            };
            self.decode_field(dest, &fd, value_node)?;
        }
        Ok(())
    }

    /// Decodes one value node guided by a field descriptor. The main
    /// dispatch of the engine.
    pub(crate) fn decode_field(
        &self,
        dest: &mut DynamicMessage,
        fd: &FieldDescriptor,
        node: &Node,
    ) -> Result<(), DecodeError> {
        match fd.cardinality() {
            Cardinality::Map => {
                let Some(mapping) = node.as_mapping() else {
                    return Err(DecodeError::TypeMismatch {
                        context: fd.full_name(),
                        expected: "mapping",
                        actual: node.shape_name(),
                    });
                };
                let (Some(key_fd), Some(value_fd)) = (fd.map_key(), fd.map_value()) else {
                    return Err(DecodeError::UnsupportedFieldKind {
                        field: fd.full_name(),
                        kind: "map",
                        node: node.shape_name(),
                    });
                };
                let map = dest.mutable_map(fd);
                for (key_node, value_node) in mapping {
                    let key_value = self.decode_value(&key_fd, key_node)?;
                    let key =
                        MapKey::try_from(key_value).map_err(|value| DecodeError::InvalidMapKey {
                            field: fd.full_name(),
                            kind: value.kind_name(),
                        })?;
                    if value_fd.kind() == Kind::Message {
                        let Some(ty) = value_fd.message_type() else {
                            return Err(DecodeError::UnsupportedFieldKind {
                                field: fd.full_name(),
                                kind: "message",
                                node: value_node.shape_name(),
                            });
                        };
                        let mut entry = DynamicMessage::new(ty);
                        self.decode_message(&mut entry, value_node)?;
                        map.insert(key, Value::Message(entry));
                    } else {
                        let value = self.decode_value(&value_fd, value_node)?;
                        map.insert(key, value);
                    }
                }
                Ok(())
            }

            Cardinality::List => {
                let Some(sequence) = node.as_sequence() else {
                    return Err(DecodeError::TypeMismatch {
                        context: fd.full_name(),
                        expected: "sequence",
                        actual: node.shape_name(),
                    });
                };
                if fd.kind() == Kind::Message {
                    let Some(ty) = fd.message_type() else {
                        return Err(DecodeError::UnsupportedFieldKind {
                            field: fd.full_name(),
                            kind: "message",
                            node: node.shape_name(),
                        });
                    };
                    let list = dest.mutable_list(fd);
                    for item in sequence {
                        let mut element = DynamicMessage::new(ty.clone());
                        self.decode_message(&mut element, item)?;
                        list.push(Value::Message(element));
                    }
                } else {
                    let list = dest.mutable_list(fd);
                    for item in sequence {
                        let value = self.decode_value(fd, item)?;
                        list.push(value);
                    }
                }
                Ok(())
            }

            Cardinality::Singular => {
                if fd.kind() == Kind::Message {
                    return match dest.mutable_message(fd) {
                        Some(nested) => self.decode_message(nested, node),
                        None => Err(DecodeError::UnsupportedFieldKind {
                            field: fd.full_name(),
                            kind: "message",
                            node: node.shape_name(),
                        }),
                    };
                }
                if !node.is_scalar() {
                    return Err(DecodeError::TypeMismatch {
                        context: fd.full_name(),
                        expected: "scalar",
                        actual: node.shape_name(),
                    });
                }
                let value = self.decode_value(fd, node)?;
                dest.set(fd, value);
                Ok(())
            }
        }
    }

    /// Coerces a leaf node into a value of the field's primitive kind.
    pub(crate) fn decode_value(
        &self,
        fd: &FieldDescriptor,
        node: &Node,
    ) -> Result<Value, DecodeError> {
        if !node.is_scalar() {
            return Err(DecodeError::TypeMismatch {
                context: fd.full_name(),
                expected: "scalar",
                actual: node.shape_name(),
            });
        }
        let invalid = || DecodeError::InvalidScalarLiteral {
            field: fd.full_name(),
            kind: fd.kind().as_str(),
            text: node.scalar_text().unwrap_or_else(|| "null".to_owned()),
        };

        match fd.kind() {
            Kind::Bool => node.parse_bool().map(Value::Bool).ok_or_else(invalid),

            Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => node
                .parse_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(Value::I32)
                .ok_or_else(invalid),

            Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => {
                node.parse_i64().map(Value::I64).ok_or_else(invalid)
            }

            Kind::Uint32 | Kind::Fixed32 => node
                .parse_u64()
                .and_then(|v| u32::try_from(v).ok())
                .map(Value::U32)
                .ok_or_else(invalid),

            Kind::Uint64 | Kind::Fixed64 => {
                node.parse_u64().map(Value::U64).ok_or_else(invalid)
            }

            Kind::Float => node
                .parse_f64()
                .map(|v| Value::F32(v as f32))
                .ok_or_else(invalid),

            Kind::Double => node.parse_f64().map(Value::F64).ok_or_else(invalid),

            Kind::String => node.scalar_text().map(Value::String).ok_or_else(invalid),

            Kind::Bytes => {
                let text = node.scalar_text().ok_or_else(invalid)?;
                BASE64_STANDARD
                    .decode(text.as_bytes())
                    .map(Value::Bytes)
                    .map_err(|_| invalid())
            }

            Kind::Enum => {
                let Some(ed) = fd.enum_type() else {
                    return Err(DecodeError::UnsupportedFieldKind {
                        field: fd.full_name(),
                        kind: "enum",
                        node: node.shape_name(),
                    });
                };
                // Value names first; bare numbers are accepted without
                // checking against the declared set (open enum).
                if let Node::String(name) = node {
                    if let Some(number) = ed.value_by_name(name) {
                        return Ok(Value::EnumNumber(number));
                    }
                }
                node.parse_i64()
                    .and_then(|v| i32::try_from(v).ok())
                    .map(Value::EnumNumber)
                    .ok_or_else(invalid)
            }

            Kind::Message => Err(DecodeError::UnsupportedFieldKind {
                field: fd.full_name(),
                kind: "message",
                node: node.shape_name(),
            }),
        }
    }
}

impl From<&str> for Decoder {
    fn from(input: &str) -> Self {
        Self::from_slice(input.as_bytes())
    }
}

impl From<&[u8]> for Decoder {
    fn from(input: &[u8]) -> Self {
        Self::from_slice(input)
    }
}
