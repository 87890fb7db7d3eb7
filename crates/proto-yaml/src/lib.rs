//! Schema-guided YAML decoding into dynamic messages.
//!
//! A [`Decoder`] reads one YAML document at a time from a multi-document
//! input and populates a [`DynamicMessage`] described by runtime
//! descriptors. Field kinds and cardinalities drive the decoding; the
//! well-known `google.protobuf` wrapper types (Duration, Timestamp, Any,
//! FieldMask) decode from their idiomatic textual forms instead of their
//! field structure.
//!
//! ```
//! use proto_yaml::{unmarshal, DescriptorPoolBuilder, DynamicMessage, Kind, MessageBuilder, Value};
//!
//! let mut builder = DescriptorPoolBuilder::new();
//! let mut msg = MessageBuilder::new("test.Message");
//! msg.field("astring", Kind::String);
//! builder.add_message(msg);
//! let pool = builder.build().unwrap();
//!
//! let mut out = DynamicMessage::new(pool.message_by_name("test.Message").unwrap());
//! unmarshal(b"astring: hello", &mut out).unwrap();
//! assert_eq!(out.get_by_name("astring"), Some(&Value::String("hello".into())));
//! ```

mod decoder;
mod error;
mod known;
mod node;

pub use decoder::{unmarshal, Decoder};
pub use error::DecodeError;

pub use proto_yaml_descriptor::{
    register_pool, Cardinality, DescriptorPool, DescriptorPoolBuilder, EnumDescriptor,
    FieldDescriptor, FieldType, GlobalRegistry, Kind, MessageBuilder, MessageDescriptor,
    PoolError, TypeResolver, WellKnown,
};
pub use proto_yaml_value::{DynamicMessage, IndexMap, MapKey, Value};
