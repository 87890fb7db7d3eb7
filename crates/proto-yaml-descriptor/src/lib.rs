//! Runtime schema metadata for proto-yaml.
//!
//! A [`DescriptorPool`] is an immutable, cheaply clonable arena of message
//! and enum metadata, built once by [`DescriptorPoolBuilder`] and consulted
//! by the decoder through the [`MessageDescriptor`] / [`FieldDescriptor`] /
//! [`EnumDescriptor`] handle types.

mod builder;
mod kind;
mod pool;
mod registry;
mod well_known;

pub use builder::{DescriptorPoolBuilder, FieldType, MessageBuilder, PoolError};
pub use kind::{Cardinality, Kind};
pub use pool::{DescriptorPool, EnumDescriptor, FieldDescriptor, MessageDescriptor};
pub use registry::{register_pool, GlobalRegistry, TypeResolver};
pub use well_known::WellKnown;
