//! Dynamic message values for proto-yaml.
//!
//! [`DynamicMessage`] is a mutable, descriptor-described message instance;
//! [`Value`] is the closed union of everything a decoded field can hold.

mod map_key;
mod message;
mod value;

pub use indexmap::IndexMap;
pub use map_key::MapKey;
pub use message::DynamicMessage;
pub use value::Value;
