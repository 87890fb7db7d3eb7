use crate::value::Value;

/// A scalar usable as a map key.
///
/// Only booleans, the integer kinds, and strings qualify; the conversion
/// from [`Value`] is the decode-time gate that rejects everything else.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    String(String),
}

impl TryFrom<Value> for MapKey {
    /// The rejected value, handed back so callers can report its kind.
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Value> {
        match value {
            Value::Bool(v) => Ok(Self::Bool(v)),
            Value::I32(v) => Ok(Self::I32(v)),
            Value::I64(v) => Ok(Self::I64(v)),
            Value::U32(v) => Ok(Self::U32(v)),
            Value::U64(v) => Ok(Self::U64(v)),
            Value::String(v) => Ok(Self::String(v)),
            other => Err(other),
        }
    }
}

impl From<&str> for MapKey {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}
