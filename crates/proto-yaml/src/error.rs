//! Decode error taxonomy.

use thiserror::Error;

/// Error decoding a YAML document into a dynamic message.
///
/// Every variant is terminal for the current decode call; the engine never
/// skips a malformed field and never panics on malformed input.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Node shape and declared field/message shape disagree.
    #[error("cannot decode {actual} into {expected} for `{context}`")]
    TypeMismatch {
        /// Message full name or field full name.
        context: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A mapping key does not name a declared field.
    #[error("unknown field `{field}` in message `{message}`")]
    UnknownField { message: String, field: String },

    /// Scalar text fails to parse as the demanded primitive.
    #[error("cannot parse `{text}` as {kind} for `{field}`")]
    InvalidScalarLiteral {
        field: String,
        kind: &'static str,
        text: String,
    },

    /// A decoded map key is not a permitted key type.
    #[error("cannot use a {kind} value as a map key in `{field}`")]
    InvalidMapKey { field: String, kind: &'static str },

    /// The `@type` discriminator does not resolve to a known message type.
    #[error("cannot resolve `{type_url}` to a message type")]
    UnresolvedAnyType { type_url: String },

    /// An `Any` mapping carries no `@type` discriminator at all.
    #[error("no `@type` key in mapping for `{message}`")]
    MissingAnyTypeKey { message: String },

    /// Contract violation: a field kind the scalar coercer cannot handle.
    #[error("cannot decode a {node} as a {kind} value for `{field}`")]
    UnsupportedFieldKind {
        field: String,
        kind: &'static str,
        node: &'static str,
    },

    /// Sentinel: the document stream is exhausted. Not a failure.
    #[error("end of document stream")]
    EndOfStream,

    /// The underlying document parser rejected the input.
    #[error("invalid document: {0}")]
    Parse(#[from] serde_yaml::Error),
}

impl DecodeError {
    /// True for the end-of-stream sentinel.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }
}
