//! Well-known wrapper type identities.
//!
//! These message types have a textual representation that differs from
//! their declared field structure, so the decoder dispatches on their
//! identity before generic field iteration. The set is closed; extending it
//! means adding a variant and its match arms.

use indexmap::IndexMap;

use crate::kind::{Cardinality, Kind};
use crate::pool::{FieldInner, MessageInner};

/// Identity of a well-known wrapper type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnown {
    Duration,
    Timestamp,
    Any,
    FieldMask,
}

impl WellKnown {
    pub const ALL: [WellKnown; 4] = [
        WellKnown::Duration,
        WellKnown::Timestamp,
        WellKnown::Any,
        WellKnown::FieldMask,
    ];

    pub fn full_name(self) -> &'static str {
        match self {
            Self::Duration => "google.protobuf.Duration",
            Self::Timestamp => "google.protobuf.Timestamp",
            Self::Any => "google.protobuf.Any",
            Self::FieldMask => "google.protobuf.FieldMask",
        }
    }

    pub fn from_full_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|wk| wk.full_name() == name)
    }

    /// The builtin descriptor data for this type.
    pub(crate) fn builtin_inner(self) -> MessageInner {
        let mut fields: IndexMap<String, FieldInner> = IndexMap::new();
        let mut scalar = |name: &str, kind: Kind, cardinality: Cardinality| {
            fields.insert(
                name.to_owned(),
                FieldInner {
                    name: name.to_owned(),
                    kind,
                    cardinality,
                    type_ref: None,
                },
            );
        };
        match self {
            Self::Duration | Self::Timestamp => {
                scalar("seconds", Kind::Int64, Cardinality::Singular);
                scalar("nanos", Kind::Int32, Cardinality::Singular);
            }
            Self::Any => {
                scalar("type_url", Kind::String, Cardinality::Singular);
                // The payload's type is only known once `type_url` has been
                // resolved, so the field carries no type reference.
                scalar("value", Kind::Message, Cardinality::Singular);
            }
            Self::FieldMask => {
                scalar("paths", Kind::String, Cardinality::List);
            }
        }
        MessageInner {
            full_name: self.full_name().to_owned(),
            fields,
            is_map_entry: false,
            well_known: Some(self),
        }
    }
}
