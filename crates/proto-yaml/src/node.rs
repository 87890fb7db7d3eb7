//! The parsed document tree.
//!
//! [`TreeNode`] is the decoder's narrow view of one YAML document: node
//! shape, ordered children, scalar content. It is produced straight from
//! the parser's event stream, which has already resolved anchors, aliases,
//! and tags, so none of those shapes exist here. Mapping children are kept
//! as an ordered pair list — duplicate keys are preserved and resolved by
//! the decoder (last one wins), not by the parser.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor};

/// One node of a parsed document.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TreeNode {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Sequence(Vec<TreeNode>),
    Mapping(Vec<(TreeNode, TreeNode)>),
}

impl TreeNode {
    /// Shape name used in error messages.
    pub(crate) fn shape_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) | Self::UInt(_) | Self::Float(_) => "number",
            Self::String(_) => "string",
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
        }
    }

    pub(crate) fn is_scalar(&self) -> bool {
        !matches!(self, Self::Sequence(_) | Self::Mapping(_))
    }

    pub(crate) fn as_sequence(&self) -> Option<&[TreeNode]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub(crate) fn as_mapping(&self) -> Option<&[(TreeNode, TreeNode)]> {
        match self {
            Self::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Scalar content as text. `None` for null and non-scalar nodes.
    pub(crate) fn scalar_text(&self) -> Option<String> {
        match self {
            Self::String(s) => Some(s.clone()),
            Self::Int(v) => Some(v.to_string()),
            Self::UInt(v) => Some(v.to_string()),
            Self::Float(v) => Some(v.to_string()),
            Self::Bool(v) => Some(v.to_string()),
            _ => None,
        }
    }

    pub(crate) fn parse_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::UInt(v) => i64::try_from(*v).ok(),
            Self::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub(crate) fn parse_u64(&self) -> Option<u64> {
        match self {
            Self::UInt(v) => Some(*v),
            Self::Int(v) => u64::try_from(*v).ok(),
            Self::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub(crate) fn parse_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            Self::UInt(v) => Some(*v as f64),
            Self::String(s) => match s.as_str() {
                ".inf" | "+.inf" => Some(f64::INFINITY),
                "-.inf" => Some(f64::NEG_INFINITY),
                ".nan" => Some(f64::NAN),
                _ => s.parse().ok(),
            },
            _ => None,
        }
    }

    pub(crate) fn parse_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            Self::String(s) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for TreeNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct NodeVisitor;

        impl<'de> Visitor<'de> for NodeVisitor {
            type Value = TreeNode;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("any document node")
            }

            fn visit_unit<E>(self) -> Result<TreeNode, E>
            where
                E: de::Error,
            {
                Ok(TreeNode::Null)
            }

            fn visit_bool<E>(self, v: bool) -> Result<TreeNode, E>
            where
                E: de::Error,
            {
                Ok(TreeNode::Bool(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<TreeNode, E>
            where
                E: de::Error,
            {
                Ok(TreeNode::Int(v))
            }

            fn visit_u64<E>(self, v: u64) -> Result<TreeNode, E>
            where
                E: de::Error,
            {
                Ok(TreeNode::UInt(v))
            }

            fn visit_f64<E>(self, v: f64) -> Result<TreeNode, E>
            where
                E: de::Error,
            {
                Ok(TreeNode::Float(v))
            }

            fn visit_str<E>(self, v: &str) -> Result<TreeNode, E>
            where
                E: de::Error,
            {
                Ok(TreeNode::String(v.to_owned()))
            }

            fn visit_string<E>(self, v: String) -> Result<TreeNode, E>
            where
                E: de::Error,
            {
                Ok(TreeNode::String(v))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<TreeNode, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut items = Vec::new();
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(TreeNode::Sequence(items))
            }

            fn visit_map<A>(self, mut map: A) -> Result<TreeNode, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::new();
                while let Some(entry) = map.next_entry()? {
                    entries.push(entry);
                }
                Ok(TreeNode::Mapping(entries))
            }

            // Explicit tags arrive as enum data; the tag itself carries no
            // meaning for decoding, only the value underneath it.
            fn visit_enum<A>(self, data: A) -> Result<TreeNode, A::Error>
            where
                A: EnumAccess<'de>,
            {
                let (_tag, variant) = data.variant::<String>()?;
                variant.newtype_variant()
            }
        }

        deserializer.deserialize_any(NodeVisitor)
    }
}
