//! Well-known wrapper type overrides.
//!
//! These types decode from a different node shape than their declared
//! fields would imply: Duration and Timestamp from a single scalar literal,
//! Any from a mapping with a reserved `@type` discriminator, FieldMask from
//! a sequence of path strings.

use proto_yaml_descriptor::WellKnown;
use proto_yaml_value::{DynamicMessage, Value};

use crate::decoder::Decoder;
use crate::error::DecodeError;
use crate::node::TreeNode as Node;

pub(crate) fn decode_well_known(
    d: &Decoder,
    wk: WellKnown,
    dest: &mut DynamicMessage,
    node: &Node,
) -> Result<(), DecodeError> {
    match wk {
        WellKnown::Duration => decode_duration(dest, node),
        WellKnown::Timestamp => decode_timestamp(dest, node),
        WellKnown::Any => decode_any(d, dest, node),
        WellKnown::FieldMask => decode_field_mask(dest, node),
    }
}

fn set_field(dest: &mut DynamicMessage, name: &str, value: Value) -> Result<(), DecodeError> {
    match dest.descriptor().field_by_name(name) {
        Some(fd) => {
            dest.set(&fd, value);
            Ok(())
        }
        None => Err(DecodeError::UnknownField {
            message: dest.descriptor().full_name().to_owned(),
            field: name.to_owned(),
        }),
    }
}

fn require_scalar_text(dest: &DynamicMessage, node: &Node) -> Result<String, DecodeError> {
    node.scalar_text().ok_or_else(|| DecodeError::TypeMismatch {
        context: dest.descriptor().full_name().to_owned(),
        expected: "scalar",
        actual: node.shape_name(),
    })
}

fn decode_duration(dest: &mut DynamicMessage, node: &Node) -> Result<(), DecodeError> {
    let text = require_scalar_text(dest, node)?;
    let Some((seconds, nanos)) = parse_duration(&text) else {
        return Err(DecodeError::InvalidScalarLiteral {
            field: dest.descriptor().full_name().to_owned(),
            kind: "duration",
            text,
        });
    };
    set_field(dest, "seconds", Value::I64(seconds))?;
    set_field(dest, "nanos", Value::I32(nanos))
}

fn decode_timestamp(dest: &mut DynamicMessage, node: &Node) -> Result<(), DecodeError> {
    let text = require_scalar_text(dest, node)?;
    let instant = chrono::DateTime::parse_from_rfc3339(&text).map_err(|_| {
        DecodeError::InvalidScalarLiteral {
            field: dest.descriptor().full_name().to_owned(),
            kind: "timestamp",
            text: text.clone(),
        }
    })?;
    set_field(dest, "seconds", Value::I64(instant.timestamp()))?;
    set_field(
        dest,
        "nanos",
        Value::I32(instant.timestamp_subsec_nanos() as i32),
    )
}

fn decode_any(d: &Decoder, dest: &mut DynamicMessage, node: &Node) -> Result<(), DecodeError> {
    let full_name = dest.descriptor().full_name().to_owned();
    let Some(mapping) = node.as_mapping() else {
        return Err(DecodeError::TypeMismatch {
            context: full_name,
            expected: "mapping",
            actual: node.shape_name(),
        });
    };

    let entries: Vec<(&Node, &Node)> = mapping.iter().map(|(k, v)| (k, v)).collect();
    let mut discriminator: Option<(usize, String)> = None;
    for (index, (key_node, value_node)) in entries.iter().enumerate() {
        if key_node.scalar_text().as_deref() == Some("@type") {
            let Some(url) = value_node.scalar_text() else {
                return Err(DecodeError::TypeMismatch {
                    context: format!("{full_name}.type_url"),
                    expected: "scalar",
                    actual: value_node.shape_name(),
                });
            };
            // Later occurrences win, like any duplicated mapping key.
            discriminator = Some((index, url));
        }
    }
    let Some((type_index, type_url)) = discriminator else {
        return Err(DecodeError::MissingAnyTypeKey { message: full_name });
    };

    let Some(payload_type) = d.resolver().resolve(&type_url) else {
        return Err(DecodeError::UnresolvedAnyType { type_url });
    };
    let mut payload = DynamicMessage::new(payload_type);
    d.decode_message_entries(
        &mut payload,
        entries
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != type_index)
            .map(|(_, pair)| *pair),
    )?;

    set_field(dest, "type_url", Value::String(type_url))?;
    set_field(dest, "value", Value::Message(payload))
}

fn decode_field_mask(dest: &mut DynamicMessage, node: &Node) -> Result<(), DecodeError> {
    let Some(sequence) = node.as_sequence() else {
        return Err(DecodeError::TypeMismatch {
            context: dest.descriptor().full_name().to_owned(),
            expected: "sequence",
            actual: node.shape_name(),
        });
    };
    let Some(paths_fd) = dest.descriptor().field_by_name("paths") else {
        return Err(DecodeError::UnknownField {
            message: dest.descriptor().full_name().to_owned(),
            field: "paths".to_owned(),
        });
    };

    // Paths are taken verbatim, in order; no deduplication, no validation.
    let mut paths = Vec::with_capacity(sequence.len());
    for item in sequence {
        let Some(path) = item.scalar_text() else {
            return Err(DecodeError::TypeMismatch {
                context: paths_fd.full_name(),
                expected: "scalar",
                actual: item.shape_name(),
            });
        };
        paths.push(Value::String(path));
    }
    dest.mutable_list(&paths_fd).extend(paths);
    Ok(())
}

/// Parses the canonical textual duration, `[-]SECONDS[.frac]s`, into
/// `(seconds, nanos)` carrying the same sign. Magnitudes beyond the
/// interchange limit of ±315,576,000,000s are rejected.
fn parse_duration(text: &str) -> Option<(i64, i32)> {
    let body = text.strip_suffix('s')?;
    let (negative, magnitude) = match body.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, body),
    };
    let (whole, frac) = match magnitude.split_once('.') {
        Some((whole, frac)) => (whole, Some(frac)),
        None => (magnitude, None),
    };
    if whole.is_empty() && frac.is_none() {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let seconds: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut nanos: i64 = 0;
    if let Some(frac) = frac {
        if frac.is_empty() || frac.len() > 9 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        nanos = frac.parse::<i64>().ok()? * 10i64.pow(9 - frac.len() as u32);
    }
    if seconds > 315_576_000_000 {
        return None;
    }
    if negative {
        Some((-seconds, -(nanos as i32)))
    } else {
        Some((seconds, nanos as i32))
    }
}
