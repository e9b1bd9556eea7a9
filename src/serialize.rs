//! Export flattening.
//!
//! [`stringify`] is a lossy conversion used when exporting a facade to
//! plain JSON-safe structures. It is deliberately distinct from
//! normalization: references collapse to their identifier text and
//! nothing is dereferenced. It never fails; a value JSON cannot carry
//! faithfully degrades to null with a warning.

use crate::value::CanonicalValue;
use serde_json::Value as JsonValue;
use tracing::warn;

/// Flatten a canonical value into a JSON-safe value.
///
/// Maps and lists keep their shape with every element stringified;
/// every scalar becomes text. Null covers both stored nulls and the
/// domain missing-value marker, and exports as empty text.
pub fn stringify(value: &CanonicalValue) -> JsonValue {
    match value {
        CanonicalValue::Ref(facade) => JsonValue::String(facade.uid().to_string()),
        CanonicalValue::Null => JsonValue::String(String::new()),
        CanonicalValue::Timestamp(t) => JsonValue::String(t.to_rfc3339()),
        CanonicalValue::Attachment(a) => JsonValue::String(a.filename.clone()),
        CanonicalValue::Map(map) => JsonValue::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), stringify(v)))
                .collect(),
        ),
        CanonicalValue::List(items) => {
            JsonValue::Array(items.iter().map(stringify).collect())
        }
        CanonicalValue::Text(s) => JsonValue::String(s.clone()),
        CanonicalValue::Bool(b) => JsonValue::String(b.to_string()),
        CanonicalValue::Int(i) => JsonValue::String(i.to_string()),
        CanonicalValue::Float(x) if x.is_finite() => JsonValue::String(x.to_string()),
        CanonicalValue::Float(x) => {
            warn!("Could not convert {} to string", x);
            JsonValue::Null
        }
    }
}
