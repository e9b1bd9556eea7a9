//! Value normalization.
//!
//! Converts raw field values into the closed canonical union. The rules
//! are ordered and first-match-wins; the order matters, e.g. a thunk
//! returning a list must be invoked before the list rule can apply, and
//! identifier-shaped text must be checked before the plain text rule.

use crate::adapter::{self, AdapterRegistryRef, WrapTarget};
use crate::error::ModelError;
use crate::source::SourceRef;
use crate::types::ROOT_UID;
use crate::value::{CanonicalValue, RawValue};
use unicode_normalization::UnicodeNormalization;

/// Recursive raw-to-canonical converter.
pub struct Normalizer {
    source: SourceRef,
    adapters: AdapterRegistryRef,
}

impl Normalizer {
    pub fn new(source: SourceRef, adapters: AdapterRegistryRef) -> Self {
        Normalizer { source, adapters }
    }

    /// Normalize a raw value, realizing nested structures fully.
    ///
    /// References produced here are lazy; the target entity is not
    /// resolved until the referenced facade is accessed.
    pub fn normalize(&self, raw: RawValue) -> Result<CanonicalValue, ModelError> {
        match raw {
            // Identifier-shaped text references another entity. The root
            // sentinel "0" is never promoted to a reference.
            RawValue::Text(s) if s != ROOT_UID && self.source.is_uid(&s) => {
                let facade = adapter::to_facade(WrapTarget::Uid(s), &self.source, &self.adapters)?;
                Ok(CanonicalValue::Ref(facade))
            }
            RawValue::Missing => Ok(CanonicalValue::Null),
            RawValue::Record(record) => {
                let facade =
                    adapter::to_facade(WrapTarget::Record(record), &self.source, &self.adapters)?;
                Ok(CanonicalValue::Ref(facade))
            }
            RawValue::Text(s) => Ok(CanonicalValue::Text(s.nfc().collect())),
            RawValue::Timestamp(t) => Ok(CanonicalValue::Timestamp(t)),
            RawValue::List(items) => {
                let items = items
                    .into_iter()
                    .map(|item| self.normalize(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(CanonicalValue::List(items))
            }
            RawValue::Map(map) => {
                let map = map
                    .into_iter()
                    .map(|(k, v)| Ok((k, self.normalize(v)?)))
                    .collect::<Result<_, ModelError>>()?;
                Ok(CanonicalValue::Map(map))
            }
            RawValue::Thunk(f) => self.normalize(f()),
            RawValue::Null => Ok(CanonicalValue::Null),
            RawValue::Bool(b) => Ok(CanonicalValue::Bool(b)),
            RawValue::Int(i) => Ok(CanonicalValue::Int(i)),
            RawValue::Float(x) => Ok(CanonicalValue::Float(x)),
            RawValue::File(a) => Ok(CanonicalValue::Attachment(a)),
        }
    }
}
