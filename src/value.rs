//! Value model.
//!
//! Two unions live here. [`RawValue`] is the open input side: whatever a
//! collaborator hands back for a field, including record handles, lazy
//! thunks and file attachments. [`CanonicalValue`] is the closed output
//! side every field resolves into; references to other entities stay
//! lazy as [`CanonicalValue::Ref`] until the target facade is accessed.

use crate::facade::Facade;
use crate::source::RecordRef;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Zero-argument computed value, invoked once during normalization.
pub type Thunk = Rc<dyn Fn() -> RawValue>;

/// File-like value carrying a filename, kept opaque by the value model.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Attachment {
            filename: filename.into(),
            data,
        }
    }
}

/// Raw field value as produced by records, projections and accessors.
#[derive(Clone)]
pub enum RawValue {
    Null,
    /// Domain "missing value" marker, distinct from a stored null.
    Missing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    List(Vec<RawValue>),
    Map(BTreeMap<String, RawValue>),
    /// Handle to a nested record, wrapped lazily during normalization.
    Record(RecordRef),
    /// Computed field, realized once during normalization.
    Thunk(Thunk),
    File(Attachment),
}

impl RawValue {
    pub fn text(s: impl Into<String>) -> Self {
        RawValue::Text(s.into())
    }

    pub fn thunk(f: impl Fn() -> RawValue + 'static) -> Self {
        RawValue::Thunk(Rc::new(f))
    }
}

impl fmt::Debug for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => write!(f, "Null"),
            RawValue::Missing => write!(f, "Missing"),
            RawValue::Bool(v) => write!(f, "Bool({})", v),
            RawValue::Int(v) => write!(f, "Int({})", v),
            RawValue::Float(v) => write!(f, "Float({})", v),
            RawValue::Text(v) => write!(f, "Text({:?})", v),
            RawValue::Timestamp(v) => write!(f, "Timestamp({})", v),
            RawValue::List(v) => f.debug_tuple("List").field(v).finish(),
            RawValue::Map(v) => f.debug_tuple("Map").field(v).finish(),
            RawValue::Record(r) => write!(f, "Record({})", r.uid()),
            RawValue::Thunk(_) => write!(f, "Thunk(..)"),
            RawValue::File(a) => write!(f, "File({:?})", a.filename),
        }
    }
}

/// Canonical value: the closed union every field lookup resolves into.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    List(Vec<CanonicalValue>),
    Map(BTreeMap<String, CanonicalValue>),
    /// Lazy reference to another entity, compared by identifier.
    Ref(Facade),
    Attachment(Attachment),
}

impl CanonicalValue {
    /// Identifier of the referenced entity, if this is a `Ref`.
    pub fn ref_uid(&self) -> Option<&str> {
        match self {
            CanonicalValue::Ref(facade) => Some(facade.uid()),
            _ => None,
        }
    }
}

/// Re-embed a canonical value into the raw union.
///
/// References surface as their identifier text, the raw shape a
/// collaborator would store them in.
impl From<CanonicalValue> for RawValue {
    fn from(value: CanonicalValue) -> Self {
        match value {
            CanonicalValue::Null => RawValue::Null,
            CanonicalValue::Bool(v) => RawValue::Bool(v),
            CanonicalValue::Int(v) => RawValue::Int(v),
            CanonicalValue::Float(v) => RawValue::Float(v),
            CanonicalValue::Text(v) => RawValue::Text(v),
            CanonicalValue::Timestamp(v) => RawValue::Timestamp(v),
            CanonicalValue::List(v) => {
                RawValue::List(v.into_iter().map(RawValue::from).collect())
            }
            CanonicalValue::Map(v) => RawValue::Map(
                v.into_iter().map(|(k, v)| (k, RawValue::from(v))).collect(),
            ),
            CanonicalValue::Ref(facade) => RawValue::Text(facade.uid().to_string()),
            CanonicalValue::Attachment(a) => RawValue::File(a),
        }
    }
}
