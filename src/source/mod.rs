//! Collaborator traits.
//!
//! The persistence layer, the indexed-query engine ("catalog") and the
//! schema registry are external services. The facade only consumes them
//! through the traits defined here; `memory` provides an instrumented
//! in-memory implementation for tests and embedding.

pub mod memory;

pub use memory::MemorySource;

use crate::error::ModelError;
use crate::types::{is_uid_shaped, ROOT_UID};
use crate::value::RawValue;
use std::collections::BTreeMap;
use std::rc::Rc;

pub type RecordRef = Rc<dyn Record>;
pub type ProjectionRef = Rc<dyn Projection>;
pub type CatalogRef = Rc<dyn Catalog>;
pub type SourceRef = Rc<dyn DataSource>;

/// Field-match query handed to a catalog, e.g. `{uid: <identifier>}`.
pub type FieldQuery = BTreeMap<String, String>;

/// Reserved query field carrying the identifier.
pub const UID_FIELD: &str = "uid";

/// Build the identifier-equality query.
pub fn uid_query(uid: &str) -> FieldQuery {
    BTreeMap::from([(UID_FIELD.to_string(), uid.to_string())])
}

/// Schema descriptor for one named field.
///
/// `accessor` is the stable name of the zero-argument accessor a record
/// binds for this field; catalogs index columns under accessor names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub accessor: String,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, accessor: impl Into<String>) -> Self {
        FieldSpec {
            name: name.into(),
            accessor: accessor.into(),
        }
    }
}

/// Full persisted entity. Shared with the persistence layer; the facade
/// never takes exclusive write access.
pub trait Record {
    fn uid(&self) -> String;

    fn type_tag(&self) -> String;

    /// Invoke the bound accessor with the given stable name.
    ///
    /// May be arbitrarily expensive; callers prefer projection columns.
    fn read(&self, accessor: &str) -> Option<RawValue>;

    /// Raw attribute access outside the field schema.
    fn attr(&self, name: &str) -> Option<RawValue>;

    /// Whether the record carries unsaved changes.
    fn is_dirty(&self) -> bool;

    /// Return the record to its dormant state. Must not be called while
    /// the record is dirty; another holder may own the pending changes.
    fn deactivate(&self);
}

/// Lightweight indexed subset of a record, returned by catalog queries.
pub trait Projection {
    fn uid(&self) -> String;

    fn type_tag(&self) -> String;

    /// Metadata column lookup by accessor name. Never wakes the record.
    fn column(&self, name: &str) -> Option<RawValue>;
}

/// Queryable index over projections.
pub trait Catalog {
    fn name(&self) -> String;

    /// Run a field-match query, returning projections in index order.
    fn search(&self, query: &FieldQuery) -> Vec<ProjectionRef>;

    /// Audit/history catalogs are excluded from owning-catalog selection.
    fn is_audit(&self) -> bool {
        false
    }

    /// Flagged canonical domain catalog, preferred during selection.
    fn is_primary(&self) -> bool {
        false
    }
}

/// Persistence collaborator: record lifecycle, schema and catalog access.
pub trait DataSource {
    /// The well-known root record (identifier `"0"`).
    fn root(&self) -> RecordRef;

    /// Identifier predicate. The sentinel counts as a valid identifier.
    fn is_uid(&self, s: &str) -> bool {
        s == ROOT_UID || is_uid_shaped(s)
    }

    /// Ordered field schema for a type tag.
    fn fields_of(&self, type_tag: &str) -> Vec<FieldSpec>;

    /// Single field lookup; the default scans [`DataSource::fields_of`].
    fn field_spec(&self, type_tag: &str, name: &str) -> Option<FieldSpec> {
        self.fields_of(type_tag).into_iter().find(|f| f.name == name)
    }

    /// Materialize ("wake") the record behind a projection.
    fn wake(&self, projection: &dyn Projection) -> Result<RecordRef, ModelError>;

    /// Ordered candidate catalogs registered for a type tag.
    fn catalogs_for(&self, type_tag: &str) -> Vec<CatalogRef>;

    /// Fallback identifier-only catalog.
    fn default_catalog(&self) -> CatalogRef;

    /// Unscoped global lookup, used to discover the owning catalog when
    /// only a bare identifier is known.
    fn find_projection(&self, uid: &str) -> Option<ProjectionRef>;
}
