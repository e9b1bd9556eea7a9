//! In-memory data source.
//!
//! A complete `DataSource` implementation backed by plain maps, with
//! wake/query/read counters so tests can observe which resolution path
//! a lookup took. Also usable as a fixture when embedding the facade
//! without a real persistence layer.

use crate::error::ModelError;
use crate::source::{
    Catalog, CatalogRef, DataSource, FieldQuery, FieldSpec, Projection, ProjectionRef, Record,
    RecordRef, SourceRef, UID_FIELD,
};
use crate::types::ROOT_UID;
use crate::value::RawValue;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// Type tag assigned to the well-known root record.
pub const ROOT_TYPE: &str = "Root";

/// Name of the fallback identifier-only catalog.
pub const DEFAULT_CATALOG: &str = "uid_catalog";

type RecordMap = Rc<RefCell<BTreeMap<String, Rc<MemoryRecord>>>>;

/// Record stored in a [`MemorySource`].
pub struct MemoryRecord {
    uid: String,
    type_tag: String,
    // keyed by accessor name
    fields: RefCell<HashMap<String, RawValue>>,
    attrs: RefCell<HashMap<String, RawValue>>,
    dirty: Cell<bool>,
    active: Cell<bool>,
    wakes: Cell<usize>,
    reads: Cell<usize>,
}

impl MemoryRecord {
    fn new(uid: impl Into<String>, type_tag: impl Into<String>) -> Rc<Self> {
        Rc::new(MemoryRecord {
            uid: uid.into(),
            type_tag: type_tag.into(),
            fields: RefCell::new(HashMap::new()),
            attrs: RefCell::new(HashMap::new()),
            dirty: Cell::new(false),
            active: Cell::new(true),
            wakes: Cell::new(0),
            reads: Cell::new(0),
        })
    }

    /// Store a field value under its accessor name.
    pub fn set_field(&self, accessor: impl Into<String>, value: RawValue) {
        self.fields.borrow_mut().insert(accessor.into(), value);
    }

    /// Store a raw attribute outside the field schema.
    pub fn set_attr(&self, name: impl Into<String>, value: RawValue) {
        self.attrs.borrow_mut().insert(name.into(), value);
    }

    pub fn set_dirty(&self, dirty: bool) {
        self.dirty.set(dirty);
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Number of times the record was materialized from a projection.
    pub fn wake_count(&self) -> usize {
        self.wakes.get()
    }

    /// Number of live accessor invocations.
    pub fn read_count(&self) -> usize {
        self.reads.get()
    }
}

impl Record for MemoryRecord {
    fn uid(&self) -> String {
        self.uid.clone()
    }

    fn type_tag(&self) -> String {
        self.type_tag.clone()
    }

    fn read(&self, accessor: &str) -> Option<RawValue> {
        self.reads.set(self.reads.get() + 1);
        self.fields.borrow().get(accessor).cloned()
    }

    fn attr(&self, name: &str) -> Option<RawValue> {
        self.attrs.borrow().get(name).cloned()
    }

    fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    fn deactivate(&self) {
        self.active.set(false);
    }
}

/// Column snapshot of one record, as a catalog would index it.
pub struct MemoryProjection {
    uid: String,
    type_tag: String,
    columns: HashMap<String, RawValue>,
}

impl MemoryProjection {
    fn snapshot(record: &MemoryRecord, columns: &[String]) -> Rc<Self> {
        let fields = record.fields.borrow();
        Rc::new(MemoryProjection {
            uid: record.uid.clone(),
            type_tag: record.type_tag.clone(),
            columns: columns
                .iter()
                .filter_map(|c| fields.get(c).map(|v| (c.clone(), v.clone())))
                .collect(),
        })
    }
}

impl Projection for MemoryProjection {
    fn uid(&self) -> String {
        self.uid.clone()
    }

    fn type_tag(&self) -> String {
        self.type_tag.clone()
    }

    fn column(&self, name: &str) -> Option<RawValue> {
        self.columns.get(name).cloned()
    }
}

/// Catalog over the records of a [`MemorySource`].
pub struct MemoryCatalog {
    name: String,
    // type tags this catalog indexes; empty means all
    types: Vec<String>,
    // accessor names exposed as metadata columns
    columns: Vec<String>,
    records: RecordMap,
    primary: Cell<bool>,
    audit: Cell<bool>,
    // rows injected by tests, e.g. to simulate duplicate identifiers
    extra_rows: RefCell<Vec<ProjectionRef>>,
    queries: Cell<usize>,
}

impl MemoryCatalog {
    pub fn mark_primary(&self) {
        self.primary.set(true);
    }

    pub fn mark_audit(&self) {
        self.audit.set(true);
    }

    /// Inject an extra result row returned for its identifier.
    pub fn push_row(&self, row: ProjectionRef) {
        self.extra_rows.borrow_mut().push(row);
    }

    pub fn query_count(&self) -> usize {
        self.queries.get()
    }

    fn covers(&self, type_tag: &str) -> bool {
        self.types.is_empty() || self.types.iter().any(|t| t == type_tag)
    }
}

impl Catalog for MemoryCatalog {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn search(&self, query: &FieldQuery) -> Vec<ProjectionRef> {
        self.queries.set(self.queries.get() + 1);

        let mut results: Vec<ProjectionRef> = Vec::new();
        for record in self.records.borrow().values() {
            if !self.covers(&record.type_tag) {
                continue;
            }
            let matches = query.iter().all(|(field, expected)| {
                if field == UID_FIELD {
                    return record.uid == *expected;
                }
                match record.fields.borrow().get(field) {
                    Some(RawValue::Text(s)) => s == expected,
                    _ => false,
                }
            });
            if matches {
                results.push(MemoryProjection::snapshot(record.as_ref(), &self.columns));
            }
        }
        for row in self.extra_rows.borrow().iter() {
            if let Some(uid) = query.get(UID_FIELD) {
                if row.uid() == *uid {
                    results.push(row.clone());
                }
            }
        }
        results
    }

    fn is_audit(&self) -> bool {
        self.audit.get()
    }

    fn is_primary(&self) -> bool {
        self.primary.get()
    }
}

/// In-memory persistence collaborator.
pub struct MemorySource {
    schemas: RefCell<HashMap<String, Vec<FieldSpec>>>,
    records: RecordMap,
    catalogs: RefCell<Vec<Rc<MemoryCatalog>>>,
    default_catalog: Rc<MemoryCatalog>,
    root: Rc<MemoryRecord>,
    global_lookups: Cell<usize>,
}

impl MemorySource {
    pub fn new() -> Rc<Self> {
        let records: RecordMap = Rc::new(RefCell::new(BTreeMap::new()));
        let root = MemoryRecord::new(ROOT_UID, ROOT_TYPE);
        records.borrow_mut().insert(ROOT_UID.to_string(), root.clone());

        let default_catalog = Rc::new(MemoryCatalog {
            name: DEFAULT_CATALOG.to_string(),
            types: Vec::new(),
            columns: Vec::new(),
            records: records.clone(),
            primary: Cell::new(false),
            audit: Cell::new(false),
            extra_rows: RefCell::new(Vec::new()),
            queries: Cell::new(0),
        });

        Rc::new(MemorySource {
            schemas: RefCell::new(HashMap::new()),
            records,
            catalogs: RefCell::new(Vec::new()),
            default_catalog,
            root,
            global_lookups: Cell::new(0),
        })
    }

    /// Register the ordered field schema for a type tag.
    pub fn define_type(&self, type_tag: impl Into<String>, fields: Vec<FieldSpec>) {
        self.schemas.borrow_mut().insert(type_tag.into(), fields);
    }

    /// Create and register a record.
    pub fn add_record(
        &self,
        uid: impl Into<String>,
        type_tag: impl Into<String>,
    ) -> Rc<MemoryRecord> {
        let record = MemoryRecord::new(uid, type_tag);
        self.records
            .borrow_mut()
            .insert(record.uid.clone(), record.clone());
        record
    }

    /// Register a catalog over the given type tags, exposing the given
    /// accessor names as metadata columns.
    pub fn add_catalog(
        &self,
        name: impl Into<String>,
        types: &[&str],
        columns: &[&str],
    ) -> Rc<MemoryCatalog> {
        let catalog = Rc::new(MemoryCatalog {
            name: name.into(),
            types: types.iter().map(|t| t.to_string()).collect(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            records: self.records.clone(),
            primary: Cell::new(false),
            audit: Cell::new(false),
            extra_rows: RefCell::new(Vec::new()),
            queries: Cell::new(0),
        });
        self.catalogs.borrow_mut().push(catalog.clone());
        catalog
    }

    pub fn record(&self, uid: &str) -> Option<Rc<MemoryRecord>> {
        self.records.borrow().get(uid).cloned()
    }

    pub fn root_record(&self) -> Rc<MemoryRecord> {
        self.root.clone()
    }

    /// Number of unscoped global identifier lookups performed.
    pub fn global_lookup_count(&self) -> usize {
        self.global_lookups.get()
    }

    /// Upcast to the trait object handle the facade consumes.
    pub fn handle(self: &Rc<Self>) -> SourceRef {
        self.clone()
    }
}

impl DataSource for MemorySource {
    fn root(&self) -> RecordRef {
        self.root.clone()
    }

    fn fields_of(&self, type_tag: &str) -> Vec<FieldSpec> {
        self.schemas
            .borrow()
            .get(type_tag)
            .cloned()
            .unwrap_or_default()
    }

    fn wake(&self, projection: &dyn Projection) -> Result<RecordRef, ModelError> {
        let uid = projection.uid();
        let record = self
            .records
            .borrow()
            .get(&uid)
            .cloned()
            .ok_or_else(|| ModelError::NotFound(uid.clone()))?;
        record.wakes.set(record.wakes.get() + 1);
        record.active.set(true);
        Ok(record)
    }

    fn catalogs_for(&self, type_tag: &str) -> Vec<CatalogRef> {
        self.catalogs
            .borrow()
            .iter()
            .filter(|c| c.covers(type_tag))
            .map(|c| c.clone() as CatalogRef)
            .collect()
    }

    fn default_catalog(&self) -> CatalogRef {
        self.default_catalog.clone()
    }

    fn find_projection(&self, uid: &str) -> Option<ProjectionRef> {
        self.global_lookups.set(self.global_lookups.get() + 1);
        self.records
            .borrow()
            .get(uid)
            .map(|r| MemoryProjection::snapshot(r.as_ref(), &[]) as ProjectionRef)
    }
}
