//! Record facade.
//!
//! [`Facade`] exposes a persisted record's fields as canonical values
//! through a read-only mapping surface. Identity (projection, record,
//! owning catalog) resolves lazily on first use and every resolved
//! field value is memoized per instance. The backing record is shared
//! with the persistence layer and is never mutated from here.

use crate::adapter::AdapterRegistryRef;
use crate::error::ModelError;
use crate::normalize::Normalizer;
use crate::serialize;
use crate::source::{uid_query, CatalogRef, ProjectionRef, RecordRef, SourceRef};
use crate::types::ROOT_UID;
use crate::value::{CanonicalValue, RawValue};
use serde_json::Value as JsonValue;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use tracing::debug;

/// Extensible descriptive fields excluded from `keys()`. Irrelevant to
/// the canonical model; read them through the raw attribute fallback
/// when actually needed.
pub const IGNORED_FIELDS: &[&str] = &[
    "allowDiscussion",
    "contributors",
    "creators",
    "expirationDate",
    "language",
    "location",
    "rights",
    "subject",
];

/// Constructor input: exactly one representation of the entity.
pub enum Seed {
    /// Identifier text, or the root sentinel `"0"`.
    Uid(String),
    Projection(ProjectionRef),
    Record(RecordRef),
}

impl From<&str> for Seed {
    fn from(uid: &str) -> Self {
        Seed::Uid(uid.to_string())
    }
}

impl From<String> for Seed {
    fn from(uid: String) -> Self {
        Seed::Uid(uid)
    }
}

impl From<ProjectionRef> for Seed {
    fn from(projection: ProjectionRef) -> Self {
        Seed::Projection(projection)
    }
}

impl From<RecordRef> for Seed {
    fn from(record: RecordRef) -> Self {
        Seed::Record(record)
    }
}

struct Inner {
    uid: String,
    source: SourceRef,
    adapters: AdapterRegistryRef,
    projection: RefCell<Option<ProjectionRef>>,
    record: RefCell<Option<RecordRef>>,
    catalog: RefCell<Option<CatalogRef>>,
    cache: RefCell<HashMap<String, CanonicalValue>>,
}

impl Drop for Inner {
    // Best-effort reclaim hint only; `release` is the real teardown.
    fn drop(&mut self) {
        if let Some(record) = self.record.borrow_mut().take() {
            if !record.is_dirty() {
                record.deactivate();
            }
        }
    }
}

/// Lazy, memoizing read-only view over one persisted record.
#[derive(Clone)]
pub struct Facade {
    inner: Rc<Inner>,
}

impl Facade {
    /// Build a facade from one of the accepted representations.
    ///
    /// The sentinel `"0"` resolves directly to the well-known root
    /// record without any catalog lookup. Identifier text that is
    /// neither the sentinel nor identifier-shaped is rejected.
    pub fn new(
        seed: impl Into<Seed>,
        source: SourceRef,
        adapters: AdapterRegistryRef,
    ) -> Result<Facade, ModelError> {
        match seed.into() {
            Seed::Uid(uid) if uid == ROOT_UID => {
                let record = source.root();
                let catalog = select_catalog(&source, &record.type_tag());
                Ok(Facade::build(
                    record.uid(),
                    source,
                    adapters,
                    None,
                    Some(record),
                    Some(catalog),
                ))
            }
            Seed::Uid(uid) => {
                if !source.is_uid(&uid) {
                    return Err(ModelError::Unsupported(format!("'{}'", uid)));
                }
                Ok(Facade::build(uid, source, adapters, None, None, None))
            }
            Seed::Projection(projection) => {
                let catalog = select_catalog(&source, &projection.type_tag());
                Ok(Facade::build(
                    projection.uid(),
                    source,
                    adapters,
                    Some(projection),
                    None,
                    Some(catalog),
                ))
            }
            Seed::Record(record) => {
                let catalog = select_catalog(&source, &record.type_tag());
                Ok(Facade::build(
                    record.uid(),
                    source,
                    adapters,
                    None,
                    Some(record),
                    Some(catalog),
                ))
            }
        }
    }

    fn build(
        uid: String,
        source: SourceRef,
        adapters: AdapterRegistryRef,
        projection: Option<ProjectionRef>,
        record: Option<RecordRef>,
        catalog: Option<CatalogRef>,
    ) -> Facade {
        Facade {
            inner: Rc::new(Inner {
                uid,
                source,
                adapters,
                projection: RefCell::new(projection),
                record: RefCell::new(record),
                catalog: RefCell::new(catalog),
                cache: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Identifier of the wrapped entity.
    pub fn uid(&self) -> &str {
        &self.inner.uid
    }

    fn is_root(&self) -> bool {
        self.inner.uid == ROOT_UID
    }

    fn normalizer(&self) -> Normalizer {
        Normalizer::new(self.inner.source.clone(), self.inner.adapters.clone())
    }

    /// Owning catalog, discovered through a global lookup when only the
    /// identifier is known.
    fn catalog(&self) -> Result<CatalogRef, ModelError> {
        if let Some(catalog) = self.inner.catalog.borrow().clone() {
            return Ok(catalog);
        }
        debug!(uid = %self.inner.uid, "discovering owning catalog");
        let probe = self
            .inner
            .source
            .find_projection(&self.inner.uid)
            .ok_or_else(|| ModelError::NotFound(self.inner.uid.clone()))?;
        let catalog = select_catalog(&self.inner.source, &probe.type_tag());
        *self.inner.catalog.borrow_mut() = Some(catalog.clone());
        Ok(catalog)
    }

    /// Authoritative projection, queried from the owning catalog.
    ///
    /// Exactly one result is valid; zero and multiple results are hard
    /// errors, never silent fallbacks.
    fn projection(&self) -> Result<ProjectionRef, ModelError> {
        if let Some(projection) = self.inner.projection.borrow().clone() {
            return Ok(projection);
        }
        debug!(uid = %self.inner.uid, "fetching projection");
        let catalog = self.catalog()?;
        let mut results = catalog.search(&uid_query(&self.inner.uid));
        match results.len() {
            0 => Err(ModelError::NotFound(self.inner.uid.clone())),
            1 => {
                let projection = results.remove(0);
                *self.inner.projection.borrow_mut() = Some(projection.clone());
                Ok(projection)
            }
            count => Err(ModelError::Ambiguous {
                uid: self.inner.uid.clone(),
                count,
            }),
        }
    }

    /// Backing record, materialized ("woken") from the projection on
    /// first access.
    fn record(&self) -> Result<RecordRef, ModelError> {
        if let Some(record) = self.inner.record.borrow().clone() {
            return Ok(record);
        }
        debug!(uid = %self.inner.uid, "waking record");
        let projection = self.projection()?;
        let record = self.inner.source.wake(projection.as_ref())?;
        *self.inner.record.borrow_mut() = Some(record.clone());
        Ok(record)
    }

    fn type_tag(&self) -> Result<String, ModelError> {
        if let Some(record) = self.inner.record.borrow().as_ref() {
            return Ok(record.type_tag());
        }
        if let Some(projection) = self.inner.projection.borrow().as_ref() {
            return Ok(projection.type_tag());
        }
        Ok(self.projection()?.type_tag())
    }

    /// Cheap metadata lookup by accessor name, without waking the
    /// record. The root has no projection; its own attributes stand in.
    fn column(&self, name: &str) -> Result<Option<RawValue>, ModelError> {
        if self.is_root() {
            let record = self.inner.record.borrow().clone();
            return Ok(record.and_then(|r| r.attr(name)));
        }
        Ok(self.projection()?.column(name))
    }

    fn catalog_name(&self) -> String {
        self.inner
            .catalog
            .borrow()
            .as_ref()
            .map(|c| c.name())
            .unwrap_or_default()
    }

    /// Resolve a field through the lookup chain: cache, projection
    /// column, live accessor, raw attributes.
    ///
    /// Schema fields are normalized and memoized. Names outside the
    /// schema fall back to raw attribute access on the record, then the
    /// projection; those results are normalized but not cached. Absent
    /// data is `None`, never an error.
    pub fn get(&self, name: &str) -> Result<Option<CanonicalValue>, ModelError> {
        if let Some(value) = self.inner.cache.borrow().get(name) {
            return Ok(Some(value.clone()));
        }

        let tag = self.type_tag()?;
        match self.inner.source.field_spec(&tag, name) {
            None => {
                // private names are not exposed through the fallback
                if name.starts_with('_') {
                    return Ok(None);
                }
                if let Some(raw) = self.record()?.attr(name) {
                    return self.normalizer().normalize(raw).map(Some);
                }
                if let Some(raw) = self.column(name)? {
                    return self.normalizer().normalize(raw).map(Some);
                }
                Ok(None)
            }
            Some(spec) => {
                let raw = match self.column(&spec.accessor)? {
                    Some(raw) => raw,
                    None => {
                        debug!(
                            column = %spec.accessor,
                            catalog = %self.catalog_name(),
                            "add metadata column to the catalog to increase performance"
                        );
                        self.record()?.read(&spec.accessor).unwrap_or(RawValue::Null)
                    }
                };
                let value = self.normalizer().normalize(raw)?;
                self.inner
                    .cache
                    .borrow_mut()
                    .insert(name.to_string(), value.clone());
                Ok(Some(value))
            }
        }
    }

    /// `get` with a caller-supplied default for absent data.
    pub fn get_or(
        &self,
        name: &str,
        default: CanonicalValue,
    ) -> Result<CanonicalValue, ModelError> {
        Ok(self.get(name)?.unwrap_or(default))
    }

    /// Indexed access; a miss is a `KeyMissing` error.
    pub fn at(&self, name: &str) -> Result<CanonicalValue, ModelError> {
        self.get(name)?
            .ok_or_else(|| ModelError::KeyMissing(name.to_string()))
    }

    /// Exposed field names: the schema for the entity's type, minus
    /// private names and the descriptive-field denylist. Never wakes
    /// the record.
    pub fn keys(&self) -> Result<Vec<String>, ModelError> {
        let tag = self.type_tag()?;
        Ok(self
            .inner
            .source
            .fields_of(&tag)
            .into_iter()
            .map(|f| f.name)
            .filter(|n| !n.starts_with('_') && !IGNORED_FIELDS.contains(&n.as_str()))
            .collect())
    }

    pub fn values(&self) -> Result<Vec<CanonicalValue>, ModelError> {
        Ok(self.items()?.into_iter().map(|(_, v)| v).collect())
    }

    pub fn items(&self) -> Result<Vec<(String, CanonicalValue)>, ModelError> {
        self.keys()?
            .into_iter()
            .map(|k| {
                let value = self.at(&k)?;
                Ok((k, value))
            })
            .collect()
    }

    pub fn iter(&self) -> Result<impl Iterator<Item = (String, CanonicalValue)>, ModelError> {
        Ok(self.items()?.into_iter())
    }

    pub fn len(&self) -> Result<usize, ModelError> {
        Ok(self.keys()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, ModelError> {
        Ok(self.keys()?.is_empty())
    }

    /// Whether the identifier resolves to exactly one projection.
    /// `NotFound` and `Ambiguous` downgrade to `false`.
    pub fn is_valid(&self) -> bool {
        if self.is_root() {
            return true;
        }
        self.projection().is_ok()
    }

    /// Export every key through the default lossy converter.
    pub fn to_dict(&self) -> Result<serde_json::Map<String, JsonValue>, ModelError> {
        self.to_dict_with(serialize::stringify)
    }

    /// Export every key through a caller-supplied converter.
    pub fn to_dict_with<F>(
        &self,
        converter: F,
    ) -> Result<serde_json::Map<String, JsonValue>, ModelError>
    where
        F: Fn(&CanonicalValue) -> JsonValue,
    {
        let mut out = serde_json::Map::new();
        for (key, value) in self.items()? {
            out.insert(key, converter(&value));
        }
        Ok(out)
    }

    /// JSON encoding of [`Facade::to_dict`].
    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(JsonValue::Object(self.to_dict()?).to_string())
    }

    /// Clear the field-value cache. Identity stays resolved.
    pub fn flush(&self) {
        self.inner.cache.borrow_mut().clear();
    }

    /// Explicit teardown: drop all cached state and return the backing
    /// record to its dormant state, unless it carries unsaved changes.
    pub fn release(&self) {
        if let Some(record) = self.inner.record.borrow_mut().take() {
            if record.is_dirty() {
                debug!(uid = %self.inner.uid, "record has unsaved changes, keeping it awake");
            } else {
                record.deactivate();
            }
        }
        *self.inner.projection.borrow_mut() = None;
        *self.inner.catalog.borrow_mut() = None;
        self.inner.cache.borrow_mut().clear();
    }
}

/// Owning-catalog selection: audit catalogs are excluded, a flagged
/// primary catalog wins, otherwise the first candidate; the default
/// identifier-only catalog covers types with no catalog of their own.
fn select_catalog(source: &SourceRef, type_tag: &str) -> CatalogRef {
    let candidates: Vec<CatalogRef> = source
        .catalogs_for(type_tag)
        .into_iter()
        .filter(|c| !c.is_audit())
        .collect();
    if candidates.is_empty() {
        return source.default_catalog();
    }
    candidates
        .iter()
        .find(|c| c.is_primary())
        .cloned()
        .unwrap_or_else(|| candidates[0].clone())
}

impl PartialEq for Facade {
    fn eq(&self, other: &Self) -> bool {
        self.inner.uid == other.inner.uid
    }
}

impl Eq for Facade {}

impl Hash for Facade {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.uid.hash(state);
    }
}

impl fmt::Display for Facade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.uid)
    }
}

impl fmt::Debug for Facade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Facade:UID({})>", self.inner.uid)
    }
}
