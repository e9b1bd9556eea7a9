//! Adapter dispatch.
//!
//! Specialized facade variants are registered by type tag in an
//! [`AdapterRegistry`] and injected at construction; there is no global
//! registry state. [`to_facade`] turns identifiers and record handles
//! into facades, consulting the registry only for records, whose type
//! tag is known without any I/O. Bare identifiers always wrap into the
//! generic facade so references stay lazy.

use crate::error::ModelError;
use crate::facade::{Facade, Seed};
use crate::source::{RecordRef, SourceRef};
use std::collections::HashMap;
use std::rc::Rc;

/// Constructor for a specialized facade, keyed by type tag.
pub type AdapterFactory =
    Rc<dyn Fn(&str, &SourceRef, &AdapterRegistryRef) -> Result<Facade, ModelError>>;

pub type AdapterRegistryRef = Rc<AdapterRegistry>;

/// Registry mapping type tag to facade constructor.
#[derive(Default)]
pub struct AdapterRegistry {
    factories: HashMap<String, AdapterFactory>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        AdapterRegistry::default()
    }

    /// Registry with no specialized variants.
    pub fn empty() -> AdapterRegistryRef {
        Rc::new(AdapterRegistry::new())
    }

    pub fn register(
        &mut self,
        type_tag: impl Into<String>,
        factory: impl Fn(&str, &SourceRef, &AdapterRegistryRef) -> Result<Facade, ModelError>
            + 'static,
    ) {
        self.factories.insert(type_tag.into(), Rc::new(factory));
    }

    pub fn lookup(&self, type_tag: &str) -> Option<AdapterFactory> {
        self.factories.get(type_tag).cloned()
    }

    pub fn into_handle(self) -> AdapterRegistryRef {
        Rc::new(self)
    }
}

/// Wrappable input for [`to_facade`].
pub enum WrapTarget {
    /// Already a facade; passes through unchanged.
    Facade(Facade),
    /// Bare identifier; wraps lazily into the generic facade.
    Uid(String),
    /// Record handle; dispatched through the registry by type tag.
    Record(RecordRef),
}

impl From<Facade> for WrapTarget {
    fn from(facade: Facade) -> Self {
        WrapTarget::Facade(facade)
    }
}

impl From<RecordRef> for WrapTarget {
    fn from(record: RecordRef) -> Self {
        WrapTarget::Record(record)
    }
}

impl From<&str> for WrapTarget {
    fn from(uid: &str) -> Self {
        WrapTarget::Uid(uid.to_string())
    }
}

/// Wrap a single target into a facade.
pub fn to_facade(
    target: impl Into<WrapTarget>,
    source: &SourceRef,
    adapters: &AdapterRegistryRef,
) -> Result<Facade, ModelError> {
    match target.into() {
        WrapTarget::Facade(facade) => Ok(facade),
        WrapTarget::Uid(uid) => {
            if !source.is_uid(&uid) {
                return Err(ModelError::Unsupported(format!("'{}'", uid)));
            }
            Facade::new(Seed::Uid(uid), source.clone(), adapters.clone())
        }
        WrapTarget::Record(record) => {
            let uid = record.uid();
            match adapters.lookup(&record.type_tag()) {
                Some(factory) => factory(&uid, source, adapters),
                None => Facade::new(Seed::Uid(uid), source.clone(), adapters.clone()),
            }
        }
    }
}

/// Wrap a list of targets element-wise.
pub fn to_facades(
    targets: Vec<WrapTarget>,
    source: &SourceRef,
    adapters: &AdapterRegistryRef,
) -> Result<Vec<Facade>, ModelError> {
    targets
        .into_iter()
        .map(|t| to_facade(t, source, adapters))
        .collect()
}
