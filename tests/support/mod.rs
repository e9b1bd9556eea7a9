//! Shared fixtures for the integration tests.

use recview::adapter::{AdapterRegistry, AdapterRegistryRef};
use recview::error::ModelError;
use recview::facade::{Facade, Seed};
use recview::source::memory::{MemoryCatalog, MemorySource};
use recview::source::FieldSpec;
use recview::value::RawValue;
use std::rc::Rc;

pub const SAMPLE_UID: &str = "aa41b954d4a4c0e8bbcf1bcf9a44e54a";
pub const CLIENT_UID: &str = "77f1b954d4a4c0e8bbcf1bcf9a44e511";
pub const UNKNOWN_UID: &str = "00000000000000000000000000000001";

/// A small world: one sample referencing one client, a primary catalog
/// indexing the sample title, and an audit catalog that must never be
/// selected.
pub struct World {
    pub source: Rc<MemorySource>,
    pub catalog: Rc<MemoryCatalog>,
    pub audit: Rc<MemoryCatalog>,
    pub adapters: AdapterRegistryRef,
}

impl World {
    pub fn facade(&self, seed: impl Into<Seed>) -> Result<Facade, ModelError> {
        Facade::new(seed, self.source.handle(), self.adapters.clone())
    }
}

pub fn sample_world() -> World {
    let source = MemorySource::new();

    source.define_type(
        "Sample",
        vec![
            FieldSpec::new("title", "getTitle"),
            FieldSpec::new("client", "getClient"),
            FieldSpec::new("volume", "getVolume"),
            FieldSpec::new("contributors", "getContributors"),
            FieldSpec::new("_internal", "getInternal"),
        ],
    );
    source.define_type("Client", vec![FieldSpec::new("title", "getTitle")]);

    let sample = source.add_record(SAMPLE_UID, "Sample");
    sample.set_field("getTitle", RawValue::text("Water"));
    sample.set_field("getClient", RawValue::text(CLIENT_UID));
    sample.set_field("getVolume", RawValue::Int(500));
    sample.set_field("getContributors", RawValue::List(vec![]));
    sample.set_field("getInternal", RawValue::text("hidden"));
    sample.set_attr("review_state", RawValue::text("published"));
    sample.set_attr("_secret", RawValue::text("classified"));

    let client = source.add_record(CLIENT_UID, "Client");
    client.set_field("getTitle", RawValue::text("Acme Labs"));

    // registration order must not matter; the audit catalog is excluded
    // and the primary flag wins over first-registered
    let audit = source.add_catalog("audit_catalog", &["Sample", "Client"], &[]);
    audit.mark_audit();
    let catalog = source.add_catalog("sample_catalog", &["Sample", "Client"], &["getTitle"]);
    catalog.mark_primary();

    World {
        source,
        catalog,
        audit,
        adapters: AdapterRegistry::empty(),
    }
}
