//! Catalog loading and indexing.
//!
//! A catalog is a TOML document with four arrays of tables:
//!
//! ```toml
//! [[sources]]
//! id = "6f1c2f0e-8d3b-4a53-9a59-7b7f7bb1f0aa"
//! name = "orders"
//! response_id = "0b8e..."
//! flows = [{ mapping_id = "...", target_id = "..." }]
//!
//! [[mappings]]
//! [[targets]]
//! [[responses]]
//! ```

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::store::types::{Mapping, ResponseMapping, Source, Target};

/// Errors raised while loading a catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("duplicate {kind} id {id}")]
    Duplicate { kind: &'static str, id: Uuid },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CatalogFile {
    sources: Vec<Source>,
    mappings: Vec<Mapping>,
    targets: Vec<Target>,
    responses: Vec<ResponseMapping>,
}

/// Indexed, immutable snapshot of every configured entity.
#[derive(Debug, Default)]
pub struct Catalog {
    pub(crate) sources: HashMap<Uuid, Arc<Source>>,
    pub(crate) mappings: HashMap<Uuid, Arc<Mapping>>,
    pub(crate) targets: HashMap<Uuid, Arc<Target>>,
    pub(crate) responses: HashMap<Uuid, Arc<ResponseMapping>>,
}

impl Catalog {
    /// Build a catalog from already-constructed entities.
    pub fn from_parts(
        sources: Vec<Source>,
        mappings: Vec<Mapping>,
        targets: Vec<Target>,
        responses: Vec<ResponseMapping>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self {
            sources: index("source", sources, |s| s.id)?,
            mappings: index("mapping", mappings, |m| m.id)?,
            targets: index("target", targets, |t| t.id)?,
            responses: index("response", responses, |r| r.id)?,
        };
        catalog.warn_dangling();
        Ok(catalog)
    }

    /// Parse a catalog from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(content)?;
        Self::from_parts(file.sources, file.mappings, file.targets, file.responses)
    }

    /// Number of sources in this catalog.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// References to unknown ids are legal (the gateway reports them per
    /// invocation) but are almost always authoring mistakes.
    fn warn_dangling(&self) {
        for source in self.sources.values() {
            if let Some(response_id) = &source.response_id {
                if !contains(&self.responses, response_id) {
                    tracing::warn!(source = %source.name, response_id = %response_id, "Source references unknown response mapping");
                }
            }
            for flow in &source.flows {
                if let Some(target_id) = &flow.target_id {
                    if !contains(&self.targets, target_id) {
                        tracing::warn!(source = %source.name, target_id = %target_id, "Flow references unknown target");
                    }
                }
                if let Some(mapping_id) = &flow.mapping_id {
                    if !contains(&self.mappings, mapping_id) {
                        tracing::warn!(source = %source.name, mapping_id = %mapping_id, "Flow references unknown mapping");
                    }
                }
            }
        }
    }
}

fn contains<T>(map: &HashMap<Uuid, T>, id: &str) -> bool {
    Uuid::try_parse(id).is_ok_and(|id| map.contains_key(&id))
}

fn index<T>(
    kind: &'static str,
    items: Vec<T>,
    id_of: impl Fn(&T) -> Uuid,
) -> Result<HashMap<Uuid, Arc<T>>, CatalogError> {
    let mut map = HashMap::with_capacity(items.len());
    for item in items {
        match map.entry(id_of(&item)) {
            Entry::Occupied(e) => {
                return Err(CatalogError::Duplicate {
                    kind,
                    id: *e.key(),
                })
            }
            Entry::Vacant(e) => {
                e.insert(Arc::new(item));
            }
        }
    }
    Ok(map)
}

/// Load a catalog file from disk.
pub fn load_catalog(path: &Path) -> Result<Catalog, CatalogError> {
    let content = fs::read_to_string(path)?;
    let catalog = Catalog::from_toml(&content)?;
    tracing::info!(path = ?path, sources = catalog.source_count(), "Catalog loaded");
    Ok(catalog)
}
