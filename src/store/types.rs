//! Catalog entity types.
//!
//! These are read-only to the gateway: one invocation resolves what it
//! needs and never mutates it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A routable configuration unit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Source {
    pub id: Uuid,
    pub name: String,
    /// Mapping/target pairs, each producing at most one outbound request.
    #[serde(default)]
    pub flows: Vec<Flow>,
    /// Response mapping used to build the caller's reply.
    #[serde(default)]
    pub response_id: Option<String>,
    /// Dispatch one request at a time instead of all at once.
    #[serde(default)]
    pub serial: bool,
}

/// One (mapping, target) pairing inside a source.
///
/// Ids are kept as authored so that dangling or malformed references can be
/// reported back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Flow {
    #[serde(default)]
    pub mapping_id: Option<String>,
    #[serde(default)]
    pub target_id: Option<String>,
}

/// A body-rendering template.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Mapping {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub template: Option<String>,
}

/// How a rendered body goes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    Text,
    Binary,
}

/// Destination descriptor for one outbound request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Target {
    pub id: Uuid,
    pub name: String,
    /// HTTP method; `GET` when absent.
    #[serde(default)]
    pub method: Option<String>,
    /// URL template.
    pub url: String,
    /// Header template, must render to a JSON object.
    #[serde(default)]
    pub headers: Option<String>,
    #[serde(default)]
    pub encoding: Option<Encoding>,
}

/// Template descriptor for the reply returned to the original caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResponseMapping {
    pub id: Uuid,
    pub name: String,
    /// Status template, must render to an integer in `[100, 600)`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub headers: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
}
