//! Template context construction.
//!
//! Two modes over the same JSON context object:
//!
//! - [`ContextMode::NullSafe`]: `params`, `body` and `headers` are wrapped in
//!   [`NullSafe`], so a missing key renders as the text `null`. Used for body
//!   templates, where `{"name": {{ body.name }}}` must stay valid JSON.
//! - [`ContextMode::Raw`]: the object is handed to the engine unchanged and
//!   missing paths render as an empty string. Used for URL, header and
//!   status templates.

use std::sync::Arc;

use minijinja::value::{Enumerator, Object, ObjectRepr};
use minijinja::Value;
use serde_json::Map;

/// Rendered in place of a missing key in null-safe mode.
pub const NULL_LITERAL: &str = "null";

/// Keys that get the null-safe wrapper.
const NULL_SAFE_KEYS: [&str; 3] = ["params", "body", "headers"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextMode {
    Raw,
    NullSafe,
}

/// Map adapter whose lookups never come back undefined.
#[derive(Debug, Default)]
pub struct NullSafe(Map<String, serde_json::Value>);

impl NullSafe {
    pub fn new(map: Map<String, serde_json::Value>) -> Self {
        Self(map)
    }

    /// The stored value, or the `null` literal when the key is absent.
    pub fn get_or_null(&self, key: &str) -> Value {
        match self.0.get(key) {
            Some(value) => Value::from_serialize(value),
            None => Value::from(NULL_LITERAL),
        }
    }
}

impl Object for NullSafe {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Map
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        key.as_str().map(|key| self.get_or_null(key))
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Values(self.0.keys().map(|k| Value::from(k.as_str())).collect())
    }
}

/// Build the engine-facing context for `mode`.
///
/// `context` is normally a serialized [`crate::transform::Context`].
pub fn build_context(context: &serde_json::Value, mode: ContextMode) -> Value {
    match mode {
        ContextMode::Raw => Value::from_serialize(context),
        ContextMode::NullSafe => null_safe(context),
    }
}

fn null_safe(context: &serde_json::Value) -> Value {
    let empty = Map::new();
    let fields = context.as_object().unwrap_or(&empty);

    let wrapped = NULL_SAFE_KEYS.iter().map(|&key| {
        let value = match fields.get(key) {
            Some(serde_json::Value::Object(map)) => Value::from_object(NullSafe::new(map.clone())),
            None | Some(serde_json::Value::Null) => Value::from_object(NullSafe::default()),
            // Raw text bodies and other scalars are not maps; leave them as they are.
            Some(other) => Value::from_serialize(other),
        };
        (key.to_string(), value)
    });
    let rest = fields
        .iter()
        .filter(|(key, _)| !NULL_SAFE_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), Value::from_serialize(value)));

    Value::from_iter(wrapped.chain(rest))
}
