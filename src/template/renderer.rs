//! Template rendering.


use minijinja::value::ValueKind;
use minijinja::{escape_formatter, Environment, Output, State, UndefinedBehavior, Value};
use thiserror::Error;

use crate::config::TemplateConfig;
use crate::template::context::{build_context, ContextMode};
use crate::template::filters;

/// Template evaluation failure.
#[derive(Debug, Error)]
#[error("template error: {0}")]
pub struct RenderError(#[from] minijinja::Error);

/// Renders user-authored templates against a request context.
///
/// The environment has no loader and no side-effecting functions; every
/// render runs under a fuel budget and the engine's recursion limit.
#[derive(Debug)]
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    pub fn new(config: &TemplateConfig) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        env.set_fuel(Some(config.fuel));
        env.set_formatter(json_formatter);
        env.add_filter("ms_date", filters::ms_date);
        env.add_filter("ns_date", filters::ns_date);
        Self { env }
    }

    /// Render `template` against an already-built context.
    ///
    /// An absent or empty template yields `None` without touching the engine.
    pub fn render(&self, context: &Value, template: Option<&str>) -> Result<Option<String>, RenderError> {
        match template {
            None | Some("") => Ok(None),
            Some(source) => Ok(Some(self.env.render_str(source, context)?)),
        }
    }

    /// Build the context for `mode` from `context` and render.
    pub fn render_json(
        &self,
        context: &serde_json::Value,
        mode: ContextMode,
        template: Option<&str>,
    ) -> Result<Option<String>, RenderError> {
        if template.map_or(true, str::is_empty) {
            return Ok(None);
        }
        self.render(&build_context(context, mode), template)
    }
}

/// Print scalars the way JSON spells them.
///
/// `none` prints as nothing, like an undefined value; booleans print as
/// `true`/`false`; floats with no fractional part print without `.0`.
fn json_formatter(
    out: &mut Output<'_>,
    state: &State<'_, '_>,
    value: &Value,
) -> Result<(), minijinja::Error> {
    match value.kind() {
        ValueKind::None => Ok(()),
        ValueKind::Bool => Ok(out.write_str(if value.is_true() { "true" } else { "false" })?),
        ValueKind::Number if !value.is_integer() => match f64::try_from(value.clone()) {
            Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
                Ok(write!(out, "{}", f as i64)?)
            }
            _ => escape_formatter(out, state, value),
        },
        _ => escape_formatter(out, state, value),
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new(&TemplateConfig::default())
    }
}
