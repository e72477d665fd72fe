//! Template rendering subsystem.
//!
//! # Data Flow
//! ```text
//! Context (serde_json::Value)
//!     → context.rs (raw or null-safe engine context)
//!     → renderer.rs (minijinja, fuel-limited)
//!     → Option<String> (None when there was no template)
//! ```
//!
//! # Design Decisions
//! - One shared `Environment`; templates are compiled per render, so there
//!   is no cache to invalidate when the catalog reloads
//! - Jinja syntax: `{{ a.b }}`, `{{ a["b"] }}`, `{{ a[0] }}`, `{{ x | ms_date }}`
//! - Rendering is a pure function of (context, template)

pub mod context;
pub mod filters;
pub mod renderer;

pub use context::{build_context, ContextMode, NullSafe, NULL_LITERAL};
pub use renderer::{RenderError, TemplateRenderer};
