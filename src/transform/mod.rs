//! Request and response transformation.
//!
//! # Data Flow
//! ```text
//! Context + Mapping.template + Target
//!     → request.rs (method, url, headers, body)
//!     → TransformedRequest
//!
//! Context + responses + errors + ResponseMapping
//!     → response.rs (status, headers, body)
//!     → TransformedResponse
//! ```
//!
//! # Design Decisions
//! - URL, header and status templates render against the raw context
//! - Body templates render null-safe so JSON templates stay well-formed
//! - JSON request bodies are validated, never re-serialized; JSON reply
//!   bodies are parsed so the caller receives a real object

pub mod error;
pub mod headers;
pub mod request;
pub mod response;
pub mod types;

pub use error::TransformError;
pub use headers::Headers;
pub use request::transform_request;
pub use response::transform_response;
pub use types::{
    Context, DeliveryResult, DownstreamResponse, RequestBody, TransformedRequest,
    TransformedResponse,
};
