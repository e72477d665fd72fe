//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, limits, tracing)
//!     → ingress.rs (method, params, headers, body → Context)
//!     → gateway::Gateway::handle
//!     → reply.rs (GatewayReply → status, headers, body)
//!     → Send to client
//! ```

pub mod health;
pub mod ingress;
pub mod reply;
pub mod server;

pub use server::{AppState, HttpServer, X_REQUEST_ID};
