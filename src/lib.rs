//! Webhook transformation gateway.
//!
//! Receives inbound webhooks, fans each one out to the configured
//! downstream targets through templates, and answers the caller with either
//! a delivery report or a templated response.

pub mod config;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod store;
pub mod template;
pub mod transform;

pub use config::GatewayConfig;
pub use gateway::{Gateway, GatewayReply};
pub use http::HttpServer;
pub use lifecycle::{Application, Shutdown};
