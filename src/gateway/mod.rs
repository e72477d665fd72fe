//! Gateway subsystem.
//!
//! # Data Flow
//! ```text
//! Context (from http::ingress)
//!     → handler.rs (validate id, load source)
//!     → flows.rs (mapping + target → TransformedRequest, per flow)
//!     → dispatcher.rs (concurrent or serial delivery)
//!     → handler.rs (response mapping, or the delivery envelope)
//!     → GatewayReply (to http::reply)
//! ```
//!
//! # Design Decisions
//! - Per-flow failures are collected in an `ErrorEnvelope` and reported
//!   in-band; they never abort sibling flows
//! - Only an invalid source id, a store failure and unexpected errors end
//!   an invocation with a 400
//! - The handler holds no per-request state; one instance serves all requests

pub mod dispatcher;
pub mod errors;
pub mod flows;
pub mod handler;

pub use dispatcher::{DispatchError, Dispatcher};
pub use errors::{ErrorEnvelope, ErrorKind, ErrorResponse};
pub use flows::{map_flows, MappedFlows};
pub use handler::{is_valid_source_id, DeliveryEnvelope, Gateway, GatewayReply};
