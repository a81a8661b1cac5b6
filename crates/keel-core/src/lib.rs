//! Service plumbing shared by Keel services: error bodies, tracing setup,
//! health probes, request ids and wire formats.

pub mod error;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
