//! # Inquest Server
//!
//! HTTP surface for the Inquest service: the investigation submission
//! endpoint, the SSE event stream, and a liveness probe.

pub mod routes;
