//! Node service: the matching engine behind `POST /process`
//!
//! Stateless per call. A matcher failure (e.g. an invalid regex) is reported
//! in the response body's `error` field with status 200; only undecodable
//! requests get an HTTP error status.

pub mod routes;
pub mod server;
pub mod types;

pub use server::{install_metrics_recorder, AppState, NodeServer};
pub use types::{ProcessRequest, ProcessResponse};
