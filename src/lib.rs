//! ditapi - REST API of the ditup collaboration network
//!
//! Every request passes a gate before it reaches the graph: a structural
//! check against the endpoint's JSON schema, then cross-field consistency
//! rules. Writes are single conditional AQL statements whose failures are
//! classified into not-found, forbidden and conflict.

pub mod auth;
pub mod cli;
pub mod config;
pub mod consistency;
pub mod gate;
pub mod http_server;
pub mod models;
pub mod observability;
pub mod request;
pub mod schema;
pub mod store;
