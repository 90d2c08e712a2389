//! # HTTP Server Module
//!
//! The REST surface of the API. Every handler follows the same order:
//! identify the caller, run the endpoint gate, call the model layer, shape
//! the response.
//!
//! # Endpoints
//!
//! - `/auth/token` - Bearer tokens from basic credentials
//! - `/users/*` - Profiles, user tags, user contacts
//! - `/tags/*` - Tags
//! - `/contacts/*` - Contact requests and confirmations
//! - `/messages/*` - Messages and threads
//! - `/ideas/*`, `/challenges/*` - Dits, their tags, votes, comments and cares
//! - `/comments/*` - Comment edits and votes

pub mod auth_routes;
pub mod comment_routes;
pub mod config;
pub mod contact_routes;
pub mod dit_routes;
pub mod errors;
pub mod extract;
pub mod message_routes;
pub mod server;
pub mod tag_routes;
pub mod user_routes;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ApiResult};
pub use server::{ApiServer, AppState};
