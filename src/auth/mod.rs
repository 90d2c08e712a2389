//! # Auth Module
//!
//! Password hashing and stateless bearer tokens. The HTTP layer turns a
//! valid token into the `AuthInfo` that gates and handlers see.

pub mod crypto;
pub mod errors;
pub mod jwt;

pub use errors::{AuthError, AuthResult};
pub use jwt::{Claims, JwtManager};
