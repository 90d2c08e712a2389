//! Request gates
//!
//! A gate composes the structural validator and the consistency checker for
//! one endpoint: schema first, requirements only on well-formed requests.
//! `Gates` holds one gate per entry of the endpoint catalogue.

mod catalogue;
mod check;
mod errors;

pub use catalogue::{Endpoint, Gates};
pub use check::{Gate, GateResult, Rejection};
pub use errors::{GateBuildError, GateBuildResult};
