//! API handlers
//!
//! Each handler follows a consistent pattern:
//! - Extract state and the JSON body using Axum extractors
//! - Validate input at the boundary
//! - Call the ledger service under the request deadline
//! - Map the result to a standardized response format

pub mod json;
pub mod ledger;
pub mod response;
pub mod validation;

pub use json::RpcJson;
pub use response::ApiResponse;
