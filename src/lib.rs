// Metapackage for end-to-end tests across the workspace crates

pub use account_service;
pub use api_gateway;
pub use common;
