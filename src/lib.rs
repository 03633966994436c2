//! JWT guards for HTTP routes: verify a signed token from a configured
//! credential, check its claims against ordered comparison rules, and attach
//! the verified identity to the request.

pub mod authn;
pub mod authz;
pub mod claims;
pub mod config;
pub mod decision;
pub mod display;
pub mod error;
pub mod logs;
pub mod server;
