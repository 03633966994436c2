mod handlers;
mod openapi;
mod request;
mod response;

pub mod config;
pub mod factory;
pub mod restful;

pub use handlers::HandlerKind;
pub use openapi::{security_requirement, security_schemes, unauthorized_response, SecurityScheme};
pub use request::request_params;
pub use response::{CommonResponse, DenialBody, DenialResponse};
