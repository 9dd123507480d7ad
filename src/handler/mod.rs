//! Request handler module
//!
//! Entry point for traffic on the endpoint listener: request conversion,
//! body limits, dispatch and access logging.

pub mod request;

pub use request::handle_request;
