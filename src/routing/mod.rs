//! Routing module
//!
//! Uri templates with `{name}` path parameters and the per-verb dispatcher
//! that serves every registered endpoint.

mod dispatcher;
pub mod template;

pub use dispatcher::Dispatcher;
pub use template::UriTemplate;
