//! HTTP protocol layer module
//!
//! Response builders shared by the endpoint listener and the management API.

pub mod response;

pub use response::{
    build_400_response, build_404_response, build_405_response, build_413_response,
    build_endpoint_response, build_json_response,
};
