//! Mapping configuration types
//!
//! Wire shapes for controllers and routers as accepted by the management API
//! and written to the mappings file (camelCase JSON / TOML keys).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::id::IdPattern;

/// HTTP verbs a mapping can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Options,
    Trace,
    Patch,
}

impl HttpMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
            Self::Patch => "PATCH",
        }
    }

    /// Map an inbound hyper method; extension methods and CONNECT have no mapping
    pub fn from_hyper(method: &hyper::Method) -> Option<Self> {
        match *method {
            hyper::Method::GET => Some(Self::Get),
            hyper::Method::HEAD => Some(Self::Head),
            hyper::Method::POST => Some(Self::Post),
            hyper::Method::PUT => Some(Self::Put),
            hyper::Method::DELETE => Some(Self::Delete),
            hyper::Method::OPTIONS => Some(Self::Options),
            hyper::Method::TRACE => Some(Self::Trace),
            hyper::Method::PATCH => Some(Self::Patch),
            _ => None,
        }
    }

    pub fn to_hyper(self) -> hyper::Method {
        match self {
            Self::Get => hyper::Method::GET,
            Self::Head => hyper::Method::HEAD,
            Self::Post => hyper::Method::POST,
            Self::Put => hyper::Method::PUT,
            Self::Delete => hyper::Method::DELETE,
            Self::Options => hyper::Method::OPTIONS,
            Self::Trace => hyper::Method::TRACE,
            Self::Patch => hyper::Method::PATCH,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a controller does with requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FunctionMode {
    Read,
    Create,
    Update,
    Delete,
    #[serde(alias = "GROOVY")]
    Script,
}

impl fmt::Display for FunctionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Read => "READ",
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Script => "SCRIPT",
        };
        f.write_str(name)
    }
}

/// How a controller keeps its data, decided once at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveInfoMode {
    /// Fixed answer, no path parameters
    Static,
    /// Keyed records addressed by path parameters
    Collection,
    /// Operator script decides
    Script,
}

impl SaveInfoMode {
    pub fn identify(function_mode: FunctionMode, id_params: &[String]) -> Self {
        if function_mode == FunctionMode::Script {
            Self::Script
        } else if id_params.is_empty() {
            Self::Static
        } else {
            Self::Collection
        }
    }
}

/// Synthetic endpoint configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControllerConfig {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_mode: Option<FunctionMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    pub delay_ms: u64,
    pub id_params: Vec<String>,
    pub generate_id: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    pub generate_id_patterns: HashMap<String, IdPattern>,
}

/// Forwarding endpoint configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouterConfig {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    pub to_url: String,
}

/// Which registry a configuration belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingKind {
    Controller,
    Router,
}

impl fmt::Display for MappingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Controller => f.write_str("controller"),
            Self::Router => f.write_str("router"),
        }
    }
}

/// Either kind of configuration, as handed to persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingConfig {
    Controller(ControllerConfig),
    Router(RouterConfig),
}

impl MappingConfig {
    pub const fn kind(&self) -> MappingKind {
        match self {
            Self::Controller(_) => MappingKind::Controller,
            Self::Router(_) => MappingKind::Router,
        }
    }

    pub fn uri(&self) -> &str {
        match self {
            Self::Controller(c) => &c.uri,
            Self::Router(r) => &r.uri,
        }
    }

    pub const fn method(&self) -> Option<HttpMethod> {
        match self {
            Self::Controller(c) => c.method,
            Self::Router(r) => r.method,
        }
    }

    /// Copy with the runtime id cleared, as written to persistence
    pub fn without_id(&self) -> Self {
        let mut copy = self.clone();
        match &mut copy {
            Self::Controller(c) => c.id.clear(),
            Self::Router(r) => r.id.clear(),
        }
        copy
    }

    /// Persisted entries are compared on their whole configuration, ignoring
    /// the runtime id and the id parameters derived at registration
    ///
    /// Two live controllers may share verb and uri (a collection CREATE and
    /// UPDATE on `/items/{id}`), so verb and uri alone are not enough.
    pub fn same_entry(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }

    fn identity(&self) -> Self {
        let mut copy = self.without_id();
        if let Self::Controller(c) = &mut copy {
            c.id_params.clear();
        }
        copy
    }
}

impl From<ControllerConfig> for MappingConfig {
    fn from(config: ControllerConfig) -> Self {
        Self::Controller(config)
    }
}

impl From<RouterConfig> for MappingConfig {
    fn from(config: RouterConfig) -> Self {
        Self::Router(config)
    }
}
