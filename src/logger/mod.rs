//! Logger module
//!
//! Logging utilities for the endpoint server and the management API:
//! - Server lifecycle logging
//! - Mapping registration logging
//! - Access logging with multiple formats
//! - Leveled error, warning, info and debug messages
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use crate::mapping::HttpMethod;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};

const LEVEL_ERROR: u8 = 0;
const LEVEL_WARN: u8 = 1;
const LEVEL_INFO: u8 = 2;
const LEVEL_DEBUG: u8 = 3;
const LEVEL_TRACE: u8 = 4;

static LEVEL: AtomicU8 = AtomicU8::new(LEVEL_INFO);

/// Map a configured level name, unknown names fall back to info
fn parse_level(level: &str) -> u8 {
    match level.to_ascii_lowercase().as_str() {
        "error" => LEVEL_ERROR,
        "warn" | "warning" => LEVEL_WARN,
        "debug" => LEVEL_DEBUG,
        "trace" => LEVEL_TRACE,
        _ => LEVEL_INFO,
    }
}

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    LEVEL.store(parse_level(&config.logging.level), Ordering::Relaxed);
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn enabled(level: u8) -> bool {
    level <= LEVEL.load(Ordering::Relaxed)
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, api_addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("Fake REST server started");
    write_info(&format!("Endpoints on: http://{addr}"));
    write_info(&format!("Management API on: http://{api_addr}/api/conf/mapping"));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if config.mappings.persist {
        write_info(&format!("Mappings file: {}", config.mappings.file));
    } else {
        write_info("Mappings are not persisted");
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================\n");
}

pub fn log_info(message: &str) {
    if enabled(LEVEL_INFO) {
        write_info(&format!("[INFO] {message}"));
    }
}

pub fn log_debug(message: &str) {
    if enabled(LEVEL_DEBUG) {
        write_info(&format!("[DEBUG] {message}"));
    }
}

pub fn log_trace(message: &str) {
    if enabled(LEVEL_TRACE) {
        write_info(&format!("[TRACE] {message}"));
    }
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    log_debug(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_api_error(message: &str) {
    write_error(&format!("[API ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    if enabled(LEVEL_WARN) {
        write_error(&format!("[WARN] {message}"));
    }
}

pub fn log_headers_count(count: usize, show: bool) {
    if show {
        write_info(&format!("[Headers] Count: {count}"));
    }
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    match writer::get() {
        Some(w) => w.write_access(&entry.format(format)),
        None => println!("{}", entry.format(format)),
    }
}

pub fn log_api_request(method: &str, path: &str, status: u16) {
    if enabled(LEVEL_INFO) {
        write_info(&format!("[API] {method} {path} - {status}"));
    }
}

pub fn log_mapping_registered(kind: &str, method: &str, urls: &[String]) {
    log_info(&format!("[Mapping] Registered {kind} {method} {}", urls.join(", ")));
}

pub fn log_mapping_unregistered(kind: &str, method: &str, urls: &[String]) {
    log_info(&format!("[Mapping] Removed {kind} {method} {}", urls.join(", ")));
}

/// Summary of every bound url, grouped by verb
pub fn log_configured_urls(urls: &BTreeMap<HttpMethod, Vec<String>>) {
    if urls.is_empty() {
        log_info("[Mapping] No urls configured");
        return;
    }
    log_info("[Mapping] Configured urls:");
    for (method, list) in urls {
        log_info(&format!("  {method}: {}", list.join(", ")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("ERROR"), LEVEL_ERROR);
        assert_eq!(parse_level("warn"), LEVEL_WARN);
        assert_eq!(parse_level("trace"), LEVEL_TRACE);
        assert_eq!(parse_level("nonsense"), LEVEL_INFO);
    }

    #[test]
    fn test_default_level_hides_debug() {
        assert!(enabled(LEVEL_ERROR));
        assert!(enabled(LEVEL_INFO));
        assert!(!enabled(LEVEL_DEBUG));
        assert!(!enabled(LEVEL_TRACE));
    }
}
