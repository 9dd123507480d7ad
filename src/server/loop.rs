// Server loop module
// Accept loop shared by the endpoint and API listeners

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::{accept_connection, ListenerRole};
use crate::config::AppState;
use crate::logger;

/// Accept connections until the task is dropped
///
/// Accept failures are logged and the loop keeps going.
pub async fn start_server_loop(listener: TcpListener, state: Arc<AppState>, role: ListenerRole) {
    let active_connections = Arc::new(AtomicUsize::new(0));

    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                accept_connection(stream, peer_addr, &state, &active_connections, role);
            }
            Err(e) => match role {
                ListenerRole::Api => {
                    logger::log_api_error(&format!("Failed to accept connection: {e}"));
                }
                ListenerRole::Endpoints => {
                    logger::log_error(&format!("Failed to accept connection: {e}"));
                }
            },
        }
    }
}
