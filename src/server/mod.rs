// Server module entry
// Listener setup, accept loop and connection serving

pub mod connection;
pub mod listener;

// `loop` is a keyword, so the module is renamed
#[path = "loop.rs"]
pub mod server_loop;

pub use connection::ListenerRole;
pub use listener::create_reusable_listener;
pub use server_loop::start_server_loop;
