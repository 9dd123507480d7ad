use clap::Parser;
use std::sync::Arc;

mod api;
mod config;
mod endpoint;
mod handler;
mod http;
mod logger;
mod mapping;
mod proxy;
mod routing;
mod server;

use config::{AppState, FileConfigStore};
use endpoint::UnconfiguredScriptEngine;
use mapping::{ConfigPersistence, MappingService};
use proxy::HttpProxyClient;
use server::{create_reusable_listener, start_server_loop, ListenerRole};

/// Fake REST server: endpoints registered at runtime through a management API
#[derive(Parser, Debug)]
#[command(name = "fakerest", version)]
struct Cli {
    /// Configuration file, with or without the .toml extension
    #[arg(short, long, env = "FAKEREST_CONFIG", default_value = "config")]
    config: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = config::Config::load_from(&cli.config)?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let app_addr = cfg.get_socket_addr()?;
    let api_addr = cfg.get_api_socket_addr()?;

    let persistence: Arc<dyn ConfigPersistence> =
        Arc::new(FileConfigStore::new(&cfg.mappings.file, cfg.mappings.persist));
    let mappings = MappingService::new(
        Arc::clone(&persistence),
        Arc::new(HttpProxyClient::new()?),
        Arc::new(UnconfiguredScriptEngine),
    );

    let report = mapping::loader::load_persisted(&mappings, persistence.as_ref()).await;
    logger::log_info(&format!(
        "Restored {} mappings ({} skipped)",
        report.registered, report.failed
    ));

    let state = Arc::new(AppState::new(&cfg, mappings));

    let app_listener = create_reusable_listener(app_addr)?;
    let api_listener = create_reusable_listener(api_addr)?;
    logger::log_server_start(&app_addr, &api_addr, &cfg);

    let app = tokio::spawn(start_server_loop(
        app_listener,
        Arc::clone(&state),
        ListenerRole::Endpoints,
    ));
    let api = tokio::spawn(start_server_loop(api_listener, state, ListenerRole::Api));

    tokio::signal::ctrl_c().await?;
    logger::log_info("Shutdown requested, stopping listeners");
    app.abort();
    api.abort();
    Ok(())
}
