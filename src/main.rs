//! Auto Save - periodically trigger a save action on a target page
//!
//! This is the main entry point for the auto-save daemon.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use auto_save::{
    agent::{LoggingSaveControl, PageAgent, PageDirectory, SaveControl},
    api::{create_router, ApiState},
    config::Config,
    controller::Controller,
    services::{check_shell_available, CommandSaveControl},
    storage::{JsonFileStore, MemoryStore, SettingsStore},
    tasks::{console_popup_task, wake_up_recovery_task},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("auto_save={},tower_http=info", config.log_level()))
        .init();

    info!("Starting auto-save v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, store={}",
        config.host,
        config.port,
        config
            .store
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "memory".to_string())
    );

    let store: Arc<dyn SettingsStore> = match &config.store {
        Some(path) => Arc::new(JsonFileStore::new(path)),
        None => Arc::new(MemoryStore::new()),
    };

    let control: Arc<dyn SaveControl> = match &config.save_command {
        Some(command) => {
            if let Err(e) = check_shell_available().await {
                anyhow::bail!(e);
            }
            info!("Save control runs: {}", command);
            Arc::new(CommandSaveControl::new(command.clone()))
        }
        None => Arc::new(LoggingSaveControl),
    };

    let pages = PageDirectory::new();
    if let Some(url) = &config.page_url {
        pages.set_active(PageAgent::install(
            url,
            &config.page_pattern,
            Arc::clone(&store),
            control,
        ));
    }

    // Start the controller and its companions
    let controller = Controller::spawn(store, pages);
    tokio::spawn(wake_up_recovery_task(controller.clone()));
    if config.interactive {
        tokio::spawn(console_popup_task(controller.clone()));
    }

    let app = create_router(ApiState::new(controller));

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Settings API running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /settings - Current settings and countdown");
    info!("  POST /settings - Update settings");
    info!("  POST /message  - Runtime message (updateSettings, getSettings)");
    info!("  GET  /badge    - Current badge");
    info!("  GET  /events   - Countdown ticks (server-sent events)");
    info!("  GET  /health   - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Auto-save shutdown complete");
    Ok(())
}
