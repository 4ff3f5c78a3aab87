use anyhow::Result;
use tracing_subscriber::EnvFilter;

mod config;
mod dbus_interface;
mod engine;

use dbus_interface::{FaceShapeService, BUS_NAME, OBJECT_PATH};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("faceshaped starting");

    let config = config::Config::from_env()?;
    if let Some(path) = &config.config_path {
        tracing::info!(path = %path.display(), "using config file");
    }

    let engine = engine::spawn_engine(&config.shape, config.queue_depth)?;

    let builder = if config.system_bus {
        zbus::connection::Builder::system()?
    } else {
        zbus::connection::Builder::session()?
    };
    let _connection = builder
        .name(BUS_NAME)?
        .serve_at(OBJECT_PATH, FaceShapeService::new(engine))?
        .build()
        .await?;

    tracing::info!(
        bus = if config.system_bus { "system" } else { "session" },
        name = BUS_NAME,
        "faceshaped ready"
    );

    // Keep running until signaled
    tokio::signal::ctrl_c().await?;
    tracing::info!("faceshaped shutting down");

    Ok(())
}
