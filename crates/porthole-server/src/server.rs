//! Server configuration and startup.

use tokio::net::TcpListener;
use tracing::info;

use crate::error::ServerError;
use crate::routes::create_router;
use crate::state::AppState;

/// Listen address of the viewer server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Bind and serve until the listener fails or the task is dropped.
pub async fn run(config: ServerConfig, state: AppState) -> Result<(), ServerError> {
    let router = create_router(state);
    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ServerError::Bind(addr.clone(), e))?;

    info!("Viewer listening at http://{}", addr);
    axum::serve(listener, router).await?;
    Ok(())
}
