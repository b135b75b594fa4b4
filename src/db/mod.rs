use sqlx::postgres::PgConnection;
use sqlx::Connection;
use tracing::debug;

use crate::config::StoreConfig;
use crate::utils::ChartError;

pub mod prices;
pub mod spikes;

/// Open a single connection to the price store
pub async fn connect(config: &StoreConfig) -> Result<PgConnection, ChartError> {
    let options = config.connect_options()?;
    debug!("Connecting to {}", config.describe());

    PgConnection::connect_with(&options)
        .await
        .map_err(|e| ChartError::store(&format!("Failed to connect to {}", config.describe()), e))
}

/// Close a connection; a failed goodbye is logged, never reported
pub async fn close(conn: PgConnection) {
    if let Err(e) = conn.close().await {
        debug!("Error while closing store connection: {}", e);
    }
}
