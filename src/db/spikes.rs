use sqlx::postgres::PgConnection;

/// A `spikes` row with every column cast to text
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SpikeRow {
    pub timestamp: Option<String>,
    pub price_before: Option<String>,
    pub price_after: Option<String>,
    pub drop_percent: Option<String>,
}

/// Get every recorded spike for a symbol, oldest first
pub async fn fetch_spikes(conn: &mut PgConnection, symbol: &str) -> Result<Vec<SpikeRow>, sqlx::Error> {
    sqlx::query_as::<_, SpikeRow>(
        "SELECT CAST(timestamp AS TEXT) AS timestamp, \
                CAST(price_before AS TEXT) AS price_before, \
                CAST(price_after AS TEXT) AS price_after, \
                CAST(drop_percent AS TEXT) AS drop_percent \
         FROM spikes \
         WHERE symbol = $1 \
         ORDER BY spikes.timestamp"
    )
    .bind(symbol)
    .fetch_all(conn)
    .await
}
