use sqlx::postgres::PgConnection;

/// A `prices` row with every column cast to text
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PriceRow {
    pub timestamp: Option<String>,
    pub open: Option<String>,
    pub high: Option<String>,
    pub low: Option<String>,
    pub close: Option<String>,
    pub volume: Option<String>,
}

/// Get the most recent `limit` price rows for a symbol, newest first
pub async fn fetch_recent_prices(
    conn: &mut PgConnection,
    symbol: &str,
    limit: u32,
) -> Result<Vec<PriceRow>, sqlx::Error> {
    sqlx::query_as::<_, PriceRow>(
        "SELECT CAST(timestamp AS TEXT) AS timestamp, \
                CAST(open AS TEXT) AS open, \
                CAST(high AS TEXT) AS high, \
                CAST(low AS TEXT) AS low, \
                CAST(close AS TEXT) AS close, \
                CAST(volume AS TEXT) AS volume \
         FROM prices \
         WHERE symbol = $1 \
         ORDER BY prices.timestamp DESC \
         LIMIT $2"
    )
    .bind(symbol)
    .bind(i64::from(limit))
    .fetch_all(conn)
    .await
}
