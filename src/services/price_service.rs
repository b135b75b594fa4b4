use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::db::{self, prices::PriceRow};
use crate::models::{Candle, CandleSeries, SpikeEvent};
use crate::services::spike_service;
use crate::utils::{parse_db_timestamp, ChartError};

/// Reads candles and spike events for one symbol from the store.
///
/// Every fetch opens its own connection and closes it before returning.
pub struct PriceSeriesLoader {
    config: StoreConfig,
}

impl PriceSeriesLoader {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Load the most recent `limit` candles for `symbol`, oldest first
    pub async fn load(&self, symbol: &str, limit: u32) -> Result<CandleSeries, ChartError> {
        let mut conn = db::connect(&self.config).await?;
        let rows = db::prices::fetch_recent_prices(&mut conn, symbol, limit).await;
        db::close(conn).await;

        let rows = rows.map_err(|e| ChartError::store("Failed to fetch prices", e))?;
        debug!("Store returned {} price rows for {}", rows.len(), symbol);

        build_series(symbol, rows)
    }

    /// Load every spike recorded for `symbol`, in store order
    pub async fn load_spikes(&self, symbol: &str) -> Result<Vec<SpikeEvent>, ChartError> {
        let mut conn = db::connect(&self.config).await?;
        let rows = db::spikes::fetch_spikes(&mut conn, symbol).await;
        db::close(conn).await;

        let rows = rows.map_err(|e| ChartError::store("Failed to fetch spikes", e))?;
        let events = spike_service::parse_spike_rows(rows)?;
        info!("Found {} spike events", events.len());
        Ok(events)
    }
}

/// Parse a text column into a finite number
pub(crate) fn parse_number(column: &str, raw: Option<&str>, row: usize) -> Result<f64, ChartError> {
    let raw = raw.ok_or_else(|| ChartError::DataCorruption(format!("row {}: {} is NULL", row, column)))?;

    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| ChartError::DataCorruption(format!("row {}: {} is not numeric: '{}'", row, column, raw)))?;

    if !value.is_finite() {
        return Err(ChartError::DataCorruption(format!("row {}: {} is not finite: '{}'", row, column, raw)));
    }

    Ok(value)
}

/// Same as [`parse_number`], also rejecting negative values
pub(crate) fn parse_non_negative(column: &str, raw: Option<&str>, row: usize) -> Result<f64, ChartError> {
    let value = parse_number(column, raw, row)?;
    if value < 0.0 {
        return Err(ChartError::DataCorruption(format!("row {}: {} is negative: {}", row, column, value)));
    }
    Ok(value)
}

pub(crate) fn parse_timestamp(raw: Option<&str>, row: usize) -> Result<chrono::DateTime<chrono::Utc>, ChartError> {
    let raw = raw.ok_or_else(|| ChartError::DataCorruption(format!("row {}: timestamp is NULL", row)))?;
    parse_db_timestamp(raw)
        .ok_or_else(|| ChartError::DataCorruption(format!("row {}: unparsable timestamp '{}'", row, raw)))
}

fn parse_price_row(row: &PriceRow, index: usize) -> Result<Candle, ChartError> {
    Ok(Candle {
        timestamp: parse_timestamp(row.timestamp.as_deref(), index)?,
        open: parse_non_negative("open", row.open.as_deref(), index)?,
        high: parse_non_negative("high", row.high.as_deref(), index)?,
        low: parse_non_negative("low", row.low.as_deref(), index)?,
        close: parse_non_negative("close", row.close.as_deref(), index)?,
        volume: parse_non_negative("volume", row.volume.as_deref(), index)?,
    })
}

/// Turn raw store rows (any order) into an ascending candle series
pub fn build_series(symbol: &str, rows: Vec<PriceRow>) -> Result<CandleSeries, ChartError> {
    if rows.is_empty() {
        return Err(ChartError::NotFound {
            symbol: symbol.to_string(),
        });
    }

    let mut candles = rows
        .iter()
        .enumerate()
        .map(|(i, row)| parse_price_row(row, i))
        .collect::<Result<Vec<_>, _>>()?;

    // Store hands rows back newest first
    candles.sort_by_key(|c| c.timestamp);

    if let Some(pair) = candles.windows(2).find(|w| w[0].timestamp == w[1].timestamp) {
        return Err(ChartError::DataCorruption(format!(
            "duplicate candle timestamp {}",
            pair[0].timestamp
        )));
    }

    Ok(CandleSeries::new(symbol, candles))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn price_row(ts: &str, close: &str) -> PriceRow {
        PriceRow {
            timestamp: Some(ts.to_string()),
            open: Some(close.to_string()),
            high: Some(close.to_string()),
            low: Some(close.to_string()),
            close: Some(close.to_string()),
            volume: Some("10.5".to_string()),
        }
    }

    #[test]
    fn test_descending_rows_become_ascending() {
        let rows = vec![
            price_row("2024-01-01 00:03:00", "105"),
            price_row("2024-01-01 00:02:00", "103"),
            price_row("2024-01-01 00:01:00", "101"),
        ];

        let series = build_series("BTCUSDT", rows).unwrap();
        let closes: Vec<f64> = series.candles().iter().map(|c| c.close).collect();
        assert_eq!(closes, vec![101.0, 103.0, 105.0]);

        let stamps: Vec<_> = series.timestamps().collect();
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_shuffled_rows_sorted() {
        let rows = vec![
            price_row("2024-01-01 00:02:00", "2"),
            price_row("2024-01-01 00:05:00", "5"),
            price_row("2024-01-01 00:01:00", "1"),
            price_row("2024-01-01 00:03:00.5", "3"),
        ];

        let series = build_series("BTCUSDT", rows).unwrap();
        let closes: Vec<f64> = series.candles().iter().map(|c| c.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0, 5.0]);
    }

    #[test]
    fn test_zero_rows_not_found() {
        let err = build_series("DOGEUSDT", Vec::new()).unwrap_err();
        assert!(matches!(err, ChartError::NotFound { symbol } if symbol == "DOGEUSDT"));
    }

    #[test]
    fn test_numeric_strings_cast() {
        let mut row = price_row("2024-01-01 00:00:00+00", "42000.12345678");
        row.volume = Some("0.00000001".to_string());

        let series = build_series("BTCUSDT", vec![row]).unwrap();
        let candle = &series.candles()[0];
        assert_eq!(candle.close, 42000.12345678);
        assert_eq!(candle.volume, 0.00000001);
    }

    #[test]
    fn test_non_numeric_field_is_corruption() {
        let mut row = price_row("2024-01-01 00:00:00", "100");
        row.high = Some("abc".to_string());

        let err = build_series("BTCUSDT", vec![row]).unwrap_err();
        assert!(matches!(err, ChartError::DataCorruption(msg) if msg.contains("high")));
    }

    #[test]
    fn test_null_and_nan_are_corruption() {
        let mut row = price_row("2024-01-01 00:00:00", "100");
        row.volume = None;
        assert!(matches!(build_series("BTCUSDT", vec![row]), Err(ChartError::DataCorruption(_))));

        let row = price_row("2024-01-01 00:00:00", "NaN");
        assert!(matches!(build_series("BTCUSDT", vec![row]), Err(ChartError::DataCorruption(_))));

        let row = price_row("2024-01-01 00:00:00", "-1");
        assert!(matches!(build_series("BTCUSDT", vec![row]), Err(ChartError::DataCorruption(_))));
    }

    #[test]
    fn test_bad_timestamp_is_corruption() {
        let row = price_row("yesterday", "100");
        let err = build_series("BTCUSDT", vec![row]).unwrap_err();
        assert!(matches!(err, ChartError::DataCorruption(msg) if msg.contains("yesterday")));
    }

    #[test]
    fn test_duplicate_timestamps_rejected() {
        let rows = vec![
            price_row("2024-01-01 00:01:00", "1"),
            price_row("2024-01-01 00:01:00+00", "2"),
        ];
        assert!(matches!(build_series("BTCUSDT", rows), Err(ChartError::DataCorruption(_))));
    }
}
