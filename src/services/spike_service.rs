use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::db::spikes::SpikeRow;
use crate::models::{CandleSeries, MarkerSeries, SpikeEvent};
use crate::services::price_service::{parse_non_negative, parse_number, parse_timestamp};
use crate::utils::ChartError;

/// Parse raw spike rows, keeping store order
pub fn parse_spike_rows(rows: Vec<SpikeRow>) -> Result<Vec<SpikeEvent>, ChartError> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            Ok(SpikeEvent {
                timestamp: parse_timestamp(row.timestamp.as_deref(), i)?,
                price_before: parse_non_negative("price_before", row.price_before.as_deref(), i)?,
                price_after: parse_non_negative("price_after", row.price_after.as_deref(), i)?,
                drop_percent: parse_number("drop_percent", row.drop_percent.as_deref(), i)?,
            })
        })
        .collect()
}

/// Project spike events onto the candle timestamps of `series`.
///
/// The result has one slot per candle. An event lands only on a candle with
/// exactly the same timestamp and contributes its `price_after`; events that
/// match no candle are dropped. When several events hit one candle the last
/// one in `events` wins.
pub fn align(series: &CandleSeries, events: &[SpikeEvent]) -> MarkerSeries {
    let index: HashMap<DateTime<Utc>, usize> = series
        .timestamps()
        .enumerate()
        .map(|(i, ts)| (ts, i))
        .collect();

    let mut markers = MarkerSeries::empty(series.timestamps());
    let mut dropped = 0usize;

    for event in events {
        match index.get(&event.timestamp) {
            Some(&slot) => markers.set(slot, event.price_after),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!("{} spike events matched no candle and were skipped", dropped);
    }

    markers
}
