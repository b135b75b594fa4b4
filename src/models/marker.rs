//! Spike marker models

use chrono::{DateTime, Utc};

/// One candle position and the marker drawn on it, if any
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerSlot {
    pub timestamp: DateTime<Utc>,
    pub price: Option<f64>,
}

/// Markers keyed by the candle timestamps of a series.
///
/// Holds exactly one slot per candle, in the same order, so slot `i` belongs
/// to candle `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSeries {
    slots: Vec<MarkerSlot>,
}

impl MarkerSeries {
    /// A series with every slot empty
    pub fn empty<I>(timestamps: I) -> Self
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        Self {
            slots: timestamps
                .into_iter()
                .map(|timestamp| MarkerSlot { timestamp, price: None })
                .collect(),
        }
    }

    pub(crate) fn set(&mut self, index: usize, price: f64) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.price = Some(price);
        }
    }

    pub fn slots(&self) -> &[MarkerSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn domain(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        self.slots.iter().map(|s| s.timestamp)
    }

    /// Marker price at an exact timestamp; `None` when the slot is empty or missing
    pub fn get(&self, timestamp: DateTime<Utc>) -> Option<f64> {
        self.slots
            .iter()
            .find(|s| s.timestamp == timestamp)
            .and_then(|s| s.price)
    }

    /// Filled slots as `(candle index, price)`
    pub fn marked(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.price.map(|p| (i, p)))
    }

    pub fn marked_count(&self) -> usize {
        self.marked().count()
    }

    pub fn has_markers(&self) -> bool {
        self.slots.iter().any(|s| s.price.is_some())
    }
}
