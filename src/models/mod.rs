//! Data models for the chart pipeline
//!
//! Each model lives for a single run: the loader builds candles and spike
//! events, the aligner derives markers, the composer consumes both.

pub mod candle;
pub mod spike;
pub mod marker;

pub use candle::{Candle, CandleSeries};
pub use spike::SpikeEvent;
pub use marker::{MarkerSeries, MarkerSlot};
