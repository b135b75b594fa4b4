use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::{debug, info};

use crate::config::ChartConfig;
use crate::models::{CandleSeries, MarkerSeries};
use crate::utils::ChartError;

const UP_COLOR: RGBColor = RGBColor(0x26, 0xa6, 0x9a);
const DOWN_COLOR: RGBColor = RGBColor(0xef, 0x53, 0x50);
const Y_LABEL_AREA: u32 = 70;

/// What gets drawn for one chart.
///
/// Both variants carry the price and volume panels; only `WithOverlay` adds
/// spike markers on top of the price panel.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPlan<'a> {
    Base {
        title: String,
        series: &'a CandleSeries,
    },
    WithOverlay {
        title: String,
        series: &'a CandleSeries,
        /// `(candle index, marker price)`
        markers: Vec<(usize, f64)>,
    },
}

impl<'a> RenderPlan<'a> {
    /// Choose the plan for a series and its markers
    pub fn build(series: &'a CandleSeries, markers: &MarkerSeries, symbol: &str) -> Result<Self, ChartError> {
        if series.is_empty() {
            return Err(ChartError::Render("cannot chart an empty candle series".to_string()));
        }
        if markers.len() != series.len() {
            return Err(ChartError::Render(format!(
                "marker series has {} slots for {} candles",
                markers.len(),
                series.len()
            )));
        }

        let title = chart_title(symbol, series.len());

        if markers.has_markers() {
            Ok(RenderPlan::WithOverlay {
                title,
                series,
                markers: markers.marked().collect(),
            })
        } else {
            Ok(RenderPlan::Base { title, series })
        }
    }

    pub fn title(&self) -> &str {
        match self {
            RenderPlan::Base { title, .. } | RenderPlan::WithOverlay { title, .. } => title,
        }
    }

    pub fn series(&self) -> &'a CandleSeries {
        match self {
            RenderPlan::Base { series, .. } | RenderPlan::WithOverlay { series, .. } => *series,
        }
    }

    /// Price and volume, always
    pub fn panel_count(&self) -> usize {
        2
    }

    pub fn overlay(&self) -> Option<&[(usize, f64)]> {
        match self {
            RenderPlan::Base { .. } => None,
            RenderPlan::WithOverlay { markers, .. } => Some(markers),
        }
    }

    /// Price axis range covering every candle and marker, padded by 10%
    fn price_range(&self) -> (f64, f64) {
        let (mut low, mut high) = self.series().price_bounds().unwrap_or((0.0, 1.0));
        for &(_, price) in self.overlay().unwrap_or(&[]) {
            low = low.min(price);
            high = high.max(price);
        }

        let padding = (high - low).max(1e-8) * 0.1;
        ((low - padding).max(0.0), high + padding)
    }
}

pub fn chart_title(symbol: &str, candle_count: usize) -> String {
    format!("{} K-Line Chart (Latest {} candles)", symbol, candle_count)
}

fn draw_err<E: std::fmt::Display>(what: &'static str) -> impl Fn(E) -> ChartError {
    move |e| ChartError::Render(format!("Failed to {}: {}", what, e))
}

/// Renders candle series to PNG files
pub struct ChartComposer {
    config: ChartConfig,
}

impl ChartComposer {
    pub fn new(config: ChartConfig) -> Self {
        Self { config }
    }

    /// Render `series` with its `markers` to `destination`, returning the path written
    pub fn compose(
        &self,
        series: &CandleSeries,
        markers: &MarkerSeries,
        symbol: &str,
        destination: &Path,
    ) -> Result<PathBuf, ChartError> {
        let plan = RenderPlan::build(series, markers, symbol)?;

        match plan.overlay() {
            Some(points) => info!(
                "Rendering {} ({} panels, {} spike markers)",
                plan.title(),
                plan.panel_count(),
                points.len()
            ),
            None => info!("Rendering {} ({} panels, no spike markers)", plan.title(), plan.panel_count()),
        }

        self.render(&plan, destination)?;
        Ok(destination.to_path_buf())
    }

    fn render(&self, plan: &RenderPlan<'_>, destination: &Path) -> Result<(), ChartError> {
        let candles = plan.series().candles();
        let count = candles.len();

        let backend = BitMapBackend::new(destination, (self.config.width, self.config.height));
        let root = backend.into_drawing_area();
        root.fill(&WHITE).map_err(draw_err("fill canvas"))?;

        let root = root
            .titled(plan.title(), ("sans-serif", 28).into_font())
            .map_err(draw_err("draw title"))?;

        let (_, area_height) = root.dim_in_pixel();
        let (upper, lower) = root.split_vertically(area_height * 3 / 4);

        // Candles sit on integer positions, so gaps in the data don't show
        let x_range = -0.5f64..(count as f64 - 0.5);
        let (y_min, y_max) = plan.price_range();

        let plot_width = upper.dim_in_pixel().0.saturating_sub(Y_LABEL_AREA + 20);
        let body_width = ((plot_width as f64 / count as f64) * 0.7).max(1.0) as u32;
        debug!("Candle body width: {}px over {} candles", body_width, count);

        let mut price_chart = ChartBuilder::on(&upper)
            .margin(10)
            .y_label_area_size(Y_LABEL_AREA)
            .build_cartesian_2d(x_range.clone(), y_min..y_max)
            .map_err(draw_err("build price panel"))?;

        price_chart
            .configure_mesh()
            .y_desc("Price (USD)")
            .disable_x_mesh()
            .draw()
            .map_err(draw_err("draw price mesh"))?;

        price_chart
            .draw_series(candles.iter().enumerate().map(|(i, c)| {
                CandleStick::new(
                    i as f64,
                    c.open,
                    c.high,
                    c.low,
                    c.close,
                    UP_COLOR.filled(),
                    DOWN_COLOR.filled(),
                    body_width,
                )
            }))
            .map_err(draw_err("draw candles"))?;

        if let Some(points) = plan.overlay() {
            price_chart
                .draw_series(points.iter().map(|&(i, price)| {
                    // Downward triangle centred on the marker price
                    EmptyElement::at((i as f64, price))
                        + Polygon::new(vec![(-7, -6), (7, -6), (0, 6)], RED.filled())
                }))
                .map_err(draw_err("draw spike markers"))?;
        }

        let max_volume = plan.series().max_volume().max(1e-8) * 1.1;
        let label_for = |x: &f64| -> String {
            let index = x.round();
            if index < 0.0 || index as usize >= count {
                return String::new();
            }
            candles[index as usize].timestamp.format("%m-%d %H:%M").to_string()
        };

        let mut volume_chart = ChartBuilder::on(&lower)
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(Y_LABEL_AREA)
            .build_cartesian_2d(x_range, 0f64..max_volume)
            .map_err(draw_err("build volume panel"))?;

        volume_chart
            .configure_mesh()
            .y_desc("Volume")
            .x_labels(count.min(8))
            .x_label_formatter(&label_for)
            .disable_x_mesh()
            .draw()
            .map_err(draw_err("draw volume mesh"))?;

        volume_chart
            .draw_series(candles.iter().enumerate().map(|(i, c)| {
                let color = if c.is_up() { UP_COLOR } else { DOWN_COLOR };
                Rectangle::new([(i as f64 - 0.35, 0.0), (i as f64 + 0.35, c.volume)], color.filled())
            }))
            .map_err(draw_err("draw volume bars"))?;

        root.present().map_err(draw_err("write chart"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SpikeEvent;
    use crate::services::price_service::{build_series, tests::price_row};
    use crate::services::spike_service::align;
    use chrono::TimeZone;

    fn series_of(count: u32) -> CandleSeries {
        let rows = (0..count)
            .rev()
            .map(|m| price_row(&format!("2024-01-01 00:{:02}:00", m), &format!("{}", 100 + m)))
            .collect();
        build_series("BTCUSDT", rows).unwrap()
    }

    fn test_config() -> ChartConfig {
        ChartConfig {
            width: 640,
            height: 480,
            output_dir: PathBuf::from("."),
        }
    }

    #[test]
    fn test_no_markers_gives_two_panel_plan() {
        let series = series_of(3);
        let markers = align(&series, &[]);

        let plan = RenderPlan::build(&series, &markers, "BTCUSDT").unwrap();
        assert!(matches!(plan, RenderPlan::Base { .. }));
        assert_eq!(plan.panel_count(), 2);
        assert!(plan.overlay().is_none());
    }

    #[test]
    fn test_markers_add_overlay() {
        let series = series_of(3);
        let event = SpikeEvent {
            timestamp: chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 1, 0).unwrap(),
            price_before: 110.0,
            price_after: 90.0,
            drop_percent: -18.18,
        };
        let markers = align(&series, &[event]);

        let plan = RenderPlan::build(&series, &markers, "BTCUSDT").unwrap();
        assert_eq!(plan.panel_count(), 2);
        assert_eq!(plan.overlay(), Some(&[(1usize, 90.0)][..]));

        // Marker below every candle widens the axis
        let (y_min, _) = plan.price_range();
        assert!(y_min < 90.0);
    }

    #[test]
    fn test_title_reflects_rendered_count() {
        let series = series_of(3);
        let markers = align(&series, &[]);

        let plan = RenderPlan::build(&series, &markers, "BTCUSDT").unwrap();
        assert_eq!(plan.title(), "BTCUSDT K-Line Chart (Latest 3 candles)");
    }

    #[test]
    fn test_empty_series_rejected() {
        let series = CandleSeries::new("BTCUSDT", Vec::new());
        let markers = MarkerSeries::empty(std::iter::empty());
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("BTCUSDT_kline.png");

        let result = ChartComposer::new(test_config()).compose(&series, &markers, "BTCUSDT", &destination);
        assert!(matches!(result, Err(ChartError::Render(_))));
        assert!(!destination.exists());
    }

    #[test]
    fn test_mismatched_markers_rejected() {
        let series = series_of(3);
        let other = series_of(2);
        let markers = align(&other, &[]);

        assert!(matches!(
            RenderPlan::build(&series, &markers, "BTCUSDT"),
            Err(ChartError::Render(_))
        ));
    }

    #[test]
    fn test_unwritable_destination_is_render_error() {
        let series = series_of(3);
        let markers = align(&series, &[]);
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("missing").join("BTCUSDT_kline.png");

        let result = ChartComposer::new(test_config()).compose(&series, &markers, "BTCUSDT", &destination);
        assert!(matches!(result, Err(ChartError::Render(_))));
    }

    #[test]
    #[ignore = "needs a system sans-serif font"]
    fn test_renders_png_with_overlay() {
        let series = series_of(5);
        let event = SpikeEvent {
            timestamp: chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 2, 0).unwrap(),
            price_before: 110.0,
            price_after: 99.0,
            drop_percent: -10.0,
        };
        let markers = align(&series, &[event]);
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("BTCUSDT_kline.png");

        let written = ChartComposer::new(test_config())
            .compose(&series, &markers, "BTCUSDT", &destination)
            .unwrap();
        assert_eq!(written, destination);
        assert!(std::fs::metadata(&written).unwrap().len() > 0);
    }
}
