//! Metric types.
use family::Family;
use series::{Instance, Series};

pub use self::counter::{Counter, CounterCell};
pub use self::gauge::{Gauge, GaugeCell};
pub use self::histogram::{Histogram, HistogramCell, HistogramSnapshot};

mod counter;
mod gauge;
mod histogram;

/// Family of counters.
pub type CounterFamily = Family<Counter>;

/// Series of a counter family.
pub type CounterSeries = Series<Counter>;

/// Instance of a counter series.
pub type CounterInstance = Instance<Counter>;

/// Family of gauges.
pub type GaugeFamily = Family<Gauge>;

/// Series of a gauge family.
pub type GaugeSeries = Series<Gauge>;

/// Instance of a gauge series.
pub type GaugeInstance = Instance<Gauge>;

/// Family of histograms.
pub type HistogramFamily = Family<Histogram>;

/// Series of a histogram family.
pub type HistogramSeries = Series<Histogram>;

/// Instance of a histogram series.
pub type HistogramInstance = Instance<Histogram>;
