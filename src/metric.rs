//! Metric.
use std::fmt;

use alloc::AllocationPolicy;
use format::SampleWriter;
use Result;

/// Metric kind.
///
/// # References
///
/// - [Metric types](https://prometheus.io/docs/concepts/metric_types/)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}
impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            MetricKind::Counter => write!(f, "counter"),
            MetricKind::Gauge => write!(f, "gauge"),
            MetricKind::Histogram => write!(f, "histogram"),
        }
    }
}

/// The behavior a metric type plugs into families, series and instances.
///
/// This is implemented by `Counter`, `Gauge` and `Histogram`;
/// it is not meant to be implemented outside this crate.
pub trait MetricType: fmt::Debug + Send + Sync + 'static {
    /// Fixed layout shared by every series and instance of a family.
    type Shape: fmt::Debug + Clone + Send + Sync;

    /// Storage of an instance, written by its owner without locking.
    type Cell: fmt::Debug + Send + Sync;

    /// Aggregated value of a series.
    type Snapshot: fmt::Debug + Clone + Send + Sync;

    /// Returns the kind of this metric type.
    fn kind() -> MetricKind;

    /// Returns the name of a label that series of this type may not use.
    fn reserved_label() -> Option<&'static str> {
        None
    }

    /// Makes a zero-valued instance cell.
    fn new_cell(shape: &Self::Shape, policy: AllocationPolicy) -> Result<Self::Cell>;

    /// Makes a zero-valued snapshot.
    fn new_snapshot(shape: &Self::Shape, policy: AllocationPolicy) -> Result<Self::Snapshot>;

    /// Adds the current values of `cell` to `snapshot`.
    fn fold(cell: &Self::Cell, snapshot: &mut Self::Snapshot);

    /// Writes the sample lines of a series.
    fn write_samples(
        writer: &mut SampleWriter,
        shape: &Self::Shape,
        snapshot: &Self::Snapshot,
    ) -> Result<()>;
}
