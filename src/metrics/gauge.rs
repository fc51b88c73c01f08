use alloc::AllocationPolicy;
use atomic::AtomicI64;
use format::SampleWriter;
use metric::{MetricKind, MetricType};
use series::Instance;
use Result;

/// `Gauge` is a metric that represents a single numerical value that can arbitrarily go up and down.
///
/// The value reported for a series is the sum of its instances,
/// so an instance usually tracks its own contribution (e.g., the connections it holds).
#[derive(Debug)]
pub enum Gauge {}
impl MetricType for Gauge {
    type Shape = ();
    type Cell = GaugeCell;
    type Snapshot = i64;

    fn kind() -> MetricKind {
        MetricKind::Gauge
    }

    fn new_cell(_shape: &(), _policy: AllocationPolicy) -> Result<GaugeCell> {
        Ok(GaugeCell {
            value: AtomicI64::new(0),
        })
    }

    fn new_snapshot(_shape: &(), _policy: AllocationPolicy) -> Result<i64> {
        Ok(0)
    }

    fn fold(cell: &GaugeCell, snapshot: &mut i64) {
        *snapshot = snapshot.wrapping_add(cell.value.get());
    }

    fn write_samples(writer: &mut SampleWriter, _shape: &(), snapshot: &i64) -> Result<()> {
        track!(writer.sample("", None, snapshot))
    }
}

/// Storage of a gauge instance.
#[derive(Debug)]
#[repr(align(64))]
pub struct GaugeCell {
    value: AtomicI64,
}

impl Instance<Gauge> {
    /// Returns the value of this instance.
    #[inline]
    pub fn value(&self) -> i64 {
        self.cell.value.get()
    }

    /// Sets this instance to `value`.
    #[inline]
    pub fn set(&mut self, value: i64) {
        self.cell.value.set(value);
    }

    /// Adds `count` to this instance.
    ///
    /// `count` may be negative.
    #[inline]
    pub fn add(&mut self, count: i64) {
        self.cell.value.update(|v| v.wrapping_add(count));
    }

    /// Increments this instance.
    #[inline]
    pub fn increment(&mut self) {
        self.add(1);
    }

    /// Decrements this instance.
    #[inline]
    pub fn decrement(&mut self) {
        self.add(-1);
    }
}

#[cfg(test)]
mod test {
    use metrics::GaugeSeries;
    use registry::Registry;

    fn new_series() -> (Registry, GaugeSeries) {
        let registry = track_try_unwrap!(Registry::new(&[]));
        let gauge = track_try_unwrap!(registry.create_gauge("foo", "Foo"));
        let series = track_try_unwrap!(gauge.create_series(&[("pool", "a")]));
        (registry, series)
    }

    #[test]
    fn it_works() {
        let (registry, series) = new_series();
        let mut instance = track_try_unwrap!(series.create_instance());

        instance.set(10);
        assert_eq!(instance.value(), 10);

        instance.increment();
        instance.decrement();
        instance.decrement();
        assert_eq!(instance.value(), 9);

        instance.add(-12);
        assert_eq!(instance.value(), -3);
        assert_eq!(track_try_unwrap!(series.snapshot()), -3);

        assert_eq!(
            track_try_unwrap!(registry.to_text()),
            "# HELP foo Foo\n# TYPE foo gauge\nfoo{pool=\"a\"} -3\n\n"
        );
    }

    #[test]
    fn instances_are_summed() {
        let (_registry, series) = new_series();
        let mut a = track_try_unwrap!(series.create_instance());
        let mut b = track_try_unwrap!(series.create_instance());
        a.set(4);
        b.set(-10);
        assert_eq!(track_try_unwrap!(series.snapshot()), -6);

        track_try_unwrap!(a.retire());
        b.set(1);
        assert_eq!(track_try_unwrap!(series.snapshot()), 5);
    }

    #[test]
    fn overflow_wraps() {
        let (_registry, series) = new_series();
        let mut instance = track_try_unwrap!(series.create_instance());
        instance.set(i64::max_value());
        instance.increment();
        assert_eq!(instance.value(), i64::min_value());
    }
}
