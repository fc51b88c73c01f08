use alloc::AllocationPolicy;
use atomic::AtomicU64;
use format::SampleWriter;
use metric::{MetricKind, MetricType};
use series::Instance;
use Result;

/// `Counter` is a cumulative metric that represents a single numerical value that only ever goes up.
///
/// This type is only used as the parameter of `Family`, `Series` and `Instance`.
#[derive(Debug)]
pub enum Counter {}
impl MetricType for Counter {
    type Shape = ();
    type Cell = CounterCell;
    type Snapshot = u64;

    fn kind() -> MetricKind {
        MetricKind::Counter
    }

    fn new_cell(_shape: &(), _policy: AllocationPolicy) -> Result<CounterCell> {
        Ok(CounterCell {
            value: AtomicU64::new(0),
        })
    }

    fn new_snapshot(_shape: &(), _policy: AllocationPolicy) -> Result<u64> {
        Ok(0)
    }

    fn fold(cell: &CounterCell, snapshot: &mut u64) {
        *snapshot = snapshot.wrapping_add(cell.value.get());
    }

    fn write_samples(writer: &mut SampleWriter, _shape: &(), snapshot: &u64) -> Result<()> {
        track!(writer.sample("", None, snapshot))
    }
}

/// Storage of a counter instance.
#[derive(Debug)]
#[repr(align(64))]
pub struct CounterCell {
    value: AtomicU64,
}

impl Instance<Counter> {
    /// Returns the value of this instance.
    #[inline]
    pub fn value(&self) -> u64 {
        self.cell.value.get()
    }

    /// Increments this instance.
    #[inline]
    pub fn increment(&mut self) {
        self.add(1);
    }

    /// Adds `count` to this instance.
    #[inline]
    pub fn add(&mut self, count: u64) {
        self.cell.value.update(|v| v.wrapping_add(count));
    }
}
