use alloc::AllocationPolicy;
use atomic::AtomicU64;
use bucket::{BucketScheme, CumulativeBuckets};
use family::Family;
use format::{BucketMode, SampleWriter};
use metric::{MetricKind, MetricType};
use series::Instance;
use Result;

/// `Histogram` samples observations (usually things like request durations or response sizes) and
/// counts them in the buckets of a fixed `BucketScheme`.
/// It also provides a sum of all observed values.
///
/// Series of a histogram family may not use the `le` label,
/// which is reserved for the bucket bounds.
#[derive(Debug)]
pub enum Histogram {}
impl MetricType for Histogram {
    type Shape = BucketScheme;
    type Cell = HistogramCell;
    type Snapshot = HistogramSnapshot;

    fn kind() -> MetricKind {
        MetricKind::Histogram
    }

    fn reserved_label() -> Option<&'static str> {
        Some("le")
    }

    fn new_cell(scheme: &BucketScheme, policy: AllocationPolicy) -> Result<HistogramCell> {
        let mut buckets = track!(policy.vec_with_capacity(scheme.count()))?;
        for _ in 0..scheme.count() {
            buckets.push(AtomicU64::new(0));
        }
        Ok(HistogramCell {
            scheme: *scheme,
            buckets: buckets.into_boxed_slice(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        })
    }

    fn new_snapshot(scheme: &BucketScheme, policy: AllocationPolicy) -> Result<HistogramSnapshot> {
        let mut buckets = track!(policy.vec_with_capacity(scheme.count()))?;
        buckets.resize(scheme.count(), 0);
        Ok(HistogramSnapshot {
            buckets,
            sum: 0,
            count: 0,
        })
    }

    fn fold(cell: &HistogramCell, snapshot: &mut HistogramSnapshot) {
        for (total, bucket) in snapshot.buckets.iter_mut().zip(cell.buckets.iter()) {
            *total = total.wrapping_add(bucket.get());
        }
        snapshot.sum = snapshot.sum.wrapping_add(cell.sum.get());
        snapshot.count = snapshot.count.wrapping_add(cell.count.get());
    }

    fn write_samples(
        writer: &mut SampleWriter,
        scheme: &BucketScheme,
        snapshot: &HistogramSnapshot,
    ) -> Result<()> {
        let mode = writer.bucket_mode();
        let buckets = snapshot
            .buckets
            .iter()
            .zip(snapshot.cumulative_buckets())
            .enumerate();
        for (i, (&count, cumulative_count)) in buckets {
            let value = match mode {
                BucketMode::Cumulative => cumulative_count,
                BucketMode::PerBucket => count,
            };
            track!(writer.sample("_bucket", Some(scheme.upper_bound(i)), value))?;
        }
        track!(writer.sample("_sum", None, snapshot.sum))?;
        track!(writer.sample("_count", None, snapshot.count))?;
        Ok(())
    }
}

/// Storage of a histogram instance.
#[derive(Debug)]
#[repr(align(64))]
pub struct HistogramCell {
    scheme: BucketScheme,
    buckets: Box<[AtomicU64]>,
    sum: AtomicU64,
    count: AtomicU64,
}

/// Aggregated value of a histogram series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramSnapshot {
    buckets: Vec<u64>,
    sum: u64,
    count: u64,
}
impl HistogramSnapshot {
    /// Returns the per-bucket counts.
    pub fn buckets(&self) -> &[u64] {
        &self.buckets
    }

    /// Returns the cumulative bucket counts.
    pub fn cumulative_buckets(&self) -> CumulativeBuckets {
        CumulativeBuckets::new(&self.buckets)
    }

    /// Returns the sum of the sampled values.
    pub fn sum(&self) -> u64 {
        self.sum
    }

    /// Returns the total sample count.
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Instance<Histogram> {
    /// Samples a value.
    #[inline]
    pub fn sample(&mut self, value: u64) {
        let cell = &*self.cell;
        let i = cell.scheme.index(value);
        cell.buckets[i].update(|n| n.wrapping_add(1));
        cell.sum.update(|n| n.wrapping_add(value));
        cell.count.update(|n| n.wrapping_add(1));
    }

    /// Returns the bucket scheme of this instance.
    pub fn scheme(&self) -> &BucketScheme {
        &self.cell.scheme
    }
}

impl Family<Histogram> {
    /// Returns the bucket scheme shared by every series of this family.
    pub fn scheme(&self) -> &BucketScheme {
        self.shape()
    }
}

#[cfg(test)]
mod test {
    use bucket::BucketScheme;
    use format::BucketMode;
    use registry::{Registry, RegistryBuilder};
    use ErrorKind;

    #[test]
    fn it_works() {
        let registry = track_try_unwrap!(Registry::new(&[]));
        let family =
            track_try_unwrap!(registry.create_histogram("foo", "Foo", BucketScheme::exponential(4)));
        assert_eq!(*family.scheme(), BucketScheme::exponential(4));

        let series = track_try_unwrap!(family.create_series(&[]));
        let mut instance = track_try_unwrap!(series.create_instance());
        assert_eq!(*instance.scheme(), BucketScheme::exponential(4));
        for &v in &[0, 1, 3, 5, 100] {
            instance.sample(v);
        }

        let snapshot = track_try_unwrap!(series.snapshot());
        assert_eq!(snapshot.buckets(), &[2, 1, 1, 1]);
        assert_eq!(
            snapshot.cumulative_buckets().collect::<Vec<_>>(),
            [2, 3, 4, 5]
        );
        assert_eq!(snapshot.sum(), 109);
        assert_eq!(snapshot.count(), 5);
        assert_eq!(
            snapshot.buckets().iter().sum::<u64>(),
            snapshot.count(),
            "every sample lands in exactly one bucket"
        );

        assert_eq!(
            track_try_unwrap!(registry.to_text()),
            [
                "# HELP foo Foo",
                "# TYPE foo histogram",
                "foo_bucket{le=\"2\"} 2",
                "foo_bucket{le=\"4\"} 3",
                "foo_bucket{le=\"8\"} 4",
                "foo_bucket{le=\"+Inf\"} 5",
                "foo_sum{} 109",
                "foo_count{} 5",
                "",
                "",
            ].join("\n")
        );
    }

    #[test]
    fn per_bucket_mode_works() {
        let registry = track_try_unwrap!(
            RegistryBuilder::new()
                .label("global", "root")
                .bucket_mode(BucketMode::PerBucket)
                .finish()
        );
        let family = track_try_unwrap!(registry.create_histogram(
            "foo",
            "Foo",
            BucketScheme::linear(10, 10, 3)
        ));
        let series = track_try_unwrap!(family.create_series(&[("test", "test1")]));
        let mut instance = track_try_unwrap!(series.create_instance());
        for &v in &[0, 15, 25, 35, 1000] {
            instance.sample(v);
        }

        assert_eq!(
            track_try_unwrap!(registry.to_text()),
            [
                "# HELP foo Foo",
                "# TYPE foo histogram",
                "foo_bucket{global=\"root\",test=\"test1\",le=\"20\"} 2",
                "foo_bucket{global=\"root\",test=\"test1\",le=\"30\"} 1",
                "foo_bucket{global=\"root\",test=\"test1\",le=\"+Inf\"} 2",
                "foo_sum{global=\"root\",test=\"test1\"} 1075",
                "foo_count{global=\"root\",test=\"test1\"} 5",
                "",
                "",
            ].join("\n")
        );
    }

    #[test]
    fn le_label_is_reserved() {
        let registry = track_try_unwrap!(Registry::new(&[]));
        let family =
            track_try_unwrap!(registry.create_histogram("foo", "Foo", BucketScheme::exponential(4)));
        let e = family.create_series(&[("le", "1")]).err();
        assert_eq!(e.map(|e| *e.kind()), Some(ErrorKind::InvalidInput));
        assert_eq!(family.series_count(), 0);

        let counter = track_try_unwrap!(registry.create_counter("bar", "Bar"));
        assert!(counter.create_series(&[("le", "1")]).is_ok());
    }

    #[test]
    fn invalid_schemes_are_rejected() {
        let registry = track_try_unwrap!(Registry::new(&[]));
        for scheme in &[
            BucketScheme::exponential(0),
            BucketScheme::exponential(65),
            BucketScheme::linear(0, 0, 4),
            BucketScheme::linear(0, 1, 0),
            BucketScheme::linear(u64::max_value(), 1, 2),
        ] {
            let e = registry.create_histogram("foo", "Foo", *scheme).err();
            assert_eq!(e.map(|e| *e.kind()), Some(ErrorKind::InvalidInput));
        }
        assert_eq!(registry.family_count(::MetricKind::Histogram), 0);
    }

    #[test]
    fn retired_buckets_are_conserved() {
        let registry = track_try_unwrap!(Registry::new(&[]));
        let family =
            track_try_unwrap!(registry.create_histogram("foo", "Foo", BucketScheme::exponential(3)));
        let series = track_try_unwrap!(family.create_series(&[]));

        let mut a = track_try_unwrap!(series.create_instance());
        let mut b = track_try_unwrap!(series.create_instance());
        a.sample(1);
        a.sample(2);
        b.sample(7);
        track_try_unwrap!(series.destroy_instance(a));

        let snapshot = track_try_unwrap!(series.snapshot());
        assert_eq!(snapshot.buckets(), &[1, 1, 1]);
        assert_eq!(snapshot.sum(), 10);
        assert_eq!(snapshot.count(), 3);

        b.sample(4);
        track_try_unwrap!(b.retire());
        let snapshot = track_try_unwrap!(series.snapshot());
        assert_eq!(snapshot.buckets(), &[1, 1, 2]);
        assert_eq!(snapshot.sum(), 14);
        assert_eq!(snapshot.count(), 4);
    }
}
