use std::io::Write;
use std::sync::{Arc, Mutex};

use alloc::AllocationPolicy;
use atomic::lock;
use bucket::BucketScheme;
use family::{self, Family, FamilyEntry, FamilyInner};
use format::{BucketMode, ExpositionWriter};
use label::{self, Label};
use metric::{MetricKind, MetricType};
use metrics::{Counter, CounterFamily, Gauge, GaugeFamily, Histogram, HistogramFamily};
use slot::SlotList;
use trackable::error::ErrorKindExt;

use {Error, ErrorKind, Result};

lazy_static! {
    static ref DEFAULT_REGISTRY: Registry = RegistryBuilder::new().build(Vec::new());
}

/// Returns the default registry.
///
/// The default registry has no global labels and default settings.
/// Destroying it makes it unusable for the rest of the process.
pub fn default_registry() -> Registry {
    DEFAULT_REGISTRY.clone()
}

/// Registry.
///
/// The root of the metrics tree: it holds the global labels,
/// which are prepended to the labels of every emitted series,
/// and the counter, gauge and histogram families.
///
/// Cloned registries share the same families.
///
/// # Examples
///
/// ```
/// use promagg::Registry;
///
/// let registry = Registry::new(&[("global", "root")]).unwrap();
/// let counter = registry.create_counter("test_counter1", "Test counter1").unwrap();
/// let series = counter.create_series(&[("test", "test1")]).unwrap();
/// let mut instance = series.create_instance().unwrap();
///
/// instance.increment();
/// instance.add(10);
///
/// let text = registry.to_text().unwrap();
/// assert!(text.contains(r#"test_counter1{global="root",test="test1"} 11"#));
/// ```
#[derive(Debug, Clone)]
pub struct Registry(Arc<Inner>);
impl Registry {
    /// Makes a new `Registry` instance with the given global labels and default settings.
    ///
    /// Note that it is recommended to create this via `RegistryBuilder`
    /// when other settings are needed.
    pub fn new(global_labels: &[(&str, &str)]) -> Result<Self> {
        let mut builder = RegistryBuilder::new();
        for &(name, value) in global_labels {
            builder.label(name, value);
        }
        track!(builder.finish())
    }

    /// Returns the global labels of this registry.
    pub fn global_labels(&self) -> &[Label] {
        &self.0.global_labels
    }

    /// Returns the number of families of the given kind.
    pub fn family_count(&self, kind: MetricKind) -> usize {
        lock(&self.0.state).families(kind).len()
    }

    /// Makes a new counter family.
    ///
    /// # Errors
    ///
    /// This method will return `Err(_)` if one of the following conditions is satisfied:
    ///
    /// - `name` is malformed or `help` contains a double-quote (`ErrorKind::InvalidInput`)
    /// - This registry has been destroyed (`ErrorKind::Destroyed`)
    ///
    /// Nothing is changed on failure.
    pub fn create_counter(&self, name: &str, help: &str) -> Result<CounterFamily> {
        track!(self.create_family::<Counter>(name, help, ()))
    }

    /// Makes a new gauge family.
    ///
    /// # Errors
    ///
    /// The same as `create_counter`.
    pub fn create_gauge(&self, name: &str, help: &str) -> Result<GaugeFamily> {
        track!(self.create_family::<Gauge>(name, help, ()))
    }

    /// Makes a new histogram family whose samples are bucketed by `scheme`.
    ///
    /// # Errors
    ///
    /// In addition to the conditions of `create_counter`,
    /// this method returns `ErrorKind::InvalidInput` error if `scheme` is malformed:
    ///
    /// - It has no buckets
    /// - It is exponential and has more than 64 buckets
    /// - It is linear and its increment is zero, or its thresholds overflow `u64`
    pub fn create_histogram(
        &self,
        name: &str,
        help: &str,
        scheme: BucketScheme,
    ) -> Result<HistogramFamily> {
        if let Err(e) = scheme.validate() {
            debug!(name = %name, reason = %e, "family rejected");
            return Err(track!(e, "scheme={:?}", scheme));
        }
        track!(self.create_family::<Histogram>(name, help, scheme))
    }

    /// Destroys `family` and all of its series.
    ///
    /// # Errors
    ///
    /// If `family` does not belong to this registry (or has already been destroyed),
    /// this method returns `ErrorKind::InvalidInput` error.
    /// If this registry has been destroyed, this method returns `ErrorKind::Destroyed` error.
    pub fn destroy_family<T: MetricType>(&self, family: Family<T>) -> Result<()> {
        let entry = {
            let mut state = lock(&self.0.state);
            track_assert!(!state.destroyed, ErrorKind::Destroyed);
            let families = state.families_mut(T::kind());
            let owned = families
                .get(family.key)
                .map_or(false, |e| family::is_entry_of(e, &family.inner));
            track_assert!(
                owned,
                ErrorKind::InvalidInput,
                "Foreign or stale family: {:?}",
                family.name()
            );
            families.remove(family.key)
        };
        if let Some(entry) = entry {
            entry.destroy();
            debug!(name = %entry.name(), kind = %entry.kind(), "family destroyed");
        }
        Ok(())
    }

    /// Writes the current state of all families to `writer` in the text exposition format.
    ///
    /// Counters come first, then gauges, then histograms; within each kind, families
    /// and series are written in creation order. Every family block ends with a blank line.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// If this registry has been destroyed, this method returns `ErrorKind::Destroyed` error.
    /// If `writer` fails (e.g., a fixed-size buffer is full), this method returns
    /// `ErrorKind::Other` error; the bytes written so far are left in `writer`.
    pub fn scrape<W: Write>(&self, writer: &mut W) -> Result<usize> {
        let state = lock(&self.0.state);
        track_assert!(!state.destroyed, ErrorKind::Destroyed);
        let mut out = ExpositionWriter::new(writer, self.0.bucket_mode);
        for kind in &KINDS {
            for entry in state.families(*kind).iter() {
                track!(entry.write(&mut out, &self.0.global_labels))?;
            }
        }
        Ok(out.written())
    }

    /// Scrapes this registry into a new string.
    pub fn to_text(&self) -> Result<String> {
        let mut buf = Vec::new();
        track!(self.scrape(&mut buf))?;
        track!(String::from_utf8(buf).map_err(|e| Error::from(ErrorKind::Other.cause(e))))
    }

    /// Destroys all families of this registry.
    ///
    /// After this call, every operation on this registry (and its clones) fails
    /// with `ErrorKind::Destroyed`.
    pub fn destroy(self) {
        let mut state = lock(&self.0.state);
        state.destroyed = true;
        for kind in &KINDS {
            let families = state.families_mut(*kind);
            while let Some(entry) = families.pop_front() {
                entry.destroy();
            }
        }
        debug!("registry destroyed");
    }

    fn create_family<T: MetricType>(
        &self,
        name: &str,
        help: &str,
        shape: T::Shape,
    ) -> Result<Family<T>> {
        let inner = match FamilyInner::<T>::new(name, help, shape, self.0.policy) {
            Ok(inner) => Arc::new(inner),
            Err(e) => {
                debug!(name = %name, kind = %T::kind(), reason = %e, "family rejected");
                return Err(track!(e));
            }
        };
        let entry: Arc<dyn FamilyEntry> = inner.clone();
        let key = {
            let mut state = lock(&self.0.state);
            track_assert!(!state.destroyed, ErrorKind::Destroyed);
            state.families_mut(T::kind()).insert(entry)
        };
        debug!(name = %name, kind = %T::kind(), "family created");
        Ok(Family { inner, key })
    }
}

/// `Registry` builder.
///
/// # Examples
///
/// ```
/// use promagg::{AllocationPolicy, BucketMode, RegistryBuilder};
///
/// let registry = RegistryBuilder::new()
///     .label("service", "api")
///     .bucket_mode(BucketMode::PerBucket)
///     .allocation_policy(AllocationPolicy::Fail)
///     .finish()
///     .unwrap();
/// assert_eq!(registry.global_labels()[0].to_string(), r#"service="api""#);
/// ```
#[derive(Debug, Clone)]
pub struct RegistryBuilder {
    labels: Vec<(String, String)>,
    bucket_mode: BucketMode,
    policy: AllocationPolicy,
}
impl RegistryBuilder {
    /// Makes a builder with no global labels and default settings.
    pub fn new() -> Self {
        RegistryBuilder {
            labels: Vec::new(),
            bucket_mode: BucketMode::default(),
            policy: AllocationPolicy::default(),
        }
    }

    /// Adds a global label.
    ///
    /// Global labels are emitted in the order they were added.
    /// Note that `name` and `value` will be validated in the invocation of the `finish` method.
    pub fn label(&mut self, name: &str, value: &str) -> &mut Self {
        self.labels.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Sets how histogram buckets are reported (the default is `BucketMode::Cumulative`).
    pub fn bucket_mode(&mut self, mode: BucketMode) -> &mut Self {
        self.bucket_mode = mode;
        self
    }

    /// Sets the allocation policy (the default is `AllocationPolicy::Abort`).
    pub fn allocation_policy(&mut self, policy: AllocationPolicy) -> &mut Self {
        self.policy = policy;
        self
    }

    /// Builds a registry.
    ///
    /// # Errors
    ///
    /// This method will return `ErrorKind::InvalidInput` error
    /// if a global label is malformed, a label name appears twice or is `le`
    /// (which is reserved for histogram buckets).
    pub fn finish(&self) -> Result<Registry> {
        let pairs = self
            .labels
            .iter()
            .map(|&(ref n, ref v)| (n.as_str(), v.as_str()))
            .collect::<Vec<_>>();
        let labels = track!(label::labels_from_pairs(&pairs, Some("le"), self.policy))?;
        Ok(self.build(labels))
    }

    fn build(&self, global_labels: Vec<Label>) -> Registry {
        Registry(Arc::new(Inner {
            global_labels,
            bucket_mode: self.bucket_mode,
            policy: self.policy,
            state: Mutex::new(State {
                destroyed: false,
                counters: SlotList::new(),
                gauges: SlotList::new(),
                histograms: SlotList::new(),
            }),
        }))
    }
}
impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

const KINDS: [MetricKind; 3] = [MetricKind::Counter, MetricKind::Gauge, MetricKind::Histogram];

#[derive(Debug)]
struct Inner {
    global_labels: Vec<Label>,
    bucket_mode: BucketMode,
    policy: AllocationPolicy,
    state: Mutex<State>,
}

#[derive(Debug)]
struct State {
    destroyed: bool,
    counters: SlotList<Arc<dyn FamilyEntry>>,
    gauges: SlotList<Arc<dyn FamilyEntry>>,
    histograms: SlotList<Arc<dyn FamilyEntry>>,
}
impl State {
    fn families(&self, kind: MetricKind) -> &SlotList<Arc<dyn FamilyEntry>> {
        match kind {
            MetricKind::Counter => &self.counters,
            MetricKind::Gauge => &self.gauges,
            MetricKind::Histogram => &self.histograms,
        }
    }

    fn families_mut(&mut self, kind: MetricKind) -> &mut SlotList<Arc<dyn FamilyEntry>> {
        match kind {
            MetricKind::Counter => &mut self.counters,
            MetricKind::Gauge => &mut self.gauges,
            MetricKind::Histogram => &mut self.histograms,
        }
    }
}
