use std::sync::{Arc, Mutex};

use alloc::AllocationPolicy;
use atomic::lock;
use format::{ExpositionWriter, SampleWriter};
use label::Label;
use metric::MetricType;
use slot::{SlotKey, SlotList};
use {ErrorKind, Result};

/// One label-value combination of a metric family.
///
/// The value reported for a series is the sum of its live instances plus
/// everything its destroyed instances had accumulated.
///
/// Cloned series share the same state.
#[derive(Debug)]
pub struct Series<T: MetricType> {
    pub(crate) inner: Arc<SeriesInner<T>>,
    pub(crate) key: SlotKey,
}
impl<T: MetricType> Series<T> {
    /// Returns the labels of this series, excluding the global labels of the registry.
    pub fn labels(&self) -> &[Label] {
        &self.inner.labels
    }

    /// Returns the number of live instances.
    pub fn instance_count(&self) -> usize {
        lock(&self.inner.state).instances.len()
    }

    /// Makes a new zero-valued instance of this series.
    ///
    /// # Errors
    ///
    /// If this series has been destroyed, this method returns `ErrorKind::Destroyed` error.
    pub fn create_instance(&self) -> Result<Instance<T>> {
        let cell = Arc::new(track!(T::new_cell(&self.inner.shape, self.inner.policy))?);
        let key = {
            let mut state = lock(&self.inner.state);
            track_assert!(!state.destroyed, ErrorKind::Destroyed);
            state.instances.insert(Arc::clone(&cell))
        };
        trace!(kind = %T::kind(), "instance created");
        Ok(Instance {
            cell,
            series: Arc::clone(&self.inner),
            key: Some(key),
        })
    }

    /// Destroys `instance`, folding its current value into this series.
    ///
    /// Everything `instance` had accumulated before this call is reflected in every
    /// subsequent aggregate of this series, exactly once.
    ///
    /// # Errors
    ///
    /// If `instance` does not belong to this series, this method returns
    /// `ErrorKind::InvalidInput` error; `instance` is then dropped, which retires it
    /// into its own series.
    /// If this series has been destroyed (and thus `instance` already retired),
    /// this method returns `ErrorKind::Destroyed` error.
    pub fn destroy_instance(&self, mut instance: Instance<T>) -> Result<()> {
        track_assert!(
            Arc::ptr_eq(&self.inner, &instance.series),
            ErrorKind::InvalidInput,
            "Foreign instance"
        );
        track!(instance.release())
    }

    /// Returns the current aggregate of this series.
    ///
    /// # Errors
    ///
    /// If this series has been destroyed, this method returns `ErrorKind::Destroyed` error.
    pub fn snapshot(&self) -> Result<T::Snapshot> {
        let state = lock(&self.inner.state);
        track_assert!(!state.destroyed, ErrorKind::Destroyed);
        Ok(SeriesInner::aggregate(&*state))
    }
}
impl<T: MetricType> Clone for Series<T> {
    fn clone(&self) -> Self {
        Series {
            inner: Arc::clone(&self.inner),
            key: self.key,
        }
    }
}

/// A contributor cell of a series, owned by a single writer.
///
/// Mutation takes `&mut self` and never locks. Scrapes running concurrently
/// may observe a partially applied update (e.g., a histogram bucket incremented
/// before its sum), but never lose one.
///
/// Dropping an instance retires it, as `retire` does, ignoring any error.
#[derive(Debug)]
pub struct Instance<T: MetricType> {
    pub(crate) cell: Arc<T::Cell>,
    series: Arc<SeriesInner<T>>,
    key: Option<SlotKey>,
}
impl<T: MetricType> Instance<T> {
    /// Destroys this instance, folding its current value into its series.
    ///
    /// This is equivalent to `series.destroy_instance(instance)`.
    ///
    /// # Errors
    ///
    /// If the series has been destroyed (and thus this instance already retired),
    /// this method returns `ErrorKind::Destroyed` error.
    pub fn retire(mut self) -> Result<()> {
        track!(self.release())
    }

    fn release(&mut self) -> Result<()> {
        match self.key.take() {
            Some(key) => track!(self.series.retire(key)),
            None => Ok(()),
        }
    }
}
impl<T: MetricType> Drop for Instance<T> {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

#[derive(Debug)]
pub(crate) struct SeriesInner<T: MetricType> {
    labels: Vec<Label>,
    shape: T::Shape,
    policy: AllocationPolicy,
    state: Mutex<SeriesState<T>>,
}
impl<T: MetricType> SeriesInner<T> {
    pub fn new(labels: Vec<Label>, shape: T::Shape, policy: AllocationPolicy) -> Result<Self> {
        let retired = track!(T::new_snapshot(&shape, policy))?;
        Ok(SeriesInner {
            labels,
            shape,
            policy,
            state: Mutex::new(SeriesState {
                destroyed: false,
                instances: SlotList::new(),
                retired,
            }),
        })
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn write(
        &self,
        out: &mut ExpositionWriter,
        name: &str,
        global_labels: &[Label],
    ) -> Result<()> {
        let state = lock(&self.state);
        let snapshot = Self::aggregate(&*state);
        let mut writer = SampleWriter::new(out, name, global_labels, &self.labels);
        track!(T::write_samples(&mut writer, &self.shape, &snapshot))
    }

    /// Retires every live instance and rejects any further use of this series.
    pub fn destroy(&self) {
        let mut guard = lock(&self.state);
        let state = &mut *guard;
        state.destroyed = true;
        while let Some(cell) = state.instances.pop_front() {
            T::fold(&cell, &mut state.retired);
        }
    }

    fn retire(&self, key: SlotKey) -> Result<()> {
        let cell = {
            let mut state = lock(&self.state);
            track_assert!(!state.destroyed, ErrorKind::Destroyed);
            let cell = match state.instances.remove(key) {
                Some(cell) => cell,
                None => track_panic!(ErrorKind::InvalidInput, "Stale instance"),
            };
            T::fold(&cell, &mut state.retired);
            cell
        };
        trace!(kind = %T::kind(), "instance retired");
        drop(cell);
        Ok(())
    }

    fn aggregate(state: &SeriesState<T>) -> T::Snapshot {
        let mut snapshot = state.retired.clone();
        for cell in state.instances.iter() {
            T::fold(cell, &mut snapshot);
        }
        snapshot
    }
}

#[derive(Debug)]
struct SeriesState<T: MetricType> {
    destroyed: bool,
    instances: SlotList<Arc<T::Cell>>,
    retired: T::Snapshot,
}
