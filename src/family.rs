use std::fmt;
use std::sync::{Arc, Mutex};

use alloc::AllocationPolicy;
use atomic::lock;
use format::ExpositionWriter;
use label::{self, Label};
use metric::{MetricKind, MetricType};
use series::{Series, SeriesInner};
use slot::{SlotKey, SlotList};
use {ErrorKind, Result};

/// A named and typed metric, owning a set of series.
///
/// Cloned families share the same state.
#[derive(Debug)]
pub struct Family<T: MetricType> {
    pub(crate) inner: Arc<FamilyInner<T>>,
    pub(crate) key: SlotKey,
}
impl<T: MetricType> Family<T> {
    /// Returns the name of this family.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the help of this family.
    pub fn help(&self) -> &str {
        &self.inner.help
    }

    /// Returns the kind of this family.
    pub fn kind(&self) -> MetricKind {
        T::kind()
    }

    /// Returns the number of series in this family.
    pub fn series_count(&self) -> usize {
        lock(&self.inner.state).series.len()
    }

    /// Makes a new series identified by `labels`.
    ///
    /// # Errors
    ///
    /// This method will return `Err(_)` if one of the following conditions is satisfied:
    ///
    /// - A label name or value is malformed (`ErrorKind::InvalidInput`)
    /// - A label name appears twice, or is reserved by the metric type (`ErrorKind::InvalidInput`)
    /// - This family has been destroyed (`ErrorKind::Destroyed`)
    ///
    /// Nothing is changed on failure.
    pub fn create_series(&self, labels: &[(&str, &str)]) -> Result<Series<T>> {
        let policy = self.inner.policy;
        let labels = match label::labels_from_pairs(labels, T::reserved_label(), policy) {
            Ok(labels) => labels,
            Err(e) => {
                debug!(name = %self.inner.name, reason = %e, "series rejected");
                return Err(track!(e));
            }
        };
        let series = Arc::new(track!(SeriesInner::new(
            labels,
            self.inner.shape.clone(),
            policy
        ))?);
        let key = {
            let mut state = lock(&self.inner.state);
            track_assert!(!state.destroyed, ErrorKind::Destroyed);
            state.series.insert(Arc::clone(&series))
        };
        debug!(
            name = %self.inner.name,
            labels = %LabelList(series.labels()),
            "series created"
        );
        Ok(Series { inner: series, key })
    }

    /// Destroys `series`, retiring all of its live instances.
    ///
    /// # Errors
    ///
    /// If `series` does not belong to this family (or has already been destroyed),
    /// this method returns `ErrorKind::InvalidInput` error.
    /// If this family has been destroyed, this method returns `ErrorKind::Destroyed` error.
    pub fn destroy_series(&self, series: Series<T>) -> Result<()> {
        {
            let mut state = lock(&self.inner.state);
            track_assert!(!state.destroyed, ErrorKind::Destroyed);
            let owned = state
                .series
                .get(series.key)
                .map_or(false, |s| Arc::ptr_eq(s, &series.inner));
            track_assert!(owned, ErrorKind::InvalidInput, "Foreign or stale series");
            state.series.remove(series.key);
        }
        series.inner.destroy();
        debug!(
            name = %self.inner.name,
            labels = %LabelList(series.inner.labels()),
            "series destroyed"
        );
        Ok(())
    }

    pub(crate) fn shape(&self) -> &T::Shape {
        &self.inner.shape
    }
}
impl<T: MetricType> Clone for Family<T> {
    fn clone(&self) -> Self {
        Family {
            inner: Arc::clone(&self.inner),
            key: self.key,
        }
    }
}

#[derive(Debug)]
pub(crate) struct FamilyInner<T: MetricType> {
    name: String,
    help: String,
    shape: T::Shape,
    policy: AllocationPolicy,
    state: Mutex<FamilyState<T>>,
}
impl<T: MetricType> FamilyInner<T> {
    pub fn new(name: &str, help: &str, shape: T::Shape, policy: AllocationPolicy) -> Result<Self> {
        track!(label::validate_name(name), "name={:?}", name)?;
        track!(label::validate_value(help), "help={:?}", help)?;
        Ok(FamilyInner {
            name: track!(policy.copy_str(name))?,
            help: track!(policy.copy_str(help))?,
            shape,
            policy,
            state: Mutex::new(FamilyState {
                destroyed: false,
                series: SlotList::new(),
            }),
        })
    }
}

#[derive(Debug)]
struct FamilyState<T: MetricType> {
    destroyed: bool,
    series: SlotList<Arc<SeriesInner<T>>>,
}

/// Type-erased view of a family, as held by a registry.
pub(crate) trait FamilyEntry: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> MetricKind;

    fn write(&self, out: &mut ExpositionWriter, global_labels: &[Label]) -> Result<()>;

    /// Destroys every series and rejects any further use of this family.
    fn destroy(&self);
}
impl<T: MetricType> FamilyEntry for FamilyInner<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> MetricKind {
        T::kind()
    }

    fn write(&self, out: &mut ExpositionWriter, global_labels: &[Label]) -> Result<()> {
        let state = lock(&self.state);
        track!(out.write_header(&self.name, &self.help, T::kind()))?;
        for series in state.series.iter() {
            track!(series.write(out, &self.name, global_labels))?;
        }
        track!(out.end_family())
    }

    fn destroy(&self) {
        let mut state = lock(&self.state);
        state.destroyed = true;
        while let Some(series) = state.series.pop_front() {
            series.destroy();
        }
    }
}

/// Returns `true` if `entry` is the type-erased form of `inner`.
pub(crate) fn is_entry_of<T: MetricType>(
    entry: &Arc<dyn FamilyEntry>,
    inner: &Arc<FamilyInner<T>>,
) -> bool {
    Arc::as_ptr(entry) as *const () == Arc::as_ptr(inner) as *const ()
}

pub(crate) struct LabelList<'a>(pub &'a [Label]);
impl<'a> fmt::Display for LabelList<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;
        for (i, label) in self.0.iter().enumerate() {
            if i != 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", label)?;
        }
        write!(f, "}}")
    }
}
