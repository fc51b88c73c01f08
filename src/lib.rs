//! In-process aggregation engine for exposing [prometheus][prometheus] metrics.
//!
//! Metrics are organized as a tree:
//! a `Registry` holds counter, gauge and histogram `Family`s,
//! a family holds `Series` (one per label-value combination),
//! and a series holds `Instance`s.
//!
//! Each instance is owned by a single writer (e.g., a worker thread) and is updated without locking.
//! The value reported for a series is the sum of its live instances plus
//! everything its destroyed instances had accumulated.
//!
//! [prometheus]: https://prometheus.io/
//!
//! # Examples
//!
//! ```
//! use promagg::Registry;
//! use promagg::bucket::BucketScheme;
//!
//! let registry = Registry::new(&[("service", "api")]).unwrap();
//! let latency = registry
//!     .create_histogram("request_latency_us", "Request latency", BucketScheme::exponential(16))
//!     .unwrap();
//! let series = latency.create_series(&[("method", "GET")]).unwrap();
//!
//! let mut worker = series.create_instance().unwrap();
//! worker.sample(120);
//! worker.retire().unwrap();
//!
//! let text = registry.to_text().unwrap();
//! assert!(text.contains(r#"request_latency_us_count{service="api",method="GET"} 1"#));
//! ```
//!
//! # References
//!
//! - [Data model](https://prometheus.io/docs/concepts/data_model/)
//! - [Metric types](https://prometheus.io/docs/concepts/metric_types/)
//! - [Exposition formats](https://prometheus.io/docs/instrumenting/exposition_formats/)
#![warn(missing_docs)]
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate trackable;
#[macro_use]
extern crate tracing;

pub use alloc::AllocationPolicy;
pub use error::{Error, ErrorKind};
pub use family::Family;
pub use format::BucketMode;
pub use metric::{MetricKind, MetricType};
pub use registry::{default_registry, Registry, RegistryBuilder};
pub use series::{Instance, Series};

pub mod bucket;
pub mod format;
pub mod label;
pub mod metrics;

mod alloc;
mod atomic;
mod error;
mod family;
mod metric;
mod registry;
mod series;
mod slot;

/// This crate specific `Result` type.
pub type Result<T> = std::result::Result<T, Error>;
