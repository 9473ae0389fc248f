//! Benchmark execution and scoring core for llmbench
//!
//! A [`BenchmarkEngine`] times dense matrix multiplications at several
//! precisions plus a memory-copy test on one device, and
//! [`overall_score`] folds the resulting [`ResultsRecord`] into a single
//! number of Benchmark Points.
//!
//! At most one engine should be executing against a given physical device at
//! a time: two runs competing for the same compute and memory produce
//! meaningless numbers. Engines on independent devices do not interact.

pub mod backend;
pub mod clock;
pub mod engine;
pub mod observer;
pub mod precision;
pub mod results;
pub mod score;
pub mod workload;

pub use backend::{CandleBackend, ComputeBackend};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::BenchmarkEngine;
pub use observer::{BenchmarkObserver, NoopObserver};
pub use precision::{quantize_fp8, FloatFormat, IntRange, MatmulPath, Precision};
pub use results::{Measurement, Metric, ResultsRecord, SkipNotice};
pub use score::{overall_score, BaselineTable};
pub use workload::{derive_profile, WorkloadProfile};

pub use llmbench_common::{BenchError, Device, DeviceKind, Result};
