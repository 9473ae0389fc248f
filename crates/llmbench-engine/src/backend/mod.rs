//! Device layer used by the engine.
//!
//! The engine only needs a handful of operations from a tensor runtime:
//! allocate random data, multiply, copy and wait for completion. Real runs use
//! [`CandleBackend`]; tests use [`mock::MockBackend`].

pub mod candle;
pub mod int_gemm;
pub mod mock;

pub use self::candle::{CandleBackend, CandleTensor};
pub use self::int_gemm::IntMatrix;

use crate::precision::{FloatFormat, IntRange};
use llmbench_common::{Device, Result};

/// Operations a device runtime must provide to be benchmarked.
pub trait ComputeBackend {
    /// Handle to a matrix or buffer living on the device.
    type Tensor;

    fn device(&self) -> Device;

    /// `size×size` matrix of standard-normal values in `format`.
    fn random_matrix(&self, size: usize, format: FloatFormat) -> Result<Self::Tensor>;

    /// Element-wise [`quantize_fp8`](crate::precision::quantize_fp8) of an F32 matrix.
    fn quantize_fp8(&self, tensor: &Self::Tensor) -> Result<Self::Tensor>;

    /// `size×size` matrix of integers drawn uniformly from `range`, widened to `i32`.
    fn random_int_matrix(&self, size: usize, range: IntRange) -> Result<Self::Tensor>;

    fn matmul(&self, a: &Self::Tensor, b: &Self::Tensor) -> Result<Self::Tensor>;

    /// One-dimensional F32 buffer of `len` standard-normal values.
    fn random_buffer(&self, len: usize) -> Result<Self::Tensor>;

    /// Copy `tensor` into freshly allocated device memory.
    fn copy(&self, tensor: &Self::Tensor) -> Result<Self::Tensor>;

    /// Block until the work that produced `pending` has completed.
    fn synchronize(&self, pending: &Self::Tensor) -> Result<()>;
}
