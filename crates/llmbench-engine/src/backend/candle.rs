//! [`ComputeBackend`] on top of `candle-core`.
//!
//! Float paths run on whatever candle device the handle maps to. The widened
//! integer path has no candle kernel, so it runs on [`IntMatrix`] and is only
//! offered on the CPU.

use super::{ComputeBackend, IntMatrix};
use crate::precision::{FloatFormat, IntRange, FP8_SCALE};
use candle_core::{DType, Tensor};
use llmbench_common::{BenchError, Device, DeviceKind, MemoryModel, Result};
use tracing::debug;

/// A value held by [`CandleBackend`].
#[derive(Debug, Clone)]
pub enum CandleTensor {
    Float(Tensor),
    Int(IntMatrix),
}

impl CandleTensor {
    fn float(&self, device: Device, op: &str) -> Result<&Tensor> {
        match self {
            CandleTensor::Float(t) => Ok(t),
            CandleTensor::Int(_) => Err(BenchError::Unsupported {
                device,
                operation: format!("{op} on an integer matrix"),
            }),
        }
    }
}

/// Candle-backed device runtime.
#[derive(Debug, Clone)]
pub struct CandleBackend {
    device: Device,
    inner: candle_core::Device,
}

impl CandleBackend {
    /// Open `device`, failing with [`BenchError::DeviceUnavailable`] if it is
    /// not usable on this host.
    pub fn new(device: Device) -> Result<Self> {
        llmbench_device_probe::ensure_compiled(&device)?;
        let opened = match device.kind() {
            DeviceKind::Cpu => Ok(candle_core::Device::Cpu),
            DeviceKind::Cuda => candle_core::Device::new_cuda(device.ordinal()),
            DeviceKind::Metal => candle_core::Device::new_metal(device.ordinal()),
        };
        let inner = opened.map_err(|e| BenchError::DeviceUnavailable {
            device,
            reason: format!("no usable device found at runtime: {e}"),
        })?;
        debug!("Opened candle device for {device}");
        Ok(Self { device, inner })
    }

    pub fn candle_device(&self) -> &candle_core::Device {
        &self.inner
    }

    fn cpu_only(&self, operation: &str) -> Result<()> {
        if self.device.is_cpu() {
            Ok(())
        } else {
            Err(BenchError::Unsupported { device: self.device, operation: operation.into() })
        }
    }
}

impl ComputeBackend for CandleBackend {
    type Tensor = CandleTensor;

    fn device(&self) -> Device {
        self.device
    }

    fn random_matrix(&self, size: usize, format: FloatFormat) -> Result<CandleTensor> {
        let t = Tensor::randn(0f32, 1f32, (size, size), &self.inner)?;
        let t = match format {
            FloatFormat::F32 => t,
            FloatFormat::F16 => t.to_dtype(DType::F16)?,
        };
        Ok(CandleTensor::Float(t))
    }

    fn quantize_fp8(&self, tensor: &CandleTensor) -> Result<CandleTensor> {
        let scale = f64::from(FP8_SCALE);
        let t = tensor.float(self.device, "fp8 quantization")?;
        let q = round_ties_even(&t.affine(scale, 0.0)?)?
            .clamp(-128f32, 127f32)?
            .affine(1.0 / scale, 0.0)?;
        Ok(CandleTensor::Float(q))
    }

    fn random_int_matrix(&self, size: usize, range: IntRange) -> Result<CandleTensor> {
        self.cpu_only("widened i32 matmul")?;
        Ok(CandleTensor::Int(IntMatrix::random(size, range, &mut rand::thread_rng())?))
    }

    fn matmul(&self, a: &CandleTensor, b: &CandleTensor) -> Result<CandleTensor> {
        match (a, b) {
            (CandleTensor::Float(a), CandleTensor::Float(b)) => {
                Ok(CandleTensor::Float(a.matmul(b)?))
            }
            (CandleTensor::Int(a), CandleTensor::Int(b)) => {
                self.cpu_only("widened i32 matmul")?;
                Ok(CandleTensor::Int(a.matmul(b)?))
            }
            _ => Err(BenchError::Unsupported {
                device: self.device,
                operation: "matmul of mixed float and integer operands".into(),
            }),
        }
    }

    fn random_buffer(&self, len: usize) -> Result<CandleTensor> {
        Ok(CandleTensor::Float(Tensor::randn(0f32, 1f32, len, &self.inner)?))
    }

    fn copy(&self, tensor: &CandleTensor) -> Result<CandleTensor> {
        match tensor {
            CandleTensor::Float(t) => Ok(CandleTensor::Float(t.copy()?)),
            CandleTensor::Int(m) => Ok(CandleTensor::Int(m.clone())),
        }
    }

    fn synchronize(&self, pending: &CandleTensor) -> Result<()> {
        let CandleTensor::Float(t) = pending else {
            // integer matrices live in host memory
            return Ok(());
        };
        match self.device.kind().memory_model() {
            MemoryModel::Host => Ok(()),
            MemoryModel::Discrete => Ok(self.inner.synchronize()?),
            MemoryModel::Unified => {
                // reading the result back forces the command queue to drain
                t.to_device(&candle_core::Device::Cpu)?;
                Ok(())
            }
        }
    }
}

/// Element-wise round half to even.
///
/// `Tensor::round` rounds ties away from zero, so exact `.5` values are
/// rounded as `2·round(x/2)` instead.
fn round_ties_even(t: &Tensor) -> candle_core::Result<Tensor> {
    let nearest = t.round()?;
    let even = t.affine(0.5, 0.0)?.round()?.affine(2.0, 0.0)?;
    let frac = t.sub(&t.floor()?)?;
    let half = frac.ones_like()?.affine(0.5, 0.0)?;
    frac.eq(&half)?.where_cond(&even, &nearest)
}
