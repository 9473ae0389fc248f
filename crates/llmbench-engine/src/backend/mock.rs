//! Deterministic backend for tests.
//!
//! Tensors carry only a shape. Every multiply and copy advances a shared
//! [`ManualClock`] by a fixed cost, so timed loops measure exactly
//! `iterations × cost`. Calls are counted so tests can check how often the
//! engine synchronizes.

use super::ComputeBackend;
use crate::clock::ManualClock;
use crate::precision::{FloatFormat, IntRange};
use llmbench_common::{BenchError, Device, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Element type of a [`MockTensor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockElement {
    Float(FloatFormat),
    Quantized,
    Int(IntRange),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockTensor {
    pub shape: Vec<usize>,
    pub element: MockElement,
}

/// Counters of backend calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub allocations: usize,
    pub matmuls: usize,
    pub copies: usize,
    pub synchronizations: usize,
}

#[derive(Debug)]
pub struct MockBackend {
    device: Device,
    clock: ManualClock,
    matmul_cost: Duration,
    copy_cost: Duration,
    fail_matmul_at: Option<usize>,
    allocations: AtomicUsize,
    matmuls: AtomicUsize,
    copies: AtomicUsize,
    synchronizations: AtomicUsize,
}

impl MockBackend {
    pub fn new(device: Device, clock: ManualClock) -> Self {
        Self {
            device,
            clock,
            matmul_cost: Duration::from_millis(10),
            copy_cost: Duration::from_millis(1),
            fail_matmul_at: None,
            allocations: AtomicUsize::new(0),
            matmuls: AtomicUsize::new(0),
            copies: AtomicUsize::new(0),
            synchronizations: AtomicUsize::new(0),
        }
    }

    pub fn with_matmul_cost(mut self, cost: Duration) -> Self {
        self.matmul_cost = cost;
        self
    }

    pub fn with_copy_cost(mut self, cost: Duration) -> Self {
        self.copy_cost = cost;
        self
    }

    /// Make the `n`th multiply (counting from 1) fail with a runtime error.
    pub fn failing_matmul_at(mut self, n: usize) -> Self {
        self.fail_matmul_at = Some(n);
        self
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            allocations: self.allocations.load(Ordering::SeqCst),
            matmuls: self.matmuls.load(Ordering::SeqCst),
            copies: self.copies.load(Ordering::SeqCst),
            synchronizations: self.synchronizations.load(Ordering::SeqCst),
        }
    }

    fn allocate(&self, shape: Vec<usize>, element: MockElement) -> MockTensor {
        self.allocations.fetch_add(1, Ordering::SeqCst);
        MockTensor { shape, element }
    }
}

impl ComputeBackend for MockBackend {
    type Tensor = MockTensor;

    fn device(&self) -> Device {
        self.device
    }

    fn random_matrix(&self, size: usize, format: FloatFormat) -> Result<MockTensor> {
        Ok(self.allocate(vec![size, size], MockElement::Float(format)))
    }

    fn quantize_fp8(&self, tensor: &MockTensor) -> Result<MockTensor> {
        Ok(self.allocate(tensor.shape.clone(), MockElement::Quantized))
    }

    fn random_int_matrix(&self, size: usize, range: IntRange) -> Result<MockTensor> {
        if !self.device.is_cpu() {
            return Err(BenchError::Unsupported {
                device: self.device,
                operation: "widened i32 matmul".into(),
            });
        }
        Ok(self.allocate(vec![size, size], MockElement::Int(range)))
    }

    fn matmul(&self, a: &MockTensor, b: &MockTensor) -> Result<MockTensor> {
        let n = self.matmuls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_matmul_at == Some(n) {
            return Err(candle_core::Error::Msg(format!("injected failure on matmul {n}")).into());
        }
        if a.shape.len() != 2 || b.shape.len() != 2 || a.shape[1] != b.shape[0] {
            return Err(BenchError::Unsupported {
                device: self.device,
                operation: format!("matmul of {:?} by {:?}", a.shape, b.shape),
            });
        }
        self.clock.advance(self.matmul_cost);
        Ok(MockTensor { shape: vec![a.shape[0], b.shape[1]], element: a.element })
    }

    fn random_buffer(&self, len: usize) -> Result<MockTensor> {
        Ok(self.allocate(vec![len], MockElement::Float(FloatFormat::F32)))
    }

    fn copy(&self, tensor: &MockTensor) -> Result<MockTensor> {
        self.copies.fetch_add(1, Ordering::SeqCst);
        self.clock.advance(self.copy_cost);
        Ok(tensor.clone())
    }

    fn synchronize(&self, _pending: &MockTensor) -> Result<()> {
        self.synchronizations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
