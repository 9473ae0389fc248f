//! Workload sizing per device kind.

use llmbench_common::{BenchError, DeviceKind, Result};
use serde::Serialize;

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;

/// Problem sizes for one benchmark run.
///
/// Immutable once built; every field is positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkloadProfile {
    matrix_dimension: usize,
    iteration_count: usize,
    memory_test_bytes: u64,
}

impl WorkloadProfile {
    /// Accelerators (discrete and unified-memory GPUs).
    pub const HIGH_THROUGHPUT: Self =
        Self { matrix_dimension: 2048, iteration_count: 60, memory_test_bytes: 2 * GIB };

    /// General-purpose CPUs.
    pub const STANDARD: Self =
        Self { matrix_dimension: 1024, iteration_count: 10, memory_test_bytes: 10 * MIB };

    /// Tiny sizes for checking that a device works end to end; not comparable
    /// against the baselines.
    pub const SMOKE: Self =
        Self { matrix_dimension: 64, iteration_count: 3, memory_test_bytes: MIB };

    /// Build a custom profile, rejecting zero-sized fields.
    pub fn new(
        matrix_dimension: usize,
        iteration_count: usize,
        memory_test_bytes: u64,
    ) -> Result<Self> {
        if matrix_dimension == 0 {
            return Err(BenchError::InvalidProfile("matrix dimension must be > 0".into()));
        }
        if iteration_count == 0 {
            return Err(BenchError::InvalidProfile("iteration count must be > 0".into()));
        }
        if memory_test_bytes < std::mem::size_of::<f32>() as u64 {
            return Err(BenchError::InvalidProfile(format!(
                "memory test must cover at least one f32, got {memory_test_bytes} bytes"
            )));
        }
        Ok(Self { matrix_dimension, iteration_count, memory_test_bytes })
    }

    pub const fn matrix_dimension(&self) -> usize {
        self.matrix_dimension
    }

    pub const fn iteration_count(&self) -> usize {
        self.iteration_count
    }

    pub const fn memory_test_bytes(&self) -> u64 {
        self.memory_test_bytes
    }

    /// Number of `f32` elements in the memory-test buffer (truncated).
    pub const fn memory_test_elements(&self) -> usize {
        (self.memory_test_bytes / std::mem::size_of::<f32>() as u64) as usize
    }

    /// Multiply-add count of one dense `n×n` matrix product: `2·n³`.
    pub fn matmul_ops(&self) -> f64 {
        2.0 * (self.matrix_dimension as f64).powi(3)
    }
}

/// Derive the workload for a device kind.
///
/// `Cuda` and `Metal` get [`WorkloadProfile::HIGH_THROUGHPUT`]; `Cpu` gets
/// [`WorkloadProfile::STANDARD`].
pub const fn derive_profile(kind: DeviceKind) -> WorkloadProfile {
    if kind.is_high_throughput() {
        WorkloadProfile::HIGH_THROUGHPUT
    } else {
        WorkloadProfile::STANDARD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accelerators_get_heavy_profile() {
        for kind in [DeviceKind::Cuda, DeviceKind::Metal] {
            let p = derive_profile(kind);
            assert_eq!(p.matrix_dimension(), 2048);
            assert_eq!(p.iteration_count(), 60);
            assert_eq!(p.memory_test_bytes(), 2_147_483_648);
        }
    }

    #[test]
    fn cpu_gets_standard_profile() {
        let p = derive_profile(DeviceKind::Cpu);
        assert_eq!(p.matrix_dimension(), 1024);
        assert_eq!(p.iteration_count(), 10);
        assert_eq!(p.memory_test_bytes(), 10_485_760);
    }

    #[test]
    fn smoke_profile_is_valid() {
        let p = WorkloadProfile::SMOKE;
        assert_eq!(WorkloadProfile::new(64, 3, 1 << 20).unwrap(), p);
        assert!(p.matmul_ops() < WorkloadProfile::STANDARD.matmul_ops());
    }

    #[test]
    fn memory_elements_truncate() {
        let p = WorkloadProfile::new(4, 1, 10).unwrap();
        assert_eq!(p.memory_test_elements(), 2);
        assert_eq!(WorkloadProfile::STANDARD.memory_test_elements(), 2_621_440);
    }

    #[test]
    fn zero_fields_rejected() {
        assert!(WorkloadProfile::new(0, 1, 4).is_err());
        assert!(WorkloadProfile::new(1, 0, 4).is_err());
        assert!(WorkloadProfile::new(1, 1, 3).is_err());
        assert!(WorkloadProfile::new(1, 1, 4).is_ok());
    }

    #[test]
    fn matmul_ops_is_two_n_cubed() {
        let p = WorkloadProfile::new(8, 1, 4).unwrap();
        assert_eq!(p.matmul_ops(), 1024.0);
    }
}
