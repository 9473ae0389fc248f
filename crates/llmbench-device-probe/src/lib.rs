//! Device detection and capability probing for llmbench.
//!
//! Answers two questions for every [`DeviceKind`]: was support for it compiled
//! into this binary, and is a usable device present on this host right now.
//! Front ends use [`available_devices`] to auto-detect targets. Backends call
//! [`ensure_compiled`] before opening a device, so a missing feature is
//! reported as such instead of as a driver error.

use llmbench_common::{BenchError, Device, DeviceKind, Result};
use serde::Serialize;
use std::fmt;
use tracing::debug;

// ── CPU capabilities ─────────────────────────────────────────────────────────

/// Best SIMD instruction set available to the CPU kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SimdLevel {
    Scalar,
    Sse42,
    Avx2,
    Avx512,
    Neon,
}

impl fmt::Display for SimdLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SimdLevel::Scalar => "scalar",
            SimdLevel::Sse42 => "sse4.2",
            SimdLevel::Avx2 => "avx2",
            SimdLevel::Avx512 => "avx512",
            SimdLevel::Neon => "neon",
        };
        f.write_str(name)
    }
}

/// CPU capabilities detected at runtime.
///
/// Obtained by calling [`probe_cpu`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CpuCapabilities {
    /// Number of logical CPU cores available to the process (always ≥ 1).
    pub core_count: usize,
    /// Best SIMD level detected at call time.
    pub simd_level: SimdLevel,
}

/// Probe the current CPU and return its capabilities.
///
/// # Examples
///
/// ```
/// use llmbench_device_probe::probe_cpu;
///
/// let caps = probe_cpu();
/// assert!(caps.core_count >= 1);
/// ```
pub fn probe_cpu() -> CpuCapabilities {
    let core_count = std::thread::available_parallelism().map(std::num::NonZero::get).unwrap_or(1);
    CpuCapabilities { core_count, simd_level: detect_simd_level() }
}

/// Detect the best SIMD instruction-set level available at runtime.
///
/// Detection order: AVX-512 > AVX2 > SSE4.2 (`x86_64`); NEON (`AArch64`);
/// scalar fallback on all other targets.
#[allow(clippy::missing_const_for_fn)] // not const on x86_64 (runtime CPUID)
pub fn detect_simd_level() -> SimdLevel {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx512f") {
            SimdLevel::Avx512
        } else if is_x86_feature_detected!("avx2") {
            SimdLevel::Avx2
        } else if is_x86_feature_detected!("sse4.2") {
            SimdLevel::Sse42
        } else {
            SimdLevel::Scalar
        }
    }
    #[cfg(target_arch = "aarch64")]
    {
        SimdLevel::Neon
    }
    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        SimdLevel::Scalar
    }
}

// ── Accelerator availability ─────────────────────────────────────────────────

/// Check if CUDA support was compiled into this binary.
#[inline]
pub const fn cuda_compiled() -> bool {
    cfg!(feature = "cuda")
}

/// Check if Metal support was compiled into this binary.
#[inline]
pub const fn metal_compiled() -> bool {
    cfg!(feature = "metal")
}

/// Whether support for `kind` was compiled into this binary.
pub const fn is_compiled(kind: DeviceKind) -> bool {
    match kind {
        DeviceKind::Cpu => true,
        DeviceKind::Cuda => cuda_compiled(),
        DeviceKind::Metal => metal_compiled(),
    }
}

/// Fail with [`BenchError::DeviceUnavailable`] when `device`'s kind was not
/// compiled in. Does not touch the hardware.
pub fn ensure_compiled(device: &Device) -> Result<()> {
    if is_compiled(device.kind()) {
        return Ok(());
    }
    Err(BenchError::DeviceUnavailable {
        device: *device,
        reason: format!("{} support was not compiled into this binary", device.kind().label()),
    })
}

/// Check if a CUDA device with the given ordinal can be opened.
///
/// Always `false` when CUDA is not compiled.
pub fn cuda_available_runtime(ordinal: usize) -> bool {
    if !cuda_compiled() || !candle_core::utils::cuda_is_available() {
        return false;
    }
    match candle_core::Device::new_cuda(ordinal) {
        Ok(_) => true,
        Err(e) => {
            debug!("CUDA device {ordinal} not usable: {e}");
            false
        }
    }
}

/// Check if a Metal device with the given ordinal can be opened.
///
/// Always `false` when Metal is not compiled.
pub fn metal_available_runtime(ordinal: usize) -> bool {
    if !metal_compiled() || !candle_core::utils::metal_is_available() {
        return false;
    }
    match candle_core::Device::new_metal(ordinal) {
        Ok(_) => true,
        Err(e) => {
            debug!("Metal device {ordinal} not usable: {e}");
            false
        }
    }
}

/// Whether `device` is usable on this host.
pub fn is_available(device: &Device) -> bool {
    match device {
        Device::Cpu => true,
        Device::Cuda(id) => cuda_available_runtime(*id),
        Device::Metal(id) => metal_available_runtime(*id),
    }
}

/// The primary device of every kind that is usable on this host, in
/// [`DeviceKind::ALL`] order. The CPU is always first.
pub fn available_devices() -> Vec<Device> {
    DeviceKind::ALL.into_iter().map(Device::primary).filter(is_available).collect()
}

// ── Snapshot ─────────────────────────────────────────────────────────────────

/// Compile-time and runtime availability of one device kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindAvailability {
    pub kind: DeviceKind,
    pub compiled: bool,
    pub runtime: bool,
}

/// Snapshot of everything the probe knows about this host.
///
/// Build with [`DeviceProbe::detect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceProbe {
    pub cpu: CpuCapabilities,
    pub kinds: Vec<KindAvailability>,
}

impl DeviceProbe {
    /// Build a snapshot using compile-time flags and runtime probing.
    ///
    /// # Examples
    ///
    /// ```
    /// use llmbench_common::DeviceKind;
    /// use llmbench_device_probe::DeviceProbe;
    ///
    /// let probe = DeviceProbe::detect();
    /// assert!(probe.is_usable(DeviceKind::Cpu), "CPU backend is always available");
    /// ```
    pub fn detect() -> Self {
        let kinds = DeviceKind::ALL
            .into_iter()
            .map(|kind| KindAvailability {
                kind,
                compiled: is_compiled(kind),
                runtime: is_available(&Device::primary(kind)),
            })
            .collect();
        Self { cpu: probe_cpu(), kinds }
    }

    pub fn is_usable(&self, kind: DeviceKind) -> bool {
        self.kinds.iter().any(|k| k.kind == kind && k.compiled && k.runtime)
    }
}
