//! Precision modes and how each one maps onto a matmul strategy.

use crate::results::Metric;
use llmbench_common::{BenchError, DeviceKind};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Scale used by the simulated 8-bit float path.
pub const FP8_SCALE: f32 = 127.0;

/// Native floating-point storage formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FloatFormat {
    F32,
    F16,
}

/// Inclusive range of narrow integer values drawn before widening to `i32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntRange {
    pub low: i8,
    pub high: i8,
}

impl IntRange {
    /// Signed 8-bit, upper bound one below `i8::MAX`.
    pub const INT8: Self = Self { low: -128, high: 126 };
    /// Signed 4-bit, upper bound one below `7`.
    pub const INT4: Self = Self { low: -8, high: 6 };

    pub fn contains(&self, value: i32) -> bool {
        (i32::from(self.low)..=i32::from(self.high)).contains(&value)
    }
}

/// How a precision mode is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatmulPath {
    /// Random matrices in the given format, multiplied natively.
    Native(FloatFormat),
    /// F32 matrices passed through [`quantize_fp8`] before multiplying.
    QuantizedFloat,
    /// Narrow integers widened to `i32` before multiplying. CPU only.
    WidenedInt(IntRange),
}

/// The closed set of benchmarked precisions, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Precision {
    Fp32,
    Fp16,
    Fp8Sim,
    Int8Sim,
    Int4Sim,
}

impl Precision {
    pub const ALL: [Precision; 5] = [
        Precision::Fp32,
        Precision::Fp16,
        Precision::Fp8Sim,
        Precision::Int8Sim,
        Precision::Int4Sim,
    ];

    pub const fn path(self) -> MatmulPath {
        match self {
            Precision::Fp32 => MatmulPath::Native(FloatFormat::F32),
            Precision::Fp16 => MatmulPath::Native(FloatFormat::F16),
            Precision::Fp8Sim => MatmulPath::QuantizedFloat,
            Precision::Int8Sim => MatmulPath::WidenedInt(IntRange::INT8),
            Precision::Int4Sim => MatmulPath::WidenedInt(IntRange::INT4),
        }
    }

    pub const fn metric(self) -> Metric {
        match self {
            Precision::Fp32 => Metric::Fp32,
            Precision::Fp16 => Metric::Fp16,
            Precision::Fp8Sim => Metric::Fp8,
            Precision::Int8Sim => Metric::Int8,
            Precision::Int4Sim => Metric::Int4,
        }
    }

    /// Widened-integer paths only run on general-purpose CPUs.
    pub const fn is_supported_on(self, kind: DeviceKind) -> bool {
        match self.path() {
            MatmulPath::Native(_) | MatmulPath::QuantizedFloat => true,
            MatmulPath::WidenedInt(_) => matches!(kind, DeviceKind::Cpu),
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Precision::Fp32 => "FP32",
            Precision::Fp16 => "FP16",
            Precision::Fp8Sim => "FP8",
            Precision::Int8Sim => "INT8",
            Precision::Int4Sim => "INT4",
        };
        f.write_str(label)
    }
}

impl FromStr for Precision {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fp32" | "f32" => Ok(Precision::Fp32),
            "fp16" | "f16" => Ok(Precision::Fp16),
            "fp8" => Ok(Precision::Fp8Sim),
            "int8" | "i8" => Ok(Precision::Int8Sim),
            "int4" | "i4" => Ok(Precision::Int4Sim),
            _ => Err(BenchError::UnknownPrecision(s.to_string())),
        }
    }
}

/// Simulated 8-bit quantization of one value:
/// `clamp(round(v·127), -128, 127) / 127`.
///
/// Ties round to even (`2.5 → 2`, `3.5 → 4`). The tensor path in
/// [`CandleBackend`](crate::backend::CandleBackend) rounds the same way.
pub fn quantize_fp8(value: f32) -> f32 {
    (value * FP8_SCALE).round_ties_even().clamp(-128.0, 127.0) / FP8_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_cover_every_precision() {
        assert_eq!(Precision::Fp32.path(), MatmulPath::Native(FloatFormat::F32));
        assert_eq!(Precision::Fp16.path(), MatmulPath::Native(FloatFormat::F16));
        assert_eq!(Precision::Fp8Sim.path(), MatmulPath::QuantizedFloat);
        assert_eq!(Precision::Int8Sim.path(), MatmulPath::WidenedInt(IntRange::INT8));
        assert_eq!(Precision::Int4Sim.path(), MatmulPath::WidenedInt(IntRange::INT4));
    }

    #[test]
    fn integer_paths_are_cpu_only() {
        for p in [Precision::Int8Sim, Precision::Int4Sim] {
            assert!(p.is_supported_on(DeviceKind::Cpu));
            assert!(!p.is_supported_on(DeviceKind::Cuda));
            assert!(!p.is_supported_on(DeviceKind::Metal));
        }
        for p in [Precision::Fp32, Precision::Fp16, Precision::Fp8Sim] {
            assert!(DeviceKind::ALL.iter().all(|k| p.is_supported_on(*k)));
        }
    }

    #[test]
    fn unknown_precision_is_an_error() {
        assert!(matches!(
            "bf16".parse::<Precision>(),
            Err(BenchError::UnknownPrecision(ref s)) if s == "bf16"
        ));
        assert_eq!("INT4".parse::<Precision>().unwrap(), Precision::Int4Sim);
    }

    #[test]
    fn quantize_examples() {
        assert_eq!(quantize_fp8(0.0), 0.0);
        assert_eq!(quantize_fp8(1.0), 1.0);
        assert_eq!(quantize_fp8(-1.0), -1.0);
        // clamps outside the representable range
        assert_eq!(quantize_fp8(5.0), 1.0);
        assert_eq!(quantize_fp8(-5.0), -128.0 / 127.0);
        assert_eq!(quantize_fp8(0.5), 64.0 / 127.0);
    }

    #[test]
    fn quantize_ties_round_to_even() {
        // each input scales to exactly k + 0.5 in f32
        assert_eq!(quantize_fp8(2.5 / 127.0), 2.0 / 127.0);
        assert_eq!(quantize_fp8(-4.5 / 127.0), -4.0 / 127.0);
        assert_eq!(quantize_fp8(0.5 / 127.0), 0.0);
        assert_eq!(quantize_fp8(3.5 / 127.0), 4.0 / 127.0);
    }

    #[test]
    fn int_ranges() {
        assert!(IntRange::INT8.contains(-128));
        assert!(IntRange::INT8.contains(126));
        assert!(!IntRange::INT8.contains(127));
        assert!(IntRange::INT4.contains(-8));
        assert!(!IntRange::INT4.contains(7));
    }
}
