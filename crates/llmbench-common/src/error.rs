//! Error types for benchmark runs.

use crate::Device;
use thiserror::Error;

/// Errors produced while configuring or executing a benchmark run.
///
/// Skipped metrics are not errors: a precision that a device does not support
/// is recorded as a skip notice by the engine and never surfaces here.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("unknown device kind '{0}'. Expected one of: cpu, cuda, metal")]
    UnknownDeviceKind(String),

    #[error("unknown precision '{0}'. Expected one of: fp32, fp16, fp8, int8, int4")]
    UnknownPrecision(String),

    #[error("device {device} is not available: {reason}")]
    DeviceUnavailable { device: Device, reason: String },

    #[error("{operation} is not supported on {device}")]
    Unsupported { device: Device, operation: String },

    #[error("invalid workload profile: {0}")]
    InvalidProfile(String),

    #[error("timed loop for {0} measured zero elapsed time")]
    ZeroElapsed(String),

    #[error("device runtime error: {0}")]
    Runtime(#[from] candle_core::Error),
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_device_kind_lists_choices() {
        let msg = BenchError::UnknownDeviceKind("tpu".into()).to_string();
        assert!(msg.contains("'tpu'"));
        assert!(msg.contains("cpu, cuda, metal"));
    }

    #[test]
    fn unsupported_names_device_and_operation() {
        let err = BenchError::Unsupported {
            device: Device::Cuda(0),
            operation: "i32 matmul".into(),
        };
        assert_eq!(err.to_string(), "i32 matmul is not supported on cuda:0");
    }

    #[test]
    fn runtime_error_keeps_source() {
        let err: BenchError = candle_core::Error::Msg("driver lost".into()).into();
        assert!(matches!(err, BenchError::Runtime(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
