//! Device handles and device-kind classification.

use crate::BenchError;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ── DeviceKind ───────────────────────────────────────────────────────────────

/// The class of compute target a benchmark runs on.
///
/// | Kind    | Class                       | Memory model |
/// |---------|-----------------------------|--------------|
/// | `Cpu`   | general-purpose CPU         | host         |
/// | `Cuda`  | discrete GPU accelerator    | discrete     |
/// | `Metal` | unified-memory accelerator  | unified      |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Cpu,
    Cuda,
    Metal,
}

impl DeviceKind {
    /// Every kind, in the order front ends list them.
    pub const ALL: [DeviceKind; 3] = [DeviceKind::Cpu, DeviceKind::Cuda, DeviceKind::Metal];

    /// Accelerators that get the heavier workload.
    pub const fn is_high_throughput(self) -> bool {
        matches!(self, DeviceKind::Cuda | DeviceKind::Metal)
    }

    pub const fn memory_model(self) -> MemoryModel {
        match self {
            DeviceKind::Cpu => MemoryModel::Host,
            DeviceKind::Cuda => MemoryModel::Discrete,
            DeviceKind::Metal => MemoryModel::Unified,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            DeviceKind::Cpu => "cpu",
            DeviceKind::Cuda => "cuda",
            DeviceKind::Metal => "metal",
        }
    }

    /// Label used by interactive front ends.
    pub const fn label(self) -> &'static str {
        match self {
            DeviceKind::Cpu => "CPU",
            DeviceKind::Cuda => "CUDA",
            DeviceKind::Metal => "Metal",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceKind {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(DeviceKind::Cpu),
            "cuda" | "gpu" => Ok(DeviceKind::Cuda),
            "metal" | "mps" => Ok(DeviceKind::Metal),
            _ => Err(BenchError::UnknownDeviceKind(s.to_string())),
        }
    }
}

/// How results produced on a device become visible to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryModel {
    /// Compute runs on the calling thread; results are ready on return.
    Host,
    /// Work is queued on a separate device with its own memory.
    Discrete,
    /// Work is queued on an accelerator that shares memory with the host.
    Unified,
}

// ── Device ───────────────────────────────────────────────────────────────────

/// A concrete compute target.
///
/// Accelerators carry the ordinal of the physical device they address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    Cpu,
    Cuda(usize),
    Metal(usize),
}

impl Device {
    pub const fn kind(&self) -> DeviceKind {
        match self {
            Device::Cpu => DeviceKind::Cpu,
            Device::Cuda(_) => DeviceKind::Cuda,
            Device::Metal(_) => DeviceKind::Metal,
        }
    }

    pub const fn ordinal(&self) -> usize {
        match self {
            Device::Cpu => 0,
            Device::Cuda(id) | Device::Metal(id) => *id,
        }
    }

    /// The first device of the given kind.
    pub const fn primary(kind: DeviceKind) -> Self {
        match kind {
            DeviceKind::Cpu => Device::Cpu,
            DeviceKind::Cuda => Device::Cuda(0),
            DeviceKind::Metal => Device::Metal(0),
        }
    }

    pub const fn is_cpu(&self) -> bool {
        matches!(self, Device::Cpu)
    }
}

impl From<DeviceKind> for Device {
    fn from(kind: DeviceKind) -> Self {
        Device::primary(kind)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda(id) => write!(f, "cuda:{id}"),
            Device::Metal(id) => write!(f, "metal:{id}"),
        }
    }
}

impl FromStr for Device {
    type Err = BenchError;

    /// Accepts `cpu`, `cuda`, `cuda:N`, `metal`, `metal:N` (and the `mps` alias).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, ordinal) = match s.split_once(':') {
            Some((kind, id)) => {
                let id = id
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| BenchError::UnknownDeviceKind(s.to_string()))?;
                (kind.parse::<DeviceKind>()?, id)
            }
            None => (s.parse::<DeviceKind>()?, 0),
        };
        match kind {
            DeviceKind::Cpu if ordinal == 0 => Ok(Device::Cpu),
            DeviceKind::Cpu => Err(BenchError::UnknownDeviceKind(s.to_string())),
            DeviceKind::Cuda => Ok(Device::Cuda(ordinal)),
            DeviceKind::Metal => Ok(Device::Metal(ordinal)),
        }
    }
}

impl Serialize for Device {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
