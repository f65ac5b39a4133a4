//! System probe port for resource reporting.
//!
//! Core owns the types; the runtime adapter does the actual probing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuUsage {
    /// Global usage in percent.
    pub usage: f64,
    pub cores: usize,
}

/// Used/total in gigabytes plus the percentage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapacityUsage {
    pub used_gb: f64,
    pub total_gb: f64,
    pub percentage: f64,
}

impl CapacityUsage {
    pub fn from_bytes(used: u64, total: u64) -> Self {
        const GB: f64 = 1024.0 * 1024.0 * 1024.0;
        let percentage = if total == 0 {
            0.0
        } else {
            used as f64 / total as f64 * 100.0
        };
        Self {
            used_gb: round2(used as f64 / GB),
            total_gb: round2(total as f64 / GB),
            percentage: round2(percentage),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpuUsage {
    pub model: String,
    pub usage: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemResources {
    pub cpu: CpuUsage,
    pub ram: CapacityUsage,
    /// `None` when no GPU could be detected.
    pub gpu: Option<GpuUsage>,
    pub vram: Option<CapacityUsage>,
}

/// Port for probing host resources.
pub trait SystemProbePort: Send + Sync {
    /// Current CPU, memory and (when available) GPU usage.
    fn resources(&self) -> SystemResources;

    /// Usage of the disk holding the data directory.
    fn storage(&self) -> CapacityUsage;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_from_bytes() {
        let usage = CapacityUsage::from_bytes(4 * 1024 * 1024 * 1024, 16 * 1024 * 1024 * 1024);
        assert!((usage.used_gb - 4.0).abs() < f64::EPSILON);
        assert!((usage.total_gb - 16.0).abs() < f64::EPSILON);
        assert!((usage.percentage - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_capacity_zero_total() {
        let usage = CapacityUsage::from_bytes(0, 0);
        assert!(usage.percentage.abs() < f64::EPSILON);
    }
}
