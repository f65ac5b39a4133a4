//! NVIDIA GPU detection via `nvidia-smi`.

use std::process::Command;

use iosrag_core::{CapacityUsage, GpuUsage};

const MIB: u64 = 1024 * 1024;

/// Parse one `name, utilization, memory.used, memory.total` CSV line
/// (memory in MiB).
fn parse_smi_line(line: &str) -> Option<(GpuUsage, CapacityUsage)> {
    let mut fields = line.split(',').map(str::trim);
    let model = fields.next().filter(|m| !m.is_empty())?.to_string();
    let usage = fields.next()?.parse::<f64>().ok();
    let used: u64 = fields.next()?.parse().ok()?;
    let total: u64 = fields.next()?.parse().ok()?;
    Some((
        GpuUsage { model, usage },
        CapacityUsage::from_bytes(used * MIB, total * MIB),
    ))
}

/// First NVIDIA GPU and its VRAM usage, or `None` when no driver answers.
pub fn probe_nvidia() -> Option<(GpuUsage, CapacityUsage)> {
    let output = Command::new("nvidia-smi")
        .args([
            "--query-gpu=name,utilization.gpu,memory.used,memory.total",
            "--format=csv,noheader,nounits",
        ])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_smi_line(stdout.lines().next()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_smi_line() {
        let (gpu, vram) = parse_smi_line("NVIDIA GeForce RTX 4090, 37, 2048, 24564").unwrap();
        assert_eq!(gpu.model, "NVIDIA GeForce RTX 4090");
        assert_eq!(gpu.usage, Some(37.0));
        assert!((vram.used_gb - 2.0).abs() < f64::EPSILON);
        assert!((vram.total_gb - 23.99).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_smi_line_without_utilization() {
        let (gpu, _) = parse_smi_line("Tesla T4, [N/A], 0, 15360").unwrap();
        assert_eq!(gpu.usage, None);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_smi_line("").is_none());
        assert!(parse_smi_line("GPU, 1, x, 2").is_none());
    }
}
