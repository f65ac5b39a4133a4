//! `SystemProbePort` implementation backed by `sysinfo`.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use iosrag_core::{CapacityUsage, CpuUsage, SystemProbePort, SystemResources};
use sysinfo::{Disks, System};

use crate::gpu::probe_nvidia;

/// Probes CPU, memory, GPU and the disk that holds the data directory.
///
/// The `System` handle is kept between calls so CPU usage is measured over
/// the interval since the previous probe rather than reading zero.
pub struct SysinfoProbe {
    data_dir: PathBuf,
    system: Mutex<System>,
}

impl SysinfoProbe {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            system: Mutex::new(System::new_all()),
        }
    }
}

/// `(used, total)` bytes of the mount with the longest prefix of `path`.
fn disk_usage<'a>(
    path: &Path,
    mounts: impl IntoIterator<Item = (&'a Path, u64, u64)>,
) -> Option<(u64, u64)> {
    mounts
        .into_iter()
        .filter(|(mount, _, _)| path.starts_with(mount))
        .max_by_key(|(mount, _, _)| mount.components().count())
        .map(|(_, total, available)| (total.saturating_sub(available), total))
}

impl SystemProbePort for SysinfoProbe {
    fn resources(&self) -> SystemResources {
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        system.refresh_cpu_usage();
        system.refresh_memory();

        let cpu = CpuUsage {
            usage: (f64::from(system.global_cpu_usage()) * 100.0).round() / 100.0,
            cores: system.cpus().len(),
        };
        let ram = CapacityUsage::from_bytes(system.used_memory(), system.total_memory());
        drop(system);

        let (gpu, vram) = probe_nvidia().map_or((None, None), |(g, v)| (Some(g), Some(v)));
        SystemResources {
            cpu,
            ram,
            gpu,
            vram,
        }
    }

    fn storage(&self) -> CapacityUsage {
        let path = self
            .data_dir
            .canonicalize()
            .unwrap_or_else(|_| self.data_dir.clone());
        let disks = Disks::new_with_refreshed_list();
        let usage = disk_usage(
            &path,
            disks
                .list()
                .iter()
                .map(|d| (d.mount_point(), d.total_space(), d.available_space())),
        );
        match usage {
            Some((used, total)) => CapacityUsage::from_bytes(used, total),
            None => {
                tracing::debug!(
                    target: "iosrag.runtime",
                    path = %path.display(),
                    "No disk found for data directory"
                );
                CapacityUsage::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_usage_picks_longest_mount() {
        let mounts = [
            (Path::new("/"), 100, 40),
            (Path::new("/srv"), 50, 10),
            (Path::new("/srv/other"), 10, 5),
        ];
        assert_eq!(
            disk_usage(Path::new("/srv/iosrag/data"), mounts),
            Some((40, 50))
        );
    }

    #[test]
    fn test_disk_usage_without_match() {
        assert_eq!(disk_usage(Path::new("relative"), [(Path::new("/"), 1, 1)]), None);
    }

    #[test]
    fn test_resources_reports_cpus_and_ram() {
        let dir = tempfile::tempdir().unwrap();
        let resources = SysinfoProbe::new(dir.path()).resources();
        assert!(resources.cpu.cores >= 1);
        assert!(resources.ram.total_gb > 0.0);
    }
}
