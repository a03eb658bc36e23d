use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{HostProbeError, Result};

pub(crate) const CPUINFO_PATH: &str = "/proc/cpuinfo";
pub(crate) const MOUNTS_PATH: &str = "/proc/mounts";
pub(crate) const MEMINFO_PATH: &str = "/proc/meminfo";
pub(crate) const COHERENCY_LINE_SIZE_PATH: &str =
    "/sys/devices/system/cpu/cpu0/cache/index0/coherency_line_size";

/// Locations of the kernel descriptor sources discovery reads.
///
/// Defaults point at the live procfs/sysfs files; deployments with a
/// relocated procfs (containers, test rigs) override them via a TOML file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub cpuinfo: PathBuf,
    pub mounts: PathBuf,
    pub meminfo: PathBuf,
    pub coherency_line_size: PathBuf,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            cpuinfo: PathBuf::from(CPUINFO_PATH),
            mounts: PathBuf::from(MOUNTS_PATH),
            meminfo: PathBuf::from(MEMINFO_PATH),
            coherency_line_size: PathBuf::from(COHERENCY_LINE_SIZE_PATH),
        }
    }
}

impl ProbeConfig {
    /// Load overrides from a TOML file; keys left out keep their defaults
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|err| HostProbeError::config(format!("{}: {err}", path.display())))?;
        Ok(toml::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_point_at_live_kernel_files() {
        let config = ProbeConfig::default();
        assert_eq!(config.cpuinfo, Path::new("/proc/cpuinfo"));
        assert_eq!(config.mounts, Path::new("/proc/mounts"));
        assert_eq!(config.meminfo, Path::new("/proc/meminfo"));
        assert!(config.coherency_line_size.starts_with("/sys"));
    }

    #[test]
    fn partial_override_keeps_defaults() {
        let config: ProbeConfig = toml::from_str(
            r#"
            mounts = "/host/proc/mounts"
            "#,
        )
        .unwrap();
        assert_eq!(config.mounts, Path::new("/host/proc/mounts"));
        assert_eq!(config.cpuinfo, Path::new("/proc/cpuinfo"));
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let config: ProbeConfig = toml::from_str("").unwrap();
        assert_eq!(config.meminfo, Path::new("/proc/meminfo"));
    }
}
