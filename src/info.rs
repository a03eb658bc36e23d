use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::{HostProbeError, Result};
use crate::probe::cpuinfo::CpuRecords;
use crate::probe::freq;

/// Highest logical CPU id the per-CPU tables cover
pub const MAX_SUPPORTED_CPUS: usize = 256;

/// Cache line size the runtime's structure layouts are compiled for.
/// Discovery fails if the hardware disagrees.
pub const CACHE_LINE_SIZE: usize = 64;

/// Page size assumed on builds that do not query the OS for it
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Static host characteristics, discovered once at process start.
///
/// Built by [`crate::probe::discover`] and frozen process-wide by
/// [`crate::probe::initialize`]; never mutated afterwards, so readers on any
/// thread share it without locking.
#[derive(Debug, Default)]
pub struct SystemInfo {
    pub(crate) cpu_count: usize,
    pub(crate) cache_line_size: usize,
    pub(crate) page_size: usize,
    pub(crate) default_huge_page_size: u64,
    pub(crate) huge_page_dir: Option<PathBuf>,
    pub(crate) cpus: CpuRecords,
}

impl SystemInfo {
    /// Number of logical CPUs visible to the process at boot
    pub fn cpu_count(&self) -> usize {
        self.cpu_count
    }

    /// Detected cache line size in bytes; equals [`CACHE_LINE_SIZE`] after a
    /// successful init
    pub fn cache_line_size(&self) -> usize {
        self.cache_line_size
    }

    /// Default memory page size in bytes
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Default huge page size in bytes, 0 when unknown
    pub fn huge_page_size(&self) -> u64 {
        self.default_huge_page_size
    }

    /// Mount point of a hugetlbfs filesystem, recorded only on builds that
    /// require one
    pub fn huge_page_dir(&self) -> Option<&Path> {
        self.huge_page_dir.as_deref()
    }

    /// Model name of the given logical CPU, `None` when the id is out of
    /// range or the descriptor source did not report one
    pub fn cpu_model(&self, id: usize) -> Option<&str> {
        self.cpus.model(id)
    }

    /// Maximum clock frequency of the given logical CPU in Hz, 0 when the id
    /// is out of range or the frequency is unknown
    pub fn cpu_freq_max(&self, id: usize) -> u64 {
        self.cpus.hz_max(id)
    }
}

static SYSTEM_INFO: OnceLock<SystemInfo> = OnceLock::new();

/// Freeze the discovered record. Fails if discovery already ran.
pub(crate) fn publish(info: SystemInfo) -> Result<()> {
    SYSTEM_INFO
        .set(info)
        .map_err(|_| HostProbeError::config("system info is already initialized"))
}

/// The frozen record, `None` before a successful initialization
pub fn snapshot() -> Option<&'static SystemInfo> {
    SYSTEM_INFO.get()
}

pub fn cpu_count() -> usize {
    snapshot().map_or(0, SystemInfo::cpu_count)
}

pub fn cache_line_size() -> usize {
    snapshot().map_or(0, SystemInfo::cache_line_size)
}

pub fn page_size() -> usize {
    snapshot().map_or(0, SystemInfo::page_size)
}

pub fn huge_page_size() -> u64 {
    snapshot().map_or(0, SystemInfo::huge_page_size)
}

pub fn huge_page_dir() -> Option<&'static Path> {
    snapshot()?.huge_page_dir()
}

pub fn cpu_model(id: usize) -> Option<&'static str> {
    snapshot()?.cpu_model(id)
}

pub fn cpu_freq_max(id: usize) -> u64 {
    snapshot().map_or(0, |info| info.cpu_freq_max(id))
}

/// Current clock frequency of the given logical CPU, sampled live.
/// The sampler's result is forwarded unchanged.
pub fn cpu_freq_current(id: usize) -> u64 {
    freq::cpu_hz_current(id)
}

/// Current clock frequency of the CPU the caller is running on
pub fn cpu_freq_current_on_caller() -> u64 {
    cpu_freq_current(current_cpu_id())
}

fn current_cpu_id() -> usize {
    #[cfg(target_os = "linux")]
    {
        let id = unsafe { libc::sched_getcpu() };
        if id < 0 { 0 } else { id as usize }
    }

    #[cfg(not(target_os = "linux"))]
    {
        0
    }
}
