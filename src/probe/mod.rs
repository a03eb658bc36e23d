mod cache;
pub mod cpuinfo;
pub mod freq;
mod hugepage;

pub use cache::CacheLineSource;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::{debug, warn};

use crate::config::ProbeConfig;
use crate::error::{HostProbeError, Result};
use crate::info::{self, CACHE_LINE_SIZE, DEFAULT_PAGE_SIZE, SystemInfo};
use cpuinfo::CpuRecords;

/// Whether this build depends on huge-page-backed shared memory.
///
/// `Required` builds query the OS page size and must find a hugetlbfs mount
/// during discovery; `BestEffort` builds use the compiled page size and only
/// pick up the default huge page size when the kernel reports one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HugePagePolicy {
    Required,
    BestEffort,
}

/// Probe capabilities of the platform discovery runs on, selected once per
/// build so the discovery sequence itself is written only against the
/// capability interface.
#[derive(Debug, Clone, Copy)]
pub struct Platform {
    pub cache_line: CacheLineSource,
    pub huge_pages: HugePagePolicy,
}

impl Platform {
    pub fn native() -> Self {
        let cache_line = if cfg!(any(
            target_arch = "x86_64",
            target_arch = "x86",
            target_arch = "powerpc64"
        )) {
            CacheLineSource::Sysfs
        } else {
            CacheLineSource::Fixed(CACHE_LINE_SIZE)
        };

        let huge_pages = if cfg!(feature = "hugetlb") {
            HugePagePolicy::Required
        } else {
            HugePagePolicy::BestEffort
        };

        Self {
            cache_line,
            huge_pages,
        }
    }
}

/// Number of logical CPUs installed at boot, queried once and memoized
pub fn installed_cpus() -> usize {
    static INSTALLED: OnceLock<usize> = OnceLock::new();
    *INSTALLED.get_or_init(|| {
        let count = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_CONF) };
        if count < 0 { 0 } else { count as usize }
    })
}

/// Run discovery against the live kernel files and freeze the result
/// process-wide. Must be called exactly once, before any reader; a second
/// call fails.
pub fn initialize() -> Result<()> {
    initialize_with(&ProbeConfig::default(), &Platform::native())
}

/// [`initialize`] with explicit descriptor paths and platform capabilities
pub fn initialize_with(config: &ProbeConfig, platform: &Platform) -> Result<()> {
    let discovered = discover(config, platform)?;
    info::publish(discovered)
}

/// Build a [`SystemInfo`] record without touching process-wide state
pub fn discover(config: &ProbeConfig, platform: &Platform) -> Result<SystemInfo> {
    discover_with_cpu_count(config, platform, installed_cpus())
}

fn discover_with_cpu_count(
    config: &ProbeConfig,
    platform: &Platform,
    cpu_count: usize,
) -> Result<SystemInfo> {
    let page_size = match platform.huge_pages {
        HugePagePolicy::Required => os_page_size()?,
        HugePagePolicy::BestEffort => DEFAULT_PAGE_SIZE,
    };

    let huge_page_dir = match platform.huge_pages {
        HugePagePolicy::Required => Some(locate_hugetlbfs_mount(&config.mounts)?),
        HugePagePolicy::BestEffort => None,
    };

    let text = fs::read_to_string(&config.cpuinfo)
        .map_err(|err| HostProbeError::io(&config.cpuinfo, err))?;
    let mut cpus = CpuRecords::new();
    let parser = cpuinfo::native_parser();
    parser.parse(&text, &mut cpus);
    debug!("parsed processor descriptors with the {} parser", parser.name());

    if cpu_count == 0 {
        return Err(HostProbeError::probe("no logical CPUs reported at boot"));
    }

    let cache_line_size = platform.cache_line.detect(&config.coherency_line_size);
    if cache_line_size == 0 {
        return Err(HostProbeError::probe(format!(
            "cache line size probe returned 0 ({})",
            config.coherency_line_size.display()
        )));
    }
    if cache_line_size != CACHE_LINE_SIZE {
        return Err(HostProbeError::Consistency {
            detected: cache_line_size,
            expected: CACHE_LINE_SIZE,
        });
    }

    let default_huge_page_size = read_default_huge_page_size(&config.meminfo);

    Ok(SystemInfo {
        cpu_count,
        cache_line_size,
        page_size,
        default_huge_page_size,
        huge_page_dir,
        cpus,
    })
}

fn os_page_size() -> Result<usize> {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size <= 0 {
        return Err(HostProbeError::config(format!(
            "sysconf(_SC_PAGESIZE) reported {size}"
        )));
    }
    Ok(size as usize)
}

fn locate_hugetlbfs_mount(mounts: &Path) -> Result<PathBuf> {
    let table = fs::read_to_string(mounts).map_err(|err| HostProbeError::io(mounts, err))?;

    match hugepage::hugetlbfs_mount(&table) {
        Ok(Some(dir)) => {
            debug!("found huge page dir: {}", dir.display());
            Ok(dir)
        }
        Ok(None) => Err(HostProbeError::not_found(format!(
            "no hugetlbfs mount in {}; mount hugetlbfs first",
            mounts.display()
        ))),
        Err(line) => Err(HostProbeError::parse(mounts, line)),
    }
}

// Huge pages are an optimization; a missing or unparseable meminfo source
// downgrades to "unknown", never to a failed init.
fn read_default_huge_page_size(meminfo: &Path) -> u64 {
    let text = match fs::read_to_string(meminfo) {
        Ok(text) => text,
        Err(err) => {
            warn!("unable to read {}: {err}", meminfo.display());
            return 0;
        }
    };

    match hugepage::default_huge_page_size(&text) {
        Some(bytes) => {
            debug!("default huge page size is {bytes} bytes");
            bytes
        }
        None => {
            warn!("no Hugepagesize line in {}", meminfo.display());
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CPUINFO_FIXTURE: &str = "\
processor\t: 0
vendor_id\t: GenuineIntel
model name\t: Intel(R) Xeon(R) CPU E5-2697 v3 @ 2.60GHz

processor\t: 1
vendor_id\t: GenuineIntel
model name\t: Intel(R) Xeon(R) CPU E5-2697 v3 @ 2.60GHz
";

    const MEMINFO_FIXTURE: &str = "\
MemTotal:       65724244 kB
Hugepagesize:       2048 kB
";

    const MOUNTS_FIXTURE: &str = "\
proc /proc proc rw,nosuid,nodev,noexec,relatime 0 0
none /dev/hugepages hugetlbfs rw 0 0
";

    struct Fixture {
        dir: TempDir,
        config: ProbeConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let mut fixture = Self {
                config: ProbeConfig::default(),
                dir,
            };
            fixture.config.cpuinfo = fixture.write("cpuinfo", CPUINFO_FIXTURE);
            fixture.config.meminfo = fixture.write("meminfo", MEMINFO_FIXTURE);
            fixture.config.mounts = fixture.write("mounts", MOUNTS_FIXTURE);
            fixture.config.coherency_line_size = fixture.write("coherency_line_size", "64\n");
            fixture
        }

        fn write(&self, name: &str, content: &str) -> PathBuf {
            let path = self.dir.path().join(name);
            fs::write(&path, content).unwrap();
            path
        }
    }

    fn best_effort() -> Platform {
        Platform {
            cache_line: CacheLineSource::Sysfs,
            huge_pages: HugePagePolicy::BestEffort,
        }
    }

    fn required() -> Platform {
        Platform {
            cache_line: CacheLineSource::Sysfs,
            huge_pages: HugePagePolicy::Required,
        }
    }

    #[test]
    fn discover_populates_the_whole_record() {
        let fixture = Fixture::new();
        let info = discover_with_cpu_count(&fixture.config, &best_effort(), 2).unwrap();

        assert_eq!(info.cpu_count(), 2);
        assert_eq!(info.cache_line_size(), CACHE_LINE_SIZE);
        assert_eq!(info.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(info.huge_page_size(), 2 * 1024 * 1024);
        assert_eq!(info.huge_page_dir(), None);
        assert_eq!(
            info.cpu_model(1),
            Some("Intel(R) Xeon(R) CPU E5-2697 v3 @ 2.60GHz")
        );
        assert_eq!(info.cpu_freq_max(1), 2_600_000_000);
    }

    #[test]
    fn cache_line_mismatch_is_fatal() {
        let fixture = Fixture::new();
        fixture.write("coherency_line_size", "128\n");

        let err = discover_with_cpu_count(&fixture.config, &best_effort(), 2).unwrap_err();
        assert!(matches!(
            err,
            HostProbeError::Consistency {
                detected: 128,
                expected: CACHE_LINE_SIZE,
            }
        ));
    }

    #[test]
    fn fixed_probe_mismatch_is_fatal_too() {
        let fixture = Fixture::new();
        let platform = Platform {
            cache_line: CacheLineSource::Fixed(128),
            huge_pages: HugePagePolicy::BestEffort,
        };

        let err = discover_with_cpu_count(&fixture.config, &platform, 2).unwrap_err();
        assert!(matches!(err, HostProbeError::Consistency { .. }));
    }

    #[test]
    fn absent_coherency_file_falls_back_to_compiled_default() {
        let fixture = Fixture::new();
        fs::remove_file(&fixture.config.coherency_line_size).unwrap();

        let info = discover_with_cpu_count(&fixture.config, &best_effort(), 2).unwrap();
        assert_eq!(info.cache_line_size(), CACHE_LINE_SIZE);
    }

    #[test]
    fn unparseable_coherency_content_fails_the_probe() {
        let fixture = Fixture::new();
        fixture.write("coherency_line_size", "not a number\n");

        let err = discover_with_cpu_count(&fixture.config, &best_effort(), 2).unwrap_err();
        assert!(matches!(err, HostProbeError::Probe { .. }));
    }

    #[test]
    fn missing_cpuinfo_is_an_io_error() {
        let fixture = Fixture::new();
        fs::remove_file(&fixture.config.cpuinfo).unwrap();

        let err = discover_with_cpu_count(&fixture.config, &best_effort(), 2).unwrap_err();
        assert!(matches!(err, HostProbeError::Io { .. }));
    }

    #[test]
    fn zero_cpu_count_fails_the_probe() {
        let fixture = Fixture::new();
        let err = discover_with_cpu_count(&fixture.config, &best_effort(), 0).unwrap_err();
        assert!(matches!(err, HostProbeError::Probe { .. }));
    }

    #[test]
    fn required_platform_records_the_hugetlbfs_mount() {
        let fixture = Fixture::new();
        let info = discover_with_cpu_count(&fixture.config, &required(), 2).unwrap();

        assert_eq!(info.huge_page_dir(), Some(Path::new("/dev/hugepages")));
        // page size came from the OS, not the compiled constant
        assert!(info.page_size() > 0);
    }

    #[test]
    fn required_platform_without_a_mount_is_not_found() {
        let fixture = Fixture::new();
        fixture.write("mounts", "proc /proc proc rw 0 0\n");

        let err = discover_with_cpu_count(&fixture.config, &required(), 2).unwrap_err();
        assert!(matches!(err, HostProbeError::NotFound { .. }));
    }

    #[test]
    fn malformed_mount_line_is_a_parse_error() {
        let fixture = Fixture::new();
        fixture.write("mounts", "none /dev/hugepages\n");

        let err = discover_with_cpu_count(&fixture.config, &required(), 2).unwrap_err();
        assert!(
            matches!(err, HostProbeError::Parse { line, .. } if line == "none /dev/hugepages")
        );
    }

    #[test]
    fn missing_hugepagesize_line_is_not_fatal() {
        let fixture = Fixture::new();
        fixture.write("meminfo", "MemTotal: 65724244 kB\n");

        let info = discover_with_cpu_count(&fixture.config, &best_effort(), 2).unwrap();
        assert_eq!(info.huge_page_size(), 0);
    }

    #[test]
    fn missing_meminfo_file_is_not_fatal() {
        let fixture = Fixture::new();
        fs::remove_file(&fixture.config.meminfo).unwrap();

        let info = discover_with_cpu_count(&fixture.config, &best_effort(), 2).unwrap();
        assert_eq!(info.huge_page_size(), 0);
    }

    #[test]
    fn installed_cpus_reports_at_least_one() {
        assert!(installed_cpus() >= 1);
    }
}
