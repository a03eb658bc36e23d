use std::path::PathBuf;

const HUGETLBFS: &str = "hugetlbfs";

/// Mount point of the first hugetlbfs filesystem in a mount table.
///
/// Each table line must carry at least the device, mount-point and
/// filesystem-type fields; a shorter line aborts the scan and is returned
/// as the error. `Ok(None)` means the table held no hugetlbfs mount.
pub fn hugetlbfs_mount(table: &str) -> Result<Option<PathBuf>, String> {
    for line in table.lines() {
        let mut fields = line.split_whitespace();
        let (Some(_device), Some(mount_point), Some(fstype)) =
            (fields.next(), fields.next(), fields.next())
        else {
            return Err(line.to_string());
        };

        if fstype == HUGETLBFS {
            return Ok(Some(PathBuf::from(mount_point)));
        }
    }

    Ok(None)
}

/// Default huge page size in bytes from a meminfo dump, taken from the
/// `Hugepagesize:<spaces><integer> kB` line. `None` when no such line exists.
pub fn default_huge_page_size(meminfo: &str) -> Option<u64> {
    for line in meminfo.lines() {
        let Some(rest) = line.strip_prefix("Hugepagesize:") else {
            continue;
        };

        let mut fields = rest.split_whitespace();
        match (
            fields.next().and_then(|value| value.parse::<u64>().ok()),
            fields.next(),
        ) {
            (Some(kb), Some("kB")) => return Some(kb * 1024),
            _ => continue,
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn finds_hugetlbfs_mount_point() {
        let table = "\
sysfs /sys sysfs rw,nosuid,nodev,noexec,relatime 0 0
proc /proc proc rw,nosuid,nodev,noexec,relatime 0 0
none /dev/hugepages hugetlbfs rw 0 0
tmpfs /run tmpfs rw,nosuid,nodev 0 0
";
        let dir = hugetlbfs_mount(table).unwrap();
        assert_eq!(dir.as_deref(), Some(Path::new("/dev/hugepages")));
    }

    #[test]
    fn first_hugetlbfs_mount_wins() {
        let table = "\
none /dev/hugepages hugetlbfs rw 0 0
none /mnt/huge1g hugetlbfs rw,pagesize=1G 0 0
";
        let dir = hugetlbfs_mount(table).unwrap();
        assert_eq!(dir.as_deref(), Some(Path::new("/dev/hugepages")));
    }

    #[test]
    fn table_without_hugetlbfs_yields_none() {
        let table = "proc /proc proc rw 0 0\ntmpfs /run tmpfs rw 0 0\n";
        assert_eq!(hugetlbfs_mount(table).unwrap(), None);
    }

    #[test]
    fn short_line_aborts_the_scan() {
        let table = "proc /proc proc rw 0 0\nnone /dev/hugepages\n";
        let err = hugetlbfs_mount(table).unwrap_err();
        assert_eq!(err, "none /dev/hugepages");
    }

    #[test]
    fn hugepage_size_converts_kb_to_bytes() {
        let meminfo = "\
MemTotal:       65724244 kB
MemFree:        41990208 kB
Hugepagesize:       2048 kB
DirectMap4k:      333500 kB
";
        assert_eq!(default_huge_page_size(meminfo), Some(2_097_152));
    }

    #[test]
    fn gigabyte_pages_convert_too() {
        assert_eq!(
            default_huge_page_size("Hugepagesize:    1048576 kB\n"),
            Some(1024 * 1024 * 1024)
        );
    }

    #[test]
    fn missing_line_yields_none() {
        assert_eq!(default_huge_page_size("MemTotal: 65724244 kB\n"), None);
    }

    #[test]
    fn malformed_value_or_unit_is_skipped() {
        assert_eq!(default_huge_page_size("Hugepagesize: two kB\n"), None);
        assert_eq!(default_huge_page_size("Hugepagesize: 2048 MB\n"), None);
        assert_eq!(default_huge_page_size("Hugepagesize: 2048\n"), None);
    }
}
