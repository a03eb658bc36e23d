use std::fs;
use std::path::Path;

use crate::info::CACHE_LINE_SIZE;

/// Where the cache line size comes from on this build.
///
/// `Sysfs` reads the cpu0/index0 coherency-line-size file; architectures
/// that do not expose that hierarchy use `Fixed`. Both variants stay
/// compiled on every target, only [`crate::probe::Platform::native`] picks
/// one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLineSource {
    Sysfs,
    Fixed(usize),
}

impl CacheLineSource {
    /// Detected cache line size in bytes. An unreadable sysfs file falls
    /// back to the compiled default; unparseable content yields 0, which the
    /// orchestrator treats as a failed probe.
    pub fn detect(&self, coherency_file: &Path) -> usize {
        match self {
            CacheLineSource::Fixed(size) => *size,
            CacheLineSource::Sysfs => match fs::read_to_string(coherency_file) {
                Ok(text) => coherency_line_size(&text).unwrap_or(0),
                Err(_) => CACHE_LINE_SIZE,
            },
        }
    }
}

/// First line of a coherency-line-size file as an unsigned byte count
pub fn coherency_line_size(text: &str) -> Option<usize> {
    text.lines().next()?.trim().parse().ok()
}
