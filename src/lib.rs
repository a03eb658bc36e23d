pub mod config;
pub mod error;
pub mod info;
pub mod probe;
pub mod utils;

pub use config::ProbeConfig;
pub use error::{HostProbeError, Result};
pub use info::{CACHE_LINE_SIZE, DEFAULT_PAGE_SIZE, MAX_SUPPORTED_CPUS, SystemInfo};
pub use probe::{CacheLineSource, HugePagePolicy, Platform, initialize, initialize_with};
