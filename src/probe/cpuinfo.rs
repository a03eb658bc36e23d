use crate::info::MAX_SUPPORTED_CPUS;

/// Per-CPU fields extracted from the processor descriptor source.
///
/// Writes through this type are bounds-checked, so a parser can never place
/// a record beyond [`MAX_SUPPORTED_CPUS`]; out-of-range ids are silently
/// dropped per the parser contract.
#[derive(Debug, Default)]
pub struct CpuRecords {
    hz_max: Vec<u64>,
    model: Vec<Option<String>>,
}

impl CpuRecords {
    pub fn new() -> Self {
        Self {
            hz_max: vec![0; MAX_SUPPORTED_CPUS],
            model: vec![None; MAX_SUPPORTED_CPUS],
        }
    }

    pub fn record_model(&mut self, id: usize, model: &str) {
        if let Some(slot) = self.model.get_mut(id) {
            *slot = Some(model.to_string());
        }
    }

    pub fn record_hz_max(&mut self, id: usize, hz: u64) {
        if let Some(slot) = self.hz_max.get_mut(id) {
            *slot = hz;
        }
    }

    pub fn model(&self, id: usize) -> Option<&str> {
        self.model.get(id)?.as_deref()
    }

    pub fn hz_max(&self, id: usize) -> u64 {
        self.hz_max.get(id).copied().unwrap_or(0)
    }
}

/// Trait for architecture-specific processor descriptor parsers.
/// Each parser understands the field layout its kernel arch emits.
pub trait CpuInfoParser: Send + Sync {
    /// Human-readable name of this parser
    fn name(&self) -> &'static str;

    /// Extract per-core model and frequency fields from the descriptor text
    fn parse(&self, cpuinfo: &str, records: &mut CpuRecords);
}

/// Parser for the x86 descriptor layout: per-core `processor` and
/// `model name` fields, with the nominal frequency embedded in the model
/// name after an `@` sign.
pub struct X86Parser;

impl CpuInfoParser for X86Parser {
    fn name(&self) -> &'static str {
        "x86"
    }

    fn parse(&self, cpuinfo: &str, records: &mut CpuRecords) {
        let mut core = None;

        for line in cpuinfo.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "processor" => core = value.parse::<usize>().ok(),
                "model name" => {
                    if let Some(id) = core {
                        records.record_model(id, value);
                        if let Some(hz) = nominal_hz(value) {
                            records.record_hz_max(id, hz);
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

/// Fallback parser for descriptor layouts without a per-core frequency
/// field; records the model string and leaves the frequency unknown.
pub struct GenericParser;

impl CpuInfoParser for GenericParser {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn parse(&self, cpuinfo: &str, records: &mut CpuRecords) {
        let mut core = None;

        for line in cpuinfo.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "processor" => core = value.parse::<usize>().ok(),
                "model name" | "cpu model" | "Processor" => {
                    if let Some(id) = core {
                        records.record_model(id, value);
                    }
                }
                _ => {}
            }
        }
    }
}

/// The parser matching the architecture this build targets
pub fn native_parser() -> &'static dyn CpuInfoParser {
    if cfg!(any(target_arch = "x86_64", target_arch = "x86")) {
        &X86Parser
    } else {
        &GenericParser
    }
}

/// Nominal frequency from a model name suffix like `@ 2.60GHz`
fn nominal_hz(model_name: &str) -> Option<u64> {
    let (_, tail) = model_name.rsplit_once('@')?;
    let tail = tail.trim();

    let mhz = if let Some(ghz) = tail.strip_suffix("GHz") {
        ghz.trim().parse::<f64>().ok()? * 1000.0
    } else if let Some(mhz) = tail.strip_suffix("MHz") {
        mhz.trim().parse::<f64>().ok()?
    } else {
        return None;
    };

    if !mhz.is_finite() || mhz <= 0.0 {
        return None;
    }

    Some((mhz.round() as u64) * 1_000_000)
}
