use std::fs;

use crate::config;

/// Current clock frequency of a logical CPU in Hz, sampled from the live
/// kernel counters. Returns 0 when neither source reports a value.
///
/// cpufreq's `scaling_cur_freq` is preferred; kernels without cpufreq still
/// publish a per-core `cpu MHz` field in the processor descriptor.
pub fn cpu_hz_current(id: usize) -> u64 {
    if let Some(khz) = scaling_cur_khz(id) {
        return khz * 1000;
    }

    match fs::read_to_string(config::CPUINFO_PATH) {
        Ok(text) => cpu_mhz_field(&text, id).unwrap_or(0),
        Err(_) => 0,
    }
}

fn scaling_cur_khz(id: usize) -> Option<u64> {
    let path = format!("/sys/devices/system/cpu/cpu{id}/cpufreq/scaling_cur_freq");
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// `cpu MHz` field of the given core in a processor descriptor dump, in Hz
pub fn cpu_mhz_field(cpuinfo: &str, id: usize) -> Option<u64> {
    let mut core = None;

    for line in cpuinfo.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        match key.trim() {
            "processor" => core = value.trim().parse::<usize>().ok(),
            "cpu MHz" if core == Some(id) => {
                let mhz: f64 = value.trim().parse().ok()?;
                return Some((mhz * 1_000_000.0).round() as u64);
            }
            _ => {}
        }
    }

    None
}
