pub fn format_bytes(bytes: u64) -> String {
    const UNIT: f64 = 1024.0;
    let bytes = bytes as f64;

    if bytes < UNIT {
        return format!("{bytes:.0} B");
    }

    let kb = bytes / UNIT;
    if kb < UNIT {
        return format!("{kb:.1} KiB");
    }

    let mb = kb / UNIT;
    if mb < UNIT {
        return format!("{mb:.1} MiB");
    }

    let gb = mb / UNIT;
    format!("{gb:.1} GiB")
}

pub fn format_hz(hz: u64) -> String {
    const UNIT: f64 = 1000.0;
    let hz = hz as f64;

    if hz < UNIT {
        return format!("{hz:.0} Hz");
    }

    let khz = hz / UNIT;
    if khz < UNIT {
        return format!("{khz:.1} kHz");
    }

    let mhz = khz / UNIT;
    if mhz < UNIT {
        return format!("{mhz:.1} MHz");
    }

    let ghz = mhz / UNIT;
    format!("{ghz:.2} GHz")
}
