use std::env;
use std::path::{Path, PathBuf};

use hostprobe::utils::{format_bytes, format_hz};
use hostprobe::{Platform, ProbeConfig, info, probe};

fn main() {
    pretty_env_logger::init();

    let config = match config_from_args() {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(2);
        }
    };

    if let Err(err) = probe::initialize_with(&config, &Platform::native()) {
        eprintln!("hostprobe error: {err}");
        std::process::exit(1);
    }

    print_report();
}

fn config_from_args() -> Result<ProbeConfig, String> {
    let mut config_path: Option<PathBuf> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Err(usage()),
            "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| "Missing value for --config\n\n".to_string() + &usage())?;
                config_path = Some(PathBuf::from(value));
            }
            _ => return Err(format!("Unknown argument: {arg}\n\n{}", usage())),
        }
    }

    match config_path {
        Some(path) => ProbeConfig::from_path(&path).map_err(|err| err.to_string()),
        None => Ok(ProbeConfig::default()),
    }
}

fn usage() -> String {
    [
        "Usage: hostprobe [options]",
        "",
        "Discovers host characteristics and prints the frozen record.",
        "",
        "Options:",
        "  --config <path>    TOML file overriding descriptor source paths",
        "  -h, --help         Show this help",
        "",
        "Example config.toml:",
        "  cpuinfo = \"/proc/cpuinfo\"",
        "  mounts = \"/proc/mounts\"",
        "  meminfo = \"/proc/meminfo\"",
        "  coherency_line_size = \"/sys/devices/system/cpu/cpu0/cache/index0/coherency_line_size\"",
    ]
    .join("\n")
}

fn print_report() {
    println!("cpu count:        {}", info::cpu_count());
    println!(
        "cpu 0 model:      {}",
        info::cpu_model(0).unwrap_or("unknown")
    );
    println!(
        "cpu 0 freq max:   {}",
        freq_label(info::cpu_freq_max(0))
    );
    println!(
        "cpu 0 freq now:   {}",
        freq_label(info::cpu_freq_current(0))
    );
    println!("cache line size:  {} B", info::cache_line_size());
    println!(
        "page size:        {}",
        format_bytes(info::page_size() as u64)
    );
    println!(
        "huge page size:   {}",
        size_label(info::huge_page_size())
    );
    println!(
        "huge page dir:    {}",
        info::huge_page_dir()
            .unwrap_or(Path::new("-"))
            .display()
    );
}

fn freq_label(hz: u64) -> String {
    if hz == 0 {
        "unknown".to_string()
    } else {
        format_hz(hz)
    }
}

fn size_label(bytes: u64) -> String {
    if bytes == 0 {
        "unknown".to_string()
    } else {
        format_bytes(bytes)
    }
}
