//! Output directory and file name composition.

use std::path::{Path, PathBuf};

use radx_model::{RadxTime, Sweep, Volume};

use crate::config::{FileNameMode, WriterConfig};

/// Replace characters that are awkward in file names.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_whitespace() || c == '/' { '_' } else { c })
        .collect()
}

/// Output directory for a file time, with optional year and day levels.
pub fn compose_dir(
    base: &Path,
    file_time: &RadxTime,
    add_year_dir: bool,
    add_day_dir: bool,
) -> PathBuf {
    let mut dir = base.to_path_buf();
    if add_year_dir {
        dir.push(file_time.year_dir());
    }
    if add_day_dir {
        dir.push(file_time.day_dir());
    }
    dir
}

/// Time used for the directory, rounded to the millisecond the same way
/// as the file name.
pub fn file_time(vol: &Volume, config: &WriterConfig) -> RadxTime {
    let time = match config.file_name_mode {
        FileNameMode::EndOnly => vol.end_time,
        FileNameMode::StartAndEnd | FileNameMode::StartOnly => vol.start_time,
    };
    let (secs, _) = time.rounded_millis();
    RadxTime::from_secs(secs)
}

/// `YYYYMMDD_HHMMSS[.mmm]`, milliseconds rounded with carry.
fn time_token(time: &RadxTime, config: &WriterConfig) -> String {
    let (secs, millis) = time.rounded_millis();
    let sep = if config.hyphen_datetime { '-' } else { '_' };
    let base = RadxTime::from_secs(secs).compact(sep);
    if config.include_subsecs {
        format!("{}.{:03}", base, millis)
    } else {
        base
    }
}

fn time_range_token(vol: &Volume, config: &WriterConfig) -> String {
    match config.file_name_mode {
        FileNameMode::StartAndEnd => format!(
            "{}_to_{}",
            time_token(&vol.start_time, config),
            time_token(&vol.end_time, config)
        ),
        FileNameMode::StartOnly => time_token(&vol.start_time, config),
        FileNameMode::EndOnly => time_token(&vol.end_time, config),
    }
}

/// File name for a whole volume.
pub fn compose_file_name(vol: &Volume, config: &WriterConfig) -> String {
    let mut name = config.file_prefix.clone();
    name.push_str(&time_range_token(vol, config));

    if config.include_instrument_name && !vol.instrument_name.is_empty() {
        name.push('_');
        name.push_str(&vol.instrument_name);
    }
    if config.include_site_name && !vol.site_name.is_empty() {
        name.push('_');
        name.push_str(&vol.site_name);
    }
    if config.include_volume_number && vol.volume_number >= 0 {
        name.push_str(&format!("_v{}", vol.volume_number));
    }
    if config.include_scan_name
        && !vol.scan_name.is_empty()
        && !vol.scan_name.to_lowercase().contains("default")
    {
        name.push('_');
        name.push_str(&vol.scan_name);
    }
    if config.include_scan_type {
        name.push('_');
        name.push_str(vol.predominant_sweep_mode().short_str());
    }

    name.push_str(&config.file_suffix);
    name.push_str(config.format.extension());
    sanitize_file_name(&name)
}

/// File name for a single-sweep volume in split mode.
///
/// Encodes volume number, sweep number, fixed angle and sweep mode; the
/// instrument name is cut to four characters.
pub fn compose_sweep_file_name(vol: &Volume, sweep: &Sweep, config: &WriterConfig) -> String {
    let mut name = config.file_prefix.clone();
    name.push_str(&time_range_token(vol, config));

    if !vol.instrument_name.is_empty() {
        let short: String = vol.instrument_name.chars().take(4).collect();
        name.push('_');
        name.push_str(&short);
    }

    let angle_label = if sweep.sweep_mode.is_rhi_like() { "az" } else { "el" };
    name.push_str(&format!(
        "_v{}_s{:02}_{}{:.2}_{}",
        vol.volume_number,
        sweep.sweep_number,
        angle_label,
        sweep.fixed_angle_deg,
        sweep.sweep_mode.short_str()
    ));

    name.push_str(&config.file_suffix);
    name.push_str(config.format.extension());
    sanitize_file_name(&name)
}
