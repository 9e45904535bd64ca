//! URL capture log for `get_url` steps.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::vars::VariableMap;

/// Append one capture line to `file` under `dir`, creating parents as needed.
///
/// The file stem gets a `_YYYYMMDD` suffix so captures within a day append to
/// one file and the log stays append-only across runs. The line format is
/// `YYYY-MM-DD HH:MM:SS: url`, prefixed with `FIRST_NAME LAST_NAME - ` when
/// both variables are present.
pub fn append_capture(
    dir: &Path,
    file: &str,
    vars: &VariableMap,
    url: &str,
    now: DateTime<Local>,
) -> std::io::Result<PathBuf> {
    let path = dir.join(dated_filename(file, now));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let name_prefix = match (vars.get("FIRST_NAME"), vars.get("LAST_NAME")) {
        (Some(first), Some(last)) => format!("{} {} - ", first, last),
        _ => String::new(),
    };
    let line = format!(
        "{}: {}{}\n",
        now.format("%Y-%m-%d %H:%M:%S"),
        name_prefix,
        url
    );

    let mut handle = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)?;
    handle.write_all(line.as_bytes())?;
    Ok(path)
}

fn dated_filename(file: &str, now: DateTime<Local>) -> String {
    let date = now.format("%Y%m%d");
    match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, date, ext),
        _ => format!("{}_{}", file, date),
    }
}
