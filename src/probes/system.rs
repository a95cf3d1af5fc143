//! Generators backed by the local host.

use crate::probes::BodySource;
use crate::routing::Route;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;
use tracing::{debug, warn};

/// Upper bound on a multi-line command body (8 KB)
pub const MAX_BODY_SIZE: usize = 8192;

/// Why a generator fell back to an error body.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Could not open {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("Could not read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Could not parse {}", path.display())]
    Parse { path: PathBuf },

    #[error("Could not run `{command}`: {source}")]
    Spawn { command: String, source: io::Error },

    #[error("`{command}` produced no output")]
    EmptyOutput { command: String },
}

/// Where the host data lives.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Memory statistics file (default: /proc/meminfo)
    pub meminfo_path: PathBuf,

    /// Load average file (default: /proc/loadavg)
    pub loadavg_path: PathBuf,

    /// Zone passed as `TZ` to `date` and printed after the timestamp
    pub time_zone: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            meminfo_path: PathBuf::from("/proc/meminfo"),
            loadavg_path: PathBuf::from("/proc/loadavg"),
            time_zone: "Asia/Taipei".to_string(),
        }
    }
}

/// The production [`BodySource`].
#[derive(Debug, Clone, Default)]
pub struct SystemProbes {
    config: ProbeConfig,
}

impl SystemProbes {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// `MemTotal:` and `MemFree:` lines from the meminfo file.
    pub fn ram_info(&self) -> Result<String, ProbeError> {
        let path = &self.config.meminfo_path;
        let file = File::open(path).map_err(|source| ProbeError::Open {
            path: path.clone(),
            source,
        })?;
        extract_meminfo(BufReader::new(file)).map_err(|source| ProbeError::Read {
            path: path.clone(),
            source,
        })
    }

    /// First line of `uname -a`.
    pub fn sys_info(&self) -> Result<String, ProbeError> {
        let output = run(Command::new("uname").arg("-a"), "uname -a")?;
        first_line(&output, true).ok_or_else(|| ProbeError::EmptyOutput {
            command: "uname -a".to_string(),
        })
    }

    /// The three load averages, two decimals each.
    pub fn load_avg(&self) -> Result<String, ProbeError> {
        let path = &self.config.loadavg_path;
        let text = std::fs::read_to_string(path).map_err(|source| ProbeError::Open {
            path: path.clone(),
            source,
        })?;
        format_loadavg(&text).ok_or_else(|| ProbeError::Parse { path: path.clone() })
    }

    /// Current time in the configured zone, without a trailing newline.
    pub fn time(&self) -> Result<String, ProbeError> {
        let tz = &self.config.time_zone;
        let format = format!("+%Y-%m-%d %H:%M:%S ({})", tz);
        let output = run(Command::new("date").env("TZ", tz).arg(&format), "date")?;
        first_line(&output, false).ok_or_else(|| ProbeError::EmptyOutput {
            command: "date".to_string(),
        })
    }

    /// Full output of `df -h /`, cut at [`MAX_BODY_SIZE`] on a line boundary.
    pub fn disk_usage(&self) -> Result<String, ProbeError> {
        let output = run(Command::new("df").args(["-h", "/"]), "df -h /")?;
        Ok(cap_lines(&output, MAX_BODY_SIZE))
    }
}

impl BodySource for SystemProbes {
    fn fetch(&self, route: Route) -> String {
        let result = match route {
            Route::RamInfo => self.ram_info(),
            Route::SysInfo => self.sys_info(),
            Route::LoadAvg => self.load_avg(),
            Route::Time => self.time(),
            Route::DiskUsage => self.disk_usage(),
        };

        match result {
            Ok(body) => {
                debug!(route = route.label(), bytes = body.len(), "Generated body");
                body
            }
            Err(e) => {
                warn!(route = route.label(), error = %e, "Data source failed");
                format!("Error: {}", e)
            }
        }
    }
}

/// Runs `command` and returns its stdout. The exit status is not checked;
/// callers decide whether the output is usable.
fn run(command: &mut Command, display: &str) -> Result<String, ProbeError> {
    let output = command.output().map_err(|source| ProbeError::Spawn {
        command: display.to_string(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Keeps the `MemTotal:` line and the `MemFree:` line, stopping at the latter.
fn extract_meminfo<R: BufRead>(reader: R) -> io::Result<String> {
    let mut body = String::new();
    for line in reader.lines() {
        let line = line?;
        if line.starts_with("MemTotal:") {
            body.push_str(&line);
            body.push('\n');
        } else if line.starts_with("MemFree:") {
            body.push_str(&line);
            body.push('\n');
            break;
        }
    }
    Ok(body)
}

fn format_loadavg(text: &str) -> Option<String> {
    let mut fields = text.split_whitespace().map(str::parse::<f32>);
    let one = fields.next()?.ok()?;
    let five = fields.next()?.ok()?;
    let fifteen = fields.next()?.ok()?;

    Some(format!(
        "Server Load Average:\n 1 min: {:.2}\n 5 min: {:.2}\n15 min: {:.2}\n",
        one, five, fifteen
    ))
}

/// First line of `text`, optionally keeping its newline. `None` if empty.
fn first_line(text: &str, keep_newline: bool) -> Option<String> {
    let end = text.find('\n').map(|i| i + 1).unwrap_or(text.len());
    let line = &text[..end];
    if line.trim().is_empty() {
        return None;
    }
    if keep_newline {
        Some(line.to_string())
    } else {
        Some(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Whole lines of `text` while they fit strictly under `max` bytes.
fn cap_lines(text: &str, max: usize) -> String {
    let mut body = String::new();
    for line in text.split_inclusive('\n') {
        if body.len() + line.len() >= max {
            break;
        }
        body.push_str(line);
    }
    body
}
