//! External command-line tools (ffprobe, AVB dumper)
//!
//! Tools are located once at startup, in priority order:
//! 1. Explicitly configured path (CLI / TOML)
//! 2. Tool-specific environment variable
//! 3. `PATH` lookup
//! 4. Fixed fallback path, if the tool has one
//!
//! Every invocation runs under a timeout. The child is spawned with
//! `kill_on_drop`, so a timed-out or cancelled call does not leave the
//! process running.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::{Error, Result};

/// Static description of an external tool
#[derive(Debug)]
pub struct ToolSpec {
    /// Executable name used for `PATH` lookup and error messages
    pub name: &'static str,
    /// Environment variable holding an explicit path
    pub env_var: &'static str,
    /// Last-resort absolute path
    pub fallback: Option<&'static str>,
    /// Remediation text returned when the tool cannot be found
    pub hint: &'static str,
}

pub const FFPROBE: ToolSpec = ToolSpec {
    name: "ffprobe",
    env_var: "FFPROBE_PATH",
    fallback: Some("/usr/bin/ffprobe"),
    hint: "ffprobe is part of FFmpeg. Please install FFmpeg or set the FFPROBE_PATH \
           environment variable to the absolute path of the ffprobe executable.",
};

pub const AVB_DUMP: ToolSpec = ToolSpec {
    name: "avb-dump",
    env_var: "MM_AVB_DUMP_PATH",
    fallback: None,
    hint: "AVB bins are read by an external dumper that prints the bin's mobs as tagged JSON. \
           It is not bundled: wrap the pyavb library (pip install pyavb) in a script that \
           opens the bin with avb.open(path) and prints each mob's name, mob_id and \
           properties in the format documented in mm_common::avb. Install it on PATH as \
           'avb-dump' or set MM_AVB_DUMP_PATH to its absolute path.",
};

/// Locate a tool executable, see module docs for the priority order
pub fn locate(spec: &ToolSpec, configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        return Some(path.to_path_buf());
    }

    if let Some(path) = std::env::var_os(spec.env_var).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(path));
    }

    if let Ok(path) = which::which(spec.name) {
        return Some(path);
    }

    spec.fallback
        .map(PathBuf::from)
        .filter(|path| path.exists())
}

/// A located tool plus its per-call timeout
#[derive(Debug, Clone)]
pub struct ExternalTool {
    spec: &'static ToolSpec,
    program: Option<PathBuf>,
    timeout: Duration,
}

impl ExternalTool {
    /// Resolve the executable path and remember it
    pub fn resolve(spec: &'static ToolSpec, configured: Option<&Path>, timeout: Duration) -> Self {
        let program = locate(spec, configured);
        match &program {
            Some(path) => debug!(tool = spec.name, path = %path.display(), "External tool located"),
            None => warn!(tool = spec.name, "External tool not found, requests needing it will fail"),
        }
        Self {
            spec,
            program,
            timeout,
        }
    }

    /// Use a known executable path as-is
    pub fn with_program(spec: &'static ToolSpec, program: PathBuf, timeout: Duration) -> Self {
        Self {
            spec,
            program: Some(program),
            timeout,
        }
    }

    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    pub fn program(&self) -> Option<&Path> {
        self.program.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn missing(&self) -> Error {
        Error::ToolMissing {
            tool: self.spec.name.to_string(),
            hint: self.spec.hint.to_string(),
        }
    }

    /// Run the tool and return its stdout
    pub async fn run<I, S>(&self, args: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let program = self.program.as_ref().ok_or_else(|| self.missing())?;

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                    self.missing()
                }
                _ => Error::Io(e),
            })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    tool = self.spec.name,
                    timeout_secs = self.timeout.as_secs_f64(),
                    "External tool timed out, process killed"
                );
                return Err(Error::ToolTimedOut {
                    tool: self.spec.name.to_string(),
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            warn!(
                tool = self.spec.name,
                code = ?output.status.code(),
                "External tool failed"
            );
            return Err(Error::ToolFailed {
                tool: self.spec.name.to_string(),
                code: output.status.code(),
                stderr,
            });
        }

        debug!(
            tool = self.spec.name,
            stdout_bytes = output.stdout.len(),
            "External tool completed"
        );
        Ok(output.stdout)
    }
}
