use std::path::Path;
use std::process::Command;
use tracing::{info, warn};

use crate::error::{OrderError, Result};

/// How a printout finally reached the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Sent straight to the default printer
    Printed,
    /// Opened with the platform's viewer command
    Viewer,
    /// Opened through the generic desktop opener
    Opened,
}

/// Print `path` on the default printer, falling back to opening it in the
/// platform viewer and then through the generic opener. Each step is tried
/// once; when all fail the error carries the on-disk path.
pub fn print_or_open(path: &Path) -> Result<Delivery> {
    let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

    match print_direct(&path) {
        Ok(()) => {
            info!(path = %path.display(), "sent to printer");
            return Ok(Delivery::Printed);
        }
        Err(reason) => warn!(path = %path.display(), %reason, "direct print failed, opening instead"),
    }

    match open_in_viewer(&path) {
        Ok(()) => return Ok(Delivery::Viewer),
        Err(reason) => warn!(path = %path.display(), %reason, "viewer failed, trying generic opener"),
    }

    open::that(&path).map_err(|e| OrderError::OpenFailed {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    Ok(Delivery::Opened)
}

fn print_direct(path: &Path) -> std::result::Result<(), String> {
    #[cfg(target_os = "windows")]
    let mut command = {
        let mut command = Command::new("powershell");
        command.args(["-NoProfile", "-Command", "Start-Process", "-Verb", "Print", "-FilePath"]);
        command.arg(path);
        command
    };

    #[cfg(not(target_os = "windows"))]
    let mut command = {
        let mut command = Command::new("lpr");
        command.arg(path);
        command
    };

    run(&mut command)
}

fn open_in_viewer(path: &Path) -> std::result::Result<(), String> {
    #[cfg(target_os = "windows")]
    let mut command = {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]);
        command.arg(path);
        command
    };

    #[cfg(target_os = "macos")]
    let mut command = {
        let mut command = Command::new("open");
        command.arg(path);
        command
    };

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let mut command = {
        let mut command = Command::new("xdg-open");
        command.arg(path);
        command
    };

    run(&mut command)
}

fn run(command: &mut Command) -> std::result::Result<(), String> {
    let output = command.output().map_err(|e| e.to_string())?;
    if output.status.success() {
        Ok(())
    } else {
        Err(format!(
            "exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ))
    }
}
