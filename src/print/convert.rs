use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

use crate::error::{OrderError, Result};

/// Upper bound for one conversion run
pub const CONVERSION_TIMEOUT: Duration = Duration::from_secs(30);

/// LibreOffice executable to run: a known install location when one exists,
/// else a name looked up on PATH.
pub fn find_converter() -> PathBuf {
    let (candidates, fallback): (&[&str], &str) = if cfg!(target_os = "windows") {
        (
            &[
                r"C:\Program Files\LibreOffice\program\soffice.exe",
                r"C:\Program Files (x86)\LibreOffice\program\soffice.exe",
            ],
            "soffice",
        )
    } else if cfg!(target_os = "macos") {
        (
            &["/Applications/LibreOffice.app/Contents/MacOS/soffice"],
            "libreoffice",
        )
    } else {
        (&[], "libreoffice")
    };

    candidates
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .unwrap_or_else(|| PathBuf::from(fallback))
}

/// Convert `spreadsheet` to PDF inside `out_dir` and return the PDF path.
///
/// A missing tool, a failing run and a run exceeding `timeout` are reported
/// as distinct errors; none of them is retried.
pub fn convert_to_pdf(converter: &Path, spreadsheet: &Path, out_dir: &Path, timeout: Duration) -> Result<PathBuf> {
    let spreadsheet = absolute(spreadsheet)?;
    let out_dir = absolute(out_dir)?;
    let stem = spreadsheet
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let pdf_path = out_dir.join(format!("{stem}.pdf"));

    let mut child = Command::new(converter)
        .arg("--headless")
        .args(["--convert-to", "pdf"])
        .arg("--outdir")
        .arg(&out_dir)
        .arg(&spreadsheet)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                OrderError::ConverterNotFound(converter.display().to_string())
            } else {
                OrderError::Io(e)
            }
        })?;

    // Drained on its own thread so a chatty converter never blocks on a full pipe
    let stderr_reader = child.stderr.take().map(|mut stream| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            let _ = stream.read_to_end(&mut buffer);
            String::from_utf8_lossy(&buffer).into_owned()
        })
    });

    let status = match child.wait_timeout(timeout)? {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            warn!(converter = %converter.display(), "conversion timed out");
            return Err(OrderError::ConversionTimeout(timeout.as_secs()));
        }
    };

    let stderr = stderr_reader
        .and_then(|reader| reader.join().ok())
        .unwrap_or_default();

    if !status.success() {
        return Err(OrderError::ConversionFailed(format!(
            "{} exited with {}: {}",
            converter.display(),
            status,
            stderr.trim()
        )));
    }

    if !pdf_path.exists() {
        return Err(OrderError::ConversionFailed(format!(
            "no PDF was produced. {}",
            stderr.trim()
        )));
    }

    debug!(pdf = %pdf_path.display(), "converted printout");
    Ok(pdf_path)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_tool_is_reported_as_not_found() {
        let temp = TempDir::new().unwrap();
        let ods = temp.path().join("x.ods");
        std::fs::write(&ods, "").unwrap();

        let err = convert_to_pdf(
            Path::new("definitely-not-a-converter-binary"),
            &ods,
            temp.path(),
            Duration::from_secs(1),
        )
        .unwrap_err();

        assert!(matches!(err, OrderError::ConverterNotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn failing_tool_is_reported_with_status() {
        let temp = TempDir::new().unwrap();
        let ods = temp.path().join("x.ods");
        std::fs::write(&ods, "").unwrap();

        let err = convert_to_pdf(Path::new("false"), &ods, temp.path(), Duration::from_secs(5))
            .unwrap_err();

        assert!(matches!(err, OrderError::ConversionFailed(_)));
    }

    #[cfg(unix)]
    #[test]
    fn successful_run_without_pdf_is_a_failure() {
        let temp = TempDir::new().unwrap();
        let ods = temp.path().join("x.ods");
        std::fs::write(&ods, "").unwrap();

        let err = convert_to_pdf(Path::new("true"), &ods, temp.path(), Duration::from_secs(5))
            .unwrap_err();

        assert!(err.to_string().contains("no PDF was produced"));
    }

    #[cfg(unix)]
    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn slow_tool_is_killed_after_timeout() {
        let temp = TempDir::new().unwrap();
        let ods = temp.path().join("x.ods");
        std::fs::write(&ods, "").unwrap();
        let converter = script(temp.path(), "slow.sh", "sleep 5");

        let err = convert_to_pdf(&converter, &ods, temp.path(), Duration::from_secs(1)).unwrap_err();

        assert!(matches!(err, OrderError::ConversionTimeout(1)));
    }

    #[cfg(unix)]
    #[test]
    fn noisy_tool_does_not_stall_on_stderr() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        let ods = temp.path().join("x.ods");
        std::fs::write(&ods, "").unwrap();
        // Arguments: --headless --convert-to pdf --outdir <dir> <file>
        let converter = script(
            temp.path(),
            "noisy.sh",
            "head -c 200000 /dev/zero | tr '\\000' 'x' >&2\ntouch \"$4/x.pdf\"",
        );

        let pdf = convert_to_pdf(&converter, &ods, &out, Duration::from_secs(20)).unwrap();

        assert_eq!(pdf, out.join("x.pdf"));
    }
}
