pub mod layout;
mod settings;

pub use layout::{CellRef, TemplateLayout};
pub use settings::Settings;

use crate::error::{OrderError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const CONFIG_FILE: &str = "config.json";
pub const TEMPLATE_FILE: &str = "template.ods";
pub const LAYOUT_FILE: &str = "layout.toml";

const APP_NAME: &str = "BomboniereMery";
const ORDERS_DIR: &str = "orders";
const QUOTES_DIR: &str = "quotes";
const OUTPUT_DIR: &str = "ordini_stampati";

/// Extensions of generated printouts, removed from the output folder on start
const PRINTOUT_EXTENSIONS: &[&str] = &["ods", "pdf", "bak"];

/// Directory holding the running executable
pub fn exe_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    exe.parent().map(Path::to_path_buf).ok_or_else(|| {
        OrderError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine the executable directory",
        ))
    })
}

/// Bundled resources (template, layout): `<exe_dir>/resources` when present,
/// otherwise the executable directory itself.
pub fn resource_dir() -> Result<PathBuf> {
    let base = exe_dir()?;
    let bundled = base.join("resources");
    if bundled.is_dir() {
        return Ok(bundled);
    }
    Ok(base)
}

/// Platform data directory (e.g. %LOCALAPPDATA%\BomboniereMery)
pub fn default_data_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", APP_NAME) {
        return Ok(proj_dirs.data_local_dir().to_path_buf());
    }

    // Fallback to ~/.bomboniere/
    let home = dirs_home().ok_or_else(|| {
        OrderError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".bomboniere"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Load config.json from `config_dir`.
///
/// Never fails: a missing file is created with defaults, an unreadable one
/// is logged and ignored.
pub fn load_config(config_dir: &Path) -> Settings {
    let path = config_dir.join(CONFIG_FILE);
    if !path.exists() {
        let settings = Settings::default();
        match save_config(config_dir, &settings) {
            Ok(()) => info!(path = %path.display(), "wrote default config"),
            Err(e) => warn!(path = %path.display(), error = %e, "could not write default config"),
        }
        return settings;
    }

    let parsed = fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|content| {
            serde_json::from_str::<Settings>(&content).map_err(|e| e.to_string())
        });

    match parsed {
        Ok(settings) => settings,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "config unreadable, using defaults");
            Settings::default()
        }
    }
}

/// Save config.json. Takes effect on the next start.
pub fn save_config(config_dir: &Path, settings: &Settings) -> Result<()> {
    fs::create_dir_all(config_dir)?;
    let content = serde_json::to_string_pretty(settings)?;
    fs::write(config_dir.join(CONFIG_FILE), content)?;
    Ok(())
}

/// The data root: custom path from the settings, else the platform default.
/// The directory is created if needed; failure to do so is only logged,
/// later writes report their own errors.
pub fn resolve_data_dir(settings: &Settings) -> Result<PathBuf> {
    let dir = match settings.custom_data_path() {
        Some(custom) => expand_path(custom),
        None => default_data_dir()?,
    };

    if let Err(e) = fs::create_dir_all(&dir) {
        warn!(path = %dir.display(), error = %e, "could not create data directory");
    }

    Ok(dir)
}

/// Every location the application reads from or writes to
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub resource_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl AppPaths {
    /// Resolve all locations, loading (or creating) config.json on the way
    pub fn resolve(config_dir: Option<PathBuf>, resource_dir_override: Option<PathBuf>) -> Result<Self> {
        let config_dir = match config_dir {
            Some(dir) => dir,
            None => exe_dir()?,
        };
        let resource_dir = match resource_dir_override {
            Some(dir) => dir,
            None => resource_dir()?,
        };
        let settings = load_config(&config_dir);
        let data_dir = resolve_data_dir(&settings)?;

        debug!(
            config = %config_dir.display(),
            resources = %resource_dir.display(),
            data = %data_dir.display(),
            "resolved paths"
        );

        Ok(Self {
            config_dir,
            resource_dir,
            data_dir,
        })
    }

    pub fn orders_dir(&self) -> PathBuf {
        self.data_dir.join(ORDERS_DIR)
    }

    pub fn quotes_dir(&self) -> PathBuf {
        self.data_dir.join(QUOTES_DIR)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.data_dir.join(OUTPUT_DIR)
    }

    pub fn template_path(&self) -> PathBuf {
        self.resource_dir.join(TEMPLATE_FILE)
    }

    /// Cell layout: `layout.toml` next to the template when present,
    /// otherwise the built-in one. Validated before being returned.
    pub fn load_layout(&self) -> Result<TemplateLayout> {
        let path = self.resource_dir.join(LAYOUT_FILE);
        if !path.exists() {
            return TemplateLayout::builtin();
        }
        let content = fs::read_to_string(&path)?;
        TemplateLayout::from_toml(&content).map_err(|e| match e {
            OrderError::LayoutParse { source, .. } => OrderError::LayoutParse { path, source },
            other => other,
        })
    }
}

/// Remove leftover printouts (.ods, .pdf, .bak) from `dir`. Other files are
/// left alone; failures are logged and skipped.
pub fn purge_output_dir(dir: &Path) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let is_printout = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| PRINTOUT_EXTENSIONS.contains(&ext));
        if !is_printout || !path.is_file() {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => warn!(path = %path.display(), error = %e, "could not remove old printout"),
        }
    }

    if removed > 0 {
        debug!(dir = %dir.display(), removed, "purged output directory");
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn first_run_writes_default_config() {
        let temp = TempDir::new().unwrap();

        let settings = load_config(temp.path());

        assert_eq!(settings, Settings::default());
        let written = fs::read_to_string(temp.path().join(CONFIG_FILE)).unwrap();
        assert!(written.contains("\"custom_data_path\": \"\""));
    }

    #[test]
    fn corrupt_config_falls_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "{ not json").unwrap();

        assert_eq!(load_config(temp.path()), Settings::default());
    }

    #[test]
    fn custom_data_path_is_created() {
        let temp = TempDir::new().unwrap();
        let data = temp.path().join("nested").join("data");
        let settings = Settings {
            custom_data_path: data.to_string_lossy().to_string(),
        };
        save_config(temp.path(), &settings).unwrap();

        let loaded = load_config(temp.path());
        let resolved = resolve_data_dir(&loaded).unwrap();

        assert_eq!(resolved, data);
        assert!(data.is_dir());
    }

    #[test]
    fn purge_removes_only_printouts() {
        let temp = TempDir::new().unwrap();
        for name in ["a.ods", "a.pdf", "a.bak", "keep.json", "notes.txt"] {
            fs::write(temp.path().join(name), "x").unwrap();
        }

        let removed = purge_output_dir(temp.path());

        assert_eq!(removed, 3);
        assert!(temp.path().join("keep.json").exists());
        assert!(temp.path().join("notes.txt").exists());
        assert!(!temp.path().join("a.pdf").exists());
    }

    #[test]
    fn purge_of_missing_dir_is_a_no_op() {
        let temp = TempDir::new().unwrap();
        assert_eq!(purge_output_dir(&temp.path().join("missing")), 0);
    }
}
