//! Settings file on disk
//!
//! `ConfigFile` owns the location of `settings.json`. Reads never fail hard:
//! a missing, blank or unreadable file yields `Settings::default()` with a
//! warning, so a broken config can never keep the app from starting.

use crate::config::Settings;
use crate::error::{Error, Result, ResultExt};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

// ─────────────────────────────────────────────────────────────────────────────
// Locations
// ─────────────────────────────────────────────────────────────────────────────

/// Directory name under the platform config root.
pub const CONFIG_DIR_NAME: &str = "draftsmith";

const SETTINGS_FILE: &str = "settings.json";

/// Per-user data directory, e.g. `~/.config/draftsmith` on Linux or
/// `%APPDATA%\draftsmith` on Windows.
pub fn get_config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().ok_or(Error::ConfigDirNotFound)?;
    Ok(base.join(CONFIG_DIR_NAME))
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    debug!("Creating {}", dir.display());
    fs::create_dir_all(dir).map_err(|source| Error::FileWrite {
        path: dir.to_path_buf(),
        source,
    })
}

/// Replace `path` with `contents` in one step.
///
/// The data lands in `<path>.bak` first and is renamed over the target, so a
/// crash mid-write leaves either the old file or the new one.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let staging = staging_path(path);
    fs::write(&staging, contents).map_err(|source| Error::FileWrite {
        path: staging.clone(),
        source,
    })?;
    fs::rename(&staging, path).map_err(|source| Error::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

// ─────────────────────────────────────────────────────────────────────────────
// ConfigFile
// ─────────────────────────────────────────────────────────────────────────────

/// Handle to one settings file.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `settings.json` inside the per-user data directory.
    pub fn default_location() -> Result<Self> {
        Ok(Self::at(get_config_dir()?.join(SETTINGS_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and sanitize the settings.
    ///
    /// A missing or blank file is not an error. Malformed JSON is, so the
    /// caller can decide whether to fall back.
    pub fn load(&self) -> Result<Settings> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings at {}", self.path.display());
                return Ok(Settings::default());
            }
            Err(e) => {
                return Err(Error::ConfigLoad {
                    path: self.path.clone(),
                    source: Box::new(e),
                })
            }
        };

        if contents.trim().is_empty() {
            return Ok(Settings::default());
        }

        let settings = Settings::from_json_sanitized(&contents).map_err(|e| Error::ConfigParse {
            message: format!("{} is not valid settings JSON: {}", self.path.display(), e),
            source: Some(Box::new(e)),
        })?;
        info!("Settings read from {}", self.path.display());
        Ok(settings)
    }

    /// Write the settings as pretty JSON, creating the directory if needed.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            ensure_dir(dir)?;
        }
        let json = serde_json::to_string_pretty(settings).map_err(|e| Error::ConfigSave {
            path: self.path.clone(),
            source: Box::new(e),
        })?;
        write_atomic(&self.path, &json).map_err(|e| Error::ConfigSave {
            path: self.path.clone(),
            source: Box::new(e),
        })?;
        debug!("Settings written to {}", self.path.display());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// App-level entry points
// ─────────────────────────────────────────────────────────────────────────────

/// Settings from the default location, or defaults if anything goes wrong.
pub fn load_config() -> Settings {
    ConfigFile::default_location()
        .and_then(|file| file.load())
        .unwrap_or_warn_default(Settings::default(), "Could not read settings")
}

/// Persist to the default location; `false` (and a warning) on failure.
pub fn save_config_silent(settings: &Settings) -> bool {
    let result = ConfigFile::default_location().and_then(|file| file.save(settings));
    if let Err(e) = &result {
        warn!("Could not save settings: {}", e);
    }
    result.is_ok()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EditMode, Theme};
    use crate::generation::Tone;
    use tempfile::TempDir;

    fn scratch() -> (TempDir, ConfigFile) {
        let dir = TempDir::new().unwrap();
        let file = ConfigFile::at(dir.path().join("nested").join(SETTINGS_FILE));
        (dir, file)
    }

    fn put(file: &ConfigFile, body: &str) {
        ensure_dir(file.path().parent().unwrap()).unwrap();
        fs::write(file.path(), body).unwrap();
    }

    #[test]
    fn test_default_location_is_under_app_dir() {
        if let Ok(file) = ConfigFile::default_location() {
            assert!(file.path().to_string_lossy().contains(CONFIG_DIR_NAME));
            assert!(file.path().ends_with(SETTINGS_FILE));
        }
    }

    #[test]
    fn test_absent_or_blank_file_gives_defaults() {
        let (_dir, file) = scratch();
        assert_eq!(file.load().unwrap(), Settings::default());

        put(&file, "  \n\t");
        assert_eq!(file.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let (_dir, file) = scratch();
        put(&file, "{ theme: dark");
        assert!(matches!(file.load(), Err(Error::ConfigParse { .. })));
    }

    #[test]
    fn test_out_of_range_values_are_clamped_on_load() {
        let (_dir, file) = scratch();
        put(&file, r#"{"font_size": 2.5, "default_image_count": 40, "theme": "dark"}"#);
        let settings = file.load().unwrap();
        assert_eq!(settings.font_size, Settings::MIN_FONT_SIZE);
        assert_eq!(settings.default_image_count, 5);
        assert_eq!(settings.theme, Theme::Dark);
    }

    #[test]
    fn test_save_creates_dir_and_reloads_equal() {
        let (_dir, file) = scratch();
        let settings = Settings {
            theme: Theme::System,
            default_edit_mode: EditMode::Editing,
            default_tone: Tone::Persuasive,
            auto_save: false,
            ..Settings::default()
        };
        file.save(&settings).unwrap();
        assert_eq!(file.load().unwrap(), settings);
        assert!(!staging_path(file.path()).exists());
    }

    #[test]
    fn test_write_atomic_overwrites() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("history.json");
        write_atomic(&target, "[1]").unwrap();
        write_atomic(&target, "[1,2]").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "[1,2]");
    }
}
