use directories::BaseDirs;
use std::path::PathBuf;
use std::sync::OnceLock;

static CONFIG_DIR_OVERRIDE: OnceLock<PathBuf> = OnceLock::new();

pub struct PathManager;

impl PathManager {
    /// Set a custom config directory (used by `--config-dir` and tests)
    pub fn set_config_dir(path: PathBuf) {
        let _ = CONFIG_DIR_OVERRIDE.set(path);
    }

    pub fn config_dir() -> Option<PathBuf> {
        if let Some(d) = CONFIG_DIR_OVERRIDE.get() {
            return Some(d.clone());
        }
        BaseDirs::new().map(|d| d.config_dir().join("smartbank"))
    }

    pub fn data_dir() -> Option<PathBuf> {
        if let Some(d) = CONFIG_DIR_OVERRIDE.get() {
            return Some(d.clone());
        }
        BaseDirs::new().map(|d| d.data_dir().join("smartbank"))
    }

    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("settings.toml"))
    }

    pub fn logs_dir() -> Option<PathBuf> {
        // On macOS, logs usually go to ~/Library/Logs/
        #[cfg(target_os = "macos")]
        {
            if let Some(dirs) = directories::UserDirs::new() {
                return Some(dirs.home_dir().join("Library/Logs/SmartBank"));
            }
        }
        Self::data_dir().map(|d| d.join("logs"))
    }

    pub fn log_file_path() -> Option<PathBuf> {
        Self::logs_dir().map(|d| d.join("smartbank.log"))
    }
}
