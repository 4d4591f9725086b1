use dirs::home_dir;
use std::{
    env, fs,
    io::Write,
    path::{Path, PathBuf},
};

const DEFAULT_DIR_NAME: &str = ".shop_ledger";
const CACHE_DIR: &str = "cache";
const CONFIG_FILE: &str = "config.json";
const TMP_SUFFIX: &str = "tmp";

/// Environment variable that relocates all on-disk state.
pub const HOME_ENV: &str = "SHOP_LEDGER_HOME";

/// Returns the application-specific data directory, defaulting to `~/.shop_ledger`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Directory holding the local cache entries below `base`.
pub fn cache_dir_in(base: &Path) -> PathBuf {
    base.join(CACHE_DIR)
}

/// Path to the configuration file below `base`.
pub fn config_file_in(base: &Path) -> PathBuf {
    base.join(CONFIG_FILE)
}

pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path)
}

/// Writes `data` next to `path` and renames it into place so readers never
/// observe a partially written file.
pub fn write_atomic(path: &Path, data: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let tmp = tmp_path(path);
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(data.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}
