use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "imihigo.toml";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    pub catalogue: String,
    pub entries: String,
    /// Persisted pillar records; the catalogue's own pillars when absent.
    pub pillars: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub dir: String,
    pub preview_rows: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            dir: "reports".to_string(),
            preview_rows: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[data]
catalogue = "data/catalogue.json"
entries = "data/entries.csv"

[output]
dir = "reports"
preview_rows = 5

[logging]
level = "info"
"#;

/// Load configuration.
///
/// Search order:
/// 1. `imihigo.toml` in the working directory
/// 2. `imihigo.toml` next to the executable
/// 3. Embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    let mut candidates = vec![PathBuf::from(CONFIG_FILE)];
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.push(exe_dir.join(CONFIG_FILE));
        }
    }

    for path in candidates {
        if path.exists() {
            // Logging is not up yet; the caller reports which file was used.
            return from_file(&path);
        }
    }

    let mut config: Config = toml::from_str(DEFAULT_CONFIG)?;
    config.base_dir = PathBuf::from(".");
    Ok(config)
}

pub fn from_file(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&contents)?;
    config.base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(config)
}

impl Config {
    /// Absolute paths are used as is, relative ones are joined to `base_dir`.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_dir.join(p)
        }
    }

    pub fn catalogue_path(&self) -> PathBuf {
        self.resolve(&self.data.catalogue)
    }

    pub fn entries_path(&self) -> PathBuf {
        self.resolve(&self.data.entries)
    }

    pub fn pillars_path(&self) -> Option<PathBuf> {
        self.data.pillars.as_deref().map(|p| self.resolve(p))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.output.dir)
    }
}
