use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::Deserialize;
use std::{fs, path::PathBuf};

/// Settings of the application itself, as opposed to the journal's own `config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the entry files and the journal profile.
    pub journal_dir: PathBuf,
    /// Preferred editor name/binary (e.g. hx for Helix). Optional; the CLI will fall back to $VISUAL/$EDITOR.
    pub editor: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    journal_dir: Option<PathBuf>,
    editor: Option<String>,
}

impl Config {
    /// Loads the first config file found (XDG path, then native) and applies defaults.
    /// An unreadable file is logged and ignored.
    pub fn load() -> Result<Self> {
        let file_config = Self::read_file_config().unwrap_or_else(|error| {
            tracing::warn!(error = %error, "ignoring unreadable config file");
            FileConfig::default()
        });
        Ok(Self::from_file_config(file_config))
    }

    fn from_file_config(file_config: FileConfig) -> Self {
        let journal_dir = file_config
            .journal_dir
            .unwrap_or_else(Self::default_journal_dir);
        Self {
            journal_dir,
            editor: file_config.editor,
        }
    }

    /// Default journal root: `{data_dir}/daybook`
    /// - macOS:   `~/Library/Application Support/daybook`
    /// - Linux:   `$XDG_DATA_HOME/daybook` or `~/.local/share/daybook`
    /// - Windows: `%APPDATA%\daybook`
    fn default_journal_dir() -> PathBuf {
        if let Some(base) = BaseDirs::new() {
            let mut p = base.data_dir().to_path_buf();
            p.push("daybook");
            p
        } else {
            PathBuf::from("./daybook")
        }
    }

    fn config_file_paths() -> Vec<PathBuf> {
        let mut v = Vec::new();
        if let Some(b) = BaseDirs::new() {
            let xdg = b
                .home_dir()
                .join(".config")
                .join("daybook")
                .join("config.toml");
            v.push(xdg);
            let native = b.config_dir().join("daybook").join("config.toml");
            v.push(native);
        }
        v
    }

    /// Read the first existing config file and parse it.
    fn read_file_config() -> Result<FileConfig> {
        for path in Self::config_file_paths() {
            if !path.exists() {
                continue;
            }
            let s =
                fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
            return Self::parse_file(&s).with_context(|| format!("parsing {}", path.display()));
        }
        Ok(FileConfig::default())
    }

    /// Parse a TOML string into `FileConfig`.
    fn parse_file(s: &str) -> Result<FileConfig> {
        Ok(toml::from_str::<FileConfig>(s)?)
    }
}
