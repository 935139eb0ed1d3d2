//! Configuration management for wordtrace.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default rasterization resolution for ingestion and rendering.
pub const DEFAULT_DPI: u32 = 300;
/// Default number of PDF pages materialized per ingestion batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;
/// Default maximum edit distance for fuzzy search.
pub const DEFAULT_MAX_DISTANCE: u32 = 2;

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Directory for annotated page images.
    pub annotated_dir: PathBuf,
    /// Resolution used when rasterizing PDF pages for OCR.
    pub ingest_dpi: u32,
    /// Resolution used when regenerating pages for highlight rendering.
    /// Independent of `ingest_dpi`.
    pub render_dpi: u32,
    /// Pages per ingestion batch; bounds peak memory for long PDFs.
    pub batch_size: usize,
    /// Tesseract language setting.
    pub tesseract_lang: String,
}

impl Default for Settings {
    fn default() -> Self {
        // Default to ~/Documents/wordtrace/ for user data
        let data_dir = dirs::document_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("wordtrace");

        Self {
            annotated_dir: data_dir.join("annotated"),
            data_dir,
            database_filename: "wordtrace.db".to_string(),
            ingest_dpi: DEFAULT_DPI,
            render_dpi: DEFAULT_DPI,
            batch_size: DEFAULT_BATCH_SIZE,
            tesseract_lang: "eng".to_string(),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            annotated_dir: data_dir.join("annotated"),
            data_dir,
            ..Default::default()
        }
    }

    /// Resolve settings from an optional data-dir override plus the config
    /// file in that directory, if one exists.
    pub fn resolve(data_dir: Option<PathBuf>) -> Result<Self> {
        let mut settings = match data_dir {
            Some(dir) => Self::with_data_dir(dir),
            None => Self::default(),
        };

        let config_path = settings.config_path();
        if config_path.exists() {
            let config = Config::load(&config_path)?;
            settings.apply(config);
        }

        Ok(settings)
    }

    /// Get the full path to the database.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Get the full path to the config file.
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("wordtrace.toml")
    }

    /// Ensure all directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        fs::create_dir_all(&self.annotated_dir)?;
        Ok(())
    }

    fn apply(&mut self, config: Config) {
        if let Some(database) = config.database {
            self.database_filename = database;
        }
        if let Some(dir) = config.annotated_dir {
            self.annotated_dir = PathBuf::from(dir);
        }
        if let Some(dpi) = config.ingest_dpi {
            self.ingest_dpi = dpi;
        }
        if let Some(dpi) = config.render_dpi {
            self.render_dpi = dpi;
        }
        if let Some(batch) = config.batch_size {
            self.batch_size = batch.max(1);
        }
        if let Some(lang) = config.tesseract_lang {
            self.tesseract_lang = lang;
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Database filename.
    #[serde(default)]
    pub database: Option<String>,
    /// Directory for annotated output pages.
    #[serde(default)]
    pub annotated_dir: Option<String>,
    /// Ingestion rasterization DPI.
    #[serde(default)]
    pub ingest_dpi: Option<u32>,
    /// Rendering rasterization DPI.
    #[serde(default)]
    pub render_dpi: Option<u32>,
    /// Pages per ingestion batch.
    #[serde(default)]
    pub batch_size: Option<usize>,
    /// Tesseract language.
    #[serde(default)]
    pub tesseract_lang: Option<String>,
}

impl Config {
    /// Load a config file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = Settings::default();
        assert_eq!(settings.ingest_dpi, 300);
        assert_eq!(settings.batch_size, 10);
        assert_eq!(settings.database_filename, "wordtrace.db");
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("wordtrace.toml");
        fs::write(&config_path, "ingest_dpi = 150\nbatch_size = 4\n").unwrap();

        let mut settings = Settings::with_data_dir(dir.path().to_path_buf());
        let config = Config::load(&config_path).unwrap();
        settings.apply(config);

        assert_eq!(settings.ingest_dpi, 150);
        assert_eq!(settings.batch_size, 4);
        // untouched values keep their defaults
        assert_eq!(settings.render_dpi, 300);
    }
}
