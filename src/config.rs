use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Engine configuration, read from a JSON file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Whether the backing datasource is configured and may be queried
    #[serde(default)]
    pub datasource_enabled: bool,

    /// XML element whose text makes up the record body
    #[serde(default = "default_content_tag")]
    pub content_tag: String,

    /// Maximum characters kept from the extracted body
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,

    /// Column expression matched against the record title
    #[serde(default = "default_title_column")]
    pub title_column: String,

    /// Column expression matched against the raw XML body
    #[serde(default = "default_body_column")]
    pub body_column: String,

    #[serde(default = "default_highlight_open")]
    pub highlight_open: String,

    #[serde(default = "default_highlight_close")]
    pub highlight_close: String,

    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
}

fn default_content_tag() -> String {
    "Content".to_string()
}

fn default_max_content_chars() -> usize {
    500
}

fn default_title_column() -> String {
    "b.NAME".to_string()
}

fn default_body_column() -> String {
    "p.FIELD1079".to_string()
}

fn default_highlight_open() -> String {
    r#"<span class="highlight">"#.to_string()
}

fn default_highlight_close() -> String {
    "</span>".to_string()
}

fn default_page_size() -> usize {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            datasource_enabled: false,
            content_tag: default_content_tag(),
            max_content_chars: default_max_content_chars(),
            title_column: default_title_column(),
            body_column: default_body_column(),
            highlight_open: default_highlight_open(),
            highlight_close: default_highlight_close(),
            default_page_size: default_page_size(),
        }
    }
}

impl Config {
    /// Default location: `<config_dir>/news-search/config.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("news-search")
            .join("config.json")
    }

    /// Load configuration from a JSON file.
    ///
    /// A missing file is not an error: defaults are used and a warning is logged.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Config file not found at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read config file {path:?}"));
            }
        };
        let config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {path:?}"))?;
        config.validate()?;

        info!(
            "Loaded config from {:?} (datasource {})",
            path,
            if config.datasource_enabled {
                "enabled"
            } else {
                "disabled"
            }
        );

        Ok(config)
    }

    /// Column expressions are spliced into SQL text, so only plain
    /// (optionally qualified) identifiers such as `b.NAME` are accepted.
    pub fn validate(&self) -> Result<()> {
        for (field, column) in [
            ("title_column", &self.title_column),
            ("body_column", &self.body_column),
        ] {
            if !is_column_identifier(column) {
                anyhow::bail!("Invalid {field} {column:?}: expected an identifier like b.NAME");
            }
        }
        Ok(())
    }
}

fn is_column_identifier(column: &str) -> bool {
    !column.is_empty()
        && column.split('.').all(|part| {
            part.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}
