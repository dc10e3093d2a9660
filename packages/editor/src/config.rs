use crate::errors::EditorError;
use quire_html::HtmlTheme;
use quire_model::DEFAULT_IMAGE_MAX_WIDTH;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_NAME: &str = "quire.config.json";

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Identifies the editor instance in logs
    pub namespace: String,

    /// Node type (or `text.<format>`) → CSS class used by HTML export
    pub theme: HtmlTheme,

    pub history: HistoryConfig,

    pub image: ImageConfig,

    pub links: LinkConfig,

    pub palette: PaletteConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryConfig {
    /// Maximum number of undo levels (0 = unlimited)
    pub max_levels: usize,

    /// Edits to the same text node closer than this coalesce into one entry
    pub merge_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageConfig {
    pub max_width: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkConfig {
    /// Protocols kept by URL sanitizing, with the trailing colon
    pub allowed_protocols: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaletteConfig {
    pub max_results: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            namespace: "quire-editor".to_string(),
            theme: default_theme(),
            history: HistoryConfig::default(),
            image: ImageConfig::default(),
            links: LinkConfig::default(),
            palette: PaletteConfig::default(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_levels: 100,
            merge_delay_ms: 1000,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_IMAGE_MAX_WIDTH,
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            allowed_protocols: ["http:", "https:", "mailto:", "sms:", "tel:"]
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self { max_results: 50 }
    }
}

fn default_theme() -> HtmlTheme {
    HtmlTheme::default()
        .with_class("text.bold", "editor-text-bold")
        .with_class("text.italic", "editor-text-italic")
        .with_class("text.strikethrough", "editor-text-strikethrough")
        .with_class("text.underline", "editor-text-underline")
        .with_class("text.underlineStrikethrough", "editor-text-underlineStrikethrough")
        .with_class("h1", "editor-text-h1")
        .with_class("h2", "editor-text-h2")
        .with_class("h3", "editor-text-h3")
        .with_class("h4", "editor-text-h4")
        .with_class("h5", "editor-text-h5")
        .with_class("h6", "editor-text-h6")
        .with_class("ul", "editor-list-ul")
        .with_class("ol", "editor-list-ol")
        .with_class("listitem", "editor-list-item")
}

impl EditorConfig {
    pub fn from_json_str(source: &str) -> Result<Self, EditorError> {
        serde_json::from_str(source).map_err(|e| EditorError::Config(e.to_string()))
    }

    /// Load config from a file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, EditorError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| EditorError::Config(e.to_string()))?;
        Self::from_json_str(&content)
    }

    /// Load `quire.config.json` from a directory
    pub fn load_dir(dir: &Path) -> Result<Self, EditorError> {
        Self::load(&dir.join(DEFAULT_CONFIG_NAME))
    }
}
