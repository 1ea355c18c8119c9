use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::io::engine::{CsvCorrectionsWriter, MatlabBatchWriter, WorkspaceWriter};
use crate::render::StrokeStyle;
use crate::session::view::DEFAULT_PANELS;

/// Viewer settings read from a TOML file. Every field has a default.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct ViewerConfig {
    pub display: DisplayConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Image slots per slice.
    pub panels: usize,
    /// Integer upscaling of the rendered frames.
    pub scale: u32,
    pub contour_color: [u8; 3],
    pub line_width: f32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        let style = StrokeStyle::default();
        Self {
            panels: DEFAULT_PANELS,
            scale: 4,
            contour_color: style.color,
            line_width: style.width,
        }
    }
}

impl DisplayConfig {
    pub fn stroke_style(&self) -> StrokeStyle {
        StrokeStyle {
            color: self.contour_color,
            width: self.line_width,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportBackend {
    #[default]
    Matlab,
    Csv,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub backend: ExportBackend,
    pub matlab_executable: PathBuf,
    /// Folder holding `update_workspace_corrected.m`, added to the MATLAB path.
    pub matlab_script_dir: Option<PathBuf>,
    /// Defaults to the folder of the opened workspace.
    pub output_folder: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            backend: ExportBackend::Matlab,
            matlab_executable: PathBuf::from("matlab"),
            matlab_script_dir: None,
            output_folder: None,
        }
    }
}

impl ExportConfig {
    pub fn writer(&self) -> Box<dyn WorkspaceWriter> {
        match self.backend {
            ExportBackend::Matlab => {
                let mut writer = MatlabBatchWriter::new(&self.matlab_executable);
                if let Some(dir) = &self.matlab_script_dir {
                    writer = writer.with_script_dir(dir);
                }
                Box::new(writer) as Box<dyn WorkspaceWriter>
            }
            ExportBackend::Csv => Box::new(CsvCorrectionsWriter),
        }
    }
}

impl ViewerConfig {
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("invalid viewer configuration")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("in {}", path.display()))?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Configuration at `path` if it exists and parses, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Using default configuration: {:#}", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = ViewerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.display.panels, 4);
        assert_eq!(config.display.stroke_style(), StrokeStyle::default());
        assert_eq!(config.export.backend, ExportBackend::Matlab);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = ViewerConfig::from_toml_str(
            r#"
            [display]
            scale = 2
            contour_color = [0, 255, 0]

            [export]
            backend = "csv"
            output_folder = "/tmp/out"
            "#,
        )
        .unwrap();
        assert_eq!(config.display.scale, 2);
        assert_eq!(config.display.panels, 4);
        assert_eq!(config.display.stroke_style().color, [0, 255, 0]);
        assert_eq!(config.export.backend, ExportBackend::Csv);
        assert_eq!(config.export.output_folder, Some(PathBuf::from("/tmp/out")));
        assert_eq!(config.export.matlab_executable, PathBuf::from("matlab"));
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!(ViewerConfig::from_toml_str("[export]\nbackend = \"hdf5\"").is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = ViewerConfig::load_or_default(Path::new("/nonexistent/densevis.toml"));
        assert_eq!(config, ViewerConfig::default());
        assert!(ViewerConfig::load(Path::new("/nonexistent/densevis.toml")).is_err());
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("densevis_bad_config.toml");
        std::fs::write(&path, "[display]\npanels = \"four\"").unwrap();
        assert_eq!(ViewerConfig::load_or_default(&path), ViewerConfig::default());
        std::fs::remove_file(&path).ok();
    }
}
