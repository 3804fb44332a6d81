//! Options-file loading (`vellum.toml`).
//!
//! Tolerant parse: unknown fields are ignored so the file format can evolve,
//! every section defaults when absent, and the raw file string is retained
//! so values can be re-derived later. Out-of-range values are clamped into
//! an "effective" value rather than rejected.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::metrics::FixedMetrics;
use crate::{Alignment, Style, StyleKey, StyleValue, WrapMode};

/// Upper clamp for the configured undo depth.
const HISTORY_CEILING: usize = 10_000;

#[derive(Debug, Deserialize, Clone)]
pub struct TextConfig {
    #[serde(default)]
    pub alignment: Alignment,
    #[serde(default)]
    pub wrap: WrapMode,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            alignment: Alignment::default(),
            wrap: WrapMode::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CaretConfig {
    /// Half-period of the blink cycle, in milliseconds.
    #[serde(default = "CaretConfig::default_blink")]
    pub blink_interval_ms: u32,
}

impl CaretConfig {
    fn default_blink() -> u32 {
        500
    }
}

impl Default for CaretConfig {
    fn default() -> Self {
        Self {
            blink_interval_ms: Self::default_blink(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UndoConfig {
    #[serde(default = "UndoConfig::default_history_max")]
    pub history_max: usize,
}

impl UndoConfig {
    fn default_history_max() -> usize {
        200
    }
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            history_max: Self::default_history_max(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FontConfig {
    #[serde(default = "FontConfig::default_size")]
    pub size: f32,
}

impl FontConfig {
    fn default_size() -> f32 {
        14.0
    }
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            size: Self::default_size(),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub text: TextConfig,
    #[serde(default)]
    pub caret: CaretConfig,
    #[serde(default)]
    pub undo: UndoConfig,
    #[serde(default)]
    pub font: FontConfig,
}

/// Parsed options plus derived effective values.
#[derive(Debug, Clone, Default)]
pub struct VellumConfig {
    /// Original file string, when one was read.
    pub raw: Option<String>,
    pub file: ConfigFile,
    /// Undo depth after clamping to `[1, 10_000]`.
    pub effective_history_max: usize,
}

impl VellumConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(target: "style.config", path = %path.display(), "config absent, using defaults");
            let mut cfg = Self::default();
            cfg.apply_limits();
            return Ok(cfg);
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut cfg = Self::parse(&raw)?;
        cfg.raw = Some(raw);
        Ok(cfg)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(raw).context("parsing vellum.toml")?;
        let mut cfg = Self {
            raw: None,
            file,
            effective_history_max: 0,
        };
        cfg.apply_limits();
        info!(
            target: "style.config",
            history_max = cfg.effective_history_max,
            blink_ms = cfg.file.caret.blink_interval_ms,
            "config loaded"
        );
        Ok(cfg)
    }

    fn apply_limits(&mut self) {
        self.effective_history_max = self.file.undo.history_max.clamp(1, HISTORY_CEILING);
    }

    /// Blink half-period in seconds.
    pub fn blink_interval(&self) -> f32 {
        self.file.caret.blink_interval_ms as f32 / 1000.0
    }

    /// Write the configured text options into a style table.
    pub fn apply_to(&self, style: &Style) {
        style.set(StyleKey::Alignment, StyleValue::Align(self.file.text.alignment));
        style.set(StyleKey::WrapText, StyleValue::Wrap(self.file.text.wrap));
        style.set(StyleKey::FontSize, StyleValue::Float(self.file.font.size));
    }

    /// Fixed-advance metrics for the configured font size.
    pub fn metrics(&self) -> FixedMetrics {
        FixedMetrics::for_font_size(self.file.font.size)
    }
}
