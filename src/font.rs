//! TrueType numeral rendering using fontdue (pure Rust)

use anyhow::{Context, Result};
use fontdue::{Font, FontSettings};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::constants::icon::SIZE;
use crate::error::IconError;
use crate::icon::{GlyphRasterizer, TextLayer};

/// Fixed bold font at a fixed pixel size
#[derive(Debug)]
pub struct FontRenderer {
    font: Font,
    size: f32,
}

impl FontRenderer {
    /// Load a TrueType font from a file path
    pub fn from_path(path: PathBuf, size: f32) -> Result<Self> {
        let font_data = fs::read(&path)
            .with_context(|| format!("Failed to read font file: {}", path.display()))?;

        let font = Font::from_bytes(font_data, FontSettings::default())
            .map_err(|e| anyhow::anyhow!("Failed to parse font: {}", e))?;

        info!(path = %path.display(), size, "Loaded numeral font");
        Ok(Self { font, size })
    }

    /// Load font from a font name (family or fullname) via fontconfig
    pub fn from_font_name(font_name: &str, size: f32) -> Result<Self> {
        let font_path = crate::font_discovery::find_font_path(font_name)
            .with_context(|| format!("Failed to resolve font '{}'", font_name))?;
        Self::from_path(font_path, size)
    }

    /// Try to find and load a bold monospace system font
    pub fn from_system_font(size: f32) -> Result<Self> {
        // Compile-time font path first (set by Nix builds via FONT_PATH)
        const FONT_PATH: Option<&str> = option_env!("FONT_PATH");
        if let Some(nix_font_path) = FONT_PATH {
            if let Ok(renderer) = Self::from_path(PathBuf::from(nix_font_path), size) {
                return Ok(renderer);
            }
            warn!(nix_font_path = %nix_font_path, "Failed to load FONT_PATH, trying fontconfig");
        }

        for name in ["DejaVu Sans Mono Bold", "Monospace Bold"] {
            if let Ok(renderer) = Self::from_font_name(name, size) {
                return Ok(renderer);
            }
        }

        let font_paths = [
            "/usr/share/fonts/truetype/dejavu/DejaVuSansMono-Bold.ttf",
            "/usr/share/fonts/TTF/DejaVuSansMono-Bold.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationMono-Bold.ttf",
            "/usr/share/fonts/liberation/LiberationMono-Bold.ttf",
        ];

        for path in &font_paths {
            if let Ok(renderer) = Self::from_path(PathBuf::from(path), size) {
                return Ok(renderer);
            }
        }

        Err(anyhow::anyhow!(
            "Could not find any system fonts. Tried FONT_PATH ({:?}), fontconfig, and hardcoded paths: {:?}",
            FONT_PATH,
            font_paths
        ))
    }
}

impl GlyphRasterizer for FontRenderer {
    /// Centers the digit's bounding box in the icon
    fn rasterize_digit(&self, digit: char) -> Result<TextLayer, IconError> {
        if !digit.is_ascii_digit() || self.font.lookup_glyph_index(digit) == 0 {
            return Err(IconError::InvalidGlyph(format!("font has no glyph for '{digit}'")));
        }

        let (metrics, bitmap) = self.font.rasterize(digit, self.size);
        if metrics.width == 0 || metrics.height == 0 {
            return Err(IconError::InvalidGlyph(format!("glyph '{digit}' rasterized empty")));
        }

        let left = (SIZE as i32 - metrics.width as i32) / 2;
        let top = (SIZE as i32 - metrics.height as i32) / 2;

        let mut layer = TextLayer::blank();
        for gy in 0..metrics.height {
            for gx in 0..metrics.width {
                layer.set(left + gx as i32, top + gy as i32, bitmap[gy * metrics.width + gx]);
            }
        }
        Ok(layer)
    }
}
