//! Font discovery via fontconfig
//!
//! Resolves "Family Style" names such as "DejaVu Sans Mono Bold" to a file.

use anyhow::{Context, Result};
use fontconfig::{Fontconfig, Pattern};
use std::ffi::CString;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Longer styles first so "SemiBold" is not read as "Bold"
const KNOWN_STYLES: &[&str] = &[
    "Condensed Bold",
    "ExtraBold",
    "SemiBold",
    "Bold",
    "Black",
    "Regular",
];

/// Splits a trailing known style off `font_name`
fn split_style(font_name: &str) -> (&str, Option<&'static str>) {
    for style in KNOWN_STYLES {
        if let Some(prefix) = font_name.strip_suffix(style) {
            if prefix.is_empty() || prefix.ends_with(' ') {
                return (prefix.trim(), Some(style));
            }
        }
    }
    (font_name, None)
}

/// Find the font file for a family name, optionally followed by a style
pub fn find_font_path(font_name: &str) -> Result<PathBuf> {
    let fc = Fontconfig::new().context("Failed to initialize fontconfig")?;
    let (family_name, style_name) = split_style(font_name);

    let mut pattern = Pattern::new(&fc);
    let family_cstr = CString::new(family_name)
        .with_context(|| format!("Invalid family name: {}", family_name))?;
    pattern.add_string(fontconfig::FC_FAMILY, &family_cstr);

    if let Some(style) = style_name {
        let style_cstr = CString::new(style)
            .with_context(|| format!("Invalid style name: {}", style))?;
        pattern.add_string(fontconfig::FC_STYLE, &style_cstr);
    }

    let matched = pattern.font_match();

    // fontconfig falls back to any family it likes; only accept the one asked for
    if let Some(matched_family) = matched.get_string(fontconfig::FC_FAMILY) {
        if !matched_family.eq_ignore_ascii_case(family_name) && family_name != "Monospace" {
            warn!(
                requested = font_name,
                matched_family = matched_family,
                "Fontconfig returned different font family - requested font may not be installed"
            );
            anyhow::bail!(
                "Font '{}' not found - fontconfig returned family '{}' instead",
                font_name,
                matched_family
            );
        }
    }

    let path = PathBuf::from(
        matched
            .filename()
            .with_context(|| format!("No font file found for '{}'", font_name))?,
    );

    if !path.exists() {
        anyhow::bail!("Font file path '{}' does not exist", path.display());
    }

    debug!(font = font_name, family = family_name, style = ?style_name, path = %path.display(), "Resolved font path");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_style() {
        assert_eq!(split_style("DejaVu Sans Mono Bold"), ("DejaVu Sans Mono", Some("Bold")));
        assert_eq!(split_style("Noto Sans SemiBold"), ("Noto Sans", Some("SemiBold")));
        assert_eq!(split_style("Monospace"), ("Monospace", None));
        assert_eq!(split_style("Bold"), ("", Some("Bold")));
        assert_eq!(split_style("Kobold"), ("Kobold", None));
    }

    #[test]
    fn test_find_common_fonts() {
        // Only checks shape: fonts may be absent on the test machine
        for family in ["DejaVu Sans Mono Bold", "Monospace"] {
            if let Ok(path) = find_font_path(family) {
                assert!(path.is_absolute(), "Font path should be absolute");
            }
        }
    }
}
