//! Status icon compositing
//!
//! Each profile gets a 16x16 icon: the base glyph with the profile's 1-based
//! slot numeral drawn over it in the profile tint. All layers are RGBA with
//! premultiplied alpha and every step is integer arithmetic, so the same
//! inputs always give byte-identical output.

use anyhow::{Context, Result};
use std::io::Cursor;
use tracing::debug;

use crate::color::Rgb;
use crate::constants::icon::{PIXELS, SIZE};
use crate::error::IconError;

/// One rasterized numeral: white text on black, where each pixel's
/// luminance doubles as its alpha (0 = background, 255 = solid glyph,
/// anything between is anti-aliased edge).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLayer {
    luminance: [u8; PIXELS],
}

impl TextLayer {
    pub fn blank() -> Self {
        Self {
            luminance: [0; PIXELS],
        }
    }

    /// Writes one pixel; coordinates outside the layer are clipped
    pub fn set(&mut self, x: i32, y: i32, value: u8) {
        if (0..SIZE as i32).contains(&x) && (0..SIZE as i32).contains(&y) {
            self.luminance[y as usize * SIZE + x as usize] = value;
        }
    }

    pub fn alpha(&self, index: usize) -> u8 {
        self.luminance[index]
    }
}

/// Produces the numeral text layer from some font
pub trait GlyphRasterizer {
    fn rasterize_digit(&self, digit: char) -> Result<TextLayer, IconError>;
}

/// Base glyph in straight (non-premultiplied) RGBA; its alpha channel is the
/// icon mask
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseGlyph {
    rgba: Vec<u8>,
}

impl BaseGlyph {
    /// The glyph shipped with the binary
    pub fn bundled() -> Result<Self> {
        Self::from_png(include_bytes!("../assets/base-icon.png"))
    }

    pub fn from_png(bytes: &[u8]) -> Result<Self> {
        let decoder = png::Decoder::new(Cursor::new(bytes));
        let mut reader = decoder.read_info().context("Failed to read base glyph PNG header")?;
        let (width, height) = {
            let info = reader.info();
            (info.width, info.height)
        };
        if width as usize != SIZE || height as usize != SIZE {
            anyhow::bail!("Base glyph must be {SIZE}x{SIZE}, got {width}x{height}");
        }

        let mut buf = vec![0; PIXELS * 4];
        let info = reader.next_frame(&mut buf).context("Failed to decode base glyph PNG")?;
        if info.bit_depth != png::BitDepth::Eight {
            anyhow::bail!("Unsupported base glyph bit depth {:?} (expected 8)", info.bit_depth);
        }
        let data = &buf[..info.buffer_size()];

        let rgba = match info.color_type {
            png::ColorType::Rgba => data.to_vec(),
            png::ColorType::Rgb => data
                .chunks_exact(3)
                .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], 0xFF])
                .collect(),
            other => anyhow::bail!(
                "Unsupported base glyph color type {:?} (expected RGB or RGBA)",
                other
            ),
        };
        Ok(Self::from_rgba(rgba)?)
    }

    pub fn from_rgba(rgba: Vec<u8>) -> Result<Self, IconError> {
        if rgba.len() != PIXELS * 4 {
            return Err(IconError::InvalidGlyph(format!(
                "base glyph has {} bytes, expected {}",
                rgba.len(),
                PIXELS * 4
            )));
        }
        Ok(Self { rgba })
    }
}

/// 16x16 premultiplied RGBA bitmap plus its 1-bit mask (set bit = opaque)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeIcon {
    pixels: Vec<u8>,
    mask: Vec<u8>,
}

impl CompositeIcon {
    /// The base glyph alone, drawn onto a fresh transparent surface
    pub fn from_base(base: &BaseGlyph) -> Self {
        let pixels = base
            .rgba
            .chunks_exact(4)
            .flat_map(|px| {
                let a = px[3];
                [scale(px[0], a), scale(px[1], a), scale(px[2], a), a]
            })
            .collect();

        Self {
            pixels,
            mask: opaque_mask(),
        }
    }

    #[cfg(test)]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[cfg(test)]
    pub fn mask(&self) -> &[u8] {
        &self.mask
    }

    /// Straight-alpha ARGB32 in network byte order, the StatusNotifier
    /// pixmap layout. Pixels outside the mask come out fully transparent.
    pub fn to_argb32(&self) -> Vec<u8> {
        self.pixels
            .chunks_exact(4)
            .enumerate()
            .flat_map(|(index, px)| {
                if !self.is_opaque(index) {
                    return [0; 4];
                }
                let a = px[3];
                [a, unscale(px[0], a), unscale(px[1], a), unscale(px[2], a)]
            })
            .collect()
    }

    fn is_opaque(&self, index: usize) -> bool {
        let (x, y) = (index % SIZE, index / SIZE);
        let row = &self.mask[y * SIZE.div_ceil(8)..];
        row[x / 8] & (0x80 >> (x % 8)) != 0
    }
}

/// `c * a / 255`, truncating
fn scale(c: u8, a: u8) -> u8 {
    (u16::from(c) * u16::from(a) / 255) as u8
}

fn unscale(c: u8, a: u8) -> u8 {
    if a == 0 {
        return 0;
    }
    ((u16::from(c) * 255 + u16::from(a) / 2) / u16::from(a)).min(255) as u8
}

/// Every bit set: alpha is carried in the color plane
fn opaque_mask() -> Vec<u8> {
    vec![0xFF; SIZE.div_ceil(8) * SIZE]
}

/// Composes `numeral` (1-9) in `tint` over `base`
pub fn render(
    rasterizer: &impl GlyphRasterizer,
    base: &BaseGlyph,
    tint: Rgb,
    numeral: u8,
) -> Result<CompositeIcon, IconError> {
    let digit = (1..=9)
        .contains(&numeral)
        .then(|| char::from(b'0' + numeral))
        .ok_or_else(|| IconError::InvalidGlyph(format!("numeral {numeral} is not a single digit 1-9")))?;

    let text = rasterizer.rasterize_digit(digit)?;
    let mut icon = CompositeIcon::from_base(base);

    for (index, dst) in icon.pixels.chunks_exact_mut(4).enumerate() {
        let a = text.alpha(index);
        if a == 0 {
            continue;
        }
        let src = [scale(tint.r, a), scale(tint.g, a), scale(tint.b, a), a];

        // Premultiplied source-over at constant alpha 255
        let inverse = 255 - u16::from(a);
        for (d, s) in dst.iter_mut().zip(src) {
            *d = s + ((u16::from(*d) * inverse + 127) / 255) as u8;
        }
    }

    Ok(icon)
}

/// Renders profile icons, falling back to the plain base glyph when the
/// numeral cannot be drawn
pub struct IconCompositor<R> {
    rasterizer: Option<R>,
    base: BaseGlyph,
}

impl<R: GlyphRasterizer> IconCompositor<R> {
    pub fn new(rasterizer: Option<R>, base: BaseGlyph) -> Self {
        Self { rasterizer, base }
    }

    pub fn base_icon(&self) -> CompositeIcon {
        CompositeIcon::from_base(&self.base)
    }

    pub fn render(&self, tint: Rgb, numeral: u8) -> Result<CompositeIcon, IconError> {
        let rasterizer = self
            .rasterizer
            .as_ref()
            .ok_or_else(|| IconError::InvalidGlyph("no font available".to_string()))?;
        render(rasterizer, &self.base, tint, numeral)
    }

    pub fn render_or_base(&self, tint: Rgb, numeral: u8) -> CompositeIcon {
        self.render(tint, numeral).unwrap_or_else(|e| {
            debug!(error = %e, numeral, "Using plain base glyph");
            self.base_icon()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{BlockRasterizer, BLOCK_EDGE_ALPHA};

    fn pixel(icon: &CompositeIcon, x: usize, y: usize) -> [u8; 4] {
        let i = (y * SIZE + x) * 4;
        icon.pixels()[i..i + 4].try_into().unwrap()
    }

    fn solid_base(rgba: [u8; 4]) -> BaseGlyph {
        BaseGlyph::from_rgba(rgba.repeat(PIXELS)).unwrap()
    }

    #[test]
    fn test_bundled_glyph_is_opaque_square_with_clear_corners() {
        let icon = CompositeIcon::from_base(&BaseGlyph::bundled().unwrap());
        assert_eq!(pixel(&icon, 8, 8), [0x30, 0x30, 0x30, 0xFF]);
        assert_eq!(pixel(&icon, 0, 0), [0, 0, 0, 0]);
        assert_eq!(icon.mask().len(), 32);
        assert!(icon.mask().iter().all(|b| *b == 0xFF));
    }

    #[test]
    fn test_render_is_deterministic() {
        let base = BaseGlyph::bundled().unwrap();
        let first = render(&BlockRasterizer, &base, Rgb::new(0, 0xFF, 0), 3).unwrap();
        let second = render(&BlockRasterizer, &base, Rgb::new(0, 0xFF, 0), 3).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_tint_changes_only_glyph_chrominance() {
        let base = BaseGlyph::bundled().unwrap();
        let background = CompositeIcon::from_base(&base);
        let green = render(&BlockRasterizer, &base, Rgb::new(0, 0xFF, 0), 3).unwrap();
        let pink = render(&BlockRasterizer, &base, Rgb::new(0xFF, 0x40, 0xA0), 3).unwrap();
        let text = BlockRasterizer.rasterize_digit('3').unwrap();

        let mut glyph_pixels = 0;
        for index in 0..PIXELS {
            let (g, p) = (&green.pixels()[index * 4..][..4], &pink.pixels()[index * 4..][..4]);
            assert_eq!(g[3], p[3], "alpha differs at {index}");
            if text.alpha(index) == 0 {
                assert_eq!(g, &background.pixels()[index * 4..][..4]);
                assert_eq!(p, g);
            } else {
                glyph_pixels += 1;
                assert_ne!(g[..3], p[..3]);
            }
        }
        assert!(glyph_pixels > 0);
    }

    #[test]
    fn test_solid_glyph_pixel_takes_tint() {
        let icon = render(&BlockRasterizer, &solid_base([0x30, 0x30, 0x30, 0xFF]), Rgb::new(10, 200, 90), 1).unwrap();
        assert_eq!(pixel(&icon, 6, 6), [10, 200, 90, 255]);
        assert_eq!(pixel(&icon, 1, 1), [0x30, 0x30, 0x30, 0xFF]);
    }

    #[test]
    fn test_edge_pixel_blends_over_base() {
        let icon = render(&BlockRasterizer, &solid_base([0x30, 0x30, 0x30, 0xFF]), Rgb::new(0, 0xFF, 0), 1).unwrap();
        // src = (0, 128, 0, 128); dst 48 * 127 / 255 rounds to 24
        assert_eq!(BLOCK_EDGE_ALPHA, 128);
        assert_eq!(pixel(&icon, 10, 6), [24, 152, 24, 255]);
    }

    #[test]
    fn test_glyph_over_transparent_base_is_recolored_text() {
        let icon = render(&BlockRasterizer, &solid_base([0, 0, 0, 0]), Rgb::new(0xFF, 0xFF, 0xFF), 2).unwrap();
        assert_eq!(pixel(&icon, 6, 6), [255, 255, 255, 255]);
        assert_eq!(pixel(&icon, 10, 6), [128, 128, 128, 128]);
        assert_eq!(pixel(&icon, 0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_numeral_outside_one_to_nine_is_invalid() {
        let base = BaseGlyph::bundled().unwrap();
        for numeral in [0, 10, 255] {
            assert!(matches!(
                render(&BlockRasterizer, &base, Rgb::new(1, 2, 3), numeral),
                Err(IconError::InvalidGlyph(_))
            ));
        }
    }

    #[test]
    fn test_missing_font_degrades_to_base() {
        let base = BaseGlyph::bundled().unwrap();
        let compositor: IconCompositor<BlockRasterizer> = IconCompositor::new(None, base.clone());

        assert!(compositor.render(Rgb::new(0, 255, 0), 1).is_err());
        assert_eq!(compositor.render_or_base(Rgb::new(0, 255, 0), 1), CompositeIcon::from_base(&base));
    }

    #[test]
    fn test_to_argb32_unpremultiplies() {
        let icon = render(&BlockRasterizer, &solid_base([0, 0, 0, 0]), Rgb::new(0, 0xFF, 0), 1).unwrap();
        let argb = icon.to_argb32();
        let i = (6 * SIZE + 10) * 4;
        assert_eq!(argb[i..i + 4], [128, 0, 255, 0]);
        assert_eq!(argb[..4], [0, 0, 0, 0]);
    }

    #[test]
    fn test_from_rgba_checks_size() {
        assert!(BaseGlyph::from_rgba(vec![0; 12]).is_err());
    }
}
